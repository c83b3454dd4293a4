//! Printers: attempt headers (owo-colors) and generated code (termimad).

use std::sync::{Arc, Mutex};

use is_terminal::IsTerminal;
use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::config::Config;

enum Target {
    Stdout,
    Buffer(Arc<Mutex<String>>),
}

/// Shows each completion before it runs, as requested by `--verbose`.
pub struct CodePrinter {
    pub skin: MadSkin,
    pub markdown: bool,
    target: Target,
}

impl Default for CodePrinter {
    fn default() -> Self {
        Self {
            skin: MadSkin::default(),
            markdown: std::io::stdout().is_terminal(),
            target: Target::Stdout,
        }
    }
}

impl CodePrinter {
    /// Markdown rendering unless `PRETTIFY_MARKDOWN` is off or stdout is not a terminal.
    pub fn from_config(cfg: &Config) -> Self {
        Self {
            markdown: cfg.get_bool("PRETTIFY_MARKDOWN") && std::io::stdout().is_terminal(),
            ..Self::default()
        }
    }

    pub fn plain() -> Self {
        Self { markdown: false, ..Self::default() }
    }

    /// Plain text appended to `buf` instead of stdout.
    pub fn to_buffer(buf: Arc<Mutex<String>>) -> Self {
        Self { markdown: false, target: Target::Buffer(buf), ..Self::default() }
    }

    pub fn print(&self, attempt: usize, text: &str) {
        match &self.target {
            Target::Buffer(buf) => {
                if let Ok(mut buf) = buf.lock() {
                    buf.push_str(&format!("# attempt {}\n{}\n", attempt, text));
                }
            }
            Target::Stdout => {
                println!("{}", format!("# attempt {}", attempt).cyan());
                if self.markdown {
                    self.skin.print_text(&fenced(text));
                    println!();
                } else {
                    println!("{}", text);
                }
            }
        }
    }
}

// Completions that already carry fences are shown as they are.
fn fenced(text: &str) -> String {
    if text.trim_start().starts_with("```") {
        return text.to_string();
    }
    format!("```python\n{}\n```", text.trim_end())
}
