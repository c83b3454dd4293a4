//! Utilities (description files, stdin prompt handling).

use std::fs;
use std::path::Path;
use anyhow::{bail, Result};

/// Read a data description file and return its content as string.
/// Currently supports .md, .txt, and other text-based files.
pub fn read_description(file_path: &str) -> Result<String> {
    let path = Path::new(file_path);

    if !path.exists() {
        bail!("Description file '{}' does not exist", file_path);
    }

    if !path.is_file() {
        bail!("'{}' is not a file", file_path);
    }

    let extension = path.extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "md" | "txt" | "rst" | "" => {
            fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read file '{}': {}", file_path, e))
        }
        _ => {
            bail!("Unsupported file type: .{}\nCurrently supported: .md, .txt, .rst, and files without extension", extension);
        }
    }
}

/// Join an inline description with one read from a file.
pub fn combine_descriptions(inline: Option<&str>, from_file: Option<&str>) -> String {
    match (inline.map(str::trim), from_file.map(str::trim)) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => format!("{}\n\n{}", a, b),
        (Some(a), _) if !a.is_empty() => a.to_string(),
        (_, Some(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Merge piped stdin with the positional prompt, stdin first.
pub fn combine_prompt(from_stdin: &str, from_args: &str) -> String {
    if !from_stdin.is_empty() && !from_args.is_empty() {
        format!("{}\n\n{}", from_stdin, from_args)
    } else if !from_stdin.is_empty() {
        from_stdin.to_string()
    } else {
        from_args.to_string()
    }
}
