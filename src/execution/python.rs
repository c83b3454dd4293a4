//! Python execution protocol: one fresh interpreter per artifact.
//!
//! The bootstrap imports the artifact under its module name, calls the entry
//! point with the JSON-decoded input, and prints exactly one outcome object on
//! stdout. File descriptor 1 is rerouted to stderr first, so anything the
//! generated code writes ends up there.

use std::{path::PathBuf, process::Output, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::debug;

use super::{ArtifactExecutor, ArtifactSlot};
use crate::{config::Config, data::InputData, error::Error, process::python::start_python, Result};

const BOOTSTRAP: &str = r#"
import importlib, json, os, sys, traceback
sys.dont_write_bytecode = True
artifact_dir, module_name, entry_point = sys.argv[1:4]

# Keep a private handle on fd 1 for the outcome, then point fd 1 at stderr so
# nothing the artifact (or its children) writes can reach the outcome stream.
sys.stdout.flush()
out = os.fdopen(os.dup(1), "w")
os.dup2(2, 1)

def emit(payload):
    out.write(payload + "\n")
    out.flush()

def fail(stage, exc):
    msg = "".join(traceback.format_exception_only(type(exc), exc)).strip()
    emit(json.dumps({"ok": False, "stage": stage, "error": msg}))
    sys.exit(1)

try:
    data = json.load(sys.stdin)
except BaseException as exc:
    fail("input", exc)

sys.path.insert(0, artifact_dir)
sys.modules.pop(module_name, None)
importlib.invalidate_caches()

try:
    module = importlib.import_module(module_name)
except BaseException as exc:
    fail("import", exc)
fn = getattr(module, entry_point, None)
if not callable(fn):
    emit(json.dumps({"ok": False, "stage": "entry_point",
                     "error": "module %r defines no callable %r" % (module_name, entry_point)}))
    sys.exit(1)
try:
    result = fn(data)
except BaseException as exc:
    fail("call", exc)

try:
    encoded = json.dumps({"ok": True, "result": result}, default=str, allow_nan=False)
except BaseException as exc:
    fail("encode", exc)
sys.stdout.flush()
emit(encoded)
"#;

const STDERR_TAIL: usize = 2000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Stage {
    Input,
    Import,
    EntryPoint,
    Call,
    Encode,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    ok: bool,
    #[serde(default)]
    result: Value,
    #[serde(default)]
    stage: Option<Stage>,
    #[serde(default)]
    error: Option<String>,
}

/// Runs artifacts with a local Python interpreter through a fixed slot.
#[derive(Debug)]
pub struct PythonExecutor {
    program: String,
    slot: ArtifactSlot,
    timeout: Duration,
    // One attempt at a time may own the slot.
    busy: Mutex<()>,
}

impl PythonExecutor {
    pub fn new(artifact_path: impl Into<PathBuf>) -> Result<Self> {
        let slot = ArtifactSlot::new(artifact_path);
        let is_py = slot.path().extension().and_then(|e| e.to_str()) == Some("py");
        if !is_py || !is_identifier(slot.module_name()) {
            return Err(Error::Configuration(format!(
                "artifact path must name an importable .py module, got {}",
                slot.path().display()
            )));
        }
        Ok(Self {
            program: "python3".into(),
            slot,
            timeout: Duration::from_secs(120),
            busy: Mutex::new(()),
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Ok(Self::new(cfg.artifact_path())?
            .with_program(cfg.python_bin())
            .with_timeout(cfg.execution_timeout()))
    }

    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn slot(&self) -> &ArtifactSlot {
        &self.slot
    }

    fn import_dir(&self) -> Result<String> {
        let dir = self.slot.dir();
        let dir = if dir.is_absolute() {
            dir
        } else {
            std::env::current_dir().map_err(Error::artifact)?.join(dir)
        };
        Ok(dir.to_string_lossy().into_owned())
    }
}

#[async_trait]
impl ArtifactExecutor for PythonExecutor {
    async fn execute(&self, source: &str, entry_point: &str, input: &InputData) -> Result<Value> {
        let _busy = self.busy.lock().await;

        let guard = self.slot.acquire().map_err(Error::artifact)?;
        guard.write(source).map_err(|e| {
            Error::artifact(format!("writing {}: {}", self.slot.path().display(), e))
        })?;

        let payload = serde_json::to_vec(input.value()).map_err(Error::execution)?;
        let dir = self.import_dir()?;
        let handle = start_python(
            &self.program,
            BOOTSTRAP,
            &[dir.as_str(), self.slot.module_name(), entry_point],
        )
        .map_err(|e| Error::artifact(format!("{:#}", e)))?;

        debug!(module = self.slot.module_name(), entry_point, "running artifact");
        let output = handle
            .communicate(payload, self.timeout)
            .await
            .map_err(|e| Error::execution(format!("{:#}", e)))?
            .ok_or_else(|| {
                Error::execution(format!("{} did not return within {:?}", entry_point, self.timeout))
            })?;

        drop(guard);
        interpret_output(&output)
    }

    fn evict(&self) -> Result<()> {
        self.slot.evict().map_err(Error::artifact)
    }

    fn has_stale_state(&self) -> bool {
        self.slot.is_occupied()
    }
}

fn interpret_output(output: &Output) -> Result<Value> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let outcome = stdout
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .and_then(|l| serde_json::from_str::<Outcome>(l).ok());

    let Some(outcome) = outcome else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::execution(format!(
            "interpreter exited with {} and no outcome: {}",
            output.status,
            tail(stderr.trim(), STDERR_TAIL)
        )));
    };

    if outcome.ok {
        return Ok(outcome.result);
    }
    let msg = outcome.error.unwrap_or_else(|| "unknown failure".into());
    match outcome.stage {
        Some(Stage::Import) | Some(Stage::EntryPoint) => Err(Error::Artifact(msg)),
        _ => Err(Error::Execution(msg)),
    }
}

fn tail(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut start = text.len() - max;
    while !text.is_char_boundary(start) {
        start += 1;
    }
    &text[start..]
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}
