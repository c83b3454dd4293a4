//! Python interpreter process bootstrap.

use anyhow::{Context, Result};
use tokio::process::{Child, Command};

use super::ProcessHandle;

/// Start `python -B -c <bootstrap> <args..>` with all pipes attached.
pub fn start_python(program: &str, bootstrap: &str, args: &[&str]) -> Result<ProcessHandle> {
    let mut cmd = Command::new(program);
    cmd.arg("-u") // unbuffered
        .arg("-B") // never write .pyc files
        .arg("-c")
        .arg(bootstrap)
        .args(args)
        .stdin(std::process::Stdio::piped())
        .stdout(std::process::Stdio::piped())
        .stderr(std::process::Stdio::piped())
        .kill_on_drop(true);

    let mut child: Child = cmd
        .spawn()
        .with_context(|| format!("failed to spawn interpreter {}", program))?;
    let stdin = child
        .stdin
        .take()
        .ok_or_else(|| anyhow::anyhow!("no stdin"))?;

    Ok(ProcessHandle { child, stdin })
}
