//! Interpreter process management (startup/IO).

use std::{process::Output, time::Duration};

use anyhow::{Context, Result};
use tokio::{
    io::AsyncWriteExt,
    process::{Child, ChildStdin},
    time::timeout,
};

pub mod python;

pub struct ProcessHandle {
    pub child: Child,
    pub stdin: ChildStdin,
}

impl ProcessHandle {
    /// Feed `input` on stdin, close it, and collect the output.
    ///
    /// Returns `Ok(None)` when `limit` elapses first; the child is killed
    /// when its handle is dropped.
    pub async fn communicate(self, input: Vec<u8>, limit: Duration) -> Result<Option<Output>> {
        let Self { child, mut stdin } = self;

        // Written concurrently so a chatty child cannot fill its pipes and stall us.
        let writer = tokio::spawn(async move {
            // A child that exits without reading stdin is reported through its status.
            let _ = stdin.write_all(&input).await;
            let _ = stdin.shutdown().await;
        });

        let out = match timeout(limit, child.wait_with_output()).await {
            Ok(out) => out.context("waiting for interpreter")?,
            Err(_) => {
                writer.abort();
                return Ok(None);
            }
        };
        let _ = writer.await;
        Ok(Some(out))
    }
}
