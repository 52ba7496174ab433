use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::command::ToolCommand;
use crate::error::ToolFailure;

pub struct ProcessRunner {
    timeout: Duration,
    drain_grace: Duration,
}

impl ProcessRunner {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            drain_grace: Duration::from_secs(2),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn run(&self, command: &ToolCommand, target: &str) -> Result<String, ToolFailure> {
        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => ToolFailure::ToolNotFound {
                    tool: command.tool.clone(),
                },
                _ => ToolFailure::Unexpected(format!(
                    "Failed to start {}: {}",
                    command.program, e
                )),
            })?;

        let stdout = OutputBuffer::drain(child.stdout.take());
        let stderr = OutputBuffer::drain(child.stderr.take());

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;
        let status = match waited {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                return Err(ToolFailure::Unexpected(format!(
                    "Failed to wait for {}: {}",
                    command.tool, e
                )));
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    warn!(tool = %command.tool, error = %e, "Failed to kill timed out process");
                }
                None
            }
        };

        let stdout = stdout.finish(self.drain_grace).await;
        let stderr = stderr.finish(self.drain_grace).await;

        match status {
            None => Err(ToolFailure::Timeout {
                tool: command.tool.clone(),
                target: target.to_string(),
                seconds: self.timeout.as_secs(),
                partial: stdout,
            }),
            Some(status) if status.success() => {
                debug!(tool = %command.tool, host = target, bytes = stdout.len(), "Tool exited cleanly");
                Ok(stdout)
            }
            Some(status) => Err(ToolFailure::ExecutionFailed {
                tool: command.tool.clone(),
                target: target.to_string(),
                code: status.code(),
                stdout,
                stderr: stderr.trim().to_string(),
            }),
        }
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}

// Drains a pipe into a shared buffer so whatever was read survives a kill.
struct OutputBuffer {
    data: Arc<Mutex<Vec<u8>>>,
    handle: Option<JoinHandle<()>>,
}

impl OutputBuffer {
    fn drain<R>(reader: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let data = Arc::new(Mutex::new(Vec::new()));

        let handle = reader.map(|mut reader| {
            let data = Arc::clone(&data);
            tokio::spawn(async move {
                let mut chunk = [0u8; 8192];
                loop {
                    match reader.read(&mut chunk).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if let Ok(mut buf) = data.lock() {
                                buf.extend_from_slice(&chunk[..n]);
                            }
                        }
                    }
                }
            })
        });

        Self { data, handle }
    }

    async fn finish(mut self, grace: Duration) -> String {
        if let Some(handle) = self.handle.take() {
            let abort = handle.abort_handle();
            if tokio::time::timeout(grace, handle).await.is_err() {
                abort.abort();
            }
        }

        let bytes = self
            .data
            .lock()
            .map(|buf| buf.clone())
            .unwrap_or_default();
        String::from_utf8_lossy(&bytes).into_owned()
    }
}
