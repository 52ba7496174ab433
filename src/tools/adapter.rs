use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use super::command::{ToolCommand, ToolPaths};
use super::process::ProcessRunner;
use crate::error::ToolFailure;
use crate::models::SecurityTask;

#[async_trait]
pub trait ToolAdapter: Send + Sync {
    async fn invoke(&self, task: &SecurityTask) -> Result<String, ToolFailure>;
}

pub struct ProcessAdapter {
    paths: ToolPaths,
    runner: ProcessRunner,
}

impl ProcessAdapter {
    pub fn new(paths: ToolPaths, timeout: Duration) -> Self {
        Self {
            paths,
            runner: ProcessRunner::new(timeout),
        }
    }

    pub fn command_for(&self, task: &SecurityTask) -> Result<ToolCommand, ToolFailure> {
        ToolCommand::build(&task.params, &task.target, &self.paths)
            .ok_or_else(|| ToolFailure::InvalidTaskType(task.type_name().to_string()))
    }
}

impl Default for ProcessAdapter {
    fn default() -> Self {
        Self::new(ToolPaths::default(), ProcessRunner::DEFAULT_TIMEOUT)
    }
}

#[async_trait]
impl ToolAdapter for ProcessAdapter {
    async fn invoke(&self, task: &SecurityTask) -> Result<String, ToolFailure> {
        let command = self.command_for(task)?;
        debug!(
            tool = %command.tool,
            host = %task.target,
            timeout_secs = self.runner.timeout().as_secs(),
            "Running {}",
            command
        );
        self.runner.run(&command, &task.target).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PortRange, TaskParams};
    use std::collections::BTreeMap;

    #[tokio::test]
    async fn test_unsupported_type_never_spawns() {
        let adapter = ProcessAdapter::default();
        let task = SecurityTask::new(
            "example.com",
            TaskParams::Unsupported {
                type_name: "nikto".to_string(),
                raw: BTreeMap::new(),
            },
        );
        let err = adapter.invoke(&task).await.unwrap_err();
        assert!(matches!(err, ToolFailure::InvalidTaskType(ref name) if name == "nikto"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_configured_binary_receives_tool_arguments() {
        // `sh -c script` binds the appended nmap arguments to $0..$3.
        let paths = ToolPaths {
            nmap: crate::tools::ToolBinary::with_args("sh", &["-c", "echo \"$1 $3\""]),
            ..ToolPaths::default()
        };
        let adapter = ProcessAdapter::new(paths, Duration::from_secs(10));
        let task = SecurityTask::new(
            "example.com",
            TaskParams::PortScan { ports: "80,443".parse::<PortRange>().unwrap() },
        );

        let out = adapter.invoke(&task).await.unwrap();
        assert_eq!(out.trim(), "example.com 80,443");
    }
}
