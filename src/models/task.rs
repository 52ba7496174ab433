use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::params::{ParamDefaults, TaskParams, TaskType};
use crate::error::{FailureKind, ParamError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaskRequest {
    #[serde(rename = "type", alias = "task_type")]
    pub task_type: String,
    pub target: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct SecurityTask {
    pub target: String,
    pub params: TaskParams,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
    pub retries: u32,
}

impl SecurityTask {
    pub fn new(target: impl Into<String>, params: TaskParams) -> Self {
        Self {
            target: target.into(),
            params,
            status: TaskStatus::Pending,
            result: None,
            error: None,
            failure: None,
            retries: 0,
        }
    }

    pub fn from_request(request: &TaskRequest, defaults: &ParamDefaults) -> Result<Self, ParamError> {
        let params = TaskParams::from_raw(&request.task_type, &request.parameters, defaults)?;
        Ok(Self::new(request.target.trim(), params))
    }

    pub fn task_type(&self) -> Option<TaskType> {
        self.params.task_type()
    }

    pub fn type_name(&self) -> &str {
        self.params.type_name()
    }

    pub fn label(&self) -> String {
        format!("{} on {}", self.type_name(), self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(rename = "type")]
    pub task_type: String,
    pub target: String,
    pub parameters: BTreeMap<String, String>,
    pub status: TaskStatus,
    pub result: Option<String>,
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    pub retries: u32,
}

impl From<&SecurityTask> for TaskRecord {
    fn from(task: &SecurityTask) -> Self {
        Self {
            task_type: task.type_name().to_string(),
            target: task.target.clone(),
            parameters: task.params.to_map(),
            status: task.status,
            result: task.result.clone(),
            error: task.error.clone(),
            failure: task.failure,
            retries: task.retries,
        }
    }
}
