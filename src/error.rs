use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    OutOfScope,
    ToolNotFound,
    Timeout,
    ExecutionFailed,
    InvalidTaskType,
    Unexpected,
}

impl FailureKind {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureKind::Timeout | FailureKind::ExecutionFailed | FailureKind::Unexpected
        )
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::OutOfScope => "Out of scope",
            FailureKind::ToolNotFound => "Tool not found",
            FailureKind::Timeout => "Timeout",
            FailureKind::ExecutionFailed => "Execution failed",
            FailureKind::InvalidTaskType => "Invalid task type",
            FailureKind::Unexpected => "Unexpected failure",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ToolFailure {
    #[error("Unknown task type: {0}")]
    InvalidTaskType(String),

    #[error("Tool {tool} not found")]
    ToolNotFound { tool: String },

    #[error("{tool} on {target} timed out after {seconds} seconds")]
    Timeout {
        tool: String,
        target: String,
        seconds: u64,
        partial: String,
    },

    #[error("{tool} failed on {target}: {stderr}")]
    ExecutionFailed {
        tool: String,
        target: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[error("Unexpected failure: {0}")]
    Unexpected(String),
}

impl ToolFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            ToolFailure::InvalidTaskType(_) => FailureKind::InvalidTaskType,
            ToolFailure::ToolNotFound { .. } => FailureKind::ToolNotFound,
            ToolFailure::Timeout { .. } => FailureKind::Timeout,
            ToolFailure::ExecutionFailed { .. } => FailureKind::ExecutionFailed,
            ToolFailure::Unexpected(_) => FailureKind::Unexpected,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    pub fn partial_output(&self) -> Option<&str> {
        let out = match self {
            ToolFailure::Timeout { partial, .. } => partial.as_str(),
            ToolFailure::ExecutionFailed { stdout, .. } => stdout.as_str(),
            _ => return None,
        };
        if out.trim().is_empty() { None } else { Some(out) }
    }
}

#[derive(Debug, Error)]
pub enum ScopeError {
    #[error("Invalid IP network '{entry}': {reason}")]
    InvalidNetwork { entry: String, reason: String },
}

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("unknown parameter '{key}' for {task_type}")]
    UnknownKey { task_type: String, key: String },

    #[error("invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("Failed to read plan {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse plan: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Task #{index} ({target}): {source}")]
    InvalidParameter {
        index: usize,
        target: String,
        #[source]
        source: ParamError,
    },

    #[error("Task #{index} has an empty target")]
    EmptyTarget { index: usize },

    #[error(transparent)]
    Scope(#[from] ScopeError),
}
