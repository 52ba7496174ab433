use serde::{Deserialize, Serialize};

use super::finding::Findings;
use super::task::{SecurityTask, TaskRecord, TaskStatus};
use crate::scope::{ScopeConfig, ScopeSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditReport {
    pub tasks: Vec<TaskRecord>,
    pub findings: Findings,
    pub scope: ScopeSnapshot,
}

impl AuditReport {
    pub fn new(tasks: &[SecurityTask], findings: Findings, scope: &ScopeConfig) -> Self {
        Self {
            tasks: tasks.iter().map(TaskRecord::from).collect(),
            findings,
            scope: scope.snapshot(),
        }
    }

    pub fn summary(&self) -> ReportSummary {
        let mut summary = ReportSummary {
            total_tasks: self.tasks.len(),
            targets_with_findings: self.findings.len(),
            ..ReportSummary::default()
        };

        for task in &self.tasks {
            match task.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Failed => summary.failed += 1,
                TaskStatus::Pending | TaskStatus::Running => summary.unfinished += 1,
            }
            summary.total_retries += task.retries as usize;
        }

        summary
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_tasks: usize,
    pub completed: usize,
    pub failed: usize,
    pub unfinished: usize,
    pub total_retries: usize,
    pub targets_with_findings: usize,
}
