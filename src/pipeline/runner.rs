use std::collections::HashMap;
use std::sync::Arc;

use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::events::{EventLog, LifecycleEvent};
use super::executor::{TaskExecutor, TaskOutcome};
use super::retry::RetryPolicy;
use crate::models::{AuditReport, Findings, SecurityTask, TaskStatus};
use crate::scope::ScopeConfig;
use crate::tools::ToolAdapter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressMode {
    Hidden,
    Compact,
    Detailed,
}

pub struct PipelineRunner {
    scope: Arc<ScopeConfig>,
    adapter: Arc<dyn ToolAdapter>,
    events: Arc<EventLog>,
    policy: RetryPolicy,
    concurrency: usize,
    cancel: CancellationToken,
    progress: ProgressMode,
}

impl PipelineRunner {
    pub fn new(scope: ScopeConfig, adapter: Arc<dyn ToolAdapter>, events: Arc<EventLog>) -> Self {
        Self {
            scope: Arc::new(scope),
            adapter,
            events,
            policy: RetryPolicy::default(),
            concurrency: 1,
            cancel: CancellationToken::new(),
            progress: ProgressMode::Hidden,
        }
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressMode) -> Self {
        self.progress = progress;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn scope(&self) -> &ScopeConfig {
        &self.scope
    }

    pub async fn run(&self, tasks: Vec<SecurityTask>) -> AuditReport {
        let total = tasks.len();
        let pb = self.create_progress_bar(total);
        let executor = TaskExecutor::new(
            self.scope.clone(),
            self.adapter.clone(),
            self.policy.clone(),
            self.events.clone(),
        );

        info!(
            tasks = total,
            concurrency = self.concurrency,
            "Starting pipeline run"
        );

        let outcomes = if self.concurrency <= 1 {
            self.run_sequential(&executor, tasks, &pb).await
        } else {
            self.run_pooled(&executor, tasks, &pb).await
        };

        let mut findings = Findings::new();
        let mut finished = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            if let Some(finding) = outcome.finding {
                findings.record(&outcome.task.target, outcome.task.type_name(), finding);
            }
            finished.push(outcome.task);
        }

        if self.cancel.is_cancelled() {
            let not_started = finished
                .iter()
                .filter(|t| t.status == TaskStatus::Pending && t.retries == 0)
                .count();
            self.events.record(LifecycleEvent::RunCancelled { not_started });
            pb.abandon_with_message("Run cancelled");
        } else {
            pb.finish_with_message("Pipeline complete");
        }
        self.events.flush();

        AuditReport::new(&finished, findings, &self.scope)
    }

    async fn run_sequential(
        &self,
        executor: &TaskExecutor,
        tasks: Vec<SecurityTask>,
        pb: &ProgressBar,
    ) -> Vec<TaskOutcome> {
        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            if self.cancel.is_cancelled() {
                outcomes.push(TaskOutcome::untouched(task));
                continue;
            }
            pb.set_message(task.label());
            outcomes.push(executor.execute(task, &self.cancel).await);
            pb.inc(1);
        }
        outcomes
    }

    async fn run_pooled(
        &self,
        executor: &TaskExecutor,
        tasks: Vec<SecurityTask>,
        pb: &ProgressBar,
    ) -> Vec<TaskOutcome> {
        let semaphore = Semaphore::new(self.concurrency);
        let mut locks: HashMap<String, Arc<Mutex<()>>> = HashMap::new();
        for task in &tasks {
            locks.entry(task.target.to_lowercase()).or_default();
        }

        let futures: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let lock = locks.get(&task.target.to_lowercase()).cloned().unwrap_or_default();
                let semaphore = &semaphore;
                async move {
                    let _host = lock.lock().await;
                    let Ok(_permit) = semaphore.acquire().await else {
                        return TaskOutcome::untouched(task);
                    };
                    if self.cancel.is_cancelled() {
                        return TaskOutcome::untouched(task);
                    }
                    pb.set_message(task.label());
                    let outcome = executor.execute(task, &self.cancel).await;
                    pb.inc(1);
                    outcome
                }
            })
            .collect();

        join_all(futures).await
    }

    fn create_progress_bar(&self, total: usize) -> ProgressBar {
        let template = match self.progress {
            ProgressMode::Hidden => return ProgressBar::hidden(),
            ProgressMode::Compact => "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len}",
            ProgressMode::Detailed => {
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}"
            }
        };

        let pb = ProgressBar::new(total as u64);
        let style = ProgressStyle::default_bar()
            .template(template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-");
        pb.set_style(style);
        pb
    }
}
