use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::error;

use super::events::{EventLog, LifecycleEvent};
use super::retry::RetryPolicy;
use super::state::TaskEvent;
use crate::error::{FailureKind, ToolFailure};
use crate::models::{Finding, SecurityTask, TaskStatus};
use crate::normalizer::OutputNormalizer;
use crate::scope::ScopeConfig;
use crate::tools::ToolAdapter;

pub const OUT_OF_SCOPE: &str = "Target out of scope";

#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task: SecurityTask,
    pub finding: Option<Finding>,
}

impl TaskOutcome {
    pub fn untouched(task: SecurityTask) -> Self {
        Self {
            task,
            finding: None,
        }
    }
}

pub struct TaskExecutor {
    scope: Arc<ScopeConfig>,
    adapter: Arc<dyn ToolAdapter>,
    policy: RetryPolicy,
    events: Arc<EventLog>,
}

impl TaskExecutor {
    pub fn new(
        scope: Arc<ScopeConfig>,
        adapter: Arc<dyn ToolAdapter>,
        policy: RetryPolicy,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            scope,
            adapter,
            policy,
            events,
        }
    }

    pub async fn execute(&self, mut task: SecurityTask, cancel: &CancellationToken) -> TaskOutcome {
        if task.status != TaskStatus::Pending {
            self.events.record(LifecycleEvent::Skipped { task: &task });
            return TaskOutcome::untouched(task);
        }

        if !self.scope.is_in_scope(&task.target) {
            self.advance(&mut task, TaskEvent::Rejected);
            task.error = Some(OUT_OF_SCOPE.to_string());
            task.failure = Some(FailureKind::OutOfScope);
            self.events.record(LifecycleEvent::OutOfScope { task: &task });
            return TaskOutcome::untouched(task);
        }

        if task.task_type().is_none() {
            let failure = ToolFailure::InvalidTaskType(task.type_name().to_string());
            self.advance(&mut task, TaskEvent::Rejected);
            task.error = Some(failure.to_string());
            task.failure = Some(failure.kind());
            self.events.record(LifecycleEvent::Failed { task: &task });
            return TaskOutcome::untouched(task);
        }

        loop {
            if cancel.is_cancelled() {
                self.events.record(LifecycleEvent::Cancelled { task: &task });
                return TaskOutcome::untouched(task);
            }

            self.advance(&mut task, TaskEvent::Dispatched);
            self.events.record(LifecycleEvent::Started {
                task: &task,
                attempt: task.retries + 1,
            });

            match self.adapter.invoke(&task).await {
                Ok(output) => {
                    let finding = OutputNormalizer::normalize(&task.params, &output);
                    task.result = Some(output);
                    task.error = None;
                    task.failure = None;
                    self.advance(&mut task, TaskEvent::Succeeded);
                    self.events.record(LifecycleEvent::Completed { task: &task });
                    return TaskOutcome {
                        task,
                        finding: Some(finding),
                    };
                }
                Err(failure) => {
                    self.record_failure(&mut task, &failure);

                    if !self.policy.should_retry(task.retries, &failure) {
                        self.advance(&mut task, TaskEvent::GaveUp);
                        if let ToolFailure::ToolNotFound { tool } = &failure {
                            self.events.record(LifecycleEvent::ToolMissing { task: &task, tool });
                        }
                        self.events.record(LifecycleEvent::Failed { task: &task });
                        let finding = failure
                            .partial_output()
                            .map(|partial| OutputNormalizer::normalize(&task.params, partial));
                        return TaskOutcome { task, finding };
                    }

                    self.advance(&mut task, TaskEvent::Retry);
                    self.events.record(LifecycleEvent::Retrying {
                        task: &task,
                        max_attempts: self.policy.max_attempts(),
                    });

                    if !self.policy.delay().is_zero() {
                        tokio::select! {
                            _ = tokio::time::sleep(self.policy.delay()) => {}
                            _ = cancel.cancelled() => {}
                        }
                    }
                }
            }
        }
    }

    fn record_failure(&self, task: &mut SecurityTask, failure: &ToolFailure) {
        task.retries += 1;
        if let Some(partial) = failure.partial_output() {
            task.result = Some(partial.to_string());
        }
        task.error = Some(failure.to_string());
        task.failure = Some(failure.kind());
    }

    fn advance(&self, task: &mut SecurityTask, event: TaskEvent) {
        if let Err(e) = task.advance(event) {
            error!(task = %task.label(), "{}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::{BTreeMap, VecDeque};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::models::{InjectionVerdict, PortRange, TaskParams};

    struct ScriptedAdapter {
        script: Mutex<VecDeque<Result<String, ToolFailure>>>,
        fallback: Result<String, ToolFailure>,
        calls: AtomicUsize,
    }

    impl ScriptedAdapter {
        fn always(result: Result<String, ToolFailure>) -> Arc<Self> {
            Self::scripted(Vec::new(), result)
        }

        fn scripted(
            script: Vec<Result<String, ToolFailure>>,
            fallback: Result<String, ToolFailure>,
        ) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                fallback,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ToolAdapter for ScriptedAdapter {
        async fn invoke(&self, _task: &SecurityTask) -> Result<String, ToolFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let next = self.script.lock().unwrap().pop_front();
            next.unwrap_or_else(|| self.fallback.clone())
        }
    }

    fn exec_failure() -> ToolFailure {
        ToolFailure::ExecutionFailed {
            tool: "nmap".to_string(),
            target: "example.com".to_string(),
            code: Some(1),
            stdout: String::new(),
            stderr: "Execution failed".to_string(),
        }
    }

    fn executor(adapter: Arc<ScriptedAdapter>) -> TaskExecutor {
        let scope = ScopeConfig::new(["example.com"], ["192.168.1.0/24"]).unwrap();
        TaskExecutor::new(
            Arc::new(scope),
            adapter,
            RetryPolicy::default(),
            Arc::new(EventLog::memory()),
        )
    }

    fn port_scan(target: &str) -> SecurityTask {
        SecurityTask::new(target, TaskParams::PortScan { ports: "80".parse::<PortRange>().unwrap() })
    }

    #[tokio::test]
    async fn test_completes_and_normalizes() {
        let adapter = ScriptedAdapter::always(Ok("80/tcp open http".to_string()));
        let outcome = executor(adapter.clone())
            .execute(port_scan("example.com"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.task.status, TaskStatus::Completed);
        assert_eq!(outcome.task.result.as_deref(), Some("80/tcp open http"));
        assert_eq!(outcome.finding, Some(Finding::Ports(vec![80])));
        assert_eq!(outcome.task.retries, 0);
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_out_of_scope_never_invokes() {
        let adapter = ScriptedAdapter::always(Ok("80/tcp open http".to_string()));
        let outcome = executor(adapter.clone())
            .execute(port_scan("other.com"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.task.status, TaskStatus::Failed);
        assert_eq!(outcome.task.error.as_deref(), Some("Target out of scope"));
        assert_eq!(outcome.task.failure, Some(FailureKind::OutOfScope));
        assert_eq!(outcome.task.retries, 0);
        assert!(outcome.finding.is_none());
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_fails_after_three_attempts() {
        let adapter = ScriptedAdapter::always(Err(exec_failure()));
        let outcome = executor(adapter.clone())
            .execute(port_scan("example.com"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.task.status, TaskStatus::Failed);
        assert_eq!(outcome.task.retries, 3);
        assert!(outcome.task.error.unwrap().contains("Execution failed"));
        assert_eq!(outcome.task.failure, Some(FailureKind::ExecutionFailed));
        assert_eq!(adapter.calls(), 3);
    }

    #[tokio::test]
    async fn test_two_failures_then_success() {
        let adapter = ScriptedAdapter::scripted(
            vec![Err(exec_failure()), Err(exec_failure())],
            Ok("443/tcp open https".to_string()),
        );
        let outcome = executor(adapter.clone())
            .execute(port_scan("192.168.1.20"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.task.status, TaskStatus::Completed);
        assert_eq!(outcome.task.retries, 2);
        assert_eq!(outcome.task.result.as_deref(), Some("443/tcp open https"));
        assert!(outcome.task.error.is_none());
        assert!(outcome.task.failure.is_none());
        assert_eq!(outcome.finding, Some(Finding::Ports(vec![443])));
        assert_eq!(adapter.calls(), 3);
    }

    #[tokio::test]
    async fn test_tool_not_found_is_not_retried() {
        let adapter = ScriptedAdapter::always(Err(ToolFailure::ToolNotFound {
            tool: "nmap".to_string(),
        }));
        let exec = executor(adapter.clone());
        let outcome = exec.execute(port_scan("example.com"), &CancellationToken::new()).await;

        assert_eq!(outcome.task.status, TaskStatus::Failed);
        assert_eq!(outcome.task.retries, 1);
        assert_eq!(outcome.task.failure, Some(FailureKind::ToolNotFound));
        assert_eq!(adapter.calls(), 1);
        assert!(exec.events.lines().iter().any(|l| l.contains("Tool nmap not found")));
    }

    #[tokio::test]
    async fn test_timeout_keeps_partial_output() {
        let timeout = ToolFailure::Timeout {
            tool: "nmap".to_string(),
            target: "example.com".to_string(),
            seconds: 300,
            partial: "22/tcp open ssh\n80/tc".to_string(),
        };
        let adapter = ScriptedAdapter::always(Err(timeout));
        let outcome = executor(adapter.clone())
            .execute(port_scan("example.com"), &CancellationToken::new())
            .await;

        assert_eq!(outcome.task.status, TaskStatus::Failed);
        assert_eq!(outcome.task.result.as_deref(), Some("22/tcp open ssh\n80/tc"));
        assert_eq!(outcome.task.failure, Some(FailureKind::Timeout));
        assert_eq!(outcome.finding, Some(Finding::Ports(vec![22])));
        assert_eq!(adapter.calls(), 3);
    }

    #[tokio::test]
    async fn test_failure_without_output_has_no_finding() {
        let adapter = ScriptedAdapter::always(Err(exec_failure()));
        let outcome = executor(adapter)
            .execute(port_scan("example.com"), &CancellationToken::new())
            .await;
        assert!(outcome.task.result.is_none());
        assert!(outcome.finding.is_none());
    }

    #[tokio::test]
    async fn test_injection_scenarios() {
        let params = TaskParams::InjectionTest { level: Default::default() };

        let adapter = ScriptedAdapter::always(Ok("[INFO] URL Is Vulnerable to SQLi".to_string()));
        let outcome = executor(adapter)
            .execute(SecurityTask::new("example.com", params.clone()), &CancellationToken::new())
            .await;
        assert_eq!(outcome.finding, Some(Finding::Injection(InjectionVerdict { vulnerable: true })));

        let adapter = ScriptedAdapter::always(Ok("all tested parameters appear clean".to_string()));
        let outcome = executor(adapter)
            .execute(SecurityTask::new("example.com", params), &CancellationToken::new())
            .await;
        assert_eq!(outcome.finding, Some(Finding::Injection(InjectionVerdict { vulnerable: false })));
    }

    #[tokio::test]
    async fn test_non_pending_task_is_skipped() {
        let adapter = ScriptedAdapter::always(Ok(String::new()));
        let mut task = port_scan("example.com");
        task.status = TaskStatus::Completed;
        task.result = Some("kept".to_string());

        let outcome = executor(adapter.clone()).execute(task, &CancellationToken::new()).await;
        assert_eq!(outcome.task.status, TaskStatus::Completed);
        assert_eq!(outcome.task.result.as_deref(), Some("kept"));
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_before_dispatch_stays_pending() {
        let adapter = ScriptedAdapter::always(Ok(String::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = executor(adapter.clone()).execute(port_scan("example.com"), &cancel).await;
        assert_eq!(outcome.task.status, TaskStatus::Pending);
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_type_is_never_attempted() {
        let adapter = ScriptedAdapter::always(Ok(String::new()));
        let exec = executor(adapter.clone());
        let task = SecurityTask::new(
            "example.com",
            TaskParams::Unsupported {
                type_name: "nikto".to_string(),
                raw: BTreeMap::new(),
            },
        );

        let outcome = exec.execute(task, &CancellationToken::new()).await;
        assert_eq!(outcome.task.status, TaskStatus::Failed);
        assert_eq!(outcome.task.failure, Some(FailureKind::InvalidTaskType));
        assert_eq!(outcome.task.retries, 0);
        assert!(outcome.task.error.unwrap().contains("nikto"));
        assert_eq!(adapter.calls(), 0);
        assert!(!exec.events.lines().iter().any(|l| l.contains("Starting")));
    }

    struct CancelOnFailure {
        cancel: CancellationToken,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ToolAdapter for CancelOnFailure {
        async fn invoke(&self, _task: &SecurityTask) -> Result<String, ToolFailure> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.cancel.cancel();
            Err(ToolFailure::ExecutionFailed {
                tool: "nmap".to_string(),
                target: "example.com".to_string(),
                code: Some(1),
                stdout: "80/tcp open http".to_string(),
                stderr: "connection reset".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_cancelled_between_retries_keeps_state() {
        let cancel = CancellationToken::new();
        let adapter = Arc::new(CancelOnFailure {
            cancel: cancel.clone(),
            calls: AtomicUsize::new(0),
        });
        let scope = ScopeConfig::new(["example.com"], Vec::<String>::new()).unwrap();
        let events = Arc::new(EventLog::memory());
        let exec = TaskExecutor::new(
            Arc::new(scope),
            adapter.clone(),
            RetryPolicy::new(3, std::time::Duration::from_secs(30)),
            events.clone(),
        );

        let outcome = exec.execute(port_scan("example.com"), &cancel).await;

        assert_eq!(outcome.task.status, TaskStatus::Pending);
        assert_eq!(outcome.task.retries, 1);
        assert!(outcome.task.error.unwrap().contains("connection reset"));
        assert_eq!(outcome.task.result.as_deref(), Some("80/tcp open http"));
        assert_eq!(outcome.task.failure, Some(FailureKind::ExecutionFailed));
        assert!(outcome.finding.is_none());
        assert_eq!(adapter.calls.load(Ordering::SeqCst), 1);
        assert!(events.lines().iter().any(|l| l.contains("Cancelled port-scan on example.com")));
    }
}
