pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod reporter;
pub mod scope;
pub mod tools;

pub use config::Settings;
pub use error::{FailureKind, PlanError, ScopeError, ToolFailure};
pub use models::{AuditReport, Finding, Findings, SecurityTask, TaskParams, TaskStatus, TaskType};
pub use normalizer::OutputNormalizer;
pub use pipeline::{EventLog, PipelineRunner, PlanFile, RetryPolicy, TaskExecutor};
pub use reporter::{ConsoleReporter, HtmlExporter, JsonExporter};
pub use scope::ScopeConfig;
pub use tools::{ProcessAdapter, ToolAdapter};
