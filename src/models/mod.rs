mod finding;
mod params;
mod report;
mod task;

pub use finding::{Finding, Findings, InjectionVerdict};
pub use params::{
    InjectionLevel, ParamDefaults, PortRange, PortSpan, TaskParams, TaskType, default_wordlist,
};
pub use report::{AuditReport, ReportSummary};
pub use task::{SecurityTask, TaskRecord, TaskRequest, TaskStatus};
