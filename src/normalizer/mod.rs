mod injection;
mod paths;
mod ports;
mod status;

pub use injection::InjectionParser;
pub use paths::PathParser;
pub use ports::PortParser;
pub use status::StatusParser;

use crate::models::{Finding, TaskParams, TaskType};

pub struct OutputNormalizer;

impl OutputNormalizer {
    pub fn normalize(params: &TaskParams, raw: &str) -> Finding {
        match params.task_type() {
            Some(task_type) => Self::normalize_type(task_type, raw),
            None => Finding::Raw(raw.to_string()),
        }
    }

    pub fn normalize_type(task_type: TaskType, raw: &str) -> Finding {
        match task_type {
            TaskType::PortScan => Finding::Ports(PortParser::parse(raw)),
            TaskType::DirectoryBruteForce => Finding::Entries(PathParser::parse(raw)),
            TaskType::Fuzz => Finding::Entries(StatusParser::parse(raw)),
            TaskType::InjectionTest => Finding::Injection(InjectionParser::parse(raw)),
        }
    }
}
