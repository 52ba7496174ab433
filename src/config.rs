use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::models::{ParamDefaults, default_wordlist};
use crate::pipeline::RetryPolicy;
use crate::tools::ToolPaths;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeout_secs: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub concurrency: usize,
    pub wordlist: PathBuf,
    pub blacklist_status: u16,
    pub tools: ToolPaths,
    pub report_path: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            timeout_secs: 300,
            max_attempts: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            retry_delay_ms: 0,
            concurrency: 1,
            wordlist: default_wordlist(),
            blacklist_status: 400,
            tools: ToolPaths::default(),
            report_path: PathBuf::from("audit_report.json"),
            log_file: Some(PathBuf::from("Logs").join("security_pipeline.log")),
        }
    }
}

impl Settings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn param_defaults(&self) -> ParamDefaults {
        ParamDefaults {
            wordlist: self.wordlist.clone(),
            blacklist_status: self.blacklist_status,
        }
    }
}
