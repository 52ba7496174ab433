use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{TaskParams, TaskType};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolBinary {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl ToolBinary {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(program: impl Into<String>, args: &[&str]) -> Self {
        Self {
            program: program.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPaths {
    pub nmap: ToolBinary,
    pub gobuster: ToolBinary,
    pub ffuf: ToolBinary,
    pub sqlmap: ToolBinary,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            nmap: ToolBinary::new("nmap"),
            gobuster: ToolBinary::new("gobuster"),
            ffuf: ToolBinary::new("ffuf"),
            sqlmap: ToolBinary::new("sqlmap"),
        }
    }
}

impl ToolPaths {
    pub fn binary(&self, task_type: TaskType) -> &ToolBinary {
        match task_type {
            TaskType::PortScan => &self.nmap,
            TaskType::DirectoryBruteForce => &self.gobuster,
            TaskType::Fuzz => &self.ffuf,
            TaskType::InjectionTest => &self.sqlmap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub tool: String,
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub const FUZZ_MARKER: &'static str = "FUZZ";

    pub fn build(params: &TaskParams, target: &str, paths: &ToolPaths) -> Option<Self> {
        let task_type = params.task_type()?;
        let binary = paths.binary(task_type);

        let tool_args: Vec<String> = match params {
            TaskParams::PortScan { ports } => vec![
                "-Pn".to_string(),
                target.to_string(),
                "-p".to_string(),
                ports.to_string(),
            ],
            TaskParams::DirectoryBruteForce {
                wordlist,
                blacklist_status,
            } => vec![
                "dir".to_string(),
                "-u".to_string(),
                format!("http://{}", target),
                "-w".to_string(),
                wordlist.display().to_string(),
                "-b".to_string(),
                blacklist_status.to_string(),
            ],
            TaskParams::Fuzz { wordlist } => vec![
                "-u".to_string(),
                format!("http://{}/{}", target, Self::FUZZ_MARKER),
                "-w".to_string(),
                wordlist.display().to_string(),
            ],
            TaskParams::InjectionTest { level } => vec![
                "-u".to_string(),
                target.to_string(),
                "--batch".to_string(),
                format!("--level={}", level.value()),
            ],
            TaskParams::Unsupported { .. } => return None,
        };

        let mut args = binary.args.clone();
        args.extend(tool_args);

        Some(Self {
            tool: task_type.tool_name().to_string(),
            program: binary.program.clone(),
            args,
        })
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}
