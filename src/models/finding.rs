use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InjectionVerdict {
    pub vulnerable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Finding {
    Ports(Vec<u16>),
    Entries(Vec<String>),
    Injection(InjectionVerdict),
    Raw(String),
}

impl Finding {
    pub fn is_empty(&self) -> bool {
        match self {
            Finding::Ports(ports) => ports.is_empty(),
            Finding::Entries(entries) => entries.is_empty(),
            Finding::Injection(verdict) => !verdict.vulnerable,
            Finding::Raw(raw) => raw.trim().is_empty(),
        }
    }

    pub fn summary(&self, max_len: usize) -> String {
        let full = self.to_string();
        if full.chars().count() <= max_len {
            return full;
        }
        let truncated: String = full.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::Ports(ports) if ports.is_empty() => write!(f, "no open ports"),
            Finding::Ports(ports) => {
                let list: Vec<String> = ports.iter().map(|p| p.to_string()).collect();
                write!(f, "{}", list.join(", "))
            }
            Finding::Entries(entries) if entries.is_empty() => write!(f, "none"),
            Finding::Entries(entries) => write!(f, "{}", entries.join(", ")),
            Finding::Injection(verdict) if verdict.vulnerable => write!(f, "vulnerable"),
            Finding::Injection(_) => write!(f, "not vulnerable"),
            Finding::Raw(raw) => write!(f, "{}", raw.trim()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Findings {
    by_target: BTreeMap<String, BTreeMap<String, Finding>>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    // Last write per (target, type) wins; no deep merge.
    pub fn record(&mut self, target: &str, task_type: &str, finding: Finding) {
        self.by_target
            .entry(target.to_string())
            .or_default()
            .insert(task_type.to_string(), finding);
    }

    pub fn get(&self, target: &str, task_type: &str) -> Option<&Finding> {
        self.by_target.get(target)?.get(task_type)
    }

    pub fn for_target(&self, target: &str) -> Option<&BTreeMap<String, Finding>> {
        self.by_target.get(target)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<String, Finding>)> {
        self.by_target.iter()
    }

    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }
}
