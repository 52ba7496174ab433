use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::config::Settings;
use crate::error::PlanError;
use crate::models::{SecurityTask, TaskRequest};
use crate::scope::ScopeConfig;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ScopeSpec {
    pub domains: Vec<String>,
    pub ips: Vec<String>,
}

impl ScopeSpec {
    pub fn extend(&mut self, other: ScopeSpec) {
        self.domains.extend(other.domains);
        self.ips.extend(other.ips);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanFile {
    pub scope: ScopeSpec,
    pub tasks: Vec<TaskRequest>,
    pub settings: Settings,
}

#[derive(Debug)]
pub struct Plan {
    pub scope: ScopeConfig,
    pub tasks: Vec<SecurityTask>,
    pub settings: Settings,
}

impl PlanFile {
    pub fn load(path: &Path) -> Result<Self, PlanError> {
        let content = fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&content)
    }

    pub fn from_json(content: &str) -> Result<Self, PlanError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn into_plan(self, extra_scope: ScopeSpec) -> Result<Plan, PlanError> {
        let mut scope_spec = self.scope;
        scope_spec.extend(extra_scope);
        let scope = ScopeConfig::new(&scope_spec.domains, &scope_spec.ips)?;

        let defaults = self.settings.param_defaults();
        let tasks = self
            .tasks
            .iter()
            .enumerate()
            .map(|(index, request)| {
                if request.target.trim().is_empty() {
                    return Err(PlanError::EmptyTarget { index });
                }
                SecurityTask::from_request(request, &defaults).map_err(|source| {
                    PlanError::InvalidParameter {
                        index,
                        target: request.target.clone(),
                        source,
                    }
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Plan {
            scope,
            tasks,
            settings: self.settings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{TaskParams, TaskStatus, TaskType};
    use std::path::PathBuf;

    const PLAN: &str = r#"{
        "scope": {"domains": ["Example.com"], "ips": ["192.168.1.0/24"]},
        "tasks": [
            {"type": "port-scan", "target": "example.com", "parameters": {"ports": "80,443"}},
            {"task_type": "gobuster", "target": "192.168.1.10", "parameters": {"wordlist": "small.txt"}},
            {"type": "sqlmap", "target": "example.com"},
            {"type": "nikto", "target": "example.com", "parameters": {"tuning": "x"}}
        ],
        "settings": {"timeout_secs": 120, "blacklist_status": 404}
    }"#;

    #[test]
    fn test_parses_plan_with_aliases() {
        let plan = PlanFile::from_json(PLAN).unwrap().into_plan(ScopeSpec::default()).unwrap();

        assert_eq!(plan.tasks.len(), 4);
        assert_eq!(plan.tasks[0].task_type(), Some(TaskType::PortScan));
        assert_eq!(plan.tasks[1].task_type(), Some(TaskType::DirectoryBruteForce));
        assert_eq!(
            plan.tasks[1].params,
            TaskParams::DirectoryBruteForce {
                wordlist: PathBuf::from("small.txt"),
                blacklist_status: 404,
            }
        );
        assert_eq!(plan.tasks[2].task_type(), Some(TaskType::InjectionTest));
        assert_eq!(plan.tasks[3].type_name(), "nikto");
        assert!(plan.tasks.iter().all(|t| t.status == TaskStatus::Pending));
        assert_eq!(plan.settings.timeout_secs, 120);
        assert!(plan.scope.is_in_scope("www.example.com"));
    }

    #[test]
    fn test_extra_scope_is_merged() {
        let extra = ScopeSpec {
            domains: vec!["other.org".to_string()],
            ips: vec!["10.0.0.0/8".to_string()],
        };
        let plan = PlanFile::from_json(PLAN).unwrap().into_plan(extra).unwrap();
        assert!(plan.scope.is_in_scope("other.org"));
        assert!(plan.scope.is_in_scope("10.2.3.4"));
        assert!(plan.scope.is_in_scope("192.168.1.99"));
    }

    #[test]
    fn test_invalid_parameter_reports_index() {
        let json = r#"{"tasks": [
            {"type": "port-scan", "target": "example.com"},
            {"type": "port-scan", "target": "example.com", "parameters": {"ports": "0-80"}}
        ]}"#;
        let err = PlanFile::from_json(json).unwrap().into_plan(ScopeSpec::default()).unwrap_err();
        assert!(matches!(err, PlanError::InvalidParameter { index: 1, .. }));
    }

    #[test]
    fn test_unknown_parameter_key_rejected() {
        let json = r#"{"tasks": [{"type": "fuzz", "target": "example.com", "parameters": {"wordlst": "a.txt"}}]}"#;
        let err = PlanFile::from_json(json).unwrap().into_plan(ScopeSpec::default()).unwrap_err();
        assert!(err.to_string().contains("wordlst"));
    }

    #[test]
    fn test_empty_target_rejected() {
        let json = r#"{"tasks": [{"type": "fuzz", "target": "  "}]}"#;
        let err = PlanFile::from_json(json).unwrap().into_plan(ScopeSpec::default()).unwrap_err();
        assert!(matches!(err, PlanError::EmptyTarget { index: 0 }));
    }

    #[test]
    fn test_invalid_scope_network() {
        let json = r#"{"scope": {"ips": ["300.1.1.1/8"]}}"#;
        let err = PlanFile::from_json(json).unwrap().into_plan(ScopeSpec::default()).unwrap_err();
        assert!(matches!(err, PlanError::Scope(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = PlanFile::load(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, PlanError::Read { .. }));
    }
}
