use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::ParamError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskType {
    PortScan,
    DirectoryBruteForce,
    Fuzz,
    InjectionTest,
}

impl TaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskType::PortScan => "port-scan",
            TaskType::DirectoryBruteForce => "directory-brute-force",
            TaskType::Fuzz => "fuzz",
            TaskType::InjectionTest => "injection-test",
        }
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            TaskType::PortScan => "nmap",
            TaskType::DirectoryBruteForce => "gobuster",
            TaskType::Fuzz => "ffuf",
            TaskType::InjectionTest => "sqlmap",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "port-scan" | "port_scan" | "nmap" => Some(TaskType::PortScan),
            "directory-brute-force" | "directory_brute_force" | "gobuster" => {
                Some(TaskType::DirectoryBruteForce)
            }
            "fuzz" | "ffuf" => Some(TaskType::Fuzz),
            "injection-test" | "injection_test" | "sqlmap" => Some(TaskType::InjectionTest),
            _ => None,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpan {
    pub start: u16,
    pub end: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRange {
    spans: Vec<PortSpan>,
}

impl PortRange {
    pub fn full() -> Self {
        Self {
            spans: vec![PortSpan { start: 1, end: 65535 }],
        }
    }

    pub fn spans(&self) -> &[PortSpan] {
        &self.spans
    }

    fn parse_port(s: &str) -> Result<u16, String> {
        match s.trim().parse::<u16>() {
            Ok(0) => Err("port 0 is not scannable".to_string()),
            Ok(port) => Ok(port),
            Err(_) => Err(format!("'{}' is not a port in 1-65535", s.trim())),
        }
    }
}

impl FromStr for PortRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spans = Vec::new();

        for part in s.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let span = match part.split_once('-') {
                Some((start, end)) => {
                    let start = Self::parse_port(start)?;
                    let end = Self::parse_port(end)?;
                    if start > end {
                        return Err(format!("range {}-{} is reversed", start, end));
                    }
                    PortSpan { start, end }
                }
                None => {
                    let port = Self::parse_port(part)?;
                    PortSpan { start: port, end: port }
                }
            };
            spans.push(span);
        }

        if spans.is_empty() {
            return Err("no ports given".to_string());
        }

        Ok(Self { spans })
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .spans
            .iter()
            .map(|span| {
                if span.start == span.end {
                    span.start.to_string()
                } else {
                    format!("{}-{}", span.start, span.end)
                }
            })
            .collect();
        write!(f, "{}", parts.join(","))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectionLevel(u8);

impl InjectionLevel {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(level: u8) -> Option<Self> {
        (Self::MIN..=Self::MAX).contains(&level).then_some(Self(level))
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl Default for InjectionLevel {
    fn default() -> Self {
        Self(Self::MIN)
    }
}

#[derive(Debug, Clone)]
pub struct ParamDefaults {
    pub wordlist: PathBuf,
    pub blacklist_status: u16,
}

impl Default for ParamDefaults {
    fn default() -> Self {
        Self {
            wordlist: default_wordlist(),
            blacklist_status: 400,
        }
    }
}

pub fn default_wordlist() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(r"C:\wordlists\common.txt")
    } else {
        PathBuf::from("/usr/share/wordlists/dirb/common.txt")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskParams {
    PortScan {
        ports: PortRange,
    },
    DirectoryBruteForce {
        wordlist: PathBuf,
        blacklist_status: u16,
    },
    Fuzz {
        wordlist: PathBuf,
    },
    InjectionTest {
        level: InjectionLevel,
    },
    Unsupported {
        type_name: String,
        raw: BTreeMap<String, String>,
    },
}

impl TaskParams {
    pub fn from_raw(
        type_name: &str,
        raw: &BTreeMap<String, String>,
        defaults: &ParamDefaults,
    ) -> Result<Self, ParamError> {
        let Some(task_type) = TaskType::parse(type_name) else {
            return Ok(TaskParams::Unsupported {
                type_name: type_name.to_string(),
                raw: raw.clone(),
            });
        };

        let mut reader = ParamReader::new(task_type, raw);

        let params = match task_type {
            TaskType::PortScan => {
                let ports = match reader.take(&["ports", "port-range", "port_range", "-p"]) {
                    Some(value) => parse_value("ports", value, |v| v.parse::<PortRange>())?,
                    None => PortRange::full(),
                };
                TaskParams::PortScan { ports }
            }
            TaskType::DirectoryBruteForce => {
                let wordlist = reader
                    .take(&["wordlist", "-w"])
                    .map(PathBuf::from)
                    .unwrap_or_else(|| defaults.wordlist.clone());
                let blacklist_status = match reader.take(&["blacklist", "-b"]) {
                    Some(value) => parse_value("blacklist", value, parse_status)?,
                    None => defaults.blacklist_status,
                };
                TaskParams::DirectoryBruteForce {
                    wordlist,
                    blacklist_status,
                }
            }
            TaskType::Fuzz => {
                let wordlist = reader
                    .take(&["wordlist", "-w"])
                    .map(PathBuf::from)
                    .unwrap_or_else(|| defaults.wordlist.clone());
                TaskParams::Fuzz { wordlist }
            }
            TaskType::InjectionTest => {
                let level = match reader.take(&["level", "--level"]) {
                    Some(value) => parse_value("level", value, parse_level)?,
                    None => InjectionLevel::default(),
                };
                TaskParams::InjectionTest { level }
            }
        };

        reader.finish()?;
        Ok(params)
    }

    pub fn task_type(&self) -> Option<TaskType> {
        match self {
            TaskParams::PortScan { .. } => Some(TaskType::PortScan),
            TaskParams::DirectoryBruteForce { .. } => Some(TaskType::DirectoryBruteForce),
            TaskParams::Fuzz { .. } => Some(TaskType::Fuzz),
            TaskParams::InjectionTest { .. } => Some(TaskType::InjectionTest),
            TaskParams::Unsupported { .. } => None,
        }
    }

    pub fn type_name(&self) -> &str {
        match self {
            TaskParams::Unsupported { type_name, .. } => type_name.as_str(),
            other => other.task_type().map(|t| t.as_str()).unwrap_or_default(),
        }
    }

    pub fn to_map(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        match self {
            TaskParams::PortScan { ports } => {
                map.insert("ports".to_string(), ports.to_string());
            }
            TaskParams::DirectoryBruteForce {
                wordlist,
                blacklist_status,
            } => {
                map.insert("wordlist".to_string(), wordlist.display().to_string());
                map.insert("blacklist".to_string(), blacklist_status.to_string());
            }
            TaskParams::Fuzz { wordlist } => {
                map.insert("wordlist".to_string(), wordlist.display().to_string());
            }
            TaskParams::InjectionTest { level } => {
                map.insert("level".to_string(), level.value().to_string());
            }
            TaskParams::Unsupported { raw, .. } => return raw.clone(),
        }
        map
    }
}

struct ParamReader<'a> {
    task_type: TaskType,
    remaining: BTreeMap<&'a str, &'a str>,
}

impl<'a> ParamReader<'a> {
    fn new(task_type: TaskType, raw: &'a BTreeMap<String, String>) -> Self {
        let remaining = raw.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        Self { task_type, remaining }
    }

    fn take(&mut self, keys: &[&str]) -> Option<&'a str> {
        let mut found = None;
        for key in keys {
            if let Some(value) = self.remaining.remove(*key) {
                found.get_or_insert(value);
            }
        }
        found.filter(|v| !v.trim().is_empty())
    }

    fn finish(self) -> Result<(), ParamError> {
        match self.remaining.keys().next() {
            Some(key) => Err(ParamError::UnknownKey {
                task_type: self.task_type.to_string(),
                key: key.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn parse_value<T>(
    key: &str,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, String>,
) -> Result<T, ParamError> {
    parse(value).map_err(|reason| ParamError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason,
    })
}

fn parse_status(value: &str) -> Result<u16, String> {
    match value.trim().parse::<u16>() {
        Ok(code) if (100..600).contains(&code) => Ok(code),
        _ => Err("expected an HTTP status code".to_string()),
    }
}

fn parse_level(value: &str) -> Result<InjectionLevel, String> {
    value
        .trim()
        .parse::<u8>()
        .ok()
        .and_then(InjectionLevel::new)
        .ok_or_else(|| {
            format!(
                "level must be between {} and {}",
                InjectionLevel::MIN,
                InjectionLevel::MAX
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_port_range_parsing() {
        let range: PortRange = "22, 80-90,443".parse().unwrap();
        assert_eq!(range.spans().len(), 3);
        assert_eq!(range.to_string(), "22,80-90,443");
        assert!("0".parse::<PortRange>().is_err());
        assert!("90-80".parse::<PortRange>().is_err());
        assert!("70000".parse::<PortRange>().is_err());
        assert!("http".parse::<PortRange>().is_err());
        assert!(" , ".parse::<PortRange>().is_err());
    }

    #[test]
    fn test_port_scan_defaults_to_full_range() {
        let params = TaskParams::from_raw("port-scan", &raw(&[]), &ParamDefaults::default()).unwrap();
        assert_eq!(params, TaskParams::PortScan { ports: PortRange::full() });
        assert_eq!(params.to_map()["ports"], "1-65535");
    }

    #[test]
    fn test_tool_aliases() {
        let defaults = ParamDefaults::default();
        let params = TaskParams::from_raw("nmap", &raw(&[("-p", "80")]), &defaults).unwrap();
        assert_eq!(params.type_name(), "port-scan");
        assert_eq!(params.to_map()["ports"], "80");

        let params = TaskParams::from_raw("sqlmap", &raw(&[("level", "3")]), &defaults).unwrap();
        assert_eq!(params.task_type(), Some(TaskType::InjectionTest));
    }

    #[test]
    fn test_directory_defaults() {
        let defaults = ParamDefaults {
            wordlist: PathBuf::from("/tmp/words.txt"),
            blacklist_status: 400,
        };
        let params = TaskParams::from_raw("directory-brute-force", &raw(&[]), &defaults).unwrap();
        let map = params.to_map();
        assert_eq!(map["wordlist"], "/tmp/words.txt");
        assert_eq!(map["blacklist"], "400");
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = TaskParams::from_raw("fuzz", &raw(&[("wordlsit", "x")]), &ParamDefaults::default())
            .unwrap_err();
        assert!(matches!(err, ParamError::UnknownKey { ref key, .. } if key == "wordlsit"));
    }

    #[test]
    fn test_level_out_of_range_rejected() {
        let err = TaskParams::from_raw(
            "injection-test",
            &raw(&[("level", "9")]),
            &ParamDefaults::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ParamError::InvalidValue { .. }));
    }

    #[test]
    fn test_unknown_type_is_unsupported() {
        let params =
            TaskParams::from_raw("nikto", &raw(&[("x", "y")]), &ParamDefaults::default()).unwrap();
        assert_eq!(params.type_name(), "nikto");
        assert_eq!(params.task_type(), None);
        assert_eq!(params.to_map()["x"], "y");
    }
}
