use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::error::ScopeError;

#[derive(Debug, Clone, Default)]
pub struct ScopeConfig {
    domains: Vec<String>,
    networks: Vec<IpNetwork>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeSnapshot {
    pub domains: Vec<String>,
    pub ips: Vec<String>,
}

impl ScopeConfig {
    pub fn new<D, I>(domains: D, ips: I) -> Result<Self, ScopeError>
    where
        D: IntoIterator,
        D::Item: AsRef<str>,
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut scope = Self::default();

        for domain in domains {
            let domain = domain.as_ref().trim().to_lowercase();
            if domain.is_empty() || scope.domains.contains(&domain) {
                continue;
            }
            scope.domains.push(domain);
        }

        for entry in ips {
            let entry = entry.as_ref().trim();
            if entry.is_empty() {
                continue;
            }
            let network = Self::parse_network(entry)?;
            if !scope.networks.contains(&network) {
                scope.networks.push(network);
            }
        }

        Ok(scope)
    }

    // Host bits are cleared, so "10.0.0.7/8" resolves to "10.0.0.0/8".
    fn parse_network(entry: &str) -> Result<IpNetwork, ScopeError> {
        let invalid = |reason: String| ScopeError::InvalidNetwork {
            entry: entry.to_string(),
            reason,
        };

        let parsed: IpNetwork = entry.parse().map_err(|e| invalid(format!("{}", e)))?;
        IpNetwork::new(parsed.network(), parsed.prefix()).map_err(|e| invalid(format!("{}", e)))
    }

    pub fn is_in_scope(&self, target: &str) -> bool {
        match target.parse::<IpAddr>() {
            Ok(ip) => self.networks.iter().any(|net| net.contains(ip)),
            Err(_) => {
                let target = target.to_lowercase();
                self.domains.iter().any(|domain| {
                    target == *domain
                        || target
                            .strip_suffix(domain.as_str())
                            .is_some_and(|prefix| prefix.ends_with('.'))
                })
            }
        }
    }

    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    pub fn networks(&self) -> &[IpNetwork] {
        &self.networks
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty() && self.networks.is_empty()
    }

    pub fn snapshot(&self) -> ScopeSnapshot {
        ScopeSnapshot {
            domains: self.domains.clone(),
            ips: self.networks.iter().map(|n| n.to_string()).collect(),
        }
    }
}
