mod config;

pub use config::{ScopeConfig, ScopeSnapshot};
