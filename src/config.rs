use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::data::persist::DEFAULT_STATE_PATH;
use crate::editor::template::DEFAULT_TEMPLATES_PATH;
use crate::solver::client::{DEFAULT_SOLVER_URL, DEFAULT_TIMEOUT_SECS};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

pub const BIND_VAR: &str = "ORBSMITH_BIND";
pub const SOLVER_URL_VAR: &str = "ORBSMITH_SOLVER_URL";
pub const STATE_PATH_VAR: &str = "ORBSMITH_STATE_PATH";
pub const TEMPLATES_PATH_VAR: &str = "ORBSMITH_TEMPLATES_PATH";
pub const TIMEOUT_VAR: &str = "ORBSMITH_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub solver_url: String,
    pub state_path: PathBuf,
    pub templates_path: PathBuf,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            solver_url: DEFAULT_SOLVER_URL.to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            templates_path: PathBuf::from(DEFAULT_TEMPLATES_PATH),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key lookup. Empty values count as unset; an unparseable timeout
    /// keeps the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            bind: get(BIND_VAR).unwrap_or(defaults.bind),
            solver_url: get(SOLVER_URL_VAR).unwrap_or(defaults.solver_url),
            state_path: get(STATE_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.state_path),
            templates_path: get(TEMPLATES_PATH_VAR)
                .map(PathBuf::from)
                .unwrap_or(defaults.templates_path),
            timeout: get(TIMEOUT_VAR)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}
