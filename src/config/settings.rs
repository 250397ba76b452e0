use super::ConfigError;
use crate::shared::ids::RunId;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RUN_ID_PLACEHOLDER: &str = "{run_id}";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_idle_poll_ms")]
    pub idle_poll_ms: u64,
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            idle_poll_ms: default_idle_poll_ms(),
            log_path: None,
        }
    }
}

fn default_endpoint() -> String {
    format!("ws://127.0.0.1:8000/ws/{RUN_ID_PLACEHOLDER}")
}

fn default_idle_poll_ms() -> u64 {
    40
}

impl Settings {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let endpoint = self.endpoint.trim();
        if !(endpoint.starts_with("ws://") || endpoint.starts_with("wss://")) {
            return Err(ConfigError::Settings(format!(
                "`endpoint` must use ws:// or wss://, got `{endpoint}`"
            )));
        }
        if !endpoint.contains(RUN_ID_PLACEHOLDER) {
            return Err(ConfigError::Settings(format!(
                "`endpoint` must contain the `{RUN_ID_PLACEHOLDER}` placeholder"
            )));
        }
        if self.idle_poll_ms == 0 {
            return Err(ConfigError::Settings(
                "`idle_poll_ms` must be > 0".to_string(),
            ));
        }
        if let Some(log_path) = &self.log_path {
            if log_path.as_os_str().is_empty() {
                return Err(ConfigError::Settings(
                    "`log_path` must be non-empty when set".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn endpoint_for(&self, run_id: &RunId) -> String {
        self.endpoint
            .trim()
            .replace(RUN_ID_PLACEHOLDER, &urlencoding::encode(run_id.as_str()))
    }
}
