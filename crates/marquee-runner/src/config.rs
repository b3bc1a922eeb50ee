//! Runner configuration.

use std::path::{Path, PathBuf};

use marquee_client::ClientConfig;
use serde::{Deserialize, Serialize};

use crate::runner::RunnerError;

/// Top-level configuration for the `marquee` binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Client behavior: server endpoint, credentials, pacing.
    pub client: ClientConfig,
    /// Scheduler tick interval in milliseconds.
    pub tick_ms: u64,
    /// Directory holding persisted state such as the device identity.
    pub state_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        RunnerConfig {
            client: ClientConfig::default(),
            tick_ms: 100,
            state_dir: PathBuf::from("."),
        }
    }
}

/// Load a YAML config file.
pub fn load_config(path: &Path) -> Result<RunnerConfig, RunnerError> {
    let text = std::fs::read_to_string(path)?;
    let config = serde_yaml::from_str(&text)?;
    Ok(config)
}
