//! Node configuration.

use powmesh_consensus::{PowConfig, MAX_DIFFICULTY};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration of one node, stored as `config.json` in its data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// URL other peers use to reach this node.
    pub address: String,
    /// Socket the HTTP server binds to.
    pub listen: SocketAddr,
    pub data_dir: PathBuf,
    /// Directory replicated to every peer.
    pub accounts_dir: PathBuf,
    /// Leading zero hex characters required of a block hash.
    pub difficulty: u32,
    /// Mining threads; 0 means one.
    pub workers: usize,
    /// Peers to join on startup.
    #[serde(default)]
    pub bootstrap: Vec<String>,
    pub request_timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("./data");
        Self {
            address: "http://127.0.0.1:7070".to_string(),
            listen: SocketAddr::from(([127, 0, 0, 1], 7070)),
            accounts_dir: data_dir.join("accounts"),
            data_dir,
            difficulty: 4,
            workers: thread::available_parallelism().map(|n| n.get()).unwrap_or(1),
            bootstrap: Vec::new(),
            request_timeout_secs: 10,
        }
    }
}

impl NodeConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save the config, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.address.trim().is_empty() {
            return Err(ConfigError::Invalid("address must not be empty".into()));
        }
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ConfigError::Invalid(format!(
                "difficulty {} exceeds the maximum of {}",
                self.difficulty, MAX_DIFFICULTY
            )));
        }
        Ok(())
    }

    pub fn pow_config(&self) -> PowConfig {
        PowConfig::new(self.difficulty, self.workers.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Where the sled database lives.
    pub fn chain_dir(&self) -> PathBuf {
        self.data_dir.join("chain")
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.data_dir.join("keys")
    }
}
