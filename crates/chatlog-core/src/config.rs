//! Service Configuration
//!
//! The process configuration: which channels to track, the flush threshold,
//! where the database lives. Persisted as a JSON file so channel
//! additions/removals survive restarts.
//!
//! The config value is constructed once at startup and passed explicitly
//! into each component's constructor. Nothing in the workspace reads it
//! from a global.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Channels tracked at startup. Entries are normalized when the
    /// lifecycle layer registers them.
    #[serde(default)]
    pub channels: Vec<String>,

    /// Buffer length at which an automatic flush is triggered.
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// SQLite database URL, e.g. `sqlite://chatlog.db`.
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Whether `unregister` flushes pending messages before discarding the
    /// buffer. Off by default: unflushed messages are dropped, matching the
    /// long-standing behavior of this service. Turn on to trade a slower
    /// channel removal for not losing the tail of the buffer.
    #[serde(default)]
    pub flush_before_unregister: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            flush_threshold: default_flush_threshold(),
            database_url: default_database_url(),
            flush_before_unregister: false,
        }
    }
}

impl ServiceConfig {
    /// Read a config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write the config back out, pretty-printed for hand editing.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let raw = serde_json::to_string_pretty(self)?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

fn default_flush_threshold() -> usize {
    10
}

fn default_database_url() -> String {
    "sqlite://chatlog.db".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let config: ServiceConfig = serde_json::from_str(r#"{"channels": ["alpha"]}"#).unwrap();
        assert_eq!(config.channels, vec!["alpha"]);
        assert_eq!(config.flush_threshold, 10);
        assert!(!config.flush_before_unregister);
    }

    #[test]
    fn save_load_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = ServiceConfig {
            channels: vec!["alpha".into(), "beta".into()],
            flush_threshold: 25,
            database_url: "sqlite://test.db".into(),
            flush_before_unregister: true,
        };
        config.save(&path).unwrap();

        let loaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_missing_file_is_an_error() {
        assert!(ServiceConfig::load("/nonexistent/config.json").is_err());
    }
}
