//! Configuration Persistence
//!
//! Wraps a [`ServiceConfig`] with its file location so channel additions
//! and removals survive restarts. The in-memory copy is the source of truth
//! while the process runs; every mutation writes the file back out before
//! returning.

use std::path::PathBuf;
use tokio::sync::RwLock;

use chatlog_core::{ChannelName, ServiceConfig};

use crate::error::Result;

pub struct ConfigStore {
    path: Option<PathBuf>,
    current: RwLock<ServiceConfig>,
}

impl ConfigStore {
    /// Load the config file at `path`; mutations are persisted back to it.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = ServiceConfig::load(&path)?;
        Ok(Self {
            path: Some(path),
            current: RwLock::new(config),
        })
    }

    /// Wrap an already-built config without file persistence. Used by tests
    /// and embedders that manage configuration themselves.
    pub fn in_memory(config: ServiceConfig) -> Self {
        Self {
            path: None,
            current: RwLock::new(config),
        }
    }

    pub async fn config(&self) -> ServiceConfig {
        self.current.read().await.clone()
    }

    pub async fn channels(&self) -> Vec<String> {
        self.current.read().await.channels.clone()
    }

    pub async fn contains(&self, channel: &ChannelName) -> bool {
        self.current
            .read()
            .await
            .channels
            .iter()
            .any(|c| c == channel.as_str())
    }

    /// Add a channel to the tracked list and persist.
    pub async fn add_channel(&self, channel: &ChannelName) -> Result<()> {
        let mut config = self.current.write().await;
        if !config.channels.iter().any(|c| c == channel.as_str()) {
            config.channels.push(channel.to_string());
            self.persist(&config)?;
        }
        Ok(())
    }

    /// Remove a channel from the tracked list and persist.
    pub async fn remove_channel(&self, channel: &ChannelName) -> Result<()> {
        let mut config = self.current.write().await;
        let before = config.channels.len();
        config.channels.retain(|c| c != channel.as_str());
        if config.channels.len() != before {
            self.persist(&config)?;
        }
        Ok(())
    }

    fn persist(&self, config: &ServiceConfig) -> Result<()> {
        if let Some(path) = &self.path {
            config.save(path)?;
            tracing::debug!(path = %path.display(), "Persisted configuration");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> ChannelName {
        ChannelName::normalize(name).unwrap()
    }

    #[tokio::test]
    async fn mutations_persist_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        ServiceConfig::default().save(&path).unwrap();

        let store = ConfigStore::load(&path).unwrap();
        store.add_channel(&channel("alpha")).await.unwrap();
        store.add_channel(&channel("beta")).await.unwrap();
        store.remove_channel(&channel("alpha")).await.unwrap();

        let reloaded = ServiceConfig::load(&path).unwrap();
        assert_eq!(reloaded.channels, vec!["beta"]);
    }

    #[tokio::test]
    async fn add_is_idempotent() {
        let store = ConfigStore::in_memory(ServiceConfig::default());
        store.add_channel(&channel("alpha")).await.unwrap();
        store.add_channel(&channel("alpha")).await.unwrap();
        assert_eq!(store.channels().await, vec!["alpha"]);
    }
}
