//! Channel Lifecycle Orchestration
//!
//! Adding or removing a channel touches four parties: the external chat
//! source, the partition store, the buffered writer, and the persisted
//! configuration. Neither storage nor the chat protocol offers a
//! transaction spanning all four, so each operation runs as a best-effort
//! saga: steps execute in a fixed order, and a failure compensates the
//! already-completed steps in reverse before surfacing the error.
//!
//! ## add_channel
//!
//! ```text
//! join chat source → ensure current-month partition → register buffer → persist config
//! ```
//!
//! Compensation: unregister the buffer, drop the partition (only if this
//! call created it), leave the chat source.
//!
//! ## remove_channel
//!
//! ```text
//! leave chat source → unregister buffer → [drop all partitions] → persist config
//! ```
//!
//! Compensation: re-register the buffer, rejoin the chat source.
//!
//! Compensation is best effort: a failing compensation step is logged and
//! skipped, never allowed to mask the primary error. Between a step and its
//! compensation the partial state is externally visible; that window is
//! accepted.

use std::sync::Arc;

use chatlog_core::{ChannelName, PartitionId};
use chatlog_ingest::BufferedWriter;
use chatlog_store::PartitionStore;

use crate::config_store::ConfigStore;
use crate::error::{Result, ServiceError};
use crate::traits::ChatSource;

pub struct LifecycleManager {
    chat: Arc<dyn ChatSource>,
    store: PartitionStore,
    writer: Arc<BufferedWriter>,
    config: Arc<ConfigStore>,
}

impl LifecycleManager {
    pub fn new(
        chat: Arc<dyn ChatSource>,
        store: PartitionStore,
        writer: Arc<BufferedWriter>,
        config: Arc<ConfigStore>,
    ) -> Self {
        Self {
            chat,
            store,
            writer,
            config,
        }
    }

    /// Start tracking a channel: join its chat source, create the
    /// current-month partition, register a buffer, persist the config.
    pub async fn add_channel(&self, raw: &str) -> Result<ChannelName> {
        let channel = ChannelName::normalize(raw)?;
        if self.config.contains(&channel).await {
            return Err(ServiceError::ChannelAlreadyConfigured(channel.to_string()));
        }

        let created = self.activate(&channel).await?;

        if let Err(e) = self.config.add_channel(&channel).await {
            self.deactivate_quietly(&channel, created).await;
            return Err(e);
        }

        tracing::info!(channel = %channel, "Added channel");
        Ok(channel)
    }

    /// Stop tracking a channel; with `drop_data`, delete every partition in
    /// its lineage.
    pub async fn remove_channel(&self, raw: &str, drop_data: bool) -> Result<ChannelName> {
        let channel = ChannelName::normalize(raw)?;
        if !self.config.contains(&channel).await {
            return Err(ServiceError::ChannelNotConfigured(channel.to_string()));
        }

        self.chat
            .leave(&channel)
            .await
            .map_err(ServiceError::ChatSource)?;

        if let Err(e) = self.writer.unregister(&channel).await {
            self.rejoin_quietly(&channel).await;
            return Err(e.into());
        }

        if drop_data {
            if let Err(e) = self.drop_all_partitions(&channel).await {
                self.reregister_quietly(&channel).await;
                self.rejoin_quietly(&channel).await;
                return Err(e);
            }
        }

        if let Err(e) = self.config.remove_channel(&channel).await {
            self.reregister_quietly(&channel).await;
            self.rejoin_quietly(&channel).await;
            return Err(e);
        }

        tracing::info!(channel = %channel, drop_data, "Removed channel");
        Ok(channel)
    }

    /// Activate every configured channel, one at a time.
    ///
    /// Sequential on purpose: partition creation is a schema-changing
    /// operation and concurrent DDL at startup is the one race this design
    /// rules out entirely.
    pub async fn bootstrap(&self) -> Result<()> {
        for raw in self.config.channels().await {
            let channel = ChannelName::normalize(&raw)?;
            self.activate(&channel).await?;
        }
        tracing::info!("Bootstrap complete");
        Ok(())
    }

    /// join → ensure partition → register buffer, with compensation.
    ///
    /// Returns whether the current-month partition was created by this call
    /// - a later rollback must only drop what this operation brought into
    /// existence.
    async fn activate(&self, channel: &ChannelName) -> Result<bool> {
        self.chat
            .join(channel)
            .await
            .map_err(ServiceError::ChatSource)?;

        let current = PartitionId::current(channel.clone());
        let created = match self
            .store
            .ensure_partition(channel, current.year, current.month)
            .await
        {
            Ok(created) => created,
            Err(e) => {
                self.leave_quietly(channel).await;
                return Err(e.into());
            }
        };

        if let Err(e) = self.writer.register(channel).await {
            if created {
                self.drop_partition_quietly(&current).await;
            }
            self.leave_quietly(channel).await;
            return Err(e.into());
        }

        Ok(created)
    }

    async fn drop_all_partitions(&self, channel: &ChannelName) -> Result<()> {
        let partitions = self.store.list_partitions(channel).await?;
        for partition in &partitions {
            self.store.drop_partition(partition).await?;
        }
        tracing::info!(channel = %channel, dropped = partitions.len(), "Dropped channel partitions");
        Ok(())
    }

    // Compensation helpers. Failures here are logged and swallowed so they
    // never mask the error that started the rollback.

    async fn deactivate_quietly(&self, channel: &ChannelName, drop_partition: bool) {
        if let Err(e) = self.writer.unregister(channel).await {
            tracing::error!(channel = %channel, error = %e, "Rollback: unregister failed");
        }
        if drop_partition {
            let current = PartitionId::current(channel.clone());
            self.drop_partition_quietly(&current).await;
        }
        self.leave_quietly(channel).await;
    }

    async fn drop_partition_quietly(&self, partition: &PartitionId) {
        if let Err(e) = self.store.drop_partition(partition).await {
            tracing::error!(partition = %partition, error = %e, "Rollback: partition drop failed");
        }
    }

    async fn leave_quietly(&self, channel: &ChannelName) {
        if let Err(e) = self.chat.leave(channel).await {
            tracing::error!(channel = %channel, error = %e, "Rollback: chat leave failed");
        }
    }

    async fn rejoin_quietly(&self, channel: &ChannelName) {
        if let Err(e) = self.chat.join(channel).await {
            tracing::error!(channel = %channel, error = %e, "Rollback: chat rejoin failed");
        }
    }

    async fn reregister_quietly(&self, channel: &ChannelName) {
        if let Err(e) = self.writer.register(channel).await {
            tracing::error!(channel = %channel, error = %e, "Rollback: buffer re-register failed");
        }
    }
}
