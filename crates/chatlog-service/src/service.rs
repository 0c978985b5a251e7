//! Service Facade
//!
//! [`ChatLogService`] is the surface the external HTTP/API layer binds to:
//! querying messages, adding/removing channels, listing timeframes and
//! sizes. It owns the wiring between the collaborators and the internal
//! layers and keeps their distinctions intact - most importantly, "no data
//! for this timeframe" stays a successful empty result while "query failed"
//! stays an error.

use std::sync::Arc;

use chatlog_core::{ChannelName, IncomingMessage, QueryParameters, ServiceConfig, StoredMessage};
use chatlog_ingest::{BufferedWriter, FlushStats, WriterConfig};
use chatlog_query::QueryEngine;
use chatlog_store::PartitionStore;

use crate::config_store::ConfigStore;
use crate::error::{Result, ServiceError};
use crate::lifecycle::LifecycleManager;
use crate::traits::{ChatSource, IdentityResolver};

pub struct ChatLogService {
    lifecycle: LifecycleManager,
    engine: QueryEngine,
    writer: Arc<BufferedWriter>,
    resolver: Arc<dyn IdentityResolver>,
    config: Arc<ConfigStore>,
}

impl ChatLogService {
    /// Wire the service together from its collaborators and storage.
    ///
    /// Reads the writer settings out of the config store's current value;
    /// call [`bootstrap`](Self::bootstrap) afterwards to activate the
    /// configured channels.
    pub async fn new(
        chat: Arc<dyn ChatSource>,
        resolver: Arc<dyn IdentityResolver>,
        store: PartitionStore,
        config: Arc<ConfigStore>,
    ) -> Self {
        let ServiceConfig {
            flush_threshold,
            flush_before_unregister,
            ..
        } = config.config().await;

        let writer = Arc::new(BufferedWriter::new(
            store.clone(),
            WriterConfig {
                flush_threshold,
                flush_before_unregister,
            },
        ));

        let lifecycle = LifecycleManager::new(
            chat,
            store.clone(),
            Arc::clone(&writer),
            Arc::clone(&config),
        );

        Self {
            lifecycle,
            engine: QueryEngine::new(store),
            writer,
            resolver,
            config,
        }
    }

    /// Activate every channel in the configuration (process-start path).
    pub async fn bootstrap(&self) -> Result<()> {
        self.lifecycle.bootstrap().await
    }

    /// Ingestion callback for the chat source.
    ///
    /// Normalizes the channel, truncates the identity key and text to their
    /// storage bounds, and appends. Never returns an error to the chat
    /// client: failures here are logged (and, for flush-related ones,
    /// counted) because the event stream cannot be paused or replayed.
    pub async fn on_message(&self, channel: &str, identity_key: &str, text: &str) {
        let channel = match ChannelName::normalize(channel) {
            Ok(channel) => channel,
            Err(e) => {
                tracing::warn!(raw = channel, error = %e, "Dropped message for invalid channel");
                return;
            }
        };

        let message = IncomingMessage::new(identity_key, text);
        if let Err(e) = self.writer.append(&channel, message).await {
            tracing::error!(channel = %channel, error = %e, "Failed to buffer message");
        }
    }

    /// Query one user's messages in a channel for a given month.
    ///
    /// The username is resolved to its stable identity key first; the query
    /// then runs against the partition for (channel, year, month). `limit`
    /// and `skip` only take effect together.
    pub async fn query_messages(
        &self,
        channel: &str,
        username: &str,
        month: u32,
        year: i32,
        limit: Option<u32>,
        skip: Option<u32>,
    ) -> Result<Vec<StoredMessage>> {
        let channel = ChannelName::normalize(channel)?;
        let identity_key = self
            .resolver
            .resolve(username)
            .await
            .map_err(ServiceError::Identity)?;

        let params = QueryParameters {
            channel,
            identity_key,
            month,
            year,
            limit,
            skip,
        };
        Ok(self.engine.query(&params).await?)
    }

    pub async fn add_channel(&self, name: &str) -> Result<ChannelName> {
        self.lifecycle.add_channel(name).await
    }

    pub async fn remove_channel(&self, name: &str, drop_data: bool) -> Result<ChannelName> {
        self.lifecycle.remove_channel(name, drop_data).await
    }

    /// Currently configured channels.
    pub async fn channels(&self) -> Vec<String> {
        self.config.channels().await
    }

    /// Timeframes with data for a channel, newest first.
    pub async fn partitions_for_channel(&self, name: &str) -> Result<Vec<(i32, u32)>> {
        let channel = ChannelName::normalize(name)?;
        Ok(self.engine.partitions_for_channel(&channel).await?)
    }

    /// Partition sizes as (table name, approximate bytes).
    ///
    /// With a channel: that channel's lineage. Without: every configured
    /// channel's lineage, in configuration order.
    pub async fn partition_sizes(&self, channel: Option<&str>) -> Result<Vec<(String, u64)>> {
        match channel {
            Some(name) => {
                let channel = ChannelName::normalize(name)?;
                Ok(self.engine.partition_sizes(&channel).await?)
            }
            None => {
                let mut sizes = Vec::new();
                for raw in self.config.channels().await {
                    let channel = ChannelName::normalize(&raw)?;
                    sizes.extend(self.engine.partition_sizes(&channel).await?);
                }
                Ok(sizes)
            }
        }
    }

    /// Explicitly flush one channel's buffer (administrative surface).
    pub async fn flush_channel(&self, name: &str) -> Result<usize> {
        let channel = ChannelName::normalize(name)?;
        Ok(self.writer.flush(&channel).await?)
    }

    /// Writer counters for operational visibility.
    pub fn flush_stats(&self) -> FlushStats {
        self.writer.stats()
    }

    /// Number of messages buffered for a channel.
    pub async fn pending_len(&self, name: &str) -> Result<usize> {
        let channel = ChannelName::normalize(name)?;
        Ok(self.writer.pending_len(&channel).await?)
    }
}
