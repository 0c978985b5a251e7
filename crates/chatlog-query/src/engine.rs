//! Query Engine
//!
//! Read path: resolves which partition a (channel, identity, month, year)
//! request maps to, executes the bounded or unbounded read, and reports
//! which timeframes exist for a channel. Queries are read-only and run
//! concurrently with appends and flushes; messages still sitting in an
//! unflushed buffer are legitimately invisible here.

use futures::future::try_join_all;

use chatlog_core::{ChannelName, PartitionId, QueryParameters, StoredMessage};
use chatlog_store::PartitionStore;

use crate::error::Result;

pub struct QueryEngine {
    store: PartitionStore,
}

impl QueryEngine {
    pub fn new(store: PartitionStore) -> Self {
        Self { store }
    }

    /// Fetch one identity's messages for a (channel, month, year), newest
    /// first.
    ///
    /// If both `limit` and `skip` are present, offset-then-limit semantics
    /// apply: skip `skip` matching rows, then return up to `limit`. One
    /// without the other falls back to the unbounded form.
    ///
    /// A partition that was never created yields an empty list - only a
    /// storage fault is an error.
    pub async fn query(&self, params: &QueryParameters) -> Result<Vec<StoredMessage>> {
        let partition = PartitionId::new(params.channel.clone(), params.year, params.month);

        if !self.store.partition_exists(&partition).await? {
            tracing::debug!(
                partition = %partition,
                "Query against nonexistent partition, returning empty result"
            );
            return Ok(Vec::new());
        }

        let rows = self
            .store
            .fetch_messages(&partition, &params.identity_key, params.range())
            .await?;
        Ok(rows)
    }

    /// The (year, month) timeframes available for a channel, newest first.
    pub async fn partitions_for_channel(&self, channel: &ChannelName) -> Result<Vec<(i32, u32)>> {
        let mut timeframes: Vec<(i32, u32)> = self
            .store
            .list_partitions(channel)
            .await?
            .into_iter()
            .map(|id| id.timeframe())
            .collect();

        timeframes.sort_unstable_by(|a, b| b.cmp(a));
        Ok(timeframes)
    }

    /// Per-partition storage footprint for a channel: (table name, bytes).
    ///
    /// Sizes are approximations from the store; reporting only.
    pub async fn partition_sizes(&self, channel: &ChannelName) -> Result<Vec<(String, u64)>> {
        let mut partitions = self.store.list_partitions(channel).await?;
        partitions.sort_unstable_by_key(|id| std::cmp::Reverse(id.timeframe()));

        let sizes = try_join_all(
            partitions
                .iter()
                .map(|id| self.store.partition_size(id)),
        )
        .await?;

        Ok(partitions
            .into_iter()
            .map(|id| id.table_name())
            .zip(sizes)
            .collect())
    }
}
