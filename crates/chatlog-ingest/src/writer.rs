//! Buffered Writer
//!
//! This module implements the write path between the chat source and the
//! partition store: one in-memory queue per channel, flushed as a single
//! bulk insert once it reaches the configured threshold.
//!
//! ## Write Flow
//!
//! ```text
//! append(channel, message)
//!     ↓
//! month rollover?            ← ensure + rebind new partition first
//!     ↓
//! queue.push(message)        ← in-memory, per channel
//!     ↓
//! len >= threshold?
//!     ↓ YES (and no flush in flight)
//! take batch + tokio::spawn  ← append returns without waiting
//!     ↓
//! PartitionStore.insert_batch
//! ```
//!
//! ## Flush Semantics
//!
//! A threshold flush takes its batch at the moment the threshold is
//! crossed: the append that crossed it swaps an empty queue in and hands
//! the old one to a spawned task. Messages appended afterwards are never
//! part of that batch - they wait in the new queue for the next trigger.
//! An explicit [`BufferedWriter::flush`] does the same swap at call time.
//!
//! - **Success**: the batch is gone from memory; the queue already holds
//!   whatever arrived since.
//! - **Failure**: the batch is spliced back in front of anything appended
//!   meanwhile - order preserved, nothing lost, nothing duplicated. The
//!   failure is logged and counted, never surfaced into the ingestion
//!   path, and the messages ride along until a later flush succeeds. If
//!   the process dies before that happens they are lost; that is the
//!   documented durability gap of this design.
//!
//! Flushes for one channel serialize on that channel's flush lock. The
//! lock is claimed at the threshold crossing itself, so two flushes can
//! never submit overlapping batches and an admin-triggered flush cannot
//! overtake an in-flight threshold batch and invert row order. If the
//! lock is already held when the threshold is crossed, no new task is
//! spawned - the queued messages are picked up by the next trigger.
//!
//! ## Concurrency
//!
//! The registry is a `RwLock<HashMap>` held only long enough to look up or
//! (un)register a channel. All per-channel state lives behind that channel's
//! own locks - appends and flushes on different channels never contend.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use chatlog_core::{ChannelName, IncomingMessage, PartitionId};
use chatlog_store::PartitionStore;

use crate::config::WriterConfig;
use crate::error::{IngestError, Result};
use crate::stats::{FlushStats, WriterStats};

/// Per-channel buffer state.
///
/// `pending` is the message queue; `bound` is the partition the next flush
/// writes to (rebound on month rollover); `flush_lock` serializes flushes
/// for this channel and doubles as the in-flight marker for threshold
/// triggers.
struct ChannelBuffer {
    channel: ChannelName,
    pending: Mutex<Vec<IncomingMessage>>,
    bound: Mutex<PartitionId>,
    flush_lock: Arc<Mutex<()>>,
}

impl ChannelBuffer {
    fn new(channel: ChannelName) -> Self {
        let bound = PartitionId::current(channel.clone());
        Self {
            channel,
            pending: Mutex::new(Vec::new()),
            bound: Mutex::new(bound),
            flush_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Take everything queued right now and flush it.
    async fn flush(&self, store: &PartitionStore, stats: &WriterStats) -> Result<usize> {
        let _guard = self.flush_lock.lock().await;
        let batch = {
            let mut pending = self.pending.lock().await;
            std::mem::take(&mut *pending)
        };
        self.flush_batch(store, stats, batch).await
    }

    /// Submit one batch as a single bulk insert. Caller holds `flush_lock`.
    ///
    /// On failure the batch goes back in front of anything appended since
    /// it was taken, preserving order for the retry.
    async fn flush_batch(
        &self,
        store: &PartitionStore,
        stats: &WriterStats,
        batch: Vec<IncomingMessage>,
    ) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }

        let target = self.bound.lock().await.clone();
        stats.record_attempt();

        match store.insert_batch(&target, &batch).await {
            Ok(()) => {
                stats.record_written(batch.len());
                Ok(batch.len())
            }
            Err(source) => {
                let mut pending = self.pending.lock().await;
                let mut restored = batch;
                restored.append(&mut pending);
                let kept = restored.len();
                *pending = restored;
                drop(pending);

                stats.record_failure();
                tracing::warn!(
                    channel = %self.channel,
                    buffered = kept,
                    error = %source,
                    "Flush failed, buffer retained for retry"
                );
                Err(IngestError::Flush {
                    channel: self.channel.to_string(),
                    source,
                })
            }
        }
    }
}

/// Buffers incoming messages per channel and flushes them in batches.
///
/// Shareable via `Arc<BufferedWriter>`; all methods take `&self`.
pub struct BufferedWriter {
    channels: RwLock<HashMap<ChannelName, Arc<ChannelBuffer>>>,
    store: PartitionStore,
    stats: Arc<WriterStats>,
    threshold: usize,
    flush_before_unregister: bool,
}

impl BufferedWriter {
    pub fn new(store: PartitionStore, config: WriterConfig) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            store,
            stats: Arc::new(WriterStats::default()),
            threshold: config.flush_threshold.max(1),
            flush_before_unregister: config.flush_before_unregister,
        }
    }

    /// Allocate an empty buffer for a channel, bound to the current-month
    /// partition.
    ///
    /// The caller must already have ensured that partition exists - a
    /// buffer and its partition are registered together, and registration
    /// itself performs no storage work.
    ///
    /// # Errors
    ///
    /// `IngestError::AlreadyRegistered` if the channel has a buffer and no
    /// intervening `unregister` happened.
    pub async fn register(&self, channel: &ChannelName) -> Result<()> {
        let mut channels = self.channels.write().await;
        if channels.contains_key(channel) {
            return Err(IngestError::AlreadyRegistered(channel.to_string()));
        }

        channels.insert(channel.clone(), Arc::new(ChannelBuffer::new(channel.clone())));
        tracing::info!(channel = %channel, "Registered channel buffer");
        Ok(())
    }

    /// Remove a channel's buffer and write-target binding.
    ///
    /// With `flush_before_unregister` off (the default), pending messages
    /// are discarded; the discard is logged and counted. With it on, a
    /// best-effort flush runs first and a flush failure still does not
    /// block the unregister.
    ///
    /// # Errors
    ///
    /// `IngestError::UnknownChannel` if the channel has no buffer.
    pub async fn unregister(&self, channel: &ChannelName) -> Result<()> {
        if self.flush_before_unregister {
            if let Some(buffer) = self.lookup(channel).await {
                if let Err(e) = buffer.flush(&self.store, &self.stats).await {
                    tracing::warn!(
                        channel = %channel,
                        error = %e,
                        "Pre-unregister flush failed, pending messages will be discarded"
                    );
                }
            }
        }

        let removed = self.channels.write().await.remove(channel);
        let buffer = removed.ok_or_else(|| IngestError::UnknownChannel(channel.to_string()))?;

        let discarded = buffer.pending.lock().await.len();
        if discarded > 0 {
            self.stats.record_discarded(discarded);
            tracing::warn!(
                channel = %channel,
                discarded,
                "Unregistered channel with unflushed messages"
            );
        } else {
            tracing::info!(channel = %channel, "Unregistered channel buffer");
        }
        Ok(())
    }

    /// Enqueue a message; trigger a background flush at the threshold.
    ///
    /// Returns as soon as the message is queued. When the queue reaches
    /// the threshold the batch is taken on the spot and the insert runs as
    /// a spawned task - its outcome is reported through logs and
    /// [`FlushStats`], never through this call.
    ///
    /// If the UTC month has advanced past the channel's bound partition,
    /// the new month's partition is ensured and bound before enqueuing.
    ///
    /// # Errors
    ///
    /// - `UnknownChannel`: channel was never registered
    /// - `Rollover`: creating the new month's partition failed
    pub async fn append(&self, channel: &ChannelName, message: IncomingMessage) -> Result<()> {
        let buffer = self
            .lookup(channel)
            .await
            .ok_or_else(|| IngestError::UnknownChannel(channel.to_string()))?;

        self.rebind_on_rollover(&buffer).await?;

        let triggered = {
            let mut pending = buffer.pending.lock().await;
            pending.push(message);
            if pending.len() >= self.threshold {
                // Claim the flush lock at the crossing itself so the batch
                // is exactly what is queued right now. If a flush is
                // already in flight, leave the queue alone - the next
                // trigger picks it up.
                match Arc::clone(&buffer.flush_lock).try_lock_owned() {
                    Ok(guard) => Some((std::mem::take(&mut *pending), guard)),
                    Err(_) => None,
                }
            } else {
                None
            }
        };

        if let Some((batch, guard)) = triggered {
            self.spawn_flush(buffer, batch, guard);
        }
        Ok(())
    }

    /// Explicitly flush a channel's buffer, waiting for the result.
    ///
    /// Returns the number of rows written. Serializes with any background
    /// flush already running for the channel.
    pub async fn flush(&self, channel: &ChannelName) -> Result<usize> {
        let buffer = self
            .lookup(channel)
            .await
            .ok_or_else(|| IngestError::UnknownChannel(channel.to_string()))?;

        buffer.flush(&self.store, &self.stats).await
    }

    /// Number of messages currently buffered for a channel.
    pub async fn pending_len(&self, channel: &ChannelName) -> Result<usize> {
        let buffer = self
            .lookup(channel)
            .await
            .ok_or_else(|| IngestError::UnknownChannel(channel.to_string()))?;

        let len = buffer.pending.lock().await.len();
        Ok(len)
    }

    pub async fn is_registered(&self, channel: &ChannelName) -> bool {
        self.channels.read().await.contains_key(channel)
    }

    pub fn stats(&self) -> FlushStats {
        self.stats.snapshot()
    }

    async fn lookup(&self, channel: &ChannelName) -> Option<Arc<ChannelBuffer>> {
        self.channels.read().await.get(channel).cloned()
    }

    /// Rebind the buffer to a new partition if the UTC month rolled over.
    ///
    /// The new partition is ensured before the binding moves, so a DDL
    /// failure leaves the buffer pointed at the old (still valid) partition.
    async fn rebind_on_rollover(&self, buffer: &ChannelBuffer) -> Result<()> {
        let current = PartitionId::current(buffer.channel.clone());
        {
            let bound = buffer.bound.lock().await;
            if bound.timeframe() == current.timeframe() {
                return Ok(());
            }
        }

        self.store
            .ensure_partition(&buffer.channel, current.year, current.month)
            .await
            .map_err(|source| IngestError::Rollover {
                channel: buffer.channel.to_string(),
                source,
            })?;

        let mut bound = buffer.bound.lock().await;
        if bound.timeframe() != current.timeframe() {
            tracing::info!(
                channel = %buffer.channel,
                from = %*bound,
                to = %current,
                "Month rollover, rebound channel partition"
            );
            *bound = current;
        }
        Ok(())
    }

    /// Run a taken batch to completion in the background.
    ///
    /// `guard` is the channel's flush lock, held since the threshold
    /// crossing; it is released when the insert settles.
    fn spawn_flush(
        &self,
        buffer: Arc<ChannelBuffer>,
        batch: Vec<IncomingMessage>,
        guard: OwnedMutexGuard<()>,
    ) {
        let store = self.store.clone();
        let stats = Arc::clone(&self.stats);
        tokio::spawn(async move {
            let result = buffer.flush_batch(&store, &stats, batch).await;
            drop(guard);
            match result {
                Ok(written) => {
                    tracing::debug!(channel = %buffer.channel, written, "Background flush complete");
                }
                Err(e) => {
                    // Already counted and logged with context by
                    // flush_batch; nothing to propagate - ingestion must
                    // not block.
                    tracing::debug!(channel = %buffer.channel, error = %e, "Background flush failed");
                }
            }
        });
    }
}
