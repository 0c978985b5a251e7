//! Flush Statistics
//!
//! Background flushes are fire-and-forget by design, so their outcomes have
//! to be observable some other way. Every flush attempt, failure, and
//! written message increments a counter here; operators read the snapshot
//! through the service surface alongside the tracing output.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct WriterStats {
    flush_attempts: AtomicU64,
    flush_failures: AtomicU64,
    messages_written: AtomicU64,
    messages_discarded: AtomicU64,
}

impl WriterStats {
    pub(crate) fn record_attempt(&self) {
        self.flush_attempts.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failure(&self) {
        self.flush_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_written(&self, count: usize) {
        self.messages_written
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_discarded(&self, count: usize) {
        self.messages_discarded
            .fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> FlushStats {
        FlushStats {
            flush_attempts: self.flush_attempts.load(Ordering::Relaxed),
            flush_failures: self.flush_failures.load(Ordering::Relaxed),
            messages_written: self.messages_written.load(Ordering::Relaxed),
            messages_discarded: self.messages_discarded.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of the writer's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlushStats {
    pub flush_attempts: u64,
    pub flush_failures: u64,
    pub messages_written: u64,
    /// Messages dropped by `unregister` while still buffered.
    pub messages_discarded: u64,
}
