//! Chatlog Storage Layer
//!
//! SQLite-backed partition store: one physical table per (channel, calendar
//! month) pair. This crate owns everything that touches storage directly -
//! partition DDL, batch inserts, filtered reads, size reporting - and holds
//! no in-memory state of its own.
//!
//! ## Responsibilities
//!
//! 1. **Partition lifecycle**: lazy, idempotent creation; irrecoverable drop
//! 2. **Discovery**: listing a channel's partitions by name prefix
//! 3. **Writes**: single-statement batch inserts with storage-assigned
//!    timestamps
//! 4. **Reads**: identity-filtered, newest-first, optionally bounded
//!
//! Buffering lives above this crate (`chatlog-ingest`); partition selection
//! for queries lives above it too (`chatlog-query`). Both talk to storage
//! exclusively through [`PartitionStore`].

pub mod error;
pub mod store;

pub use error::{Result, StoreError};
pub use store::PartitionStore;
