//! Ingest Error Types
//!
//! `UnknownChannel` and `AlreadyRegistered` are operator errors and surface
//! immediately. `Flush` wraps the storage failure of a bulk insert; the
//! buffer is left intact when it occurs, and background flush tasks report
//! it through logs and counters rather than propagating it into the
//! ingestion path. `Rollover` is a partition-creation failure hit while
//! rebinding a channel to a new month - fatal to the append that
//! triggered it.

use thiserror::Error;

use chatlog_store::StoreError;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Channel not registered: {0}")]
    UnknownChannel(String),

    #[error("Channel already registered: {0}")]
    AlreadyRegistered(String),

    #[error("Flush for channel {channel} failed: {source}")]
    Flush {
        channel: String,
        #[source]
        source: StoreError,
    },

    #[error("Month rollover for channel {channel} failed: {source}")]
    Rollover {
        channel: String,
        #[source]
        source: StoreError,
    },
}
