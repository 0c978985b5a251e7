//! Query Error Types
//!
//! A query fails only on a genuine storage fault. "No partition for that
//! timeframe" is a valid empty result, not an error - callers presenting
//! query results must keep the two distinguishable.

use thiserror::Error;

use chatlog_store::StoreError;

pub type Result<T> = std::result::Result<T, QueryError>;

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Storage fault during query: {0}")]
    Store(#[from] StoreError),
}
