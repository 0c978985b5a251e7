//! Storage Error Types
//!
//! Partition DDL failures (`PartitionCreate`, `PartitionDrop`) are fatal to
//! whatever higher-level operation triggered them and always surface to the
//! caller. `BatchInsert` is the flush failure the ingest layer recovers from
//! locally. `QueryFailed` is a genuine storage fault during a read - distinct
//! from "partition does not exist", which readers report as an empty result,
//! never as an error.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to create partition {partition}: {source}")]
    PartitionCreate {
        partition: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Failed to drop partition {partition}: {source}")]
    PartitionDrop {
        partition: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Bulk insert into partition {partition} failed: {source}")]
    BatchInsert {
        partition: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Query against partition {partition} failed: {source}")]
    QueryFailed {
        partition: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
