//! Service Error Types

use thiserror::Error;

use chatlog_core::CoreError;
use chatlog_ingest::IngestError;
use chatlog_query::QueryError;
use chatlog_store::StoreError;

use crate::traits::CollaboratorError;

pub type Result<T> = std::result::Result<T, ServiceError>;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Channel already configured: {0}")]
    ChannelAlreadyConfigured(String),

    #[error("Channel not configured: {0}")]
    ChannelNotConfigured(String),

    #[error("Chat source error: {0}")]
    ChatSource(CollaboratorError),

    #[error("Identity resolution failed: {0}")]
    Identity(CollaboratorError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Query(#[from] QueryError),
}
