//! Core Error Types

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid channel name: {0:?}")]
    InvalidChannelName(String),

    #[error("Invalid partition name: {0:?}")]
    InvalidPartitionName(String),

    #[error("Config file error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
