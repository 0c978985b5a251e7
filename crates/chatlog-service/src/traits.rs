//! External Collaborator Traits
//!
//! The chat-protocol client and the identity-resolution client live outside
//! this workspace; these traits are the seams they plug into. The embedding
//! process implements them against the real protocol clients and binds the
//! per-event callback to [`ChatLogService::on_message`]; tests implement
//! them as in-memory doubles.
//!
//! [`ChatLogService::on_message`]: crate::service::ChatLogService::on_message

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use chatlog_core::ChannelName;

/// Failure reported by an external collaborator. Carries the collaborator's
/// own message; this workspace does not interpret it beyond surfacing it.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct CollaboratorError(pub String);

impl CollaboratorError {
    pub fn new(message: impl fmt::Display) -> Self {
        Self(message.to_string())
    }
}

/// The chat-protocol client: joins and leaves message sources.
///
/// Event delivery is not part of this trait - the embedding process wires
/// the protocol client's message callback to the service directly.
#[async_trait]
pub trait ChatSource: Send + Sync {
    async fn join(&self, channel: &ChannelName) -> Result<(), CollaboratorError>;

    async fn leave(&self, channel: &ChannelName) -> Result<(), CollaboratorError>;
}

/// Maps a human-readable name to the stable identity key messages are
/// stored under.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, username: &str) -> Result<String, CollaboratorError>;
}
