//! Chatlog Core Types
//!
//! Shared vocabulary for the chatlog workspace - the types that every other
//! crate speaks in.
//!
//! ## Main Components
//!
//! ### ChannelName
//! A validated, normalized channel identifier. This is the only path by which
//! externally-influenced text may reach a storage identifier: raw strings are
//! rejected unless they survive normalization and a strict character-set
//! check.
//!
//! ### PartitionId
//! Identifies one physical partition: a (channel, year, month) triple.
//! Knows how to render itself as a table name and how to parse one back.
//!
//! ### Messages
//! - [`IncomingMessage`]: what ingestion sees - identity key + text, no
//!   timestamp (storage assigns it at insert).
//! - [`StoredMessage`]: what queries return - row id, identity key, insert
//!   timestamp, text.
//!
//! ### ServiceConfig
//! The process configuration: tracked channels, flush threshold, database
//! URL. Loaded from and saved to a JSON file, and passed explicitly into
//! each component's constructor - there is no ambient global.

pub mod channel;
pub mod config;
pub mod error;
pub mod message;
pub mod partition;

pub use channel::ChannelName;
pub use config::ServiceConfig;
pub use error::{CoreError, Result};
pub use message::{IncomingMessage, QueryParameters, StoredMessage};
pub use partition::PartitionId;
