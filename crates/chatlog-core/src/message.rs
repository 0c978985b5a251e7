//! Message Types
//!
//! Two shapes of the same event: [`IncomingMessage`] is what the ingestion
//! path buffers (no timestamp - storage assigns one at insert time), and
//! [`StoredMessage`] is what the query path returns (row id, identity key,
//! insert timestamp, text).

use serde::{Deserialize, Serialize};

use crate::channel::ChannelName;

/// Maximum stored identity key length, in bytes.
pub const MAX_IDENTITY_LEN: usize = 32;

/// Maximum stored message text length, in bytes.
pub const MAX_MESSAGE_LEN: usize = 512;

/// A message as received from the chat source, before it is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    /// Stable identifier of the message's originator - not the display name.
    pub identity_key: String,

    /// Message text.
    pub text: String,
}

impl IncomingMessage {
    /// Build a message, truncating both fields to their storage bounds.
    ///
    /// Truncation is on a char boundary so multi-byte text never splits.
    pub fn new(identity_key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            identity_key: truncate_to(identity_key.into(), MAX_IDENTITY_LEN),
            text: truncate_to(text.into(), MAX_MESSAGE_LEN),
        }
    }
}

fn truncate_to(mut s: String, max: usize) -> String {
    if s.len() > max {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s.truncate(end);
    }
    s
}

/// A persisted message, as returned by queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMessage {
    /// Monotonic row id within the partition; insertion order.
    pub id: i64,

    pub identity_key: String,

    /// Insert timestamp in milliseconds since the Unix epoch, assigned by
    /// the storage layer at write time.
    pub recorded_at: i64,

    pub text: String,
}

/// Parameters for searching one identity's messages in one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryParameters {
    pub channel: ChannelName,
    pub identity_key: String,
    pub month: u32,
    pub year: i32,

    /// Maximum number of rows returned. Only effective together with `skip`.
    pub limit: Option<u32>,

    /// Number of matching rows to skip. Only effective together with `limit`.
    pub skip: Option<u32>,
}

impl QueryParameters {
    /// The bounded range, if both halves were supplied.
    ///
    /// One without the other falls back to the unbounded query form.
    pub fn range(&self) -> Option<(u32, u32)> {
        match (self.limit, self.skip) {
            (Some(limit), Some(skip)) => Some((limit, skip)),
            _ => None,
        }
    }
}
