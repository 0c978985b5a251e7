//! Validated Channel Names
//!
//! Channel names become part of partition table names, so they must never
//! carry anything that could change the meaning of a storage statement.
//! [`ChannelName::normalize`] is the single constructor: it lowercases,
//! strips the chat-protocol `#` prefix, and then enforces a strict
//! identifier-safe character set. Everything downstream (partition naming,
//! buffer registry keys, config entries) works with the already-validated
//! type, never with raw strings.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::CoreError;

/// Maximum accepted channel name length after normalization.
pub const MAX_CHANNEL_LEN: usize = 64;

/// A normalized, identifier-safe channel name.
///
/// Invariants (enforced at construction):
/// - non-empty, at most [`MAX_CHANNEL_LEN`] bytes
/// - only `a-z`, `0-9` and `_`
/// - first character is not a digit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelName(String);

impl ChannelName {
    /// Normalize and validate a raw channel name.
    ///
    /// Lowercases the input and strips a single leading `#` (the form chat
    /// protocols deliver channel names in) before validating.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidChannelName` if the normalized name is empty, too
    /// long, contains characters outside `[a-z0-9_]`, or starts with a digit.
    pub fn normalize(raw: &str) -> Result<Self, CoreError> {
        let name = raw.trim().trim_start_matches('#').to_lowercase();

        if name.is_empty() || name.len() > MAX_CHANNEL_LEN {
            return Err(CoreError::InvalidChannelName(raw.to_string()));
        }
        if name.starts_with(|c: char| c.is_ascii_digit()) {
            return Err(CoreError::InvalidChannelName(raw.to_string()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(CoreError::InvalidChannelName(raw.to_string()));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChannelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ChannelName {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::normalize(&value)
    }
}

impl From<ChannelName> for String {
    fn from(name: ChannelName) -> Self {
        name.0
    }
}
