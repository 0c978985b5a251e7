//! Partition Identity
//!
//! A partition is one physical table holding one channel's messages for one
//! UTC calendar month. The table name encodes all three parts as
//! `{channel}_{year}_{month}` so a prefix match on the channel discovers
//! every partition in that channel's lineage.
//!
//! Exactly one partition is "current" for a channel at any wall-clock time:
//! the one for the current UTC month. Older partitions stay queryable but
//! are never appended to again.

use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::channel::ChannelName;
use crate::error::CoreError;

/// Identifies one (channel, year, month) partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PartitionId {
    pub channel: ChannelName,
    pub year: i32,
    pub month: u32,
}

impl PartitionId {
    pub fn new(channel: ChannelName, year: i32, month: u32) -> Self {
        Self {
            channel,
            year,
            month,
        }
    }

    /// The partition for the current UTC month.
    pub fn current(channel: ChannelName) -> Self {
        let now = Utc::now();
        Self::new(channel, now.year(), now.month())
    }

    /// Render the physical table name, e.g. `alpha_2026_8`.
    ///
    /// Safe to interpolate into storage statements: the channel component is
    /// a validated [`ChannelName`] and the rest is numeric.
    pub fn table_name(&self) -> String {
        format!("{}_{}_{}", self.channel, self.year, self.month)
    }

    /// Parse a table name produced by [`table_name`](Self::table_name).
    ///
    /// Channel names may themselves contain underscores, so the year and
    /// month are taken from the two rightmost `_`-separated segments.
    ///
    /// # Errors
    ///
    /// `CoreError::InvalidPartitionName` if the name does not have the
    /// expected shape or its components fail validation.
    pub fn parse(table_name: &str) -> Result<Self, CoreError> {
        let invalid = || CoreError::InvalidPartitionName(table_name.to_string());

        let (rest, month) = table_name.rsplit_once('_').ok_or_else(invalid)?;
        let (channel, year) = rest.rsplit_once('_').ok_or_else(invalid)?;

        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        if !(1..=12).contains(&month) || !(1970..=9999).contains(&year) {
            return Err(invalid());
        }

        let channel = ChannelName::normalize(channel).map_err(|_| invalid())?;
        Ok(Self::new(channel, year, month))
    }

    /// Sort key for ordering partitions chronologically.
    pub fn timeframe(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.table_name())
    }
}
