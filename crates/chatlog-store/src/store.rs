//! SQLite Partition Store
//!
//! Owns the physical storage layout: one table per (channel, month)
//! partition, named `{channel}_{year}_{month}`. Every call is an immediate
//! storage operation - the store holds no state beyond the connection pool,
//! so it can be cloned and shared freely across the writer, the query
//! engine, and the lifecycle layer.
//!
//! ## Partition Schema
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS "{table}" (
//!     id           INTEGER PRIMARY KEY AUTOINCREMENT,
//!     identity_key TEXT NOT NULL,
//!     recorded_at  INTEGER NOT NULL,
//!     message      TEXT NOT NULL
//! );
//! CREATE INDEX IF NOT EXISTS "idx_{table}_identity" ON "{table}" (identity_key);
//! ```
//!
//! `id` is the insertion-order sort key readers rely on; AUTOINCREMENT keeps
//! it monotonic even across row deletion. `recorded_at` is epoch
//! milliseconds, assigned here at insert time - callers never supply it.
//! The identity index exists because identity equality is the only read
//! predicate.
//!
//! ## Runtime Queries and Identifier Safety
//!
//! Partition tables are created dynamically, so compile-time checked query
//! macros cannot apply; this module uses runtime queries throughout. Table
//! names are interpolated, which is only sound because they are rendered
//! from [`PartitionId`] - the channel component is a validated
//! [`ChannelName`](chatlog_core::ChannelName) and the rest is numeric. Raw
//! external strings never reach an identifier position. All value positions
//! are bound parameters.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;

use chatlog_core::{ChannelName, IncomingMessage, PartitionId, StoredMessage};

use crate::error::{Result, StoreError};

/// Estimated fixed per-row storage overhead (row id, timestamp, record
/// header) used by [`PartitionStore::partition_size`].
const ROW_OVERHEAD_BYTES: i64 = 24;

#[derive(Clone)]
pub struct PartitionStore {
    pool: SqlitePool,
}

impl PartitionStore {
    /// Open (creating if missing) the database at `url`,
    /// e.g. `sqlite://chatlog.db`.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    /// In-memory database for tests.
    ///
    /// Capped at one connection: each SQLite in-memory connection is its own
    /// database, so a larger pool would scatter partitions across invisible
    /// copies.
    pub async fn connect_in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        Ok(Self { pool })
    }

    /// Create the partition for (channel, year, month) if it does not exist.
    ///
    /// Idempotent and safe to call concurrently for the same key; the second
    /// caller sees a no-op. Returns whether this call physically created the
    /// partition - the lifecycle saga uses that to decide whether a rollback
    /// should drop it again.
    ///
    /// # Errors
    ///
    /// `StoreError::PartitionCreate` on DDL failure. Callers treat this as
    /// fatal for the operation that needed the partition.
    pub async fn ensure_partition(
        &self,
        channel: &ChannelName,
        year: i32,
        month: u32,
    ) -> Result<bool> {
        let id = PartitionId::new(channel.clone(), year, month);
        let table = id.table_name();

        let existed = self.partition_exists(&id).await?;

        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS \"{table}\" ( \
                id INTEGER PRIMARY KEY AUTOINCREMENT, \
                identity_key TEXT NOT NULL, \
                recorded_at INTEGER NOT NULL, \
                message TEXT NOT NULL \
            )"
        );
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::PartitionCreate {
                partition: table.clone(),
                source,
            })?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS \"idx_{table}_identity\" ON \"{table}\" (identity_key)"
        );
        sqlx::query(&index)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::PartitionCreate {
                partition: table.clone(),
                source,
            })?;

        if !existed {
            tracing::info!(partition = %table, "Created partition");
        }
        Ok(!existed)
    }

    /// Drop a partition and its data, irrecoverably.
    ///
    /// # Errors
    ///
    /// `StoreError::PartitionDrop` on DDL failure; callers must not assume
    /// the drop happened unless this returns Ok.
    pub async fn drop_partition(&self, id: &PartitionId) -> Result<()> {
        let table = id.table_name();

        let ddl = format!("DROP TABLE IF EXISTS \"{table}\"");
        sqlx::query(&ddl)
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::PartitionDrop {
                partition: table.clone(),
                source,
            })?;

        tracing::info!(partition = %table, "Dropped partition");
        Ok(())
    }

    /// All partitions in a channel's lineage, in no guaranteed order.
    ///
    /// Matches on the `{channel}_` prefix against the schema catalog, then
    /// re-parses each hit: the prefix alone would also catch channels that
    /// merely extend this one's name (`alpha` vs `alpha_x`), so hits whose
    /// parsed channel differs are filtered out, as are unparsable tables.
    pub async fn list_partitions(&self, channel: &ChannelName) -> Result<Vec<PartitionId>> {
        // `_` is a LIKE wildcard; escape it so the separator matches literally.
        let pattern = format!("{}\\_%", channel.as_str());

        let rows = sqlx::query(
            r"SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE ? ESCAPE '\'",
        )
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name: String = row.get(0);
                PartitionId::parse(&name).ok()
            })
            .filter(|id| &id.channel == channel)
            .collect())
    }

    pub async fn partition_exists(&self, id: &PartitionId) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?")
            .bind(id.table_name())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    /// Approximate storage footprint of one partition, in bytes.
    ///
    /// Sums stored column lengths plus a fixed per-row overhead. Reporting
    /// only - nothing gates on this value.
    pub async fn partition_size(&self, id: &PartitionId) -> Result<u64> {
        let table = id.table_name();
        let sql = format!(
            "SELECT COALESCE(SUM(LENGTH(identity_key) + LENGTH(message) + {ROW_OVERHEAD_BYTES}), 0) \
             FROM \"{table}\""
        );

        let row = sqlx::query(&sql)
            .fetch_one(&self.pool)
            .await
            .map_err(|source| StoreError::QueryFailed {
                partition: table,
                source,
            })?;

        let bytes: i64 = row.get(0);
        Ok(bytes.max(0) as u64)
    }

    /// Insert a batch of messages into a partition as a single multi-row
    /// statement. The insert timestamp is assigned here, not by the caller.
    ///
    /// All-or-nothing: either every row lands or the statement fails and the
    /// partition is untouched.
    ///
    /// # Errors
    ///
    /// `StoreError::BatchInsert` on failure - the flush path keeps its
    /// buffer and retries later.
    pub async fn insert_batch(&self, id: &PartitionId, batch: &[IncomingMessage]) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }

        let table = id.table_name();
        let recorded_at = chrono::Utc::now().timestamp_millis();

        let placeholders = vec!["(?, ?, ?)"; batch.len()].join(", ");
        let sql = format!(
            "INSERT INTO \"{table}\" (identity_key, recorded_at, message) VALUES {placeholders}"
        );

        let mut query = sqlx::query(&sql);
        for message in batch {
            query = query
                .bind(&message.identity_key)
                .bind(recorded_at)
                .bind(&message.text);
        }

        query
            .execute(&self.pool)
            .await
            .map_err(|source| StoreError::BatchInsert {
                partition: table.clone(),
                source,
            })?;

        tracing::debug!(partition = %table, rows = batch.len(), "Flushed batch");
        Ok(())
    }

    /// Read one identity's messages from a partition, newest first.
    ///
    /// `range` applies offset-then-limit semantics: skip `skip` matching
    /// rows, then return up to `limit`. The partition must exist - resolving
    /// "no such partition" to an empty result is the query engine's job.
    ///
    /// # Errors
    ///
    /// `StoreError::QueryFailed` on a storage fault (including a read
    /// against a partition that was never created).
    pub async fn fetch_messages(
        &self,
        id: &PartitionId,
        identity_key: &str,
        range: Option<(u32, u32)>,
    ) -> Result<Vec<StoredMessage>> {
        let table = id.table_name();

        let sql = match range {
            Some(_) => format!(
                "SELECT id, identity_key, recorded_at, message FROM \"{table}\" \
                 WHERE identity_key = ? ORDER BY id DESC LIMIT ? OFFSET ?"
            ),
            None => format!(
                "SELECT id, identity_key, recorded_at, message FROM \"{table}\" \
                 WHERE identity_key = ? ORDER BY id DESC"
            ),
        };

        let mut query = sqlx::query_as::<_, (i64, String, i64, String)>(&sql).bind(identity_key);
        if let Some((limit, skip)) = range {
            query = query.bind(limit as i64).bind(skip as i64);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|source| StoreError::QueryFailed {
                partition: table,
                source,
            })?;

        Ok(rows
            .into_iter()
            .map(|(id, identity_key, recorded_at, text)| StoredMessage {
                id,
                identity_key,
                recorded_at,
                text,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> ChannelName {
        ChannelName::normalize(name).unwrap()
    }

    fn messages(identity: &str, count: usize) -> Vec<IncomingMessage> {
        (0..count)
            .map(|i| IncomingMessage::new(identity, format!("message {i}")))
            .collect()
    }

    #[tokio::test]
    async fn ensure_partition_is_idempotent() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");

        let created = store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        assert!(created);

        // Second call is a no-op, not an error.
        let created = store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        assert!(!created);

        let partitions = store.list_partitions(&alpha).await.unwrap();
        assert_eq!(partitions.len(), 1);
    }

    #[tokio::test]
    async fn list_partitions_matches_exact_channel_only() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");
        let alpha_x = channel("alpha_x");

        store.ensure_partition(&alpha, 2026, 7).await.unwrap();
        store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        store.ensure_partition(&alpha_x, 2026, 8).await.unwrap();

        let mut timeframes: Vec<_> = store
            .list_partitions(&alpha)
            .await
            .unwrap()
            .into_iter()
            .map(|id| id.timeframe())
            .collect();
        timeframes.sort();
        assert_eq!(timeframes, vec![(2026, 7), (2026, 8)]);

        let other = store.list_partitions(&alpha_x).await.unwrap();
        assert_eq!(other.len(), 1);
    }

    #[tokio::test]
    async fn drop_partition_removes_table() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");

        store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        let id = PartitionId::new(alpha.clone(), 2026, 8);
        assert!(store.partition_exists(&id).await.unwrap());

        store.drop_partition(&id).await.unwrap();
        assert!(!store.partition_exists(&id).await.unwrap());
        assert!(store.list_partitions(&alpha).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn insert_batch_then_fetch_newest_first() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");
        store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        let id = PartitionId::new(alpha, 2026, 8);

        store.insert_batch(&id, &messages("u1", 3)).await.unwrap();

        let rows = store.fetch_messages(&id, "u1", None).await.unwrap();
        assert_eq!(rows.len(), 3);
        // Newest first: reverse insertion order.
        assert_eq!(rows[0].text, "message 2");
        assert_eq!(rows[2].text, "message 0");
        assert!(rows[0].id > rows[1].id);
        assert!(rows[0].recorded_at > 0);
    }

    #[tokio::test]
    async fn fetch_filters_by_identity() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");
        store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        let id = PartitionId::new(alpha, 2026, 8);

        store.insert_batch(&id, &messages("u1", 2)).await.unwrap();
        store.insert_batch(&id, &messages("u2", 5)).await.unwrap();

        let rows = store.fetch_messages(&id, "u1", None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|m| m.identity_key == "u1"));
    }

    #[tokio::test]
    async fn fetch_applies_offset_then_limit() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");
        store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        let id = PartitionId::new(alpha, 2026, 8);

        store.insert_batch(&id, &messages("u1", 10)).await.unwrap();

        // Newest-first ranking: skip 5, take 3 => rows ranked 6-8.
        let rows = store
            .fetch_messages(&id, "u1", Some((3, 5)))
            .await
            .unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].text, "message 4");
        assert_eq!(rows[1].text, "message 3");
        assert_eq!(rows[2].text, "message 2");
    }

    #[tokio::test]
    async fn insert_into_missing_partition_fails() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let id = PartitionId::new(channel("ghost"), 2026, 8);

        let err = store
            .insert_batch(&id, &messages("u1", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::BatchInsert { .. }));
    }

    #[tokio::test]
    async fn partition_size_grows_with_rows() {
        let store = PartitionStore::connect_in_memory().await.unwrap();
        let alpha = channel("alpha");
        store.ensure_partition(&alpha, 2026, 8).await.unwrap();
        let id = PartitionId::new(alpha, 2026, 8);

        let empty = store.partition_size(&id).await.unwrap();
        assert_eq!(empty, 0);

        store.insert_batch(&id, &messages("u1", 4)).await.unwrap();
        let filled = store.partition_size(&id).await.unwrap();
        assert!(filled > 0);
    }

    #[tokio::test]
    async fn file_backed_store_persists() {
        let dir = tempfile::TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("chatlog.db").display());

        let alpha = channel("alpha");
        {
            let store = PartitionStore::connect(&url).await.unwrap();
            store.ensure_partition(&alpha, 2026, 8).await.unwrap();
            let id = PartitionId::new(alpha.clone(), 2026, 8);
            store.insert_batch(&id, &messages("u1", 2)).await.unwrap();
        }

        let store = PartitionStore::connect(&url).await.unwrap();
        let id = PartitionId::new(alpha, 2026, 8);
        let rows = store.fetch_messages(&id, "u1", None).await.unwrap();
        assert_eq!(rows.len(), 2);
    }
}
