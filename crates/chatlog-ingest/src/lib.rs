//! Chatlog Ingestion Layer
//!
//! The buffered write path: one in-memory queue per channel, batched into
//! bulk inserts against the channel's current-month partition. Buffering
//! amortizes per-message write cost on busy channels; the threshold (default
//! 10 messages) bounds how much is ever held in memory.
//!
//! Design points, in brief:
//!
//! - **Non-blocking ingestion**: hitting the threshold spawns the flush as a
//!   background task; `append` never waits on storage I/O.
//! - **Loss-free flush**: a failed bulk insert puts the snapshot back in the
//!   buffer, ahead of anything appended meanwhile. Failures are visible via
//!   [`FlushStats`] and logs but never propagate into the ingestion path.
//! - **Month rollover**: each append checks whether the UTC month advanced
//!   past the channel's bound partition and rebinds (creating the new
//!   partition) before enqueuing.
//! - **Per-channel isolation**: every channel has its own queue and locks;
//!   no lock spans channels.
//!
//! Unflushed messages exist only in process memory - a crash loses them.

pub mod config;
pub mod error;
pub mod stats;
pub mod writer;

pub use config::WriterConfig;
pub use error::{IngestError, Result};
pub use stats::FlushStats;
pub use writer::BufferedWriter;
