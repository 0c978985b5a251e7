//! Chatlog Query Layer
//!
//! Read-side counterpart of the ingestion layer: given a channel, an
//! identity and a timeframe, decide which partition holds the answer and
//! read it back in reverse-chronological order. Also derives the
//! timeframe/size listings the presentation layer builds its selection UI
//! from.

pub mod engine;
pub mod error;

pub use engine::QueryEngine;
pub use error::{QueryError, Result};
