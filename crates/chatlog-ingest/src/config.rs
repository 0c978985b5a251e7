//! Writer Configuration

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Buffer length at which an automatic flush is triggered (default: 10).
    #[serde(default = "default_flush_threshold")]
    pub flush_threshold: usize,

    /// Flush pending messages before a buffer is unregistered. Off by
    /// default: `unregister` discards whatever is still buffered, which is
    /// the historical behavior of this service. The tail of a busy channel's
    /// buffer is lost when it is removed with this off.
    #[serde(default)]
    pub flush_before_unregister: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            flush_threshold: default_flush_threshold(),
            flush_before_unregister: false,
        }
    }
}

fn default_flush_threshold() -> usize {
    10
}
