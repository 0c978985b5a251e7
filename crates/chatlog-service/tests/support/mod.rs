//! In-memory collaborator doubles for service tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use chatlog_core::ChannelName;
use chatlog_service::{ChatSource, CollaboratorError, IdentityResolver};

/// Chat source double: records joined channels, fails on demand.
#[derive(Default)]
pub struct MockChatSource {
    joined: Mutex<Vec<String>>,
    fail_join: AtomicBool,
    fail_leave: AtomicBool,
}

#[allow(dead_code)] // not every test file exercises every helper
impl MockChatSource {
    pub fn joined(&self) -> Vec<String> {
        self.joined.lock().unwrap().clone()
    }

    pub fn fail_next_join(&self) {
        self.fail_join.store(true, Ordering::SeqCst);
    }

    pub fn fail_next_leave(&self) {
        self.fail_leave.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ChatSource for MockChatSource {
    async fn join(&self, channel: &ChannelName) -> Result<(), CollaboratorError> {
        if self.fail_join.swap(false, Ordering::SeqCst) {
            return Err(CollaboratorError::new("join refused"));
        }
        self.joined.lock().unwrap().push(channel.to_string());
        Ok(())
    }

    async fn leave(&self, channel: &ChannelName) -> Result<(), CollaboratorError> {
        if self.fail_leave.swap(false, Ordering::SeqCst) {
            return Err(CollaboratorError::new("leave refused"));
        }
        self.joined
            .lock()
            .unwrap()
            .retain(|c| c != channel.as_str());
        Ok(())
    }
}

/// Identity resolver double backed by a fixed username → key table.
pub struct MockResolver {
    identities: HashMap<String, String>,
}

impl MockResolver {
    pub fn new(pairs: &[(&str, &str)]) -> Self {
        Self {
            identities: pairs
                .iter()
                .map(|(name, key)| (name.to_string(), key.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl IdentityResolver for MockResolver {
    async fn resolve(&self, username: &str) -> Result<String, CollaboratorError> {
        self.identities
            .get(username)
            .cloned()
            .ok_or_else(|| CollaboratorError::new(format!("unknown user: {username}")))
    }
}
