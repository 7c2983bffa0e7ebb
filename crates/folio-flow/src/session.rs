//! Keyed store of active conversations
//!
//! One conversation per user at most. The store is injected into
//! message handlers; sweeping is passive — callers run it on their own
//! cadence, and a message that arrives before the sweep can still be
//! served by a state past the inactivity window.

use crate::error::FlowError;
use crate::flow::Conversation;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

/// Chat user identity (Telegram user ids are 64-bit integers)
pub type UserId = i64;

/// Conversations older than this are eligible for cleanup
pub const INACTIVITY_WINDOW: Duration = Duration::from_secs(60 * 60);

/// Keyed conversation store
pub trait SessionStore: Send + Sync {
    /// Start a conversation for a user
    ///
    /// # Errors
    /// [`FlowError::AlreadyActive`] when the user already has one.
    fn begin(&self, user: UserId, conversation: Conversation) -> Result<(), FlowError>;

    /// Clone out the user's conversation, if any
    fn get(&self, user: UserId) -> Option<Conversation>;

    /// Store the (advanced) conversation back
    fn set(&self, user: UserId, conversation: Conversation);

    /// Remove and return the user's conversation
    fn remove(&self, user: UserId) -> Option<Conversation>;

    /// Whether the user has an active conversation
    fn is_active(&self, user: UserId) -> bool;

    /// Drop conversations older than `max_age`; returns how many
    fn sweep(&self, max_age: Duration) -> usize;
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct InMemorySessions {
    inner: Mutex<HashMap<UserId, Conversation>>,
}

impl InMemorySessions {
    /// Create an empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessions {
    fn begin(&self, user: UserId, conversation: Conversation) -> Result<(), FlowError> {
        let mut guard = self.inner.lock();
        if guard.contains_key(&user) {
            return Err(FlowError::AlreadyActive);
        }
        guard.insert(user, conversation);
        Ok(())
    }

    fn get(&self, user: UserId) -> Option<Conversation> {
        self.inner.lock().get(&user).cloned()
    }

    fn set(&self, user: UserId, conversation: Conversation) {
        self.inner.lock().insert(user, conversation);
    }

    fn remove(&self, user: UserId) -> Option<Conversation> {
        self.inner.lock().remove(&user)
    }

    fn is_active(&self, user: UserId) -> bool {
        self.inner.lock().contains_key(&user)
    }

    fn sweep(&self, max_age: Duration) -> usize {
        let mut guard = self.inner.lock();
        let before = guard.len();
        guard.retain(|_, conversation| conversation.age() <= max_age);
        before - guard.len()
    }
}
