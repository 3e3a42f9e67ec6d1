//! In-memory conversation store: decrypted messages bucketed by
//! conversation key, in arrival order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use pl_proto::StoredMessage;

#[derive(Clone, Default)]
pub struct ConversationStore {
    inner: Arc<RwLock<HashMap<String, Vec<StoredMessage>>>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one message to a conversation. No dedup: a message that
    /// arrives both live and through a history reload appears twice
    /// until the next [`replace`](Self::replace).
    pub fn append(&self, conversation: &str, message: StoredMessage) {
        self.inner
            .write()
            .entry(conversation.to_string())
            .or_default()
            .push(message);
    }

    /// Replace a conversation's bucket wholesale, e.g. after a history
    /// reload.
    pub fn replace(&self, conversation: &str, messages: Vec<StoredMessage>) {
        self.inner.write().insert(conversation.to_string(), messages);
    }

    /// Snapshot of one conversation, in insertion order.
    pub fn messages(&self, conversation: &str) -> Vec<StoredMessage> {
        self.inner
            .read()
            .get(conversation)
            .cloned()
            .unwrap_or_default()
    }

    pub fn conversation_count(&self) -> usize {
        self.inner.read().len()
    }
}
