//! Conversation history loader.
//!
//! History records carry both envelope halves; which half we can open
//! depends on who sent the message. Recovery is per record: one bad
//! record is skipped (format error) or shown as undecryptable
//! (decryption failure) while the rest of the conversation loads.

use std::sync::Arc;

use chrono::Utc;

use pl_crypto::{hybrid, RsaKeyPair};
use pl_proto::api::HistoryRecord;
use pl_proto::{
    conversation_key, parse_server_timestamp, DualEnvelope, MessagePayload, StoredMessage,
};

use crate::directory::KeyDirectory;
use crate::error::ClientError;
use crate::services::PersistenceService;
use crate::store::ConversationStore;

pub struct HistoryLoader {
    username: String,
    keys: Arc<RsaKeyPair>,
    directory: KeyDirectory,
    store: ConversationStore,
}

impl HistoryLoader {
    pub fn new(
        username: impl Into<String>,
        keys: Arc<RsaKeyPair>,
        directory: KeyDirectory,
        store: ConversationStore,
    ) -> Self {
        Self {
            username: username.into(),
            keys,
            directory,
            store,
        }
    }

    /// Fetch and decrypt the conversation with `peer`, replacing the
    /// store bucket wholesale. Reloading is idempotent.
    pub async fn load(
        &self,
        persistence: &dyn PersistenceService,
        peer: &str,
    ) -> Result<Vec<StoredMessage>, ClientError> {
        let records = persistence.fetch_history(peer).await?;
        let total = records.len();
        let mut messages = Vec::with_capacity(total);
        for record in records {
            if let Some(message) = self.decrypt_record(&record) {
                messages.push(message);
            }
        }
        tracing::debug!(
            event = "history_loaded",
            peer = %peer,
            records = total,
            decoded = messages.len(),
        );
        let conversation = conversation_key(&self.username, peer);
        self.store.replace(&conversation, messages.clone());
        Ok(messages)
    }

    /// One record → one stored message, or None when the record is
    /// structurally unusable.
    fn decrypt_record(&self, record: &HistoryRecord) -> Option<StoredMessage> {
        let timestamp = record
            .timestamp
            .as_deref()
            .and_then(parse_server_timestamp)
            .unwrap_or_else(Utc::now);

        let dual = match DualEnvelope::from_json(&record.text) {
            Ok(dual) => dual,
            Err(err) => {
                tracing::warn!(event = "history_record_unparsable", from = %record.from_user, error = %err);
                return None;
            }
        };
        // We wrote the for_sender half; everything else is addressed to
        // us in for_recipient.
        let envelope = if record.from_user == self.username {
            &dual.for_sender
        } else {
            &dual.for_recipient
        };
        let sealed = match envelope.decode() {
            Ok(sealed) => sealed,
            Err(err) => {
                tracing::warn!(event = "history_record_unparsable", from = %record.from_user, error = %err);
                return None;
            }
        };

        let plaintext = match hybrid::open(&sealed, &self.keys) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(event = "history_record_undecryptable", from = %record.from_user, error = %err);
                return Some(StoredMessage::undecryptable(record.from_user.as_str(), timestamp));
            }
        };
        let payload = match MessagePayload::from_canonical(&plaintext) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(event = "history_payload_unparsable", from = %record.from_user, error = %err);
                return Some(StoredMessage::undecryptable(record.from_user.as_str(), timestamp));
            }
        };

        let verified = self.verify(&record.from_user, &payload, &sealed.signature);
        Some(StoredMessage::from_payload(
            record.from_user.as_str(),
            payload,
            verified,
            timestamp,
        ))
    }

    fn verify(&self, from: &str, payload: &MessagePayload, signature: &[u8]) -> bool {
        let Some(sender_key) = self.directory.lookup(from) else {
            tracing::warn!(event = "sender_key_not_found", from = %from);
            return false;
        };
        match payload.canonical_bytes() {
            Ok(canonical) => hybrid::verify(&canonical, signature, &sender_key),
            Err(_) => false,
        }
    }
}
