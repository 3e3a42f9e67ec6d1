//! Inbound message pipeline: raw realtime frame → decrypted, verified
//! (or flagged) entry in the conversation store.
//!
//! Failure handling is per-message and graded:
//!   - unparsable frame or envelope: skip, warn — nothing useful to show
//!   - ciphertext/key-unwrap failure: append an undecryptable placeholder
//!   - sender key missing, or signature mismatch: keep the plaintext,
//!     mark it unverified
//! One bad message never takes down the channel or the conversation.

use std::sync::Arc;

use pl_crypto::{hybrid, RsaKeyPair};
use pl_proto::{
    conversation_key, envelope::Envelope, InboundFrame, MessagePayload, StoredMessage,
};

use crate::directory::KeyDirectory;
use crate::store::ConversationStore;

pub struct InboundPipeline {
    username: String,
    keys: Arc<RsaKeyPair>,
    directory: KeyDirectory,
    store: ConversationStore,
}

impl InboundPipeline {
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

    /// Entry point for raw WebSocket text.
    pub fn handle_text(&self, raw: &str) {
        match serde_json::from_str::<InboundFrame>(raw) {
            Ok(frame) => self.handle_frame(frame),
            Err(err) => {
                tracing::warn!(event = "frame_unparsable", error = %err);
            }
        }
    }

    pub fn handle_frame(&self, frame: InboundFrame) {
        let conversation = conversation_key(&self.username, &frame.from);
        let timestamp = frame.timestamp_utc();

        let sealed = match Envelope::from_json(&frame.text).and_then(|e| e.decode()) {
            Ok(sealed) => sealed,
            Err(err) => {
                tracing::warn!(event = "envelope_unparsable", from = %frame.from, error = %err);
                return;
            }
        };

        let plaintext = match hybrid::open(&sealed, &self.keys) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(event = "message_undecryptable", from = %frame.from, error = %err);
                self.store
                    .append(&conversation, StoredMessage::undecryptable(frame.from.as_str(), timestamp));
                return;
            }
        };

        let payload = match MessagePayload::from_canonical(&plaintext) {
            Ok(p) => p,
            Err(err) => {
                tracing::warn!(event = "payload_unparsable", from = %frame.from, error = %err);
                self.store
                    .append(&conversation, StoredMessage::undecryptable(frame.from.as_str(), timestamp));
                return;
            }
        };

        let verified = self.verify_sender(&frame.from, &payload, &sealed.signature);
        self.store.append(
            &conversation,
            StoredMessage::from_payload(frame.from.as_str(), payload, verified, timestamp),
        );
    }

    /// Recompute the canonical bytes from the parsed payload and check
    /// the signature against the sender's directory key. A missing key
    /// or mismatch downgrades to unverified; it never discards the
    /// message.
    fn verify_sender(
        &self,
        from: &str,
        payload: &MessagePayload,
        signature: &[u8],
    ) -> bool {
        let Some(sender_key) = self.directory.lookup(from) else {
            tracing::warn!(event = "sender_key_not_found", from = %from);
            return false;
        };
        let canonical = match payload.canonical_bytes() {
            Ok(bytes) => bytes,
            Err(err) => {
                tracing::warn!(event = "canonical_reserialise_failed", from = %from, error = %err);
                return false;
            }
        };
        let verified = hybrid::verify(&canonical, signature, &sender_key);
        if !verified {
            tracing::warn!(event = "signature_mismatch", from = %from);
        }
        verified
    }
}
