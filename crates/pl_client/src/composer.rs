//! Outbound message composer: payload → dual envelope → realtime +
//! durable store + local echo.
//!
//! Delivery order matters: the realtime push is fire-and-forget, but
//! the durable store write is authoritative — if it fails the send
//! fails, even though the recipient may already have seen the live
//! frame (the two paths are not transactional).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;

use pl_crypto::{hybrid, RsaKeyPair};
use pl_proto::api::StoreMessageRequest;
use pl_proto::{
    conversation_key, DualEnvelope, FileInfo, MessagePayload, OutboundFrame, StoredMessage,
};

use crate::directory::KeyDirectory;
use crate::error::ClientError;
use crate::services::{DirectoryService, PersistenceService, RealtimeSender};
use crate::store::ConversationStore;

pub struct MessageComposer {
    username: String,
    keys: Arc<RsaKeyPair>,
    directory: KeyDirectory,
    store: ConversationStore,
    corrupt_signature: AtomicBool,
}

impl MessageComposer {
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
            corrupt_signature: AtomicBool::new(false),
        }
    }

    /// Tamper-detection exercise hook: when set, every outgoing
    /// signature has one bit flipped, so recipients see the message as
    /// unverified.
    pub fn set_corrupt_signature(&self, corrupt: bool) {
        self.corrupt_signature.store(corrupt, Ordering::Relaxed);
    }

    pub async fn send_text(
        &self,
        directory: &dyn DirectoryService,
        persistence: &dyn PersistenceService,
        realtime: &dyn RealtimeSender,
        to: &str,
        content: &str,
    ) -> Result<StoredMessage, ClientError> {
        self.send_payload(directory, persistence, realtime, to, MessagePayload::text(content))
            .await
    }

    /// Send raw file bytes. The content travels base64-encoded inside
    /// the encrypted payload, all in one envelope.
    pub async fn send_file(
        &self,
        directory: &dyn DirectoryService,
        persistence: &dyn PersistenceService,
        realtime: &dyn RealtimeSender,
        to: &str,
        bytes: &[u8],
        file_name: &str,
        file_type: &str,
    ) -> Result<StoredMessage, ClientError> {
        let payload = MessagePayload::file(STANDARD.encode(bytes), file_name, file_type);
        self.send_payload(directory, persistence, realtime, to, payload)
            .await
    }

    async fn send_payload(
        &self,
        directory: &dyn DirectoryService,
        persistence: &dyn PersistenceService,
        realtime: &dyn RealtimeSender,
        to: &str,
        payload: MessagePayload,
    ) -> Result<StoredMessage, ClientError> {
        // Refresh first so a recipient who rotated keys since our last
        // look still gets a readable copy.
        self.directory.refresh(directory).await?;
        let recipient_key = self
            .directory
            .lookup(to)
            .ok_or_else(|| ClientError::KeyNotFound(to.to_string()))?;
        let own_key = self
            .directory
            .lookup(&self.username)
            .ok_or_else(|| ClientError::KeyNotFound(self.username.clone()))?;

        let canonical = payload.canonical_bytes()?;
        let dual = hybrid::seal(
            &canonical,
            &recipient_key,
            &own_key,
            &self.keys,
            self.corrupt_signature.load(Ordering::Relaxed),
        )?;
        let envelopes = DualEnvelope::encode(&dual);

        let file_info = match (&payload.file_name, &payload.file_type) {
            (Some(name), Some(mime)) => Some(FileInfo {
                file_name: name.clone(),
                file_type: mime.clone(),
            }),
            _ => None,
        };
        realtime.send_frame(OutboundFrame {
            to: to.to_string(),
            text: envelopes.for_recipient.to_json()?,
            file_info,
        });

        persistence
            .store_message(&StoreMessageRequest {
                from_user: self.username.clone(),
                to_user: to.to_string(),
                text: envelopes.to_json()?,
            })
            .await?;

        let message = StoredMessage::from_payload(&self.username, payload, true, Utc::now());
        let conversation = conversation_key(&self.username, to);
        self.store.append(&conversation, message.clone());
        tracing::info!(event = "message_sent", to = %to, kind = ?message.kind);
        Ok(message)
    }
}
