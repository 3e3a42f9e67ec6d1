//! Conversation keys and the decrypted in-memory message model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::payload::{MessagePayload, PayloadKind};

/// Order-independent key for the conversation between two users: both
/// sides must derive the identical bucket name for the same pair.
pub fn conversation_key(a: &str, b: &str) -> String {
    let mut pair = [a, b];
    pair.sort_unstable();
    pair.join("-")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoredMessageKind {
    Text,
    File,
    /// Ciphertext we could not open; kept so the conversation shows a
    /// gap instead of silently losing the slot.
    Undecryptable,
}

/// One decrypted (or failed-to-decrypt) message as held by the
/// conversation store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredMessage {
    pub from: String,
    pub content: String,
    pub kind: StoredMessageKind,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub file_type: Option<String>,
    /// Whether the RSA-PSS signature checked out against the sender's
    /// directory key. `false` means "readable but unauthenticated".
    pub verified: bool,
    pub timestamp: DateTime<Utc>,
}

impl StoredMessage {
    pub fn from_payload(
        from: impl Into<String>,
        payload: MessagePayload,
        verified: bool,
        timestamp: DateTime<Utc>,
    ) -> Self {
        let kind = match payload.kind {
            PayloadKind::Text => StoredMessageKind::Text,
            PayloadKind::File => StoredMessageKind::File,
        };
        Self {
            from: from.into(),
            content: payload.content,
            kind,
            file_name: payload.file_name,
            file_type: payload.file_type,
            verified,
            timestamp,
        }
    }

    /// Placeholder for a message whose ciphertext or wrapped key failed
    /// to open.
    pub fn undecryptable(from: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            from: from.into(),
            content: String::new(),
            kind: StoredMessageKind::Undecryptable,
            file_name: None,
            file_type: None,
            verified: false,
            timestamp,
        }
    }
}
