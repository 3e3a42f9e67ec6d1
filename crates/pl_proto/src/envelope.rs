//! Encrypted message envelope — what the relay and the persistence store
//! see.
//!
//! The relay is a dumb pipe: every field here is opaque base64. A
//! [`DualEnvelope`] is what gets persisted (`for_sender` +
//! `for_recipient`, sharing nonce/ciphertext/signature); the realtime
//! channel only ever carries the single recipient-addressed half.
//!
//! Decoding validates structure and base64 *before* anything reaches a
//! cryptographic primitive; a missing field or bad encoding is a format
//! error, never a decryption failure.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use pl_crypto::{DualSealed, SealedMessage};

use crate::error::ProtoError;

/// One transport-encoded message copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// RSA-OAEP-wrapped AES key, base64.
    pub aes_key: String,
    /// AES-GCM nonce, base64.
    pub iv: String,
    /// AES-GCM ciphertext (tag appended), base64.
    pub cipher_text: String,
    /// RSA-PSS signature over the canonical plaintext, base64.
    pub signature: String,
}

impl Envelope {
    pub fn encode(sealed: &SealedMessage) -> Self {
        Self {
            aes_key: STANDARD.encode(&sealed.wrapped_key),
            iv: STANDARD.encode(&sealed.nonce),
            cipher_text: STANDARD.encode(&sealed.ciphertext),
            signature: STANDARD.encode(&sealed.signature),
        }
    }

    pub fn decode(&self) -> Result<SealedMessage, ProtoError> {
        Ok(SealedMessage {
            wrapped_key: STANDARD.decode(&self.aes_key)?,
            nonce: STANDARD.decode(&self.iv)?,
            ciphertext: STANDARD.decode(&self.cipher_text)?,
            signature: STANDARD.decode(&self.signature)?,
        })
    }

    pub fn from_json(s: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Both copies of one message, as persisted by the durable store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DualEnvelope {
    pub for_sender: Envelope,
    pub for_recipient: Envelope,
}

impl DualEnvelope {
    pub fn encode(dual: &DualSealed) -> Self {
        Self {
            for_sender: Envelope::encode(&dual.for_sender),
            for_recipient: Envelope::encode(&dual.for_recipient),
        }
    }

    pub fn from_json(s: &str) -> Result<Self, ProtoError> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json(&self) -> Result<String, ProtoError> {
        Ok(serde_json::to_string(self)?)
    }
}
