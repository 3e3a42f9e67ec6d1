//! Plaintext message payload and its canonical serialisation.
//!
//! The RSA-PSS signature is computed over [`MessagePayload::canonical_bytes`]
//! and the verifier re-derives the exact same bytes from the parsed
//! payload before checking it. The canonical rule is therefore part of
//! the protocol:
//!   - keys in struct declaration order (`content`, `type`, `fileName`,
//!     `fileType`),
//!   - absent optional fields omitted entirely (never `null`),
//!   - compact JSON (no whitespace).
//! Any deviation between signer and verifier makes every signature
//! spuriously fail, so both sides funnel through this one function.

use serde::{Deserialize, Serialize};

use crate::error::ProtoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Text,
    File,
}

/// What the user actually sent, before encryption / after decryption.
///
/// For files, `content` carries the whole file base64-encoded; there is
/// no chunking, which bounds transfers to what one AEAD pass can hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessagePayload {
    pub content: String,
    #[serde(rename = "type")]
    pub kind: PayloadKind,
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none", default)]
    pub file_name: Option<String>,
    #[serde(rename = "fileType", skip_serializing_if = "Option::is_none", default)]
    pub file_type: Option<String>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: PayloadKind::Text,
            file_name: None,
            file_type: None,
        }
    }

    /// `content` must already be the text-safe (base64) encoding of the
    /// file bytes — see the composer.
    pub fn file(content: impl Into<String>, file_name: impl Into<String>, file_type: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: PayloadKind::File,
            file_name: Some(file_name.into()),
            file_type: Some(file_type.into()),
        }
    }

    /// The byte string that gets signed and encrypted.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Parse decrypted plaintext back into a payload.
    pub fn from_canonical(bytes: &[u8]) -> Result<Self, ProtoError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_form_omits_absent_file_fields() {
        let payload = MessagePayload::text("hi");
        let bytes = payload.canonical_bytes().unwrap();
        let s = String::from_utf8(bytes).unwrap();
        assert_eq!(s, r#"{"content":"hi","type":"text"}"#);
    }

    #[test]
    fn canonical_form_is_stable_through_a_parse_cycle() {
        let payload = MessagePayload::file("QUJD", "notes.txt", "text/plain");
        let bytes = payload.canonical_bytes().unwrap();
        let reparsed = MessagePayload::from_canonical(&bytes).unwrap();
        assert_eq!(reparsed, payload);
        assert_eq!(reparsed.canonical_bytes().unwrap(), bytes);
    }

    #[test]
    fn file_fields_keep_declaration_order() {
        let payload = MessagePayload::file("QQ==", "a.bin", "application/octet-stream");
        let s = String::from_utf8(payload.canonical_bytes().unwrap()).unwrap();
        assert_eq!(
            s,
            r#"{"content":"QQ==","type":"file","fileName":"a.bin","fileType":"application/octet-stream"}"#
        );
    }
}
