//! Request/response bodies for the HTTP collaborators (auth, key
//! directory, durable message store).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub name: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

/// Publish (or overwrite) our SPKI public key under our username.
#[derive(Debug, Clone, Serialize)]
pub struct PublicKeyUpload {
    pub username: String,
    pub pubkey: String,
}

/// The wholesale key directory dump: username → base64 SPKI public key.
pub type DirectoryDump = std::collections::HashMap<String, String>;

/// A user known to the server, keys or not.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DirectoryUser {
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Persist both halves of a message; `text` is a serialized
/// [`crate::DualEnvelope`].
#[derive(Debug, Clone, Serialize)]
pub struct StoreMessageRequest {
    pub from_user: String,
    pub to_user: String,
    pub text: String,
}

/// One record of conversation history as the durable store returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryRecord {
    pub from_user: String,
    #[serde(default)]
    pub to_user: Option<String>,
    pub text: String,
    #[serde(default)]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistoryResponse {
    pub messages: Vec<HistoryRecord>,
}
