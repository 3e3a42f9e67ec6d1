//! pl_proto — wire types and serialisation for Parley Secure Messaging
//!
//! Everything that crosses a process boundary is JSON with base64-encoded
//! byte fields, matching what the relay server and existing peers already
//! speak.
//!
//! # Modules
//! - `envelope`     — encrypted message envelope (what the relay sees)
//! - `payload`      — plaintext message payload and its canonical form
//! - `frame`        — realtime relay frames (WebSocket)
//! - `api`          — request/response types for the HTTP collaborators
//! - `conversation` — conversation keys and the in-memory message model
//! - `error`        — format/serialisation error type

pub mod api;
pub mod conversation;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod payload;

pub use conversation::{conversation_key, StoredMessage, StoredMessageKind};
pub use envelope::{DualEnvelope, Envelope};
pub use error::ProtoError;
pub use frame::{parse_server_timestamp, FileInfo, InboundFrame, OutboundFrame};
pub use payload::{MessagePayload, PayloadKind};
