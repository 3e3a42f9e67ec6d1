//! pl_client — client core for Parley Secure Messaging
//!
//! Ties the crypto engine and wire types together into the pieces an
//! application embeds: session bootstrap, the realtime delivery
//! channel, the inbound pipeline, history loading, and the outbound
//! composer.
//!
//! # Modules
//! - `session`   — key bootstrap, login, key publication
//! - `api`       — HTTP client for the account/directory/store endpoints
//! - `directory` — public-key directory cache
//! - `store`     — in-memory conversation store
//! - `channel`   — WebSocket delivery channel with reconnect
//! - `pipeline`  — inbound frame → decrypted stored message
//! - `history`   — durable history loading and decryption
//! - `composer`  — outbound message construction and delivery
//! - `services`  — traits decoupling the core from the HTTP client
//! - `error`     — client failure taxonomy

pub mod api;
pub mod channel;
pub mod composer;
pub mod directory;
pub mod error;
pub mod history;
pub mod pipeline;
pub mod services;
pub mod session;
pub mod store;

pub use api::ApiClient;
pub use channel::{retry_delay, ChannelState, DeliveryChannel, InboundHandler};
pub use composer::MessageComposer;
pub use directory::KeyDirectory;
pub use error::ClientError;
pub use history::HistoryLoader;
pub use pipeline::InboundPipeline;
pub use services::{DirectoryService, PersistenceService, RealtimeSender};
pub use session::{load_or_generate_keys, Session, SessionConfig};
pub use store::ConversationStore;
