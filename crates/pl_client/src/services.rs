//! Seams between the messaging core and its collaborators.
//!
//! The composer, history loader, and directory talk to the server
//! through these traits rather than a concrete HTTP client, so the
//! end-to-end paths are testable with in-memory fakes.

use async_trait::async_trait;

use pl_proto::api::{DirectoryDump, HistoryRecord, StoreMessageRequest};
use pl_proto::OutboundFrame;

use crate::error::ClientError;

/// Serves the wholesale public-key dump.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn fetch_public_keys(&self) -> Result<DirectoryDump, ClientError>;
}

/// The durable message store.
#[async_trait]
pub trait PersistenceService: Send + Sync {
    async fn store_message(&self, req: &StoreMessageRequest) -> Result<(), ClientError>;
    async fn fetch_history(&self, peer: &str) -> Result<Vec<HistoryRecord>, ClientError>;
}

/// Best-effort realtime delivery. Implementations never block and never
/// report failure to the caller; an undeliverable frame is dropped and
/// the durable store remains the source of truth.
pub trait RealtimeSender: Send + Sync {
    fn send_frame(&self, frame: OutboundFrame);
}
