use thiserror::Error;

use pl_crypto::CryptoError;
use pl_proto::ProtoError;

/// Client-side failure taxonomy.
///
/// Which variant a failure maps to decides how the pipeline recovers:
/// `Format` skips the offending record, `KeyNotFound` downgrades a
/// message to unverified, `Crypto` (on the open path) produces an
/// undecryptable placeholder, and `Persistence`/`Http` surface to the
/// caller.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Format(#[from] ProtoError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("No public key on record for {0}")]
    KeyNotFound(String),

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Durable store rejected the request: {0}")]
    Persistence(String),

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}
