use thiserror::Error;

/// Failures while decoding or encoding wire structures.
///
/// Both variants are format errors in the taxonomy sense: they are raised
/// before any cryptographic primitive sees the input, and callers recover
/// by skipping the single offending record.
#[derive(Debug, Error)]
pub enum ProtoError {
    #[error("Malformed wire structure: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Invalid base64 field: {0}")]
    Base64(#[from] base64::DecodeError),
}
