use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Invalid key material: {0}")]
    InvalidKey(String),

    #[error("No private key stored; key generation has not run on this device")]
    MissingPrivateKey,

    #[error("Key store I/O failed: {0}")]
    KeyStoreIo(#[from] std::io::Error),

    #[error("Symmetric key wrap failed")]
    KeyWrap,

    #[error("Symmetric key unwrap failed (wrong private key or corrupted field)")]
    KeyUnwrap,

    #[error("AEAD encryption failed")]
    AeadEncrypt,

    #[error("AEAD decryption failed (authentication tag mismatch, possible tampering)")]
    AeadDecrypt,

    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),
}
