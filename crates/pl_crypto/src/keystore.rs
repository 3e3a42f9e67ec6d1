//! Durable local storage for the account's private key.
//!
//! The key is written exactly once, when it is generated on first login,
//! and read back on every later session. A missing key is a hard error:
//! nothing can be decrypted or signed without it, so callers must not
//! silently fall through to generating a second pair (peers already hold
//! ciphertext wrapped under the first one).

use std::fs;
use std::path::PathBuf;

use base64::{engine::general_purpose::STANDARD, Engine};
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::RsaKeyPair;

/// File-backed private key storage (base64 PKCS#8 DER, one file).
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Persist a freshly generated pair.
    pub fn save(&self, pair: &RsaKeyPair) -> Result<(), CryptoError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let der = pair.private_pkcs8_der()?;
        let encoded = Zeroizing::new(STANDARD.encode(der.as_slice()));
        fs::write(&self.path, encoded.as_bytes())?;
        tracing::info!(event = "private_key_stored", path = %self.path.display());
        Ok(())
    }

    /// Load the stored pair, or fail with `MissingPrivateKey`.
    pub fn load(&self) -> Result<RsaKeyPair, CryptoError> {
        if !self.exists() {
            return Err(CryptoError::MissingPrivateKey);
        }
        let encoded = fs::read_to_string(&self.path)?;
        let der = Zeroizing::new(STANDARD.decode(encoded.trim())?);
        RsaKeyPair::from_pkcs8_der(&der)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_then_load_restores_the_pair() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("privkey"));
        assert!(!store.exists());

        let pair = RsaKeyPair::generate().unwrap();
        store.save(&pair).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.public_key(), pair.public_key());
    }

    #[test]
    fn load_without_key_is_a_hard_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = KeyStore::new(dir.path().join("privkey"));
        assert!(matches!(store.load(), Err(CryptoError::MissingPrivateKey)));
    }
}
