//! RSA key material.
//!
//! Each account owns one long-term RSA-2048 key pair, generated on first
//! login. The public half travels as base64-encoded SPKI DER (the format
//! the key directory serves for every user); the private half is PKCS#8
//! DER and never leaves the device (see `keystore`).

use base64::{engine::general_purpose::STANDARD, Engine};
use rand::rngs::OsRng;
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use zeroize::Zeroizing;

use crate::error::CryptoError;

/// Modulus size shared by every peer. Not negotiable on the wire.
pub const RSA_BITS: usize = 2048;

/// A peer's public key as fetched from the key directory.
#[derive(Debug, Clone, PartialEq)]
pub struct PeerPublicKey(pub(crate) RsaPublicKey);

impl PeerPublicKey {
    /// Decode a base64 SPKI DER public key (the directory wire format).
    pub fn from_spki_b64(s: &str) -> Result<Self, CryptoError> {
        let der = STANDARD.decode(s)?;
        let key = RsaPublicKey::from_public_key_der(&der)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Self(key))
    }

    pub fn to_spki_b64(&self) -> Result<String, CryptoError> {
        let der = self
            .0
            .to_public_key_der()
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(STANDARD.encode(der.as_bytes()))
    }
}

/// The local account's key pair.
pub struct RsaKeyPair {
    public: RsaPublicKey,
    private: RsaPrivateKey,
}

impl RsaKeyPair {
    /// Generate a fresh pair. Runs once per account, on first login.
    pub fn generate() -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::new(&mut OsRng, RSA_BITS)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let public = private.to_public_key();
        Ok(Self { public, private })
    }

    /// Rebuild the pair from stored PKCS#8 DER.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, CryptoError> {
        let private = RsaPrivateKey::from_pkcs8_der(der)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        let public = private.to_public_key();
        Ok(Self { public, private })
    }

    /// PKCS#8 DER export of the private key, for the key store only.
    pub fn private_pkcs8_der(&self) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let doc = self
            .private
            .to_pkcs8_der()
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Ok(Zeroizing::new(doc.as_bytes().to_vec()))
    }

    /// Public half in the directory's wire format (base64 SPKI DER).
    pub fn public_spki_b64(&self) -> Result<String, CryptoError> {
        PeerPublicKey(self.public.clone()).to_spki_b64()
    }

    /// The public half as a peer key, e.g. for verifying our own history.
    pub fn public_key(&self) -> PeerPublicKey {
        PeerPublicKey(self.public.clone())
    }

    pub(crate) fn private(&self) -> &RsaPrivateKey {
        &self.private
    }
}

impl std::fmt::Debug for RsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print private key material.
        f.debug_struct("RsaKeyPair").finish_non_exhaustive()
    }
}
