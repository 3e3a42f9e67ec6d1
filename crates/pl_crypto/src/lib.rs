//! pl_crypto — Parley Secure Messaging cryptographic primitives
//!
//! # Design principles
//! - NO custom crypto; all primitives come from audited RustCrypto crates.
//! - Secret material is zeroized on drop wherever it is exported.
//! - Algorithm parameters are hardcoded — there is no negotiation on the
//!   wire, so both peers must compile against the same constants.
//!
//! # Module layout
//! - `keys`     — RSA-2048 key pairs, SPKI/PKCS#8 encoding, peer public keys
//! - `keystore` — durable private-key storage on the local device
//! - `hybrid`   — RSA-OAEP key wrap + AES-256-GCM bulk cipher + RSA-PSS
//!                signatures, packaged as dual sealed messages
//! - `error`    — unified error type

pub mod error;
pub mod hybrid;
pub mod keys;
pub mod keystore;

pub use error::CryptoError;
pub use hybrid::{DualSealed, SealedMessage};
pub use keys::{PeerPublicKey, RsaKeyPair};
pub use keystore::KeyStore;
