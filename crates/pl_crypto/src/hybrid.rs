//! Hybrid encrypt-and-sign engine.
//!
//! One outbound message is processed as:
//!   canonical payload bytes
//!     → RSA-PSS(SHA-256) signature with the sender's private key
//!     → fresh AES-256 key + random 96-bit nonce, one AES-GCM pass
//!     → the AES key wrapped twice with RSA-OAEP(SHA-256): once under the
//!       recipient's public key, once under the sender's own
//!
//! The two resulting [`SealedMessage`]s share the nonce, ciphertext, and
//! signature; only the wrapped key differs. Both sides must agree on the
//! parameters below out of band — there is no negotiation.
//!
//! Key sizes: AES key 32 bytes, nonce 12 bytes, PSS salt 32 bytes
//! (SHA-256 output size).

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use rsa::pss::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{RandomizedSigner, SignatureEncoding, Verifier};
use rsa::Oaep;
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::CryptoError;
use crate::keys::{PeerPublicKey, RsaKeyPair};

/// AES-256-GCM key size in bytes.
pub const AES_KEY_SIZE: usize = 32;
/// AES-GCM nonce size in bytes (96 bits).
pub const NONCE_SIZE: usize = 12;

/// One decrypted-side copy of an encrypted message, raw bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedMessage {
    /// AES key under RSA-OAEP(SHA-256).
    pub wrapped_key: Vec<u8>,
    /// Random per-message AES-GCM nonce.
    pub nonce: Vec<u8>,
    /// AES-GCM ciphertext (tag appended).
    pub ciphertext: Vec<u8>,
    /// RSA-PSS(SHA-256) signature over the canonical plaintext.
    pub signature: Vec<u8>,
}

/// The same message sealed for both parties, so either can later decrypt
/// its own stored copy.
#[derive(Debug, Clone)]
pub struct DualSealed {
    pub for_sender: SealedMessage,
    pub for_recipient: SealedMessage,
}

/// Sign and encrypt `canonical` for `recipient`, producing a copy for the
/// sender as well.
///
/// `corrupt_signature` flips one bit of the computed signature before it
/// is embedded. It exists solely to exercise the tamper-detection path
/// end to end and must only ever be set by an explicit caller decision.
pub fn seal(
    canonical: &[u8],
    recipient: &PeerPublicKey,
    own: &PeerPublicKey,
    keypair: &RsaKeyPair,
    corrupt_signature: bool,
) -> Result<DualSealed, CryptoError> {
    let signer = SigningKey::<Sha256>::new(keypair.private().clone());
    let mut signature = signer.sign_with_rng(&mut OsRng, canonical).to_vec();
    if corrupt_signature {
        signature[0] ^= 0x01;
        tracing::warn!(event = "signature_corruption_hook", "flipping one signature bit");
    }

    let mut key = Zeroizing::new([0u8; AES_KEY_SIZE]);
    OsRng.fill_bytes(key.as_mut());
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = Aes256Gcm::new_from_slice(key.as_ref()).map_err(|_| CryptoError::AeadEncrypt)?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), canonical)
        .map_err(|_| CryptoError::AeadEncrypt)?;

    let wrap = |pk: &PeerPublicKey| -> Result<Vec<u8>, CryptoError> {
        pk.0.encrypt(&mut OsRng, Oaep::new::<Sha256>(), key.as_ref())
            .map_err(|_| CryptoError::KeyWrap)
    };
    let wrapped_for_recipient = wrap(recipient)?;
    let wrapped_for_sender = wrap(own)?;

    Ok(DualSealed {
        for_sender: SealedMessage {
            wrapped_key: wrapped_for_sender,
            nonce: nonce.to_vec(),
            ciphertext: ciphertext.clone(),
            signature: signature.clone(),
        },
        for_recipient: SealedMessage {
            wrapped_key: wrapped_for_recipient,
            nonce: nonce.to_vec(),
            ciphertext,
            signature,
        },
    })
}

/// Unwrap the AES key with our private key and decrypt the ciphertext.
///
/// Any failure here is a hard decryption failure: the caller gets no
/// plaintext. Signature checking is a separate, soft step — see
/// [`verify`].
pub fn open(sealed: &SealedMessage, keypair: &RsaKeyPair) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if sealed.nonce.len() != NONCE_SIZE {
        return Err(CryptoError::AeadDecrypt);
    }
    let key = Zeroizing::new(
        keypair
            .private()
            .decrypt(Oaep::new::<Sha256>(), &sealed.wrapped_key)
            .map_err(|_| CryptoError::KeyUnwrap)?,
    );
    let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::AeadDecrypt)?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&sealed.nonce), sealed.ciphertext.as_ref())
        .map_err(|_| CryptoError::AeadDecrypt)?;
    Ok(Zeroizing::new(plaintext))
}

/// Check `signature` over `canonical` against the sender's public key.
///
/// A mismatch is an ordinary outcome (the message stays readable, just
/// unverified), so this returns a bool rather than an error.
pub fn verify(canonical: &[u8], signature: &[u8], sender: &PeerPublicKey) -> bool {
    let verifier = VerifyingKey::<Sha256>::new(sender.0.clone());
    match Signature::try_from(signature) {
        Ok(sig) => verifier.verify(canonical, &sig).is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> RsaKeyPair {
        RsaKeyPair::generate().unwrap()
    }

    #[test]
    fn seal_open_verify_roundtrip() {
        let alice = pair();
        let bob = pair();
        let msg = br#"{"content":"hello","type":"text"}"#;

        let dual = seal(msg, &bob.public_key(), &alice.public_key(), &alice, false).unwrap();

        let plain = open(&dual.for_recipient, &bob).unwrap();
        assert_eq!(plain.as_slice(), msg);
        assert!(verify(&plain, &dual.for_recipient.signature, &alice.public_key()));
    }

    #[test]
    fn both_halves_decrypt_to_identical_plaintext() {
        let alice = pair();
        let bob = pair();
        let msg = b"dual envelope payload";

        let dual = seal(msg, &bob.public_key(), &alice.public_key(), &alice, false).unwrap();

        let for_bob = open(&dual.for_recipient, &bob).unwrap();
        let for_alice = open(&dual.for_sender, &alice).unwrap();
        assert_eq!(for_bob.as_slice(), for_alice.as_slice());
        assert_eq!(dual.for_sender.nonce, dual.for_recipient.nonce);
        assert_eq!(dual.for_sender.signature, dual.for_recipient.signature);
        assert_ne!(dual.for_sender.wrapped_key, dual.for_recipient.wrapped_key);
    }

    #[test]
    fn corrupted_signature_still_decrypts_but_fails_verify() {
        let alice = pair();
        let bob = pair();
        let msg = b"tamper detection";

        let dual = seal(msg, &bob.public_key(), &alice.public_key(), &alice, true).unwrap();

        let plain = open(&dual.for_recipient, &bob).unwrap();
        assert_eq!(plain.as_slice(), msg);
        assert!(!verify(&plain, &dual.for_recipient.signature, &alice.public_key()));
    }

    #[test]
    fn any_signature_bit_flip_fails_verify() {
        let alice = pair();
        let bob = pair();
        let msg = b"bit flip sweep";
        let dual = seal(msg, &bob.public_key(), &alice.public_key(), &alice, false).unwrap();

        // Sample a handful of positions rather than all 2048.
        for idx in [0usize, 1, 17, 100, 255] {
            let mut sig = dual.for_recipient.signature.clone();
            let pos = idx % sig.len();
            sig[pos] ^= 1 << (idx % 8);
            assert!(!verify(msg, &sig, &alice.public_key()), "flip at {idx} verified");
        }
    }

    #[test]
    fn ciphertext_tampering_is_a_hard_failure() {
        let alice = pair();
        let bob = pair();
        let dual = seal(b"integrity", &bob.public_key(), &alice.public_key(), &alice, false)
            .unwrap();

        let mut tampered = dual.for_recipient.clone();
        tampered.ciphertext[0] ^= 0x01;
        assert!(matches!(open(&tampered, &bob), Err(CryptoError::AeadDecrypt)));
    }

    #[test]
    fn wrapped_key_tampering_is_a_hard_failure() {
        let alice = pair();
        let bob = pair();
        let dual = seal(b"integrity", &bob.public_key(), &alice.public_key(), &alice, false)
            .unwrap();

        let mut tampered = dual.for_recipient.clone();
        let last = tampered.wrapped_key.len() - 1;
        tampered.wrapped_key[last] ^= 0x01;
        assert!(matches!(open(&tampered, &bob), Err(CryptoError::KeyUnwrap)));
    }

    #[test]
    fn wrong_private_key_cannot_open() {
        let alice = pair();
        let bob = pair();
        let eve = pair();
        let dual = seal(b"secret", &bob.public_key(), &alice.public_key(), &alice, false).unwrap();
        assert!(open(&dual.for_recipient, &eve).is_err());
    }

    #[test]
    fn nonces_are_unique_per_message() {
        let alice = pair();
        let bob = pair();
        let a = seal(b"one", &bob.public_key(), &alice.public_key(), &alice, false).unwrap();
        let b = seal(b"one", &bob.public_key(), &alice.public_key(), &alice, false).unwrap();
        assert_ne!(a.for_recipient.nonce, b.for_recipient.nonce);
        assert_ne!(a.for_recipient.ciphertext, b.for_recipient.ciphertext);
    }
}
