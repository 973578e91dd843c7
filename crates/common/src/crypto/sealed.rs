//! Public-key sealing using ECDH + ChaCha20-Poly1305
//!
//! A payload is sealed to a recipient's [`PublicKey`] so that only the holder
//! of the matching [`SecretKey`] can open it.
//!
//! # Protocol Overview
//!
//! To seal a payload:
//! 1. **Generate ephemeral key**: Create a one-time X25519 secret
//! 2. **Perform ECDH**: Combine it with the recipient's public key
//! 3. **Derive key**: BLAKE3 `derive_key` over the shared secret and both public keys
//! 4. **Encrypt**: ChaCha20-Poly1305 with a random nonce
//!
//! The recipient repeats the ECDH with their secret key and the ephemeral
//! public key carried in the ciphertext. Opening with any other key fails
//! authentication instead of producing garbage plaintext.

use std::fmt;

use chacha20poly1305::{
    aead::{Aead, KeyInit},
    ChaCha20Poly1305, Key, Nonce,
};
use serde::{Deserialize, Serialize};
use x25519_dalek::StaticSecret;

use super::keys::{KeyError, PublicKey, SecretKey, PRIVATE_KEY_SIZE, PUBLIC_KEY_SIZE};

/// Size of ChaCha20-Poly1305 nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the Poly1305 authentication tag in bytes
pub const TAG_SIZE: usize = 16;
/// Bytes a sealed payload carries on top of its plaintext
///
/// Layout: ephemeral_pubkey (32) || nonce (12) || ciphertext || tag (16)
pub const SEAL_OVERHEAD: usize = PUBLIC_KEY_SIZE + NONCE_SIZE + TAG_SIZE;
/// Largest plaintext accepted by [`Ciphertext::seal`]
pub const MAX_PAYLOAD_SIZE: usize = 64;

const KDF_CONTEXT: &str = "lottery 2025-10 draw seal v1";

/// Errors raised while sealing a payload
#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("payload of {0} bytes exceeds the {max} byte limit", max = MAX_PAYLOAD_SIZE)]
    PayloadTooLarge(usize),
    #[error("key error: {0}")]
    Key(#[from] KeyError),
    #[error("encryption error: {0}")]
    Default(#[from] anyhow::Error),
}

/// Errors raised while opening a sealed payload
#[derive(Debug, thiserror::Error)]
pub enum DecryptionError {
    /// Authentication failed: sealed to another key, or tampered with
    #[error("ciphertext was not sealed for this key")]
    WrongKey,
    #[error("malformed ciphertext: {0}")]
    Malformed(String),
}

/// An opaque sealed payload
///
/// Produced by [`Ciphertext::seal`] and only meaningful to
/// [`Ciphertext::open`] with the matching secret key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ciphertext(Vec<u8>);

impl fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ciphertext({} bytes)", self.0.len())
    }
}

impl From<Vec<u8>> for Ciphertext {
    fn from(bytes: Vec<u8>) -> Self {
        Ciphertext(bytes)
    }
}

impl From<Ciphertext> for Vec<u8> {
    fn from(ciphertext: Ciphertext) -> Self {
        ciphertext.0
    }
}

impl Ciphertext {
    /// Seal `plaintext` so that only `recipient`'s secret key can open it
    ///
    /// # Errors
    ///
    /// Returns [`EncryptionError::PayloadTooLarge`] if the plaintext is larger
    /// than [`MAX_PAYLOAD_SIZE`], or a key error if the random source fails.
    pub fn seal(plaintext: &[u8], recipient: &PublicKey) -> Result<Self, EncryptionError> {
        if plaintext.len() > MAX_PAYLOAD_SIZE {
            return Err(EncryptionError::PayloadTooLarge(plaintext.len()));
        }

        let mut ephemeral_bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut ephemeral_bytes).map_err(KeyError::Generation)?;
        let ephemeral = StaticSecret::from(ephemeral_bytes);
        let ephemeral_public = SecretKey::from(ephemeral_bytes).public();

        let shared = ephemeral.diffie_hellman(&recipient.to_x25519());
        if !shared.was_contributory() {
            return Err(anyhow::anyhow!("recipient public key is a low order point").into());
        }
        let key = derive_key(shared.as_bytes(), &ephemeral_public, recipient);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::getrandom(&mut nonce_bytes).map_err(KeyError::Generation)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let encrypted = cipher
            .encrypt(nonce, plaintext)
            .map_err(|_| anyhow::anyhow!("encrypt error"))?;

        let mut out = Vec::with_capacity(SEAL_OVERHEAD + plaintext.len());
        out.extend_from_slice(&ephemeral_public.to_bytes());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&encrypted);

        Ok(Ciphertext(out))
    }

    /// Open a sealed payload with the recipient's secret key
    ///
    /// # Errors
    ///
    /// Returns [`DecryptionError::Malformed`] if the bytes cannot be a sealed
    /// payload, and [`DecryptionError::WrongKey`] if authentication fails.
    pub fn open(&self, recipient: &SecretKey) -> Result<Vec<u8>, DecryptionError> {
        if self.0.len() < SEAL_OVERHEAD {
            return Err(DecryptionError::Malformed(format!(
                "expected at least {} bytes, got {}",
                SEAL_OVERHEAD,
                self.0.len()
            )));
        }

        let (ephemeral_bytes, rest) = self.0.split_at(PUBLIC_KEY_SIZE);
        let (nonce_bytes, encrypted) = rest.split_at(NONCE_SIZE);
        let ephemeral_public = PublicKey::try_from(ephemeral_bytes)
            .map_err(|e| DecryptionError::Malformed(e.to_string()))?;

        let shared = recipient
            .to_x25519()
            .diffie_hellman(&ephemeral_public.to_x25519());
        if !shared.was_contributory() {
            return Err(DecryptionError::Malformed(
                "ephemeral key is a low order point".to_string(),
            ));
        }
        let key = derive_key(shared.as_bytes(), &ephemeral_public, &recipient.public());
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key));

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
            .map_err(|_| DecryptionError::WrongKey)
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

fn derive_key(shared: &[u8; 32], ephemeral: &PublicKey, recipient: &PublicKey) -> [u8; 32] {
    let mut material = [0u8; 32 + 2 * PUBLIC_KEY_SIZE];
    material[..32].copy_from_slice(shared);
    material[32..32 + PUBLIC_KEY_SIZE].copy_from_slice(&ephemeral.to_bytes());
    material[32 + PUBLIC_KEY_SIZE..].copy_from_slice(&recipient.to_bytes());
    blake3::derive_key(KDF_CONTEXT, &material)
}
