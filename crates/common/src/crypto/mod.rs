//! Cryptographic primitives for draw confidentiality
//!
//! - **Keypairs**: every user owns one X25519 keypair, generated at
//!   registration and never rotated
//! - **Sealing**: draw numbers are sealed to the owner's public key with an
//!   ephemeral ECDH exchange and ChaCha20-Poly1305, so stored draws are opaque
//!   to anyone without the owner's secret key
//!
//! # Key size
//!
//! X25519 gives roughly 128-bit security. This replaces the 512-bit RSA
//! modulus of earlier deployments while keeping the same shape: encrypt to a
//! public key, decrypt with the matching private key, fail on any other key.

mod keys;
mod sealed;

pub use keys::{
    KeyError, KeyPairProvider, Keypair, OsKeyPairProvider, PublicKey, SecretKey, PRIVATE_KEY_SIZE,
    PUBLIC_KEY_SIZE,
};
pub use sealed::{Ciphertext, DecryptionError, EncryptionError, MAX_PAYLOAD_SIZE, SEAL_OVERHEAD};
