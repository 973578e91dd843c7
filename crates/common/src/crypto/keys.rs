use std::fmt;

use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

/// Size of X25519 private key in bytes
pub const PRIVATE_KEY_SIZE: usize = 32;
/// Size of X25519 public key in bytes
pub const PUBLIC_KEY_SIZE: usize = 32;

/// Errors that can occur during key operations
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    #[error("key error: {0}")]
    Default(#[from] anyhow::Error),
    /// The system random source could not produce key material
    #[error("key generation failed: {0}")]
    Generation(getrandom::Error),
}

/// Public half of a user's draw keypair
///
/// Draws are sealed to this key when they are submitted. It is safe to
/// store and display; it can only be used to encrypt.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
pub struct PublicKey([u8; PUBLIC_KEY_SIZE]);

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.to_hex())
    }
}

impl From<[u8; PUBLIC_KEY_SIZE]> for PublicKey {
    fn from(bytes: [u8; PUBLIC_KEY_SIZE]) -> Self {
        PublicKey(bytes)
    }
}

impl TryFrom<&[u8]> for PublicKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PUBLIC_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid public key size, expected {}, got {}",
                PUBLIC_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut buff = [0; PUBLIC_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(buff.into())
    }
}

impl PublicKey {
    /// Parse a public key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; PUBLIC_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| anyhow::anyhow!("public key hex decode error"))?;
        Ok(buff.into())
    }

    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub(crate) fn to_x25519(self) -> X25519PublicKey {
        X25519PublicKey::from(self.0)
    }
}

/// Private half of a user's draw keypair
///
/// Only ever used to open draws sealed to the matching [`PublicKey`].
/// `Debug` output is redacted so the key cannot leak through logs.
#[derive(Clone, Serialize, Deserialize)]
pub struct SecretKey([u8; PRIVATE_KEY_SIZE]);

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(<redacted>)")
    }
}

impl From<[u8; PRIVATE_KEY_SIZE]> for SecretKey {
    fn from(secret: [u8; PRIVATE_KEY_SIZE]) -> Self {
        Self(secret)
    }
}

impl TryFrom<&[u8]> for SecretKey {
    type Error = KeyError;
    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() != PRIVATE_KEY_SIZE {
            return Err(anyhow::anyhow!(
                "invalid private key size, expected {}, got {}",
                PRIVATE_KEY_SIZE,
                bytes.len()
            )
            .into());
        }
        let mut buff = [0; PRIVATE_KEY_SIZE];
        buff.copy_from_slice(bytes);
        Ok(buff.into())
    }
}

impl SecretKey {
    /// Parse a secret key from a hexadecimal string
    ///
    /// Accepts both plain hex and "0x"-prefixed hex strings.
    pub fn from_hex(hex: &str) -> Result<Self, KeyError> {
        let hex = hex.strip_prefix("0x").unwrap_or(hex);
        let mut buff = [0; PRIVATE_KEY_SIZE];
        hex::decode_to_slice(hex, &mut buff)
            .map_err(|_| anyhow::anyhow!("private key hex decode error"))?;
        Ok(Self::from(buff))
    }

    /// Generate a new random secret key from the operating system's CSPRNG
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::Generation`] if the random source is unavailable.
    pub fn generate() -> Result<Self, KeyError> {
        let mut bytes = [0u8; PRIVATE_KEY_SIZE];
        getrandom::getrandom(&mut bytes).map_err(KeyError::Generation)?;
        Ok(Self::from(bytes))
    }

    /// Derive the public key from this secret key
    pub fn public(&self) -> PublicKey {
        let public = X25519PublicKey::from(&self.to_x25519());
        PublicKey(public.to_bytes())
    }

    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Encode secret key in PEM format with tag "PRIVATE KEY"
    pub fn to_pem(&self) -> String {
        let pem = pem::Pem::new("PRIVATE KEY", self.to_bytes());
        pem::encode(&pem)
    }

    /// Parse a secret key from PEM format
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The PEM string is malformed
    /// - The PEM tag is not "PRIVATE KEY"
    /// - The key size is incorrect
    pub fn from_pem(pem_str: &str) -> Result<Self, KeyError> {
        let pem = pem::parse(pem_str).map_err(|e| anyhow::anyhow!("failed to parse PEM: {}", e))?;

        if pem.tag() != "PRIVATE KEY" {
            return Err(anyhow::anyhow!("invalid PEM tag, expected PRIVATE KEY").into());
        }

        Self::try_from(pem.contents())
    }

    pub(crate) fn to_x25519(&self) -> StaticSecret {
        StaticSecret::from(self.0)
    }
}

/// A user's draw keypair
///
/// Bound to exactly one user at registration and never rotated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Keypair {
    public: PublicKey,
    secret: SecretKey,
}

impl Keypair {
    /// Rebuild a keypair from its stored secret half
    pub fn from_secret(secret: SecretKey) -> Self {
        Self {
            public: secret.public(),
            secret,
        }
    }

    /// Rebuild a keypair from both stored halves
    ///
    /// # Errors
    ///
    /// Fails if the public key was not derived from the secret key.
    pub fn from_parts(public: PublicKey, secret: SecretKey) -> Result<Self, KeyError> {
        if secret.public() != public {
            return Err(anyhow::anyhow!("public key does not match secret key").into());
        }
        Ok(Self { public, secret })
    }

    pub fn public(&self) -> &PublicKey {
        &self.public
    }

    pub fn secret(&self) -> &SecretKey {
        &self.secret
    }
}

/// Source of fresh keypairs for newly registered users
pub trait KeyPairProvider: Send + Sync + 'static {
    fn generate(&self) -> Result<Keypair, KeyError>;
}

/// Generates X25519 keypairs from the operating system's CSPRNG
#[derive(Debug, Clone, Copy, Default)]
pub struct OsKeyPairProvider;

impl KeyPairProvider for OsKeyPairProvider {
    fn generate(&self) -> Result<Keypair, KeyError> {
        Ok(Keypair::from_secret(SecretKey::generate()?))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_keypair_generation() {
        let keypair = OsKeyPairProvider.generate().unwrap();

        let private_hex = keypair.secret().to_hex();
        let recovered_private = SecretKey::from_hex(&private_hex).unwrap();
        assert_eq!(keypair.secret().to_bytes(), recovered_private.to_bytes());

        let public_hex = keypair.public().to_hex();
        let recovered_public = PublicKey::from_hex(&public_hex).unwrap();
        assert_eq!(*keypair.public(), recovered_public);
    }

    #[test]
    fn test_generated_keys_differ() {
        let a = OsKeyPairProvider.generate().unwrap();
        let b = OsKeyPairProvider.generate().unwrap();
        assert_ne!(a.public(), b.public());
    }

    #[test]
    fn test_pem_serialization() {
        let private_key = SecretKey::generate().unwrap();

        let pem = private_key.to_pem();
        let recovered_private = SecretKey::from_pem(&pem).unwrap();
        assert_eq!(private_key.to_bytes(), recovered_private.to_bytes());
        assert_eq!(private_key.public(), recovered_private.public());
    }

    #[test]
    fn test_pem_wrong_tag() {
        let pem = pem::encode(&pem::Pem::new("PUBLIC KEY", [7u8; PRIVATE_KEY_SIZE]));
        assert!(SecretKey::from_pem(&pem).is_err());
    }

    #[test]
    fn test_from_parts_rejects_mismatch() {
        let a = SecretKey::generate().unwrap();
        let b = SecretKey::generate().unwrap();
        assert!(Keypair::from_parts(a.public(), a.clone()).is_ok());
        assert!(Keypair::from_parts(b.public(), a).is_err());
    }

    #[test]
    fn test_secret_debug_is_redacted() {
        let secret = SecretKey::generate().unwrap();
        let rendered = format!("{:?}", Keypair::from_secret(secret.clone()));
        assert!(!rendered.contains(&secret.to_hex()));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_invalid_key_sizes() {
        assert!(PublicKey::try_from(&[1u8; 16][..]).is_err());
        assert!(SecretKey::try_from(&[1u8; 64][..]).is_err());
        assert!(SecretKey::try_from(&[1u8; PRIVATE_KEY_SIZE][..]).is_ok());
    }
}
