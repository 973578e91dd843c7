//! Sealing and opening of draw numbers
//!
//! Numbers are serialized canonically (ascending, space separated) before
//! sealing, so two submissions of the same set in different orders open to
//! equal values.

use crate::crypto::{Ciphertext, DecryptionError, EncryptionError, PublicKey, SecretKey};

use super::numbers::DrawNumbers;

/// Seal a number set to `recipient`
pub fn encrypt(numbers: &DrawNumbers, recipient: &PublicKey) -> Result<Ciphertext, EncryptionError> {
    Ciphertext::seal(&numbers.to_canonical_bytes(), recipient)
}

/// Open a sealed number set with the owner's secret key
///
/// The result is a fresh value; nothing stored is touched. Plaintext that
/// does not parse as a valid draw is reported as malformed rather than
/// returned.
pub fn decrypt(ciphertext: &Ciphertext, secret: &SecretKey) -> Result<DrawNumbers, DecryptionError> {
    let plaintext = ciphertext.open(secret)?;
    let text = std::str::from_utf8(&plaintext)
        .map_err(|_| DecryptionError::Malformed("draw plaintext is not utf-8".to_string()))?;
    text.parse()
        .map_err(|e| DecryptionError::Malformed(format!("draw plaintext: {}", e)))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::crypto::{KeyPairProvider, OsKeyPairProvider};

    #[test]
    fn test_roundtrip_is_order_independent() {
        let keypair = OsKeyPairProvider.generate().unwrap();
        let submitted = DrawNumbers::new([51, 3, 59, 22, 17, 40]).unwrap();

        let sealed = encrypt(&submitted, keypair.public()).unwrap();
        let opened = decrypt(&sealed, keypair.secret()).unwrap();

        assert_eq!(opened, DrawNumbers::new([3, 17, 22, 40, 51, 59]).unwrap());
    }

    #[test]
    fn test_wrong_key_never_yields_numbers() {
        let owner = OsKeyPairProvider.generate().unwrap();
        let numbers = DrawNumbers::new([1, 2, 3, 4, 5, 6]).unwrap();
        let sealed = encrypt(&numbers, owner.public()).unwrap();

        for _ in 0..16 {
            let stranger = OsKeyPairProvider.generate().unwrap();
            assert!(matches!(
                decrypt(&sealed, stranger.secret()),
                Err(DecryptionError::WrongKey)
            ));
        }
    }

    #[test]
    fn test_non_draw_plaintext_is_malformed() {
        let keypair = OsKeyPairProvider.generate().unwrap();
        let sealed = Ciphertext::seal(b"1 2 3", keypair.public()).unwrap();
        assert!(matches!(
            decrypt(&sealed, keypair.secret()),
            Err(DecryptionError::Malformed(_))
        ));
    }
}
