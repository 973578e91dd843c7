use crate::crypto::{Ciphertext, DecryptionError, EncryptionError, SecretKey};
use crate::user::{User, UserId};

use super::codec;
use super::numbers::DrawNumbers;

pub type DrawId = i64;

/// A draw as it is persisted: numbers are always ciphertext
///
/// This is the only draw type the store accepts or returns. Decrypted
/// numbers live in [`RevealedDraw`], which has no way back into storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedDraw {
    pub id: DrawId,
    pub owner: UserId,
    pub numbers: Ciphertext,
    pub is_master: bool,
    pub been_played: bool,
    pub matches_master: bool,
    pub round: u64,
}

impl SealedDraw {
    /// Decrypt into a detached view with the owner's secret key
    pub fn reveal(&self, secret: &SecretKey) -> Result<RevealedDraw, DecryptionError> {
        Ok(RevealedDraw {
            id: self.id,
            owner: self.owner,
            numbers: codec::decrypt(&self.numbers, secret)?,
            is_master: self.is_master,
            been_played: self.been_played,
            matches_master: self.matches_master,
            round: self.round,
        })
    }
}

/// A draw that has been sealed but not yet persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDraw {
    owner: UserId,
    numbers: Ciphertext,
    is_master: bool,
    round: u64,
}

impl NewDraw {
    /// Seal a user's submission to their own public key
    ///
    /// User draws start unplayed in round 0.
    pub fn user(owner: &User, numbers: &DrawNumbers) -> Result<Self, EncryptionError> {
        Ok(Self {
            owner: owner.id,
            numbers: codec::encrypt(numbers, owner.public_key())?,
            is_master: false,
            round: 0,
        })
    }

    /// Seal a round's winning numbers to the publishing admin's public key
    pub fn master(admin: &User, numbers: &DrawNumbers, round: u64) -> Result<Self, EncryptionError> {
        Ok(Self {
            owner: admin.id,
            numbers: codec::encrypt(numbers, admin.public_key())?,
            is_master: true,
            round,
        })
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn numbers(&self) -> &Ciphertext {
        &self.numbers
    }

    pub fn is_master(&self) -> bool {
        self.is_master
    }

    pub fn round(&self) -> u64 {
        self.round
    }

    /// The stored record for this draw once the store assigned an id
    pub fn persisted(self, id: DrawId) -> SealedDraw {
        SealedDraw {
            id,
            owner: self.owner,
            numbers: self.numbers,
            is_master: self.is_master,
            been_played: false,
            matches_master: false,
            round: self.round,
        }
    }
}

/// Transient plaintext view of a draw
///
/// Detached from storage: it can be displayed or compared, but no store
/// operation accepts it, so edits can never overwrite stored ciphertext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevealedDraw {
    pub id: DrawId,
    pub owner: UserId,
    pub numbers: DrawNumbers,
    pub is_master: bool,
    pub been_played: bool,
    pub matches_master: bool,
    pub round: u64,
}
