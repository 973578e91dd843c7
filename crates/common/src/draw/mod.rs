//! Draw records and the draw codec
//!
//! A draw is six numbers sealed to its owner's public key. The persisted
//! form ([`SealedDraw`]) only ever carries ciphertext; decrypting produces a
//! separate [`RevealedDraw`] value.

pub mod codec;
mod numbers;
mod record;

pub use numbers::{DrawNumbers, DrawNumbersError, MAX_NUMBER, MIN_NUMBER, NUMBERS_PER_DRAW};
pub use record::{DrawId, NewDraw, RevealedDraw, SealedDraw};
