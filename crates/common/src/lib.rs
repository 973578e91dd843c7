/**
 * Cryptographic types and operations.
 *  - Per-user X25519 keypairs
 *  - Sealing payloads to a public key
 */
pub mod crypto;
/**
 * Draw numbers, the sealed/revealed draw records
 *  and the codec between them.
 */
pub mod draw;
/**
 * User-facing operations: registration,
 *  submitting and reviewing draws.
 */
pub mod lottery;
/**
 * Round lifecycle state machine and the
 *  settlement algorithm.
 */
pub mod round;
/**
 * Persistence boundary for users and draws,
 *  plus an in-memory implementation.
 */
pub mod store;
pub mod user;

pub mod prelude {
    pub use crate::crypto::{Keypair, PublicKey, SecretKey};
    pub use crate::draw::{DrawNumbers, RevealedDraw, SealedDraw};
    pub use crate::lottery::{Lottery, LotteryError};
    pub use crate::round::{RoundEngine, RoundError, RoundState, Settlement, Winner};
    pub use crate::store::{DrawFilter, DrawStore, MemoryDrawStore, StoreError};
    pub use crate::user::{Registration, Role, User};
}
