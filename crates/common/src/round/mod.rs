//! Round lifecycle: publishing, revealing and settling winning draws
//!
//! ```text
//! NoActiveRound --publish--> Open --settle--> Settling --> NoActiveRound
//!                              ^                  |
//!                              +----publish-------+ (a new round can be
//!                                                    published at any time)
//! ```
//!
//! `publish_round` and `settle_round` both read the current master draw and
//! then change it, so they run under one engine-wide lock. The store's
//! check-and-set methods back this up when several engines share a store.

mod settlement;
mod source;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Mutex;

use crate::crypto::{DecryptionError, EncryptionError};
use crate::draw::{DrawNumbers, NewDraw, RevealedDraw, SealedDraw};
use crate::store::{DrawStore, StoreError};
use crate::user::{User, UserId};

pub use settlement::{Settlement, SettlementFailure, Winner};
pub use source::{FixedNumberSource, NumberSource, OsNumberSource};

/// Default number of user draws settled concurrently
pub const DEFAULT_SETTLE_CONCURRENCY: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum RoundError<T> {
    #[error("draw store error: {0}")]
    Store(#[from] StoreError<T>),
    #[error("{0} is not an administrator")]
    Forbidden(String),
    /// There is no unplayed winning draw to settle
    #[error("current winning draw expired, add a new winning draw for the next round")]
    NoActiveRound,
    /// The round is open but nobody has entered a draw yet
    #[error("no user draws entered for round {0}")]
    NoPendingDraws(u64),
    #[error("random source unavailable: {0}")]
    Random(getrandom::Error),
    #[error("failed to seal winning draw: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("cannot open winning draw of round {round}: {source}")]
    MasterDecryption { round: u64, source: DecryptionError },
    #[error("publisher {0} of the winning draw no longer exists")]
    MissingPublisher(UserId),
}

impl<T> RoundError<T> {
    /// Expected business outcomes that leave the round untouched
    pub fn is_informational(&self) -> bool {
        matches!(self, RoundError::NoActiveRound | RoundError::NoPendingDraws(_))
    }
}

/// Where the lottery is in its round lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    NoActiveRound,
    Open { round: u64 },
    Settling { round: u64 },
}

/// Owns the round lifecycle on top of a [`DrawStore`]
#[derive(Clone)]
pub struct RoundEngine<S: DrawStore> {
    store: S,
    numbers: Arc<dyn NumberSource>,
    lock: Arc<Mutex<()>>,
    // round currently being settled, 0 when idle
    settling: Arc<AtomicU64>,
    settle_concurrency: usize,
}

impl<S: DrawStore> std::fmt::Debug for RoundEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundEngine")
            .field("store", &self.store)
            .field("settle_concurrency", &self.settle_concurrency)
            .finish_non_exhaustive()
    }
}

fn require_admin<T>(identity: &User) -> Result<(), RoundError<T>> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(RoundError::Forbidden(identity.email.clone()))
    }
}

/// Resets the settling marker even if settlement is cancelled midway
struct SettlingGuard<'a>(&'a AtomicU64);

impl<'a> SettlingGuard<'a> {
    fn enter(marker: &'a AtomicU64, round: u64) -> Self {
        marker.store(round, Ordering::SeqCst);
        Self(marker)
    }
}

impl Drop for SettlingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(0, Ordering::SeqCst);
    }
}

impl<S: DrawStore> RoundEngine<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            numbers: Arc::new(OsNumberSource),
            lock: Arc::new(Mutex::new(())),
            settling: Arc::new(AtomicU64::new(0)),
            settle_concurrency: DEFAULT_SETTLE_CONCURRENCY,
        }
    }

    pub fn with_number_source(mut self, numbers: impl NumberSource) -> Self {
        self.numbers = Arc::new(numbers);
        self
    }

    pub fn with_settle_concurrency(mut self, concurrency: usize) -> Self {
        self.settle_concurrency = concurrency.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn state(&self) -> Result<RoundState, RoundError<S::Error>> {
        let settling = self.settling.load(Ordering::SeqCst);
        if settling != 0 {
            return Ok(RoundState::Settling { round: settling });
        }
        Ok(match self.store.current_master().await? {
            Some(master) => RoundState::Open {
                round: master.round,
            },
            None => RoundState::NoActiveRound,
        })
    }

    /// Publish a new winning draw, retiring the previous one
    ///
    /// The previous master draw (settled or not) is deleted and the new
    /// round number is its round plus one; the very first round is 1.
    pub async fn publish_round(&self, admin: &User) -> Result<SealedDraw, RoundError<S::Error>> {
        require_admin(admin)?;
        let _guard = self.lock.lock().await;

        let previous = self.store.latest_master().await?;
        let round = previous.as_ref().map_or(1, |d| d.round + 1);

        let numbers = self.numbers.draw().map_err(RoundError::Random)?;
        let draw = NewDraw::master(admin, &numbers, round)?;
        let published = self
            .store
            .replace_master(previous.as_ref().map(|d| d.id), draw)
            .await?;

        if let Some(previous) = previous.filter(|d| !d.been_played) {
            tracing::info!(
                round = previous.round,
                "discarded winning draw that was never settled"
            );
        }
        tracing::info!(
            round,
            draw_id = published.id,
            admin = %admin.email,
            "published winning draw"
        );
        Ok(published)
    }

    /// Decrypt the current winning draw for `viewer`
    ///
    /// Returns `Ok(None)` when no round is open. Only the admin who
    /// published the draw holds the key that opens it.
    pub async fn reveal_current(
        &self,
        viewer: &User,
    ) -> Result<Option<RevealedDraw>, RoundError<S::Error>> {
        require_admin(viewer)?;
        let Some(master) = self.store.current_master().await? else {
            return Ok(None);
        };
        let revealed = master
            .reveal(viewer.keypair.secret())
            .map_err(|source| RoundError::MasterDecryption {
                round: master.round,
                source,
            })?;
        Ok(Some(revealed))
    }

    /// Match every pending user draw against the current winning draw
    ///
    /// Each draw is decrypted with its owner's key, compared as a set, and
    /// committed on its own. A draw that fails is reported in
    /// [`Settlement::failures`] and stays pending; it does not affect any
    /// other draw.
    pub async fn settle_round(&self, admin: &User) -> Result<Settlement, RoundError<S::Error>> {
        require_admin(admin)?;
        let _guard = self.lock.lock().await;

        let master = self
            .store
            .current_master()
            .await?
            .ok_or(RoundError::NoActiveRound)?;
        let pending = self.store.pending_draws().await?;
        if pending.is_empty() {
            return Err(RoundError::NoPendingDraws(master.round));
        }

        // the winning draw was sealed to whoever published it
        let publisher = self
            .store
            .user(master.owner)
            .await?
            .ok_or(RoundError::MissingPublisher(master.owner))?;
        let winning = master
            .reveal(publisher.keypair.secret())
            .map_err(|source| RoundError::MasterDecryption {
                round: master.round,
                source,
            })?
            .numbers;

        let round = master.round;
        let _settling = SettlingGuard::enter(&self.settling, round);
        self.store.mark_played(master.id).await?;

        tracing::info!(round, pending = pending.len(), "settling round");

        let outcomes: Vec<_> = stream::iter(pending)
            .map(|draw| self.settle_one(draw, &winning, round))
            .buffered(self.settle_concurrency)
            .collect()
            .await;

        let mut settlement = Settlement::new(round);
        for outcome in outcomes {
            match outcome {
                Ok(winner) => {
                    settlement.settled += 1;
                    settlement.winners.extend(winner);
                }
                Err(failure) => {
                    tracing::warn!(
                        round,
                        draw_id = failure.draw_id,
                        reason = %failure.reason,
                        "draw left unsettled"
                    );
                    settlement.failures.push(failure);
                }
            }
        }

        tracing::info!(
            round,
            settled = settlement.settled,
            winners = settlement.winners.len(),
            failures = settlement.failures.len(),
            "round settled"
        );
        Ok(settlement)
    }

    async fn settle_one(
        &self,
        draw: SealedDraw,
        winning: &DrawNumbers,
        round: u64,
    ) -> Result<Option<Winner>, SettlementFailure> {
        let draw_id = draw.id;
        let fail = move |reason: String| SettlementFailure { draw_id, reason };

        let owner = match self.store.user(draw.owner).await {
            Ok(Some(owner)) => owner,
            Ok(None) => return Err(fail(format!("owner {} not found", draw.owner))),
            Err(e) => return Err(fail(e.to_string())),
        };
        let revealed = draw
            .reveal(owner.keypair.secret())
            .map_err(|e| fail(e.to_string()))?;

        let matches_master = revealed.numbers == *winning;
        self.store
            .settle_draw(draw_id, round, matches_master)
            .await
            .map_err(|e| fail(e.to_string()))?;

        tracing::debug!(round, draw_id, matches_master, "settled draw");
        Ok(matches_master.then(|| Winner {
            round,
            numbers: revealed.numbers,
            user_id: owner.id,
            email: owner.email,
        }))
    }
}
