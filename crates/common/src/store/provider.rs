use std::fmt::{Debug, Display};

use async_trait::async_trait;

use crate::draw::{DrawId, NewDraw, SealedDraw};
use crate::user::{NewUser, Role, User, UserId};

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError<T> {
    /// Failure inside the backing store
    #[error("unhandled draw store error: {0}")]
    Provider(#[from] T),
    #[error("draw {0} not found")]
    DrawNotFound(DrawId),
    /// A user with this (normalized) email already exists
    #[error("email address already registered: {0}")]
    EmailTaken(String),
    /// A check-and-set precondition did not hold, i.e. somebody else
    ///  changed the record between our read and our write
    #[error("conflict: {0}")]
    Conflict(String),
}

/// Predicate over the stored draw flags
///
/// `None` fields match anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawFilter {
    pub owner: Option<UserId>,
    pub is_master: Option<bool>,
    pub been_played: Option<bool>,
}

impl DrawFilter {
    pub fn owner(mut self, owner: UserId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn master(mut self, is_master: bool) -> Self {
        self.is_master = Some(is_master);
        self
    }

    pub fn played(mut self, been_played: bool) -> Self {
        self.been_played = Some(been_played);
        self
    }

    pub fn matches(&self, draw: &SealedDraw) -> bool {
        self.owner.map_or(true, |o| o == draw.owner)
            && self.is_master.map_or(true, |m| m == draw.is_master)
            && self.been_played.map_or(true, |p| p == draw.been_played)
    }
}

/// Persistence for users and sealed draws
///
/// Implementations must make every method atomic on its own. The
/// check-and-set methods (`replace_master`, `mark_played`, `settle_draw`)
/// are what keeps "at most one unplayed master draw" true when callers race.
#[async_trait]
pub trait DrawStore: Send + Sync + std::fmt::Debug + Clone + 'static {
    type Error: Display + Debug + Send + Sync + 'static;

    /// Persist a new user
    ///
    /// Should fail with `StoreError::EmailTaken` if the email is in use.
    async fn insert_user(&self, user: NewUser) -> Result<User, StoreError<Self::Error>>;

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError<Self::Error>>;

    /// Look a user up by normalized email
    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError<Self::Error>>;

    /// All users, optionally restricted to one role, ordered by id
    async fn users(&self, role: Option<Role>) -> Result<Vec<User>, StoreError<Self::Error>>;

    /// Persist a user draw
    ///
    /// Master draws are rejected with `StoreError::Conflict`; they can only
    ///  enter the store through `replace_master`.
    async fn insert_draw(&self, draw: NewDraw) -> Result<SealedDraw, StoreError<Self::Error>>;

    /// All draws matching `filter`, ordered by id
    async fn draws(&self, filter: DrawFilter) -> Result<Vec<SealedDraw>, StoreError<Self::Error>>;

    /// The master draw with the highest round, played or not
    async fn latest_master(&self) -> Result<Option<SealedDraw>, StoreError<Self::Error>>;

    /// Atomically retire the previous master draw and insert a new one
    ///
    /// # Arguments
    /// * `previous` - the master draw the caller observed, `None` if it saw none
    /// * `draw` - the new master draw
    ///
    /// Should fail with `StoreError::Conflict` if the stored master is not
    ///  `previous`, or if `draw` is not a master draw.
    async fn replace_master(
        &self,
        previous: Option<DrawId>,
        draw: NewDraw,
    ) -> Result<SealedDraw, StoreError<Self::Error>>;

    /// Mark an unplayed master draw as played
    ///
    /// Should fail with `StoreError::Conflict` if the draw is already played
    ///  or is not a master draw.
    async fn mark_played(&self, id: DrawId) -> Result<(), StoreError<Self::Error>>;

    /// Record the settlement outcome of one user draw
    ///
    /// Sets `been_played`, `round` and `matches_master` together. Should
    ///  fail with `StoreError::Conflict` if the draw is a master draw or was
    ///  already settled.
    async fn settle_draw(
        &self,
        id: DrawId,
        round: u64,
        matches_master: bool,
    ) -> Result<(), StoreError<Self::Error>>;

    /// Delete every draw matching `filter`, returning how many were removed
    async fn delete_draws(&self, filter: DrawFilter) -> Result<u64, StoreError<Self::Error>>;

    /// The current winning draw: the master draw that has not been played
    async fn current_master(&self) -> Result<Option<SealedDraw>, StoreError<Self::Error>> {
        let masters = self
            .draws(DrawFilter::default().master(true).played(false))
            .await?;
        Ok(masters.into_iter().next())
    }

    /// User draws still waiting for a round to be settled
    async fn pending_draws(&self) -> Result<Vec<SealedDraw>, StoreError<Self::Error>> {
        self.draws(DrawFilter::default().master(false).played(false))
            .await
    }
}
