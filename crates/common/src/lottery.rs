use std::sync::Arc;

use crate::crypto::{EncryptionError, KeyError, KeyPairProvider, OsKeyPairProvider};
use crate::draw::{DrawNumbers, NewDraw, RevealedDraw, SealedDraw};
use crate::round::{NumberSource, RoundEngine};
use crate::store::{DrawFilter, DrawStore, StoreError};
use crate::user::{NewUser, Registration, Role, User};

#[derive(Debug, thiserror::Error)]
pub enum LotteryError<T> {
    #[error("draw store error: {0}")]
    Store(#[from] StoreError<T>),
    /// Keypair generation failed; the registration is abandoned
    #[error("key generation error: {0}")]
    KeyGeneration(#[from] KeyError),
    /// The draw could not be sealed; the submission is rejected
    #[error("encryption error: {0}")]
    Encryption(#[from] EncryptionError),
    #[error("no user registered with email {0}")]
    UnknownUser(String),
    #[error("{0} is not an administrator")]
    Forbidden(String),
    #[error("an administrator already exists")]
    AlreadyBootstrapped,
}

/// The lottery's user-facing operations over a [`DrawStore`]
///
/// Every operation takes the acting identity explicitly; nothing is read
/// from ambient session state.
#[derive(Clone)]
pub struct Lottery<S: DrawStore> {
    store: S,
    keys: Arc<dyn KeyPairProvider>,
    rounds: RoundEngine<S>,
}

impl<S: DrawStore> std::fmt::Debug for Lottery<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lottery")
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

impl<S: DrawStore> Lottery<S> {
    pub fn new(store: S) -> Self {
        Self {
            rounds: RoundEngine::new(store.clone()),
            store,
            keys: Arc::new(OsKeyPairProvider),
        }
    }

    pub fn with_key_provider(mut self, keys: impl KeyPairProvider) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    pub fn with_number_source(mut self, numbers: impl NumberSource) -> Self {
        self.rounds = self.rounds.with_number_source(numbers);
        self
    }

    pub fn with_settle_concurrency(mut self, concurrency: usize) -> Self {
        self.rounds = self.rounds.with_settle_concurrency(concurrency);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Round lifecycle: publish, reveal, settle
    pub fn rounds(&self) -> &RoundEngine<S> {
        &self.rounds
    }

    /// Resolve the acting identity for an email address
    pub async fn identity(&self, email: &str) -> Result<User, LotteryError<S::Error>> {
        self.store
            .user_by_email(email)
            .await?
            .ok_or_else(|| LotteryError::UnknownUser(email.to_string()))
    }

    async fn register(
        &self,
        registration: Registration,
        role: Role,
    ) -> Result<User, LotteryError<S::Error>> {
        let keypair = self.keys.generate()?;
        let user = self
            .store
            .insert_user(NewUser::new(registration, role, keypair))
            .await?;
        tracing::info!(user_id = user.id, email = %user.email, role = %user.role, "registered user");
        Ok(user)
    }

    /// Sign up an ordinary player
    pub async fn register_user(
        &self,
        registration: Registration,
    ) -> Result<User, LotteryError<S::Error>> {
        self.register(registration, Role::User).await
    }

    /// Register another administrator on behalf of an existing one
    pub async fn register_admin(
        &self,
        acting: &User,
        registration: Registration,
    ) -> Result<User, LotteryError<S::Error>> {
        require_admin(acting)?;
        self.register(registration, Role::Admin).await
    }

    /// Create the first administrator of an empty lottery
    pub async fn bootstrap_admin(
        &self,
        registration: Registration,
    ) -> Result<User, LotteryError<S::Error>> {
        if !self.store.users(Some(Role::Admin)).await?.is_empty() {
            return Err(LotteryError::AlreadyBootstrapped);
        }
        self.register(registration, Role::Admin).await
    }

    pub async fn users(
        &self,
        acting: &User,
        role: Option<Role>,
    ) -> Result<Vec<User>, LotteryError<S::Error>> {
        require_admin(acting)?;
        Ok(self.store.users(role).await?)
    }

    /// Seal a draw to the submitter's public key and store it
    pub async fn submit_draw(
        &self,
        user: &User,
        numbers: &DrawNumbers,
    ) -> Result<SealedDraw, LotteryError<S::Error>> {
        let draw = self.store.insert_draw(NewDraw::user(user, numbers)?).await?;
        tracing::info!(user_id = user.id, draw_id = draw.id, "draw submitted");
        Ok(draw)
    }

    /// The user's draws still waiting for a round, decrypted for display
    pub async fn playable_draws(
        &self,
        user: &User,
    ) -> Result<Vec<RevealedDraw>, LotteryError<S::Error>> {
        self.reveal_own(user, false).await
    }

    /// The user's settled draws and their outcomes, decrypted for display
    pub async fn played_draws(
        &self,
        user: &User,
    ) -> Result<Vec<RevealedDraw>, LotteryError<S::Error>> {
        self.reveal_own(user, true).await
    }

    /// Delete the user's settled draws so they can play again
    pub async fn clear_played(&self, user: &User) -> Result<u64, LotteryError<S::Error>> {
        let removed = self
            .store
            .delete_draws(
                DrawFilter::default()
                    .owner(user.id)
                    .master(false)
                    .played(true),
            )
            .await?;
        tracing::info!(user_id = user.id, removed, "cleared played draws");
        Ok(removed)
    }

    async fn reveal_own(
        &self,
        user: &User,
        been_played: bool,
    ) -> Result<Vec<RevealedDraw>, LotteryError<S::Error>> {
        let draws = self
            .store
            .draws(
                DrawFilter::default()
                    .owner(user.id)
                    .master(false)
                    .played(been_played),
            )
            .await?;
        // a draw that does not open with the owner's key is left out, not fatal
        Ok(draws
            .iter()
            .filter_map(|d| match d.reveal(user.keypair.secret()) {
                Ok(revealed) => Some(revealed),
                Err(e) => {
                    tracing::warn!(user_id = user.id, draw_id = d.id, error = %e, "skipping unreadable draw");
                    None
                }
            })
            .collect())
    }
}

fn require_admin<T>(identity: &User) -> Result<(), LotteryError<T>> {
    if identity.is_admin() {
        Ok(())
    } else {
        Err(LotteryError::Forbidden(identity.email.clone()))
    }
}
