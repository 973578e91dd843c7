use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use super::provider::{DrawFilter, DrawStore, StoreError};
use crate::draw::{DrawId, NewDraw, SealedDraw};
use crate::user::{normalize_email, NewUser, Role, User, UserId};

/// In-memory draw store using BTreeMaps
#[derive(Debug, Clone)]
pub struct MemoryDrawStore {
    inner: Arc<RwLock<MemoryDrawStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryDrawStoreInner {
    users: BTreeMap<UserId, User>,
    draws: BTreeMap<DrawId, SealedDraw>,
    last_user_id: UserId,
    last_draw_id: DrawId,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MemoryDrawStoreError {
    #[error("memory store error: {0}")]
    Internal(String),
}

type Result<T> = std::result::Result<T, StoreError<MemoryDrawStoreError>>;

impl MemoryDrawStore {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(MemoryDrawStoreInner::default())),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryDrawStoreInner>> {
        self.inner.read().map_err(|e| {
            StoreError::Provider(MemoryDrawStoreError::Internal(format!(
                "failed to acquire read lock: {}",
                e
            )))
        })
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryDrawStoreInner>> {
        self.inner.write().map_err(|e| {
            StoreError::Provider(MemoryDrawStoreError::Internal(format!(
                "failed to acquire write lock: {}",
                e
            )))
        })
    }
}

impl Default for MemoryDrawStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDrawStoreInner {
    fn latest_master(&self) -> Option<&SealedDraw> {
        self.draws
            .values()
            .filter(|d| d.is_master)
            .max_by_key(|d| d.round)
    }

    fn push_draw(&mut self, draw: NewDraw) -> SealedDraw {
        self.last_draw_id += 1;
        let sealed = draw.persisted(self.last_draw_id);
        self.draws.insert(sealed.id, sealed.clone());
        sealed
    }
}

#[async_trait]
impl DrawStore for MemoryDrawStore {
    type Error = MemoryDrawStoreError;

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut inner = self.write()?;

        let email = normalize_email(&user.email);
        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::EmailTaken(email));
        }

        inner.last_user_id += 1;
        let mut user = user.persisted(inner.last_user_id);
        user.email = email;
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        let inner = self.read()?;
        Ok(inner.users.get(&id).cloned())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let inner = self.read()?;
        let email = normalize_email(email);
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let inner = self.read()?;
        Ok(inner
            .users
            .values()
            .filter(|u| role.map_or(true, |r| u.role == r))
            .cloned()
            .collect())
    }

    async fn insert_draw(&self, draw: NewDraw) -> Result<SealedDraw> {
        if draw.is_master() {
            return Err(StoreError::Conflict(
                "master draws must be published through replace_master".to_string(),
            ));
        }
        let mut inner = self.write()?;
        if !inner.users.contains_key(&draw.owner()) {
            return Err(StoreError::Conflict(format!(
                "draw owner {} does not exist",
                draw.owner()
            )));
        }
        Ok(inner.push_draw(draw))
    }

    async fn draws(&self, filter: DrawFilter) -> Result<Vec<SealedDraw>> {
        let inner = self.read()?;
        Ok(inner
            .draws
            .values()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect())
    }

    async fn latest_master(&self) -> Result<Option<SealedDraw>> {
        let inner = self.read()?;
        Ok(inner.latest_master().cloned())
    }

    async fn replace_master(&self, previous: Option<DrawId>, draw: NewDraw) -> Result<SealedDraw> {
        if !draw.is_master() {
            return Err(StoreError::Conflict(
                "replacement is not a master draw".to_string(),
            ));
        }
        let mut inner = self.write()?;

        // Check: the master we are retiring is still the stored one
        let stored = inner.latest_master().map(|d| d.id);
        if stored != previous {
            return Err(StoreError::Conflict(format!(
                "expected master draw {:?}, found {:?}",
                previous, stored
            )));
        }

        // Set: retire it and insert the new round's draw
        if let Some(id) = previous {
            inner.draws.remove(&id);
        }
        Ok(inner.push_draw(draw))
    }

    async fn mark_played(&self, id: DrawId) -> Result<()> {
        let mut inner = self.write()?;
        let draw = inner
            .draws
            .get_mut(&id)
            .ok_or(StoreError::DrawNotFound(id))?;

        if !draw.is_master || draw.been_played {
            return Err(StoreError::Conflict(format!(
                "draw {} is not an unplayed master draw",
                id
            )));
        }
        draw.been_played = true;
        Ok(())
    }

    async fn settle_draw(&self, id: DrawId, round: u64, matches_master: bool) -> Result<()> {
        let mut inner = self.write()?;
        let draw = inner
            .draws
            .get_mut(&id)
            .ok_or(StoreError::DrawNotFound(id))?;

        if draw.is_master || draw.been_played {
            return Err(StoreError::Conflict(format!(
                "draw {} is not a pending user draw",
                id
            )));
        }
        draw.been_played = true;
        draw.round = round;
        draw.matches_master = matches_master;
        Ok(())
    }

    async fn delete_draws(&self, filter: DrawFilter) -> Result<u64> {
        let mut inner = self.write()?;
        let before = inner.draws.len();
        inner.draws.retain(|_, d| !filter.matches(d));
        Ok((before - inner.draws.len()) as u64)
    }
}
