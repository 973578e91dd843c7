use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite};
use time::OffsetDateTime;

use common::crypto::{Ciphertext, Keypair};
use common::draw::{DrawId, NewDraw, SealedDraw};
use common::store::{DrawFilter, DrawStore, StoreError};
use common::user::{normalize_email, NewUser, Role, User, UserId};

use crate::database::types::{DBool, DKey, DRole};
use crate::database::Database;

type Result<T> = std::result::Result<T, StoreError<sqlx::Error>>;

const USER_COLUMNS: &str =
    "SELECT id, email, firstname, lastname, role, public_key, secret_key, registered_on FROM users";
const DRAW_COLUMNS: &str =
    "SELECT id, owner_id, numbers, is_master, been_played, matches_master, round FROM draws";

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    firstname: String,
    lastname: String,
    role: DRole,
    public_key: DKey,
    secret_key: DKey,
    registered_on: OffsetDateTime,
}

impl TryFrom<UserRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: UserRow) -> std::result::Result<Self, Self::Error> {
        let keypair = Keypair::from_parts(row.public_key.into(), row.secret_key.into())
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;
        Ok(User {
            id: row.id,
            email: row.email,
            firstname: row.firstname,
            lastname: row.lastname,
            role: row.role.into(),
            keypair,
            registered_on: row.registered_on,
        })
    }
}

#[derive(sqlx::FromRow)]
struct DrawRow {
    id: i64,
    owner_id: i64,
    numbers: Vec<u8>,
    is_master: DBool,
    been_played: DBool,
    matches_master: DBool,
    round: i64,
}

impl TryFrom<DrawRow> for SealedDraw {
    type Error = sqlx::Error;

    fn try_from(row: DrawRow) -> std::result::Result<Self, Self::Error> {
        let round = u64::try_from(row.round)
            .map_err(|e| sqlx::Error::Decode(format!("draw {}: {}", row.id, e).into()))?;
        Ok(SealedDraw {
            id: row.id,
            owner: row.owner_id,
            numbers: Ciphertext::from(row.numbers),
            is_master: row.is_master.into(),
            been_played: row.been_played.into(),
            matches_master: row.matches_master.into(),
            round,
        })
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &DrawFilter) {
    if let Some(owner) = filter.owner {
        query.push(" AND owner_id = ").push_bind(owner);
    }
    if let Some(is_master) = filter.is_master {
        query.push(" AND is_master = ").push_bind(DBool::from(is_master));
    }
    if let Some(been_played) = filter.been_played {
        query.push(" AND been_played = ").push_bind(DBool::from(been_played));
    }
}

fn db_round(round: u64) -> Result<i64> {
    i64::try_from(round).map_err(|_| StoreError::Conflict(format!("round {} out of range", round)))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_error) if db_error.is_unique_violation())
}

impl Database {
    async fn insert_draw_row(
        conn: &mut sqlx::SqliteConnection,
        draw: NewDraw,
    ) -> std::result::Result<SealedDraw, sqlx::Error> {
        let round = i64::try_from(draw.round())
            .map_err(|e| sqlx::Error::Encode(Box::new(e)))?;
        let id = sqlx::query(
            r#"
            INSERT INTO draws (owner_id, numbers, is_master, been_played, matches_master, round)
            VALUES (?, ?, ?, 0, 0, ?)
            "#,
        )
        .bind(draw.owner())
        .bind(draw.numbers().bytes())
        .bind(DBool::from(draw.is_master()))
        .bind(round)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();
        Ok(draw.persisted(id))
    }

    /// Distinguish a missing draw from a failed precondition after an
    ///  update matched no rows
    async fn missing_or_conflict(&self, id: DrawId, conflict: String) -> StoreError<sqlx::Error> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM draws WHERE id = ?")
            .bind(id)
            .fetch_one(&**self)
            .await;
        match exists {
            Ok(0) => StoreError::DrawNotFound(id),
            Ok(_) => StoreError::Conflict(conflict),
            Err(e) => StoreError::Provider(e),
        }
    }
}

#[async_trait]
impl DrawStore for Database {
    type Error = sqlx::Error;

    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let email = normalize_email(&user.email);
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, firstname, lastname, role, public_key, secret_key, registered_on)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&email)
        .bind(&user.firstname)
        .bind(&user.lastname)
        .bind(DRole::from(user.role))
        .bind(DKey::from(user.keypair.public()))
        .bind(DKey::from(user.keypair.secret()))
        .bind(user.registered_on)
        .execute(&**self)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::EmailTaken(email.clone())
            } else {
                StoreError::Provider(e)
            }
        })?;

        let mut user = user.persisted(result.last_insert_rowid());
        user.email = email;
        tracing::debug!(user_id = user.id, "inserted user");
        Ok(user)
    }

    async fn user(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE id = ?", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&**self)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{} WHERE email = ?", USER_COLUMNS))
            .bind(normalize_email(email))
            .fetch_optional(&**self)
            .await?;
        Ok(row.map(User::try_from).transpose()?)
    }

    async fn users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut query = QueryBuilder::<Sqlite>::new(USER_COLUMNS);
        if let Some(role) = role {
            query.push(" WHERE role = ").push_bind(DRole::from(role));
        }
        query.push(" ORDER BY id");

        let rows = query.build_query_as::<UserRow>().fetch_all(&**self).await?;
        Ok(rows
            .into_iter()
            .map(User::try_from)
            .collect::<std::result::Result<_, _>>()?)
    }

    async fn insert_draw(&self, draw: NewDraw) -> Result<SealedDraw> {
        if draw.is_master() {
            return Err(StoreError::Conflict(
                "master draws must be published through replace_master".to_string(),
            ));
        }
        let owner = draw.owner();
        let mut conn = self.acquire().await?;
        Database::insert_draw_row(&mut *conn, draw)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db_error) if db_error.is_foreign_key_violation() => {
                    StoreError::Conflict(format!("draw owner {} does not exist", owner))
                }
                e => StoreError::Provider(e),
            })
    }

    async fn draws(&self, filter: DrawFilter) -> Result<Vec<SealedDraw>> {
        let mut query = QueryBuilder::<Sqlite>::new(DRAW_COLUMNS);
        query.push(" WHERE 1 = 1");
        push_filter(&mut query, &filter);
        query.push(" ORDER BY id");

        let rows = query.build_query_as::<DrawRow>().fetch_all(&**self).await?;
        tracing::debug!(?filter, count = rows.len(), "queried draws");
        Ok(rows
            .into_iter()
            .map(SealedDraw::try_from)
            .collect::<std::result::Result<_, _>>()?)
    }

    async fn latest_master(&self) -> Result<Option<SealedDraw>> {
        let row = sqlx::query_as::<_, DrawRow>(&format!(
            "{} WHERE is_master = 1 ORDER BY round DESC LIMIT 1",
            DRAW_COLUMNS
        ))
        .fetch_optional(&**self)
        .await?;
        Ok(row.map(SealedDraw::try_from).transpose()?)
    }

    async fn replace_master(&self, previous: Option<DrawId>, draw: NewDraw) -> Result<SealedDraw> {
        if !draw.is_master() {
            return Err(StoreError::Conflict(
                "replacement is not a master draw".to_string(),
            ));
        }
        let mut tx = self.begin().await?;

        // Check and retire in one write: the master we observed is still the stored one
        if let Some(id) = previous {
            let retired = sqlx::query("DELETE FROM draws WHERE id = ? AND is_master = 1")
                .bind(id)
                .execute(&mut *tx)
                .await?
                .rows_affected();
            if retired == 0 {
                return Err(StoreError::Conflict(format!(
                    "expected master draw {}, it is no longer stored",
                    id
                )));
            }
        }

        // a master we did not observe trips the single-master index
        let published = Database::insert_draw_row(&mut *tx, draw)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!(
                        "expected master draw {:?}, found another",
                        previous
                    ))
                } else {
                    StoreError::Provider(e)
                }
            })?;

        tx.commit().await?;
        Ok(published)
    }

    async fn mark_played(&self, id: DrawId) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE draws SET been_played = 1 WHERE id = ? AND is_master = 1 AND been_played = 0",
        )
        .bind(id)
        .execute(&**self)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(self
                .missing_or_conflict(id, format!("draw {} is not an unplayed master draw", id))
                .await);
        }
        Ok(())
    }

    async fn settle_draw(&self, id: DrawId, round: u64, matches_master: bool) -> Result<()> {
        let updated = sqlx::query(
            r#"
            UPDATE draws
            SET been_played = 1, round = ?, matches_master = ?
            WHERE id = ? AND is_master = 0 AND been_played = 0
            "#,
        )
        .bind(db_round(round)?)
        .bind(DBool::from(matches_master))
        .bind(id)
        .execute(&**self)
        .await?
        .rows_affected();

        if updated == 0 {
            return Err(self
                .missing_or_conflict(id, format!("draw {} is not a pending user draw", id))
                .await);
        }
        Ok(())
    }

    async fn delete_draws(&self, filter: DrawFilter) -> Result<u64> {
        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM draws WHERE 1 = 1");
        push_filter(&mut query, &filter);

        let removed = query.build().execute(&**self).await?.rows_affected();
        tracing::debug!(?filter, removed, "deleted draws");
        Ok(removed)
    }
}
