use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{NewUser, User};

/// Sequence name for user identifiers in the ids table.
pub const USER_SEQUENCE: &str = "user";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),
    #[error("identifier {0} already taken")]
    IdentifierCollision(i64),
    #[error("email already taken")]
    EmailTaken,
}

/// Persistence for user records.
///
/// `create` allocates the identifier itself; the allocation is a single
/// atomic increment in the backing store and is never rolled back.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Bump the counter for `sequence` and return the new value. An absent
    /// counter starts at zero.
    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError>;
    async fn create(&self, user: NewUser) -> Result<User, StoreError>;
    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError>;
    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    users_table: String,
    ids_table: String,
}

impl PgUserStore {
    /// Table names are interpolated into SQL and must already be validated identifiers.
    pub fn new(pool: PgPool, users_table: impl Into<String>, ids_table: impl Into<String>) -> Self {
        Self {
            pool,
            users_table: users_table.into(),
            ids_table: ids_table.into(),
        }
    }

    /// Creates the configured tables if they are missing.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        for sql in self.schema() {
            sqlx::query(&sql).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn schema(&self) -> [String; 2] {
        [
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {users} (
                    user_id    BIGINT PRIMARY KEY,
                    name       TEXT   NOT NULL,
                    email      TEXT   NOT NULL UNIQUE,
                    password   TEXT   NOT NULL,
                    created_at BIGINT NOT NULL,
                    updated_at BIGINT NOT NULL
                )
                "#,
                users = self.users_table
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {ids} (
                    sequence TEXT   PRIMARY KEY,
                    next     BIGINT NOT NULL
                )
                "#,
                ids = self.ids_table
            ),
        ]
    }

    fn select_by(&self, column: &str) -> String {
        format!(
            r#"
            SELECT user_id, name, email, password, created_at, updated_at
            FROM {users}
            WHERE {column} = $1
            LIMIT 1
            "#,
            users = self.users_table
        )
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn next_id(&self, sequence: &str) -> Result<i64, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {ids} (sequence, next)
            VALUES ($1, 1)
            ON CONFLICT (sequence) DO UPDATE SET next = {ids}.next + 1
            RETURNING next
            "#,
            ids = self.ids_table
        );
        let id = sqlx::query_scalar::<_, i64>(&sql)
            .bind(sequence)
            .fetch_one(&self.pool)
            .await?;
        Ok(id)
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let user_id = self.next_id(USER_SEQUENCE).await?;
        let sql = format!(
            r#"
            INSERT INTO {users} (user_id, name, email, password, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id) DO NOTHING
            "#,
            users = self.users_table
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password)
            .bind(user.created_at)
            .bind(user.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::EmailTaken,
                other => StoreError::Unavailable(other),
            })?;

        if result.rows_affected() == 0 {
            return Err(StoreError::IdentifierCollision(user_id));
        }
        Ok(user.with_id(user_id))
    }

    async fn get_by_id(&self, user_id: i64) -> Result<Option<User>, StoreError> {
        let sql = self.select_by("user_id");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let sql = self.select_by("email");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }
}
