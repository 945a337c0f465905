use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Account, NewAccount, ProfileUpdate};
use crate::db::StoreError;

/// Persistence for accounts. Uniqueness of username and email is enforced by
/// the store itself and reported as [`StoreError::Duplicate`].
#[async_trait]
pub trait AccountRepo: Send + Sync {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Account>>;
    /// Matches username or email; a username match takes precedence.
    async fn find_by_login(&self, username_or_email: &str) -> anyhow::Result<Option<Account>>;
    async fn username_exists(&self, username: &str) -> anyhow::Result<bool>;
    async fn email_exists(&self, email: &str) -> anyhow::Result<bool>;
    async fn create(&self, new: NewAccount) -> Result<Account, StoreError>;
    async fn record_login(&self, id: i64) -> anyhow::Result<Option<Account>>;
    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError>;
}

const ACCOUNT_COLUMNS: &str =
    "id, username, email, password_hash, first_name, last_name, created_at, last_login_at";

#[derive(Clone)]
pub struct PgAccountRepo {
    db: PgPool,
}

impl PgAccountRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountRepo for PgAccountRepo {
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Account>> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1");
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }

    async fn find_by_login(&self, username_or_email: &str) -> anyhow::Result<Option<Account>> {
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS}
            FROM users
            WHERE username = $1 OR email = lower($1)
            ORDER BY (username = $1) DESC
            LIMIT 1
            "#
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(username_or_email)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }

    async fn username_exists(&self, username: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn email_exists(&self, email: &str) -> anyhow::Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.db)
                .await?;
        Ok(exists)
    }

    async fn create(&self, new: NewAccount) -> Result<Account, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(&new.username)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(&new.first_name)
            .bind(&new.last_name)
            .fetch_one(&self.db)
            .await?;
        Ok(account)
    }

    async fn record_login(&self, id: i64) -> anyhow::Result<Option<Account>> {
        let sql = format!(
            "UPDATE users SET last_login_at = now() WHERE id = $1 RETURNING {ACCOUNT_COLUMNS}"
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }

    async fn update_profile(
        &self,
        id: i64,
        update: ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let sql = format!(
            r#"
            UPDATE users
            SET email = $2, first_name = $3, last_name = $4
            WHERE id = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        );
        let account = sqlx::query_as::<_, Account>(&sql)
            .bind(id)
            .bind(&update.email)
            .bind(&update.first_name)
            .bind(&update.last_name)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }
}
