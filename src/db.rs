use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

use crate::config::AppConfig;

pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let db = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("connect to database")?;

    sqlx::migrate!("./migrations")
        .run(&db)
        .await
        .context("run migrations")?;

    Ok(db)
}

/// Unique constraint that rejected a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueKey {
    Username,
    Email,
    Isbn,
    Unknown,
}

impl UniqueKey {
    /// Maps a constraint name from `migrations/` to its key.
    pub fn from_constraint(name: Option<&str>) -> Self {
        match name {
            Some("users_username_key") => Self::Username,
            Some("users_email_key") => Self::Email,
            Some("books_isbn_key") => Self::Isbn,
            _ => Self::Unknown,
        }
    }
}

/// Failure of a write that may hit a unique constraint.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate value for {0:?}")]
    Duplicate(UniqueKey),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &e {
            if db_err.is_unique_violation() {
                return Self::Duplicate(UniqueKey::from_constraint(db_err.constraint()));
            }
        }
        Self::Other(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_names_map_to_keys() {
        assert_eq!(
            UniqueKey::from_constraint(Some("users_username_key")),
            UniqueKey::Username
        );
        assert_eq!(
            UniqueKey::from_constraint(Some("users_email_key")),
            UniqueKey::Email
        );
        assert_eq!(
            UniqueKey::from_constraint(Some("books_isbn_key")),
            UniqueKey::Isbn
        );
        assert_eq!(UniqueKey::from_constraint(Some("other")), UniqueKey::Unknown);
        assert_eq!(UniqueKey::from_constraint(None), UniqueKey::Unknown);
    }

    #[test]
    fn non_database_errors_are_not_duplicates() {
        let err: StoreError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, StoreError::Other(_)));
    }
}
