use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// Book row joined with its owner's username.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Book {
    pub id: i64,
    pub user_id: i64, // owner, fixed at creation
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub image_url: Option<String>,
    pub created_at: OffsetDateTime,
    pub updated_at: Option<OffsetDateTime>,
    pub owner_username: Option<String>,
}

/// Validated, mutable fields of a book. Blank optionals are already `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub published_year: Option<i32>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookFilter {
    pub owner_id: Option<i64>,
    pub search: Option<String>,
    pub limit: i64,
    pub offset: i64,
}
