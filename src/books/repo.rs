use async_trait::async_trait;
use sqlx::PgPool;

use super::repo_types::{Book, BookFields, BookFilter};
use crate::db::StoreError;

/// Persistence for catalog entries. A non-null ISBN is unique across all
/// books; the store reports a collision as [`StoreError::Duplicate`].
#[async_trait]
pub trait BookRepo: Send + Sync {
    /// One page of books, newest first, and the total matching count.
    async fn list(&self, filter: &BookFilter) -> anyhow::Result<(Vec<Book>, i64)>;
    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Book>>;
    async fn isbn_taken(&self, isbn: &str, exclude_id: Option<i64>) -> anyhow::Result<bool>;
    async fn create(&self, owner_id: i64, fields: BookFields) -> Result<Book, StoreError>;
    async fn update(&self, id: i64, fields: BookFields) -> Result<Option<Book>, StoreError>;
    async fn delete(&self, id: i64) -> anyhow::Result<bool>;
}

#[derive(Clone)]
pub struct PgBookRepo {
    db: PgPool,
}

impl PgBookRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const SELECT_BOOK: &str = r#"
    SELECT b.id, b.user_id, b.title, b.author, b.description, b.isbn,
           b.published_year, b.image_url, b.created_at, b.updated_at,
           u.username AS owner_username
"#;

// $1 owner filter, $2 search term; either may be NULL.
const FILTER: &str = r#"
    WHERE ($1::BIGINT IS NULL OR b.user_id = $1)
      AND ($2::TEXT IS NULL
           OR strpos(b.title, $2) > 0
           OR strpos(b.author, $2) > 0
           OR strpos(coalesce(b.description, ''), $2) > 0
           OR strpos(coalesce(b.isbn, ''), $2) > 0)
"#;

#[async_trait]
impl BookRepo for PgBookRepo {
    async fn list(&self, filter: &BookFilter) -> anyhow::Result<(Vec<Book>, i64)> {
        let total: i64 = sqlx::query_scalar(&format!("SELECT count(*) FROM books b {FILTER}"))
            .bind(filter.owner_id)
            .bind(filter.search.as_deref())
            .fetch_one(&self.db)
            .await?;

        let sql = format!(
            r#"
            {SELECT_BOOK}
            FROM books b
            LEFT JOIN users u ON u.id = b.user_id
            {FILTER}
            ORDER BY b.created_at DESC, b.id DESC
            LIMIT $3 OFFSET $4
            "#
        );
        let rows = sqlx::query_as::<_, Book>(&sql)
            .bind(filter.owner_id)
            .bind(filter.search.as_deref())
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.db)
            .await?;

        Ok((rows, total))
    }

    async fn find_by_id(&self, id: i64) -> anyhow::Result<Option<Book>> {
        let sql = format!(
            r#"
            {SELECT_BOOK}
            FROM books b
            LEFT JOIN users u ON u.id = b.user_id
            WHERE b.id = $1
            "#
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(book)
    }

    async fn isbn_taken(&self, isbn: &str, exclude_id: Option<i64>) -> anyhow::Result<bool> {
        let taken: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM books
                WHERE isbn = $1 AND ($2::BIGINT IS NULL OR id <> $2)
            )
            "#,
        )
        .bind(isbn)
        .bind(exclude_id)
        .fetch_one(&self.db)
        .await?;
        Ok(taken)
    }

    async fn create(&self, owner_id: i64, fields: BookFields) -> Result<Book, StoreError> {
        let sql = format!(
            r#"
            WITH b AS (
                INSERT INTO books (user_id, title, author, description, isbn, published_year, image_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING *
            )
            {SELECT_BOOK}
            FROM b
            LEFT JOIN users u ON u.id = b.user_id
            "#
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(owner_id)
            .bind(&fields.title)
            .bind(&fields.author)
            .bind(&fields.description)
            .bind(&fields.isbn)
            .bind(fields.published_year)
            .bind(&fields.image_url)
            .fetch_one(&self.db)
            .await?;
        Ok(book)
    }

    async fn update(&self, id: i64, fields: BookFields) -> Result<Option<Book>, StoreError> {
        let sql = format!(
            r#"
            WITH b AS (
                UPDATE books
                SET title = $2, author = $3, description = $4, isbn = $5,
                    published_year = $6, image_url = $7, updated_at = now()
                WHERE id = $1
                RETURNING *
            )
            {SELECT_BOOK}
            FROM b
            LEFT JOIN users u ON u.id = b.user_id
            "#
        );
        let book = sqlx::query_as::<_, Book>(&sql)
            .bind(id)
            .bind(&fields.title)
            .bind(&fields.author)
            .bind(&fields.description)
            .bind(&fields.isbn)
            .bind(fields.published_year)
            .bind(&fields.image_url)
            .fetch_optional(&self.db)
            .await?;
        Ok(book)
    }

    async fn delete(&self, id: i64) -> anyhow::Result<bool> {
        let res = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
