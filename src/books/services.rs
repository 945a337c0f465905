use tracing::{info, warn};

use super::{
    dto::{BookRequest, BookResponse, ListQuery, Paginated},
    repo::BookRepo,
    repo_types::{Book, BookFields, BookFilter},
};
use crate::{
    error::ApiError,
    state::AppState,
    validation::{check_len, check_optional_len, non_blank},
};

/// Only the owner may update or delete a book.
pub fn authorize_mutation(caller_id: i64, book: &Book) -> Result<(), ApiError> {
    if book.user_id == caller_id {
        return Ok(());
    }
    warn!(caller_id, book_id = book.id, owner_id = book.user_id, "mutation by non-owner denied");
    Err(ApiError::Forbidden(
        "You can only modify books you own".into(),
    ))
}

/// ISBNs compare literally. `exclude_id` is the book being updated.
pub async fn ensure_isbn_available(
    books: &dyn BookRepo,
    isbn: Option<&str>,
    exclude_id: Option<i64>,
) -> Result<(), ApiError> {
    let Some(isbn) = isbn else {
        return Ok(());
    };
    if books.isbn_taken(isbn, exclude_id).await? {
        return Err(ApiError::Conflict(
            "A book with this ISBN already exists".into(),
        ));
    }
    Ok(())
}

fn validate(req: BookRequest) -> Result<BookFields, ApiError> {
    let title = req.title.trim().to_string();
    let author = req.author.trim().to_string();
    let fields = BookFields {
        title,
        author,
        description: non_blank(req.description),
        isbn: non_blank(req.isbn),
        published_year: req.published_year,
        image_url: non_blank(req.image_url),
    };

    check_len("Title", &fields.title, 1, 200)?;
    check_len("Author", &fields.author, 1, 150)?;
    check_optional_len("Description", fields.description.as_deref(), 1000)?;
    check_optional_len("ISBN", fields.isbn.as_deref(), 20)?;
    check_optional_len("Image URL", fields.image_url.as_deref(), 500)?;
    if let Some(year) = fields.published_year {
        if !(1000..=2100).contains(&year) {
            return Err(ApiError::validation(
                "Published year must be between 1000 and 2100",
            ));
        }
    }
    Ok(fields)
}

async fn load(state: &AppState, id: i64) -> Result<Book, ApiError> {
    state
        .books
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))
}

pub async fn list_books(
    state: &AppState,
    caller_id: i64,
    query: ListQuery,
) -> Result<Paginated<BookResponse>, ApiError> {
    let (page, page_size) = query.normalized();
    let filter = BookFilter {
        owner_id: query.my_books_only.then_some(caller_id),
        search: non_blank(query.search),
        limit: page_size,
        offset: (page - 1).saturating_mul(page_size),
    };

    let (rows, total) = state.books.list(&filter).await?;
    let data = rows.into_iter().map(BookResponse::from).collect();
    Ok(Paginated::new(data, page, page_size, total))
}

/// Any authenticated caller may read any book.
pub async fn get_book(state: &AppState, id: i64) -> Result<BookResponse, ApiError> {
    load(state, id).await.map(BookResponse::from)
}

pub async fn create_book(
    state: &AppState,
    caller_id: i64,
    req: BookRequest,
) -> Result<BookResponse, ApiError> {
    let fields = validate(req)?;
    ensure_isbn_available(state.books.as_ref(), fields.isbn.as_deref(), None).await?;

    let book = state.books.create(caller_id, fields).await?;
    info!(book_id = book.id, owner_id = caller_id, title = %book.title, "book created");
    Ok(book.into())
}

pub async fn update_book(
    state: &AppState,
    caller_id: i64,
    id: i64,
    req: BookRequest,
) -> Result<BookResponse, ApiError> {
    let fields = validate(req)?;
    let existing = load(state, id).await?;
    authorize_mutation(caller_id, &existing)?;

    if fields.isbn != existing.isbn {
        ensure_isbn_available(state.books.as_ref(), fields.isbn.as_deref(), Some(id)).await?;
    }

    // Last write wins if two owners' requests race; no version check.
    let book = state
        .books
        .update(id, fields)
        .await?
        .ok_or_else(|| ApiError::not_found("Book not found"))?;
    info!(book_id = id, owner_id = caller_id, "book updated");
    Ok(book.into())
}

pub async fn delete_book(state: &AppState, caller_id: i64, id: i64) -> Result<(), ApiError> {
    let existing = load(state, id).await?;
    authorize_mutation(caller_id, &existing)?;

    if !state.books.delete(id).await? {
        return Err(ApiError::not_found("Book not found"));
    }
    info!(book_id = id, owner_id = caller_id, "book deleted");
    Ok(())
}
