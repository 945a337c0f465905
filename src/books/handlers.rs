use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{BookRequest, BookResponse, ListQuery, Paginated},
    services,
};
use crate::{
    auth::extractors::AuthUser,
    error::ApiError,
    extract::{ValidJson, ValidPath, ValidQuery},
    state::AppState,
};

pub fn book_routes() -> Router<AppState> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
}

#[instrument(skip(state))]
pub async fn list_books(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    ValidQuery(q): ValidQuery<ListQuery>,
) -> Result<Json<Paginated<BookResponse>>, ApiError> {
    services::list_books(&state, account_id, q).await.map(Json)
}

#[instrument(skip(state))]
pub async fn get_book(
    State(state): State<AppState>,
    AuthUser(_account_id): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    services::get_book(&state, id).await.map(Json)
}

#[instrument(skip(state, payload))]
pub async fn create_book(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    ValidJson(payload): ValidJson<BookRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let book = services::create_book(&state, account_id, payload).await?;
    let location = format!("/books/{}", book.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(book)))
}

#[instrument(skip(state, payload))]
pub async fn update_book(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    ValidPath(id): ValidPath<i64>,
    ValidJson(payload): ValidJson<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    services::update_book(&state, account_id, id, payload)
        .await
        .map(Json)
}

#[instrument(skip(state))]
pub async fn delete_book(
    State(state): State<AppState>,
    AuthUser(account_id): AuthUser,
    ValidPath(id): ValidPath<i64>,
) -> Result<StatusCode, ApiError> {
    services::delete_book(&state, account_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
