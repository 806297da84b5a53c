//! Book endpoints: filtered listing plus transactional create/update/delete.

use axum::http::StatusCode;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use librarium_core::api_types::ApiResponse;
use librarium_core::catalog::{Book, BookPatch, NewBook};
use librarium_core::database::BooksRepository;
use librarium_core::query::{BookPage, BookQuery, DEFAULT_PAGE_SIZE, SortDirection, SortKey};
use serde::Deserialize;
use sqlx::types::Decimal;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::infra::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListBooksQuery {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    pub genre_id: Option<Uuid>,
    pub published_year: Option<i32>,
    pub rating_min: Option<Decimal>,
    pub rating_max: Option<Decimal>,
    pub sort: Option<String>,
    pub direction: Option<String>,
    pub page: Option<i64>,
    pub page_size: Option<i64>,
}

impl ListBooksQuery {
    fn into_book_query(self) -> Result<BookQuery, librarium_core::CatalogError> {
        let sort = match self.sort.as_deref() {
            Some(raw) => SortKey::parse(raw)?,
            None => SortKey::default(),
        };
        let direction = match self.direction.as_deref() {
            Some(raw) => SortDirection::parse(raw)?,
            None => SortDirection::default(),
        };

        Ok(BookQuery {
            search: self.search,
            genre_id: self.genre_id,
            published_year: self.published_year,
            rating_min: self.rating_min,
            rating_max: self.rating_max,
            sort,
            direction,
            page: self.page.unwrap_or(1),
            page_size: self.page_size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<ListBooksQuery>,
) -> AppResult<Json<ApiResponse<BookPage>>> {
    let query = params.into_book_query()?;
    let page = state.db.books().list(&query).await?;
    Ok(Json(ApiResponse::success(page)))
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let book = state.db.books().get(id).await?;
    Ok(Json(ApiResponse::success(book)))
}

pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<NewBook>,
) -> AppResult<(StatusCode, Json<ApiResponse<Book>>)> {
    let book = state.db.books().create(&payload).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(book))))
}

pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<BookPatch>,
) -> AppResult<Json<ApiResponse<Book>>> {
    let book = state.db.books().update(id, &patch).await?;
    Ok(Json(ApiResponse::success(book)))
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.db.books().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
