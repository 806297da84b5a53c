use axum::{Router, routing::get};

use crate::catalog::{book_handlers, contributor_handlers, genre_handlers};
use crate::infra::app_state::AppState;

/// Create all v1 API routes
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route(
            "/books",
            get(book_handlers::list_books).post(book_handlers::create_book),
        )
        .route(
            "/books/{id}",
            get(book_handlers::get_book)
                .put(book_handlers::update_book)
                .delete(book_handlers::delete_book),
        )
        .route(
            "/genres",
            get(genre_handlers::list_genres).post(genre_handlers::create_genre),
        )
        .route(
            "/contributors",
            get(contributor_handlers::list_contributors)
                .post(contributor_handlers::create_contributor),
        )
        .route(
            "/contributors/{id}",
            get(contributor_handlers::get_contributor),
        )
}
