pub mod book_handlers;
pub mod contributor_handlers;
pub mod genre_handlers;
