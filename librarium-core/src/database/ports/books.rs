use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::{Book, BookPatch, NewBook};
use crate::error::Result;
use crate::query::{BookPage, BookQuery};

/// Book reads and transactional writes, including the genre and
/// contributor-role association rows owned by each book.
#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Filtered, sorted, paginated listing with eagerly hydrated
    /// associations and a pagination-independent total.
    async fn list(&self, query: &BookQuery) -> Result<BookPage>;

    async fn get(&self, id: Uuid) -> Result<Book>;

    /// Inserts the book row and all association rows in one transaction.
    /// Any unknown genre or contributor id fails the whole call with
    /// `NotFound` and nothing is persisted.
    async fn create(&self, book: &NewBook) -> Result<Book>;

    /// Applies only the supplied fields. A supplied association list
    /// replaces the existing set wholesale within the same transaction.
    async fn update(&self, id: Uuid, patch: &BookPatch) -> Result<Book>;

    /// Deletes the book row; cascades remove its association rows.
    /// Deleting an id that does not exist reports `NotFound`.
    async fn delete(&self, id: Uuid) -> Result<()>;
}
