use async_trait::async_trait;

use crate::catalog::Genre;
use crate::error::Result;

#[async_trait]
pub trait GenresRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Genre>>;

    /// Direct creation: a duplicate name is a `Conflict`, unlike the
    /// idempotent import path.
    async fn create(&self, name: &str) -> Result<Genre>;

    /// Upsert-by-name for bulk import: inserts names that do not exist yet
    /// and leaves existing ones untouched. Returns the number of rows
    /// actually inserted. One call is one atomic statement.
    async fn upsert_names(&self, names: &[String]) -> Result<u64>;
}
