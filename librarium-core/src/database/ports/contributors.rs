use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::Contributor;
use crate::error::Result;

#[async_trait]
pub trait ContributorsRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Contributor>>;

    async fn get(&self, id: Uuid) -> Result<Contributor>;

    async fn create(&self, full_name: &str) -> Result<Contributor>;
}
