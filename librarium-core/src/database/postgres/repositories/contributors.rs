use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Contributor, validate_non_empty};
use crate::database::ports::contributors::ContributorsRepository;
use crate::error::{CatalogError, Result};

/// PostgreSQL-backed implementation of the `ContributorsRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresContributorsRepository {
    pool: PgPool,
}

impl PostgresContributorsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContributorsRepository for PostgresContributorsRepository {
    async fn list(&self) -> Result<Vec<Contributor>> {
        let contributors: Vec<Contributor> = sqlx::query_as(
            "SELECT id, full_name, created_at, updated_at FROM contributors ORDER BY full_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to list contributors: {e}")))?;

        Ok(contributors)
    }

    async fn get(&self, id: Uuid) -> Result<Contributor> {
        let contributor: Option<Contributor> = sqlx::query_as(
            "SELECT id, full_name, created_at, updated_at FROM contributors WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to get contributor: {e}")))?;

        contributor.ok_or_else(|| CatalogError::NotFound(format!("contributor {id} not found")))
    }

    async fn create(&self, full_name: &str) -> Result<Contributor> {
        validate_non_empty("full_name", full_name)?;

        let contributor: Contributor = sqlx::query_as(
            r#"
            INSERT INTO contributors (id, full_name)
            VALUES ($1, $2)
            RETURNING id, full_name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(full_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to create contributor: {e}")))?;

        info!(
            "Created contributor: {} ({})",
            contributor.full_name, contributor.id
        );
        Ok(contributor)
    }
}
