use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Genre, validate_non_empty};
use crate::database::ports::genres::GenresRepository;
use crate::error::{CatalogError, Result};

/// PostgreSQL-backed implementation of the `GenresRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresGenresRepository {
    pool: PgPool,
}

impl PostgresGenresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GenresRepository for PostgresGenresRepository {
    async fn list(&self) -> Result<Vec<Genre>> {
        let genres: Vec<Genre> = sqlx::query_as(
            "SELECT id, name, created_at, updated_at FROM genres ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to list genres: {e}")))?;

        Ok(genres)
    }

    async fn create(&self, name: &str) -> Result<Genre> {
        validate_non_empty("name", name)?;

        let genre: Genre = sqlx::query_as(
            r#"
            INSERT INTO genres (id, name)
            VALUES ($1, $2)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error()
                && db_err.constraint() == Some("genres_name_key")
            {
                return CatalogError::Conflict(format!("genre {name:?} already exists"));
            }
            CatalogError::Storage(format!("failed to create genre: {e}"))
        })?;

        info!("Created genre: {} ({})", genre.name, genre.id);
        Ok(genre)
    }

    async fn upsert_names(&self, names: &[String]) -> Result<u64> {
        if names.is_empty() {
            return Ok(0);
        }

        let ids: Vec<Uuid> = names.iter().map(|_| Uuid::new_v4()).collect();
        let result = sqlx::query(
            r#"
            INSERT INTO genres (id, name)
            SELECT * FROM UNNEST($1::uuid[], $2::text[])
            ON CONFLICT (name) DO NOTHING
            "#,
        )
        .bind(&ids)
        .bind(names)
        .execute(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to upsert genres: {e}")))?;

        Ok(result.rows_affected())
    }
}
