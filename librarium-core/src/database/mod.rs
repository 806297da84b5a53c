//! Postgres persistence: pool factory plus repository ports and adapters.

pub mod ports;
pub mod postgres;

pub use ports::{BooksRepository, ContributorsRepository, GenresRepository};
pub use postgres::repositories::{
    PostgresBooksRepository, PostgresContributorsRepository, PostgresGenresRepository,
};

use std::fmt;
use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::error::{CatalogError, Result};

/// Shared database handle: one connection pool and the repositories built
/// on it. Opened once at process start, cloned per request.
#[derive(Clone)]
pub struct CatalogDatabase {
    pool: PgPool,
    books: PostgresBooksRepository,
    genres: PostgresGenresRepository,
    contributors: PostgresContributorsRepository,
}

impl fmt::Debug for CatalogDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CatalogDatabase")
            .field("pool_size", &self.pool.size())
            .field("idle_connections", &self.pool.num_idle())
            .finish()
    }
}

impl CatalogDatabase {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let max_connections = std::env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(10);

        let min_connections = std::env::var("DB_MIN_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(2);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .test_before_acquire(true)
            .connect(connection_string)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to connect to database: {e}")))?;

        info!(
            max_connections,
            min_connections, "connected to PostgreSQL"
        );

        Ok(Self::from_pool(pool))
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self {
            books: PostgresBooksRepository::new(pool.clone()),
            genres: PostgresGenresRepository::new(pool.clone()),
            contributors: PostgresContributorsRepository::new(pool.clone()),
            pool,
        }
    }

    /// Applies the embedded migrations.
    pub async fn migrate(&self) -> Result<()> {
        crate::MIGRATOR
            .run(&self.pool)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to run migrations: {e}")))?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn books(&self) -> &PostgresBooksRepository {
        &self.books
    }

    pub fn genres(&self) -> &PostgresGenresRepository {
        &self.genres
    }

    pub fn contributors(&self) -> &PostgresContributorsRepository {
        &self.contributors
    }
}
