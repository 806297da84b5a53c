use std::sync::Arc;

use anyhow::Result;
use axum_test::TestServer;
use librarium_core::database::CatalogDatabase;
use librarium_server::infra::{app_state::AppState, config::Config};
use librarium_server::routes::create_api_router;
use sqlx::PgPool;

/// Builds a test server over a per-test database pool provisioned by
/// `#[sqlx::test]`.
pub fn build_test_server(pool: PgPool) -> Result<TestServer> {
    let config = Config {
        server_host: "127.0.0.1".to_string(),
        server_port: 0,
        database_url: String::new(),
        cors_allowed_origins: vec![],
    };

    let state = AppState {
        db: Arc::new(CatalogDatabase::from_pool(pool)),
        config: Arc::new(config),
    };

    let router = create_api_router().with_state(state);
    TestServer::new(router)
}
