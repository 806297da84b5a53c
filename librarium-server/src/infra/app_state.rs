use std::{fmt, sync::Arc};

use librarium_core::database::CatalogDatabase;

use crate::infra::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<CatalogDatabase>,
    pub config: Arc<Config>,
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}
