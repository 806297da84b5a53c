use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        CatalogError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
