//! Filter, sort, and pagination parameters for book listings.

use serde::{Deserialize, Serialize};
use sqlx::types::Decimal;
use uuid::Uuid;

use crate::catalog::Book;
use crate::error::{CatalogError, Result};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Column a book listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Title,
    Rating,
    PublishedYear,
}

impl SortKey {
    /// The backing column, interpolated into ORDER BY. Only these fixed
    /// names ever reach the SQL text.
    pub fn column(self) -> &'static str {
        match self {
            SortKey::Title => "b.title",
            SortKey::Rating => "b.rating",
            SortKey::PublishedYear => "b.published_year",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "title" => Ok(SortKey::Title),
            "rating" => Ok(SortKey::Rating),
            "published_year" => Ok(SortKey::PublishedYear),
            other => Err(CatalogError::Validation(format!(
                "sort must be one of title, rating, published_year, got {other:?}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        match raw {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(CatalogError::Validation(format!(
                "direction must be asc or desc, got {other:?}"
            ))),
        }
    }
}

/// Sparse filter over the book catalog. Absent fields impose no constraint.
#[derive(Debug, Clone, Default)]
pub struct BookQuery {
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
    /// Books holding at least one association to this genre.
    pub genre_id: Option<Uuid>,
    pub published_year: Option<i32>,
    pub rating_min: Option<Decimal>,
    pub rating_max: Option<Decimal>,
    pub sort: SortKey,
    pub direction: SortDirection,
    pub page: i64,
    pub page_size: i64,
}

impl BookQuery {
    pub fn validate(&self) -> Result<()> {
        if self.page < 1 {
            return Err(CatalogError::Validation(format!(
                "page must be at least 1, got {}",
                self.page
            )));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&self.page_size) {
            return Err(CatalogError::Validation(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        Ok(())
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.page_size
    }
}

/// One page of matching books plus the total match count across all pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookPage {
    pub items: Vec<Book>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}
