//! Domain types for the book catalog and their write-time validation.
//!
//! Validation runs before any persistence work: out-of-range values are
//! rejected, never clamped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Decimal;
use uuid::Uuid;

use crate::error::{CatalogError, Result};

/// Inclusive bounds on a book rating, stored as NUMERIC(3, 1).
pub const RATING_DECIMAL_SCALE: u32 = 1;

/// Inclusive bounds on a publication year (Gutenberg to near future).
pub const PUBLISHED_YEAR_MIN: i32 = 1450;
pub const PUBLISHED_YEAR_MAX: i32 = 2100;

/// Role a contributor holds on a book. A contributor may hold several
/// distinct roles on the same book, each as its own association row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "contributor_role", rename_all = "lowercase")]
pub enum Role {
    Author,
    Editor,
    Illustrator,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contributor {
    pub id: Uuid,
    pub full_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A contributor as embedded in a book, together with the role held.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditedContributor {
    pub id: Uuid,
    pub full_name: String,
    pub role: Role,
}

/// A book hydrated with its genre and contributor associations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub rating: Decimal,
    pub description: Option<String>,
    pub published_year: i32,
    pub genres: Vec<Genre>,
    pub contributors: Vec<CreditedContributor>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Reference to a contributor with the role they hold on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContributorRef {
    pub contributor_id: Uuid,
    pub role: Role,
}

/// Payload for creating a book.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub rating: Decimal,
    pub description: Option<String>,
    pub published_year: i32,
    #[serde(default)]
    pub genre_ids: Vec<Uuid>,
    #[serde(default)]
    pub contributors: Vec<ContributorRef>,
}

impl NewBook {
    pub fn validate(&self) -> Result<()> {
        validate_non_empty("title", &self.title)?;
        validate_rating(self.rating)?;
        validate_published_year(self.published_year)?;
        Ok(())
    }
}

/// Partial update for a book. `None` fields are left untouched; a supplied
/// genre or contributor list replaces the existing associations wholesale,
/// so `Some(vec![])` clears them while `None` keeps them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub rating: Option<Decimal>,
    pub description: Option<String>,
    pub published_year: Option<i32>,
    pub genre_ids: Option<Vec<Uuid>>,
    pub contributors: Option<Vec<ContributorRef>>,
}

impl BookPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_non_empty("title", title)?;
        }
        if let Some(rating) = self.rating {
            validate_rating(rating)?;
        }
        if let Some(year) = self.published_year {
            validate_published_year(year)?;
        }
        Ok(())
    }

    /// True when any scalar column changes (associations aside).
    pub fn touches_scalars(&self) -> bool {
        self.title.is_some()
            || self.rating.is_some()
            || self.description.is_some()
            || self.published_year.is_some()
    }
}

pub fn validate_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::Validation(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

pub fn validate_rating(rating: Decimal) -> Result<()> {
    if rating < Decimal::ZERO || rating > Decimal::from(10) {
        return Err(CatalogError::Validation(format!(
            "rating must be between 0.0 and 10.0, got {rating}"
        )));
    }
    if rating.normalize().scale() > RATING_DECIMAL_SCALE {
        return Err(CatalogError::Validation(format!(
            "rating carries at most one fractional digit, got {rating}"
        )));
    }
    Ok(())
}

pub fn validate_published_year(year: i32) -> Result<()> {
    if !(PUBLISHED_YEAR_MIN..=PUBLISHED_YEAR_MAX).contains(&year) {
        return Err(CatalogError::Validation(format!(
            "published_year must be between {PUBLISHED_YEAR_MIN} and {PUBLISHED_YEAR_MAX}, got {year}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        assert!(validate_rating(dec("0.0")).is_ok());
        assert!(validate_rating(dec("10.0")).is_ok());
        assert!(validate_rating(dec("10.1")).is_err());
        assert!(validate_rating(dec("-0.1")).is_err());
    }

    #[test]
    fn rating_precision_is_one_fractional_digit() {
        assert!(validate_rating(dec("7.5")).is_ok());
        // Trailing zeros normalize away.
        assert!(validate_rating(dec("7.50")).is_ok());
        assert!(validate_rating(dec("7.55")).is_err());
    }

    #[test]
    fn published_year_bounds_are_inclusive() {
        assert!(validate_published_year(1450).is_ok());
        assert!(validate_published_year(2100).is_ok());
        assert!(validate_published_year(1449).is_err());
        assert!(validate_published_year(2101).is_err());
    }

    #[test]
    fn new_book_rejects_blank_title() {
        let book = NewBook {
            title: "   ".into(),
            rating: dec("5.0"),
            description: None,
            published_year: 2000,
            genre_ids: vec![],
            contributors: vec![],
        };
        assert!(matches!(
            book.validate(),
            Err(CatalogError::Validation(msg)) if msg.contains("title")
        ));
    }

    #[test]
    fn patch_validates_only_supplied_fields() {
        let patch = BookPatch {
            title: Some("New".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(patch.touches_scalars());

        let patch = BookPatch {
            rating: Some(dec("11.0")),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = BookPatch {
            genre_ids: Some(vec![]),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
        assert!(!patch.touches_scalars());
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Author).unwrap(), "\"author\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"illustrator\"").unwrap(),
            Role::Illustrator
        );
    }
}
