use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use tracing::info;
use uuid::Uuid;

use crate::catalog::{Book, BookPatch, CreditedContributor, Genre, NewBook, Role};
use crate::database::ports::books::BooksRepository;
use crate::error::{CatalogError, Result};
use crate::query::{BookPage, BookQuery};

/// PostgreSQL-backed implementation of the `BooksRepository` port.
#[derive(Clone, Debug)]
pub struct PostgresBooksRepository {
    pool: PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct BookRow {
    id: Uuid,
    title: String,
    rating: Decimal,
    description: Option<String>,
    published_year: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct BookGenreRow {
    book_id: Uuid,
    id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct CreditRow {
    book_id: Uuid,
    id: Uuid,
    full_name: String,
    role: Role,
}

const BOOK_COLUMNS: &str =
    "b.id, b.title, b.rating, b.description, b.published_year, b.created_at, b.updated_at";

/// Escapes LIKE metacharacters so user text matches literally.
fn escape_like(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Appends the sparse filter conjunction. Shared by the page query and the
/// COUNT query so both always see the same matching set.
fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &BookQuery) {
    builder.push(" WHERE TRUE");

    if let Some(search) = query.search.as_deref().filter(|s| !s.trim().is_empty()) {
        builder.push(" AND b.title ILIKE ");
        builder.push_bind(format!("%{}%", escape_like(search.trim())));
    }
    if let Some(genre_id) = query.genre_id {
        builder.push(
            " AND EXISTS (SELECT 1 FROM book_genres bg WHERE bg.book_id = b.id AND bg.genre_id = ",
        );
        builder.push_bind(genre_id);
        builder.push(")");
    }
    if let Some(year) = query.published_year {
        builder.push(" AND b.published_year = ");
        builder.push_bind(year);
    }
    if let Some(min) = query.rating_min {
        builder.push(" AND b.rating >= ");
        builder.push_bind(min);
    }
    if let Some(max) = query.rating_max {
        builder.push(" AND b.rating <= ");
        builder.push_bind(max);
    }
}

fn dedupe_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    ids.iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}

impl PostgresBooksRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads genre associations for a set of books in one batched query.
    async fn genres_for_books(&self, book_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Genre>>> {
        let rows: Vec<BookGenreRow> = sqlx::query_as(
            r#"
            SELECT bg.book_id, g.id, g.name, g.created_at, g.updated_at
            FROM book_genres bg
            JOIN genres g ON g.id = bg.genre_id
            WHERE bg.book_id = ANY($1)
            ORDER BY g.name
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to load book genres: {e}")))?;

        let mut by_book: HashMap<Uuid, Vec<Genre>> = HashMap::new();
        for row in rows {
            by_book.entry(row.book_id).or_default().push(Genre {
                id: row.id,
                name: row.name,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }
        Ok(by_book)
    }

    /// Loads contributor-role credits for a set of books in one batched query.
    async fn credits_for_books(
        &self,
        book_ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<CreditedContributor>>> {
        let rows: Vec<CreditRow> = sqlx::query_as(
            r#"
            SELECT bc.book_id, c.id, c.full_name, bc.role
            FROM book_contributors bc
            JOIN contributors c ON c.id = bc.contributor_id
            WHERE bc.book_id = ANY($1)
            ORDER BY c.full_name, bc.role
            "#,
        )
        .bind(book_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to load book contributors: {e}")))?;

        let mut by_book: HashMap<Uuid, Vec<CreditedContributor>> = HashMap::new();
        for row in rows {
            by_book
                .entry(row.book_id)
                .or_default()
                .push(CreditedContributor {
                    id: row.id,
                    full_name: row.full_name,
                    role: row.role,
                });
        }
        Ok(by_book)
    }

    async fn hydrate(&self, rows: Vec<BookRow>) -> Result<Vec<Book>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut genres = self.genres_for_books(&ids).await?;
        let mut credits = self.credits_for_books(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| Book {
                genres: genres.remove(&row.id).unwrap_or_default(),
                contributors: credits.remove(&row.id).unwrap_or_default(),
                id: row.id,
                title: row.title,
                rating: row.rating,
                description: row.description,
                published_year: row.published_year,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect())
    }
}

/// Verifies every id references an existing genre. Runs inside the write
/// transaction so the check and the inserts see one snapshot.
async fn ensure_genres_exist(tx: &mut Transaction<'_, Postgres>, ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM genres WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to check genre ids: {e}")))?;

    let found: HashSet<Uuid> = found.into_iter().collect();
    let missing: Vec<Uuid> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        return Err(CatalogError::NotFound(format!(
            "unknown genre ids: {missing:?}"
        )));
    }
    Ok(())
}

async fn ensure_contributors_exist(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[Uuid],
) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    let found: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM contributors WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to check contributor ids: {e}")))?;

    let found: HashSet<Uuid> = found.into_iter().collect();
    let missing: Vec<Uuid> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
    if !missing.is_empty() {
        return Err(CatalogError::NotFound(format!(
            "unknown contributor ids: {missing:?}"
        )));
    }
    Ok(())
}

async fn insert_genre_links(
    tx: &mut Transaction<'_, Postgres>,
    book_id: Uuid,
    genre_ids: &[Uuid],
) -> Result<()> {
    for genre_id in genre_ids {
        sqlx::query("INSERT INTO book_genres (book_id, genre_id) VALUES ($1, $2)")
            .bind(book_id)
            .bind(genre_id)
            .execute(&mut **tx)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to link genre: {e}")))?;
    }
    Ok(())
}

async fn insert_contributor_links(
    tx: &mut Transaction<'_, Postgres>,
    book_id: Uuid,
    credits: &[(Uuid, Role)],
) -> Result<()> {
    for (contributor_id, role) in credits {
        sqlx::query(
            "INSERT INTO book_contributors (book_id, contributor_id, role) VALUES ($1, $2, $3)",
        )
        .bind(book_id)
        .bind(contributor_id)
        .bind(role)
        .execute(&mut **tx)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to link contributor: {e}")))?;
    }
    Ok(())
}

/// Deduplicates (contributor, role) pairs while keeping input order.
fn dedupe_credits(credits: &[crate::catalog::ContributorRef]) -> Vec<(Uuid, Role)> {
    let mut seen = HashSet::new();
    credits
        .iter()
        .filter(|c| seen.insert((c.contributor_id, c.role)))
        .map(|c| (c.contributor_id, c.role))
        .collect()
}

#[async_trait]
impl BooksRepository for PostgresBooksRepository {
    async fn list(&self, query: &BookQuery) -> Result<BookPage> {
        query.validate()?;

        let mut count_builder =
            QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books b");
        push_filters(&mut count_builder, query);
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to count books: {e}")))?;

        let mut sql_builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {BOOK_COLUMNS} FROM books b"));
        push_filters(&mut sql_builder, query);
        // Identity tie-break keeps pagination stable when sort keys collide.
        sql_builder.push(" ORDER BY ");
        sql_builder.push(query.sort.column());
        sql_builder.push(" ");
        sql_builder.push(query.direction.sql());
        sql_builder.push(", b.id ASC");
        sql_builder.push(" LIMIT ");
        sql_builder.push_bind(query.page_size);
        sql_builder.push(" OFFSET ");
        sql_builder.push_bind(query.offset());

        let rows: Vec<BookRow> = sql_builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to list books: {e}")))?;

        let items = self.hydrate(rows).await?;

        Ok(BookPage {
            items,
            total,
            page: query.page,
            page_size: query.page_size,
        })
    }

    async fn get(&self, id: Uuid) -> Result<Book> {
        let row: Option<BookRow> =
            sqlx::query_as(&format!("SELECT {BOOK_COLUMNS} FROM books b WHERE b.id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| CatalogError::Storage(format!("failed to get book: {e}")))?;

        let row = row.ok_or_else(|| CatalogError::NotFound(format!("book {id} not found")))?;
        let mut books = self.hydrate(vec![row]).await?;
        Ok(books.remove(0))
    }

    async fn create(&self, book: &NewBook) -> Result<Book> {
        book.validate()?;

        let genre_ids = dedupe_ids(&book.genre_ids);
        let credits = dedupe_credits(&book.contributors);
        let contributor_ids = dedupe_ids(
            &credits.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to start transaction: {e}")))?;

        ensure_genres_exist(&mut tx, &genre_ids).await?;
        ensure_contributors_exist(&mut tx, &contributor_ids).await?;

        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO books (id, title, rating, description, published_year)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&book.title)
        .bind(book.rating)
        .bind(&book.description)
        .bind(book.published_year)
        .execute(&mut *tx)
        .await
        .map_err(|e| CatalogError::Storage(format!("failed to create book: {e}")))?;

        insert_genre_links(&mut tx, id, &genre_ids).await?;
        insert_contributor_links(&mut tx, id, &credits).await?;

        tx.commit()
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to commit transaction: {e}")))?;

        info!("Created book: {} ({})", book.title, id);
        self.get(id).await
    }

    async fn update(&self, id: Uuid, patch: &BookPatch) -> Result<Book> {
        patch.validate()?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to start transaction: {e}")))?;

        // Lock the row so concurrent association replacements serialize.
        let existing: Option<Uuid> =
            sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| CatalogError::Storage(format!("failed to load book: {e}")))?;
        if existing.is_none() {
            return Err(CatalogError::NotFound(format!("book {id} not found")));
        }

        // Every successful mutation bumps updated_at, association-only
        // updates included.
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE books SET updated_at = NOW()");
        if let Some(title) = &patch.title {
            builder.push(", title = ");
            builder.push_bind(title);
        }
        if let Some(rating) = patch.rating {
            builder.push(", rating = ");
            builder.push_bind(rating);
        }
        if let Some(description) = &patch.description {
            builder.push(", description = ");
            builder.push_bind(description);
        }
        if let Some(year) = patch.published_year {
            builder.push(", published_year = ");
            builder.push_bind(year);
        }
        builder.push(" WHERE id = ");
        builder.push_bind(id);
        builder
            .build()
            .execute(&mut *tx)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to update book: {e}")))?;

        if let Some(genre_ids) = &patch.genre_ids {
            let genre_ids = dedupe_ids(genre_ids);
            ensure_genres_exist(&mut tx, &genre_ids).await?;
            sqlx::query("DELETE FROM book_genres WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    CatalogError::Storage(format!("failed to clear genre links: {e}"))
                })?;
            insert_genre_links(&mut tx, id, &genre_ids).await?;
        }

        if let Some(contributors) = &patch.contributors {
            let credits = dedupe_credits(contributors);
            let contributor_ids =
                dedupe_ids(&credits.iter().map(|(id, _)| *id).collect::<Vec<_>>());
            ensure_contributors_exist(&mut tx, &contributor_ids).await?;
            sqlx::query("DELETE FROM book_contributors WHERE book_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    CatalogError::Storage(format!("failed to clear contributor links: {e}"))
                })?;
            insert_contributor_links(&mut tx, id, &credits).await?;
        }

        tx.commit()
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to commit transaction: {e}")))?;

        info!("Updated book: {}", id);
        self.get(id).await
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| CatalogError::Storage(format!("failed to delete book: {e}")))?;

        if result.rows_affected() == 0 {
            return Err(CatalogError::NotFound(format!("book {id} not found")));
        }

        info!("Deleted book: {}", id);
        Ok(())
    }
}
