//! Behavioural tests for the Postgres repositories, run against a
//! per-test database provisioned by `#[sqlx::test]`.

use std::str::FromStr;

use anyhow::Result;
use sqlx::PgPool;
use sqlx::types::Decimal;
use uuid::Uuid;

use librarium_core::CatalogError;
use librarium_core::catalog::{BookPatch, ContributorRef, NewBook, Role};
use librarium_core::database::{
    BooksRepository, CatalogDatabase, ContributorsRepository, GenresRepository,
};
use librarium_core::query::{BookQuery, SortDirection, SortKey};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn new_book(title: &str, rating: &str, year: i32) -> NewBook {
    NewBook {
        title: title.to_string(),
        rating: dec(rating),
        description: None,
        published_year: year,
        genre_ids: vec![],
        contributors: vec![],
    }
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn create_and_get_hydrates_associations(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    let fantasy = db.genres().create("Fantasy").await?;
    let tolkien = db.contributors().create("J. R. R. Tolkien").await?;

    let mut payload = new_book("The Hobbit", "8.6", 1937);
    payload.description = Some("There and back again".to_string());
    payload.genre_ids = vec![fantasy.id];
    payload.contributors = vec![
        ContributorRef {
            contributor_id: tolkien.id,
            role: Role::Author,
        },
        ContributorRef {
            contributor_id: tolkien.id,
            role: Role::Illustrator,
        },
    ];

    let book = db.books().create(&payload).await?;
    assert_eq!(book.title, "The Hobbit");
    assert_eq!(book.rating, dec("8.6"));
    assert_eq!(book.published_year, 1937);

    let fetched = db.books().get(book.id).await?;
    assert_eq!(fetched.genres.len(), 1);
    assert_eq!(fetched.genres[0].name, "Fantasy");
    // Same contributor may hold two distinct roles.
    assert_eq!(fetched.contributors.len(), 2);
    assert!(
        fetched
            .contributors
            .iter()
            .any(|c| c.id == tolkien.id && c.role == Role::Author)
    );
    assert!(
        fetched
            .contributors
            .iter()
            .any(|c| c.id == tolkien.id && c.role == Role::Illustrator)
    );

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn create_with_unknown_reference_persists_nothing(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    let mut payload = new_book("Ghost Book", "5.0", 2000);
    payload.genre_ids = vec![Uuid::new_v4()];

    let err = db.books().create(&payload).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));

    let page = db.books().list(&default_query()).await?;
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn boundary_values_are_inclusive(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    assert!(db.books().create(&new_book("Low", "0.0", 1450)).await.is_ok());
    assert!(db.books().create(&new_book("High", "10.0", 2100)).await.is_ok());

    let err = db
        .books()
        .create(&new_book("Too good", "10.1", 2000))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    let err = db
        .books()
        .create(&new_book("Too early", "5.0", 1449))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn partial_update_leaves_unnamed_fields(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    let fantasy = db.genres().create("Fantasy").await?;
    let mut payload = new_book("Original", "7.0", 1990);
    payload.description = Some("keep me".to_string());
    payload.genre_ids = vec![fantasy.id];
    let book = db.books().create(&payload).await?;

    let updated = db
        .books()
        .update(
            book.id,
            &BookPatch {
                title: Some("New".to_string()),
                ..Default::default()
            },
        )
        .await?;

    assert_eq!(updated.title, "New");
    assert_eq!(updated.rating, dec("7.0"));
    assert_eq!(updated.description.as_deref(), Some("keep me"));
    assert_eq!(updated.published_year, 1990);
    assert_eq!(updated.genres.len(), 1);
    assert_eq!(updated.created_at, book.created_at);
    assert!(updated.updated_at > book.updated_at);

    // Supplying an empty list clears the associations; omitting it did not.
    let cleared = db
        .books()
        .update(
            book.id,
            &BookPatch {
                genre_ids: Some(vec![]),
                ..Default::default()
            },
        )
        .await?;
    assert!(cleared.genres.is_empty());
    assert!(cleared.updated_at > updated.updated_at);

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn update_replaces_association_set(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    let fantasy = db.genres().create("Fantasy").await?;
    let scifi = db.genres().create("SciFi").await?;

    let mut payload = new_book("Shapeshifter", "6.0", 2001);
    payload.genre_ids = vec![fantasy.id];
    let book = db.books().create(&payload).await?;

    let updated = db
        .books()
        .update(
            book.id,
            &BookPatch {
                genre_ids: Some(vec![scifi.id]),
                ..Default::default()
            },
        )
        .await?;

    // Replacement, not merge.
    assert_eq!(updated.genres.len(), 1);
    assert_eq!(updated.genres[0].id, scifi.id);

    let err = db
        .books()
        .update(
            book.id,
            &BookPatch {
                genre_ids: Some(vec![Uuid::new_v4()]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));

    // The failed update rolled back: prior associations intact.
    let unchanged = db.books().get(book.id).await?;
    assert_eq!(unchanged.genres.len(), 1);
    assert_eq!(unchanged.genres[0].id, scifi.id);

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn update_replaces_credit_set(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    let ann = db.contributors().create("Ann Author").await?;
    let bea = db.contributors().create("Bea Brush").await?;

    let mut payload = new_book("Recredited", "6.5", 2010);
    payload.contributors = vec![ContributorRef {
        contributor_id: ann.id,
        role: Role::Author,
    }];
    let book = db.books().create(&payload).await?;

    let updated = db
        .books()
        .update(
            book.id,
            &BookPatch {
                contributors: Some(vec![
                    ContributorRef {
                        contributor_id: ann.id,
                        role: Role::Editor,
                    },
                    ContributorRef {
                        contributor_id: bea.id,
                        role: Role::Illustrator,
                    },
                ]),
                ..Default::default()
            },
        )
        .await?;

    // Replacement, not merge: the author credit is gone.
    assert_eq!(updated.contributors.len(), 2);
    assert!(
        updated
            .contributors
            .iter()
            .any(|c| c.id == ann.id && c.role == Role::Editor)
    );
    assert!(
        updated
            .contributors
            .iter()
            .any(|c| c.id == bea.id && c.role == Role::Illustrator)
    );
    assert!(!updated.contributors.iter().any(|c| c.role == Role::Author));

    let err = db
        .books()
        .update(
            book.id,
            &BookPatch {
                contributors: Some(vec![ContributorRef {
                    contributor_id: Uuid::new_v4(),
                    role: Role::Author,
                }]),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));

    // The failed update rolled back: prior credits intact.
    let unchanged = db.books().get(book.id).await?;
    assert_eq!(unchanged.contributors.len(), 2);

    // An empty credit list clears every credit.
    let cleared = db
        .books()
        .update(
            book.id,
            &BookPatch {
                contributors: Some(vec![]),
                ..Default::default()
            },
        )
        .await?;
    assert!(cleared.contributors.is_empty());

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn delete_cascades_and_repeating_reports_not_found(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool.clone());

    let fantasy = db.genres().create("Fantasy").await?;
    let author = db.contributors().create("A. Writer").await?;
    let mut payload = new_book("Doomed", "4.0", 1999);
    payload.genre_ids = vec![fantasy.id];
    payload.contributors = vec![ContributorRef {
        contributor_id: author.id,
        role: Role::Author,
    }];
    let book = db.books().create(&payload).await?;

    db.books().delete(book.id).await?;

    let genre_links: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM book_genres WHERE book_id = $1")
            .bind(book.id)
            .fetch_one(&pool)
            .await?;
    let credit_links: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM book_contributors WHERE book_id = $1")
            .bind(book.id)
            .fetch_one(&pool)
            .await?;
    assert_eq!(genre_links, 0);
    assert_eq!(credit_links, 0);

    // The referenced entities themselves survive.
    assert_eq!(db.genres().list().await?.len(), 1);
    assert_eq!(db.contributors().list().await?.len(), 1);

    let err = db.books().delete(book.id).await.unwrap_err();
    assert!(matches!(err, CatalogError::NotFound(_)));

    Ok(())
}

fn default_query() -> BookQuery {
    BookQuery {
        page: 1,
        page_size: 20,
        ..Default::default()
    }
}

async fn seed_listing_fixture(db: &CatalogDatabase) -> Result<Uuid> {
    let fantasy = db.genres().create("Fantasy").await?;

    let mut dune = new_book("Dune", "9.0", 1965);
    dune.genre_ids = vec![fantasy.id];
    db.books().create(&dune).await?;

    let mut hobbit = new_book("The Hobbit", "9.0", 1937);
    hobbit.genre_ids = vec![fantasy.id];
    db.books().create(&hobbit).await?;

    db.books().create(&new_book("Dune Messiah", "7.2", 1969)).await?;
    db.books().create(&new_book("Neuromancer", "8.3", 1984)).await?;

    Ok(fantasy.id)
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn list_filters_compose(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);
    let fantasy_id = seed_listing_fixture(&db).await?;

    // Case-insensitive substring on title.
    let page = db
        .books()
        .list(&BookQuery {
            search: Some("dune".to_string()),
            ..default_query()
        })
        .await?;
    assert_eq!(page.total, 2);

    // Genre filter returns only associated books.
    let page = db
        .books()
        .list(&BookQuery {
            genre_id: Some(fantasy_id),
            ..default_query()
        })
        .await?;
    assert_eq!(page.total, 2);
    assert!(page.items.iter().all(|b| b.genres.iter().any(|g| g.id == fantasy_id)));

    // Inclusive rating bounds.
    let page = db
        .books()
        .list(&BookQuery {
            rating_min: Some(dec("8.3")),
            rating_max: Some(dec("9.0")),
            ..default_query()
        })
        .await?;
    assert_eq!(page.total, 3);

    // Exact year.
    let page = db
        .books()
        .list(&BookQuery {
            published_year: Some(1984),
            ..default_query()
        })
        .await?;
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].title, "Neuromancer");

    // No match is not an error.
    let page = db
        .books()
        .list(&BookQuery {
            search: Some("no such title".to_string()),
            ..default_query()
        })
        .await?;
    assert_eq!(page.total, 0);
    assert!(page.items.is_empty());

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn list_sorts_deterministically(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);
    seed_listing_fixture(&db).await?;

    let query = BookQuery {
        sort: SortKey::Rating,
        direction: SortDirection::Desc,
        ..default_query()
    };

    let first = db.books().list(&query).await?;
    let ratings: Vec<Decimal> = first.items.iter().map(|b| b.rating).collect();
    let mut sorted = ratings.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(ratings, sorted);

    // Two books share rating 9.0: the identity tie-break keeps repeated
    // requests in identical order.
    let second = db.books().list(&query).await?;
    let first_ids: Vec<Uuid> = first.items.iter().map(|b| b.id).collect();
    let second_ids: Vec<Uuid> = second.items.iter().map(|b| b.id).collect();
    assert_eq!(first_ids, second_ids);

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn pagination_bounds_and_total(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);
    seed_listing_fixture(&db).await?;

    let page = db
        .books()
        .list(&BookQuery {
            page: 1,
            page_size: 3,
            ..Default::default()
        })
        .await?;
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, 4);

    let page = db
        .books()
        .list(&BookQuery {
            page: 2,
            page_size: 3,
            ..Default::default()
        })
        .await?;
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.total, 4);

    // Past the end: empty items, total unchanged.
    let page = db
        .books()
        .list(&BookQuery {
            page: 5,
            page_size: 3,
            ..Default::default()
        })
        .await?;
    assert!(page.items.is_empty());
    assert_eq!(page.total, 4);

    let err = db
        .books()
        .list(&BookQuery {
            page: 0,
            page_size: 3,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    let err = db
        .books()
        .list(&BookQuery {
            page: 1,
            page_size: 101,
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn duplicate_genre_name_conflicts(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    db.genres().create("Fantasy").await?;
    let err = db.genres().create("Fantasy").await.unwrap_err();
    assert!(matches!(err, CatalogError::Conflict(_)));

    let err = db.genres().create("   ").await.unwrap_err();
    assert!(matches!(err, CatalogError::Validation(_)));

    Ok(())
}

#[sqlx::test(migrator = "librarium_core::MIGRATOR")]
async fn upsert_names_inserts_only_missing(pool: PgPool) -> Result<()> {
    let db = CatalogDatabase::from_pool(pool);

    let names = vec!["Fantasy".to_string(), "SciFi".to_string()];
    assert_eq!(db.genres().upsert_names(&names).await?, 2);
    assert_eq!(db.genres().upsert_names(&names).await?, 0);

    let more = vec!["SciFi".to_string(), "Horror".to_string()];
    assert_eq!(db.genres().upsert_names(&more).await?, 1);

    assert_eq!(db.genres().list().await?.len(), 3);
    Ok(())
}
