//! Integration tests for the PostgreSQL row store.
//!
//! Runs the repositories and the recommendation engine against a real
//! database seeded with a small marketplace.
//!
//! # Requirements
//!
//! - Docker must be running (testcontainers launches a PostgreSQL container)
//! - Feature flag `postgres` must be enabled
//!
//! # Running
//!
//! ```sh
//! cargo test --features postgres --test postgres_tests -- --test-threads=1
//! ```
//!
//! # Test isolation
//!
//! All tests share a single PostgreSQL container (via `OnceLock`). Each test
//! creates a fresh `PgPool`, truncates every table and reseeds before running.

#![cfg(feature = "postgres")]

use market::prelude::*;
use market::storage::ensure_schema;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::OnceLock;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::postgres::Postgres;

// ---------------------------------------------------------------------------
// Shared test environment (single container, fresh pool per test)
// ---------------------------------------------------------------------------

/// Holds the testcontainer handle (keeps it alive) and the connection URL.
struct PgTestEnv {
    /// Container handle; dropping this stops the PostgreSQL container.
    _container: testcontainers::ContainerAsync<Postgres>,
    connection_url: String,
}

/// Global test environment, initialized once per test binary.
static TEST_ENV: OnceLock<PgTestEnv> = OnceLock::new();

async fn init_pg_env() -> &'static PgTestEnv {
    if let Some(env) = TEST_ENV.get() {
        return env;
    }

    let container = Postgres::default()
        .start()
        .await
        .expect("Failed to start PostgreSQL container, is Docker running?");

    let host = container.get_host().await.unwrap();
    let port = container.get_host_port_ipv4(5432).await.unwrap();
    let url = format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

    let pool = PgPool::connect(&url)
        .await
        .expect("Failed to connect to PostgreSQL");
    ensure_schema(&pool).await.expect("Failed to create schema");
    pool.close().await;

    let _ = TEST_ENV.set(PgTestEnv {
        _container: container,
        connection_url: url,
    });
    TEST_ENV.get().unwrap()
}

async fn pg_pool() -> PgPool {
    let env = init_pg_env().await;
    PgPoolOptions::new()
        .max_connections(2)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&env.connection_url)
        .await
        .expect("Failed to connect to PostgreSQL")
}

// ---------------------------------------------------------------------------
// Seed data
// ---------------------------------------------------------------------------

const SEED: &[&str] = &[
    "TRUNCATE users, items, item_types, items_to_types, purchases, messages \
     RESTART IDENTITY CASCADE",
    "INSERT INTO users (username, password, first_name, last_name, email, address, zip_code, \
     region_or_state, city, country, latitude, longitude, is_admin, is_flagged) VALUES \
     ('u1', 'x', 'fn1', 'ln1', 'u1@example.com', '100 address', '11111', 'state1', 'city1', 'country1', 10.99876, -99.99981, false, false), \
     ('u2', 'x', 'fn2', 'ln2', 'u2@example.com', '200 address', '22222', 'state2', 'city2', 'country2', 10.99876, -99.99981, true, false), \
     ('u3', 'x', 'fn3', 'ln3', 'u3@example.com', '300 address', '33333', 'state3', 'city3', 'country3', 10.99876, -99.99981, false, false), \
     ('u4', 'x', 'fn4', 'ln4', 'u4@example.com', '400 address', '22222', 'state2', 'city2', 'country2', 10.99876, -99.99981, false, true)",
    "INSERT INTO items (name, image_url, initial_price, condition, description, seller_username, is_sold) VALUES \
     ('i1', 'test_url_1', 100, 'great', 'test item', 'u1', false), \
     ('i2', 'test_url_2', 100, 'great', 'test item', 'u1', false), \
     ('i3', 'test_url_3', 100, 'great', 'test item', 'u2', false), \
     ('i4', 'test_url_4', 100, 'great', 'test item', 'u3', false), \
     ('i5', 'test_url_5', 40, 'used', 'lamp', 'u4', false), \
     ('i6', 'test_url_6', 60, 'good', 'desk', 'u3', false)",
    "INSERT INTO item_types (name) VALUES ('electronics'), ('movies'), ('books')",
    "INSERT INTO items_to_types (item_id, type_id) VALUES \
     (1, 1), (2, 1), (2, 2), (3, 1), (3, 3), (4, 1), (4, 3), (5, 1), (6, 3)",
    "INSERT INTO messages (from_username, to_username, item_id, body) VALUES \
     ('u1', 'u3', 4, 'is this available?'), \
     ('u3', 'u1', 4, 'yes'), \
     ('u1', 'u3', 4, 'great, buying'), \
     ('u1', 'u2', 3, 'different item')",
];

async fn seeded_store() -> PostgresStore {
    let pool = pg_pool().await;
    for statement in SEED {
        sqlx::query(statement)
            .execute(&pool)
            .await
            .expect("Failed to seed database");
    }
    let store = PostgresStore::new(pool);
    // u1 buys i4, which gives u1 affinity for electronics and books
    user::make_sale(&store, "u1", ValidatedId::new(4))
        .await
        .expect("Failed to record seed purchase");
    store
}

fn filters(pairs: &[(&str, &str)]) -> FilterRequest {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
        .collect()
}

// ---------------------------------------------------------------------------
// Items
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_find_all_unsold() {
    let store = seeded_store().await;

    let listings = item::find_all(&store, &FilterRequest::new()).await.unwrap();

    let ids: Vec<i64> = listings.iter().map(|l| l.item.id).collect();
    assert_eq!(ids, vec![1, 2, 3, 5, 6]);
    assert_eq!(listings[1].categories.len(), 2);
    assert_eq!(listings[0].location.zip_code.as_deref(), Some("11111"));
}

#[tokio::test]
async fn test_find_all_with_filters() {
    let store = seeded_store().await;

    let listings = item::find_all(&store, &filters(&[("condition", "GREAT"), ("maxPrice", "100")]))
        .await
        .unwrap();
    let ids: Vec<i64> = listings.iter().map(|l| l.item.id).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let listings = item::find_all(&store, &filters(&[("maxPrice", "50")]))
        .await
        .unwrap();
    assert_eq!(listings.len(), 1);
    assert_eq!(listings[0].item.name, "i5");
}

#[tokio::test]
async fn test_update_item() {
    let store = seeded_store().await;
    let patch = ItemPatch {
        name: Some("new item".to_string()),
        condition: Some("good".to_string()),
        description: Some("new description".to_string()),
        ..Default::default()
    };

    let updated = item::update(&store, ValidatedId::new(1), &patch).await.unwrap();
    assert_eq!(updated.name, "new item");
    assert_eq!(updated.condition.as_deref(), Some("good"));

    let err = item::update(&store, ValidatedId::new(4), &patch).await.unwrap_err();
    assert!(matches!(err, MarketError::Conflict { .. }));

    let err = item::update(&store, ValidatedId::new(999), &patch).await.unwrap_err();
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_add_to_categories() {
    let store = seeded_store().await;

    let written = item::add_to_categories(
        &store,
        ValidatedId::new(6),
        &[ValidatedId::new(1), ValidatedId::new(2)],
    )
    .await
    .unwrap();
    assert_eq!(written, 2);

    let categories = item::categories_of(&store, ValidatedId::new(6)).await.unwrap();
    let names: Vec<&str> = categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["electronics", "movies", "books"]);
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_update_user() {
    let store = seeded_store().await;
    let patch = UserPatch {
        first_name: Some("Ana".to_string()),
        region_or_state: Some("state9".to_string()),
        ..Default::default()
    };

    let updated = user::update(&store, "u1", &patch).await.unwrap();
    assert_eq!(updated.first_name, "Ana");
    assert_eq!(updated.region_or_state.as_deref(), Some("state9"));

    let err = user::update(&store, "ghost", &patch).await.unwrap_err();
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_make_sale() {
    let store = seeded_store().await;

    let purchase = user::make_sale(&store, "u2", ValidatedId::new(6)).await.unwrap();
    assert_eq!(purchase.item_id, 6);
    assert_eq!(purchase.username, "u2");

    let detail = item::find_by_id(&store, ValidatedId::new(6)).await.unwrap();
    assert!(detail.item.is_sold);

    let err = user::make_sale(&store, "u3", ValidatedId::new(6)).await.unwrap_err();
    assert!(matches!(err, MarketError::Conflict { .. }));

    let err = user::make_sale(&store, "u3", ValidatedId::new(999)).await.unwrap_err();
    assert!(matches!(err, MarketError::NotFound { .. }));
}

#[tokio::test]
async fn test_failed_sale_leaves_item_unsold() {
    let store = seeded_store().await;

    let err = user::make_sale(&store, "ghost", ValidatedId::new(5)).await.unwrap_err();
    assert!(matches!(err, MarketError::Storage(_)));

    let detail = item::find_by_id(&store, ValidatedId::new(5)).await.unwrap();
    assert!(!detail.item.is_sold);
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_conversation() {
    let store = seeded_store().await;

    let thread = message::conversation(&store, ValidatedId::new(4), "u1", "u3")
        .await
        .unwrap();
    let ids: Vec<i64> = thread.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![3, 2, 1]);
    assert_eq!(thread[0].item_name, "i4");

    let history = message::messages_between(&store, "u1", "u2").await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn test_created_message_joins_conversation() {
    let store = seeded_store().await;
    let reply = NewMessage {
        from_username: "u3".to_string(),
        to_username: "u1".to_string(),
        item_id: ValidatedId::new(4),
        body: "thanks!".to_string(),
    };

    let stored = message::create(&store, &reply).await.unwrap();
    assert_eq!(stored.id, 5);

    let thread = message::conversation(&store, ValidatedId::new(4), "u1", "u3")
        .await
        .unwrap();
    let ids: Vec<i64> = thread.iter().map(|m| m.id).collect();
    assert_eq!(ids, vec![5, 3, 2, 1]);
    assert_eq!(thread[0].body, "thanks!");
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_recommendations() {
    let store = seeded_store().await;
    let engine = RecommendationEngine::new(Arc::new(store));

    let affinities = engine.category_affinities("u1").await.unwrap();
    let ids: Vec<i64> = affinities.iter().map(|a| a.category_id.get()).collect();
    assert_eq!(ids, vec![1, 3]);

    let picks = engine.recommend_for_user("u1").await.unwrap();
    let ids: Vec<i64> = picks.iter().map(|c| c.id).collect();
    // i3 matches both categories; i6 only books; own items and u4's lamp excluded
    assert_eq!(ids, vec![3, 6]);
    assert_eq!(picks[0].score, 2);
    assert_eq!(picks[0].location.city.as_deref(), Some("city2"));

    assert!(engine.recommend_for_user("u2").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_items_near() {
    let store = seeded_store().await;
    let engine = RecommendationEngine::new(Arc::new(store));

    let picks = engine
        .items_near("u1", "22222", "city2", "state2")
        .await
        .unwrap();
    let ids: Vec<i64> = picks.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![3]);
}
