//! PostgreSQL storage backend using sqlx.
//!
//! Provides `PostgresStore`, a [`RowStore`] backed by a `sqlx::PgPool`.
//!
//! # Feature flag
//!
//! This module is gated behind the `postgres` feature flag:
//! ```toml
//! [dependencies]
//! market-rs = { version = "0.1", features = ["postgres"] }
//! ```
//!
//! # Row decoding
//!
//! Statements are wrapped as `WITH q AS (<sql>) SELECT to_jsonb(q) FROM q`, so
//! every row comes back as one JSON object regardless of its shape. The outer
//! select carries no `ORDER BY` of its own; PostgreSQL emits the rows of a
//! single-reference CTE in the order the inner statement produced them.

use crate::config::DatabaseConfig;
use crate::core::error::StorageError;
use crate::core::field::FieldValue;
use crate::core::store::{Row, RowStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::{PgArguments, PgPoolOptions};
use sqlx::query::{Query, QueryScalar};
use sqlx::Postgres;

const BACKEND: &str = "postgres";

// ---------------------------------------------------------------------------
// Schema management
// ---------------------------------------------------------------------------

/// Apply the marketplace tables (idempotent).
///
/// Safe to call on every startup.
pub async fn ensure_schema(pool: &PgPool) -> Result<()> {
    const TABLES: &[(&str, &str)] = &[
        (
            "users",
            "CREATE TABLE IF NOT EXISTS users (
                username VARCHAR(25) PRIMARY KEY,
                password TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL,
                address TEXT,
                zip_code TEXT,
                city TEXT,
                region_or_state TEXT,
                country TEXT,
                latitude DOUBLE PRECISION,
                longitude DOUBLE PRECISION,
                is_admin BOOLEAN NOT NULL DEFAULT FALSE,
                is_flagged BOOLEAN NOT NULL DEFAULT FALSE
            )",
        ),
        (
            "items",
            "CREATE TABLE IF NOT EXISTS items (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL,
                image_url TEXT,
                initial_price DOUBLE PRECISION NOT NULL,
                condition TEXT,
                description TEXT,
                seller_username VARCHAR(25) NOT NULL
                    REFERENCES users ON DELETE CASCADE,
                is_sold BOOLEAN NOT NULL DEFAULT FALSE
            )",
        ),
        (
            "item_types",
            "CREATE TABLE IF NOT EXISTS item_types (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL UNIQUE
            )",
        ),
        (
            "items_to_types",
            "CREATE TABLE IF NOT EXISTS items_to_types (
                id BIGSERIAL PRIMARY KEY,
                item_id BIGINT NOT NULL REFERENCES items ON DELETE CASCADE,
                type_id BIGINT NOT NULL REFERENCES item_types ON DELETE CASCADE
            )",
        ),
        (
            "purchases",
            "CREATE TABLE IF NOT EXISTS purchases (
                id BIGSERIAL PRIMARY KEY,
                item_id BIGINT NOT NULL REFERENCES items ON DELETE CASCADE,
                username VARCHAR(25) NOT NULL REFERENCES users ON DELETE CASCADE,
                final_price DOUBLE PRECISION,
                exchange_method TEXT,
                sale_made TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        ),
        (
            "messages",
            "CREATE TABLE IF NOT EXISTS messages (
                id BIGSERIAL PRIMARY KEY,
                from_username VARCHAR(25) NOT NULL REFERENCES users ON DELETE CASCADE,
                to_username VARCHAR(25) NOT NULL REFERENCES users ON DELETE CASCADE,
                item_id BIGINT NOT NULL REFERENCES items ON DELETE CASCADE,
                body TEXT NOT NULL,
                sent_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )",
        ),
    ];

    for (table, ddl) in TABLES {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .map_err(|e| anyhow!("Failed to create {} table: {}", table, e))?;
    }

    Ok(())
}

/// Open a connection pool sized from configuration
pub async fn connect(url: &str, config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(url)
        .await
        .map_err(|e| {
            StorageError::Connection {
                backend: BACKEND.to_string(),
                message: e.to_string(),
            }
            .into()
        })
}

fn query_error(err: sqlx::Error) -> StorageError {
    StorageError::Query {
        backend: BACKEND.to_string(),
        message: err.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Parameter binding
// ---------------------------------------------------------------------------

fn bind_query<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &FieldValue,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::String(s) => query.bind(s.clone()),
        FieldValue::Null => query.bind(None::<String>),
    }
}

fn bind_scalar<'q>(
    query: QueryScalar<'q, Postgres, Value, PgArguments>,
    value: &FieldValue,
) -> QueryScalar<'q, Postgres, Value, PgArguments> {
    match value {
        FieldValue::Boolean(b) => query.bind(*b),
        FieldValue::Integer(i) => query.bind(*i),
        FieldValue::Float(f) => query.bind(*f),
        FieldValue::String(s) => query.bind(s.clone()),
        FieldValue::Null => query.bind(None::<String>),
    }
}

// ---------------------------------------------------------------------------
// PostgresStore
// ---------------------------------------------------------------------------

/// Row store backed by PostgreSQL.
///
/// # Example
///
/// ```rust,ignore
/// use sqlx::PgPool;
/// use market::storage::PostgresStore;
///
/// let pool = PgPool::connect("postgresql:///market").await?;
/// let store = PostgresStore::new(pool);
/// let rows = store.fetch("SELECT id, name FROM item_types", &[]).await?;
/// ```
#[derive(Clone, Debug)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new `PostgresStore` with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RowStore for PostgresStore {
    async fn fetch(&self, sql: &str, values: &[FieldValue]) -> Result<Vec<Row>> {
        let wrapped = format!("WITH q AS ({}) SELECT to_jsonb(q) FROM q", sql);

        let mut query = sqlx::query_scalar::<_, Value>(&wrapped);
        for value in values {
            query = bind_scalar(query, value);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(query_error)?;

        rows.into_iter()
            .map(|row| match row {
                Value::Object(map) => Ok(map),
                other => Err(anyhow!("Expected a JSON object row, got {}", other)),
            })
            .collect()
    }

    async fn execute(&self, sql: &str, values: &[FieldValue]) -> Result<u64> {
        let mut query = sqlx::query(sql);
        for value in values {
            query = bind_query(query, value);
        }

        let result = query
            .execute(&self.pool)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected())
    }
}
