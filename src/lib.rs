//! # Market-RS
//!
//! Query construction, recommendation ranking and conversation assembly for a
//! marketplace backend.
//!
//! ## Features
//!
//! - **Allow-listed filters**: request filters only reach SQL through a
//!   closed per-entity column map; values are always bound
//! - **Partial updates**: `SET` lists built from typed patches
//! - **Inlined id lists**: multi-row inserts and id disjunctions that only
//!   accept validated integer ids
//! - **Recommendations**: purchase-history affinity and category-overlap
//!   ranking with coarse seller locations
//! - **Conversations**: two directional reads merged into one thread
//! - **Pluggable storage**: any [`RowStore`](core::store::RowStore); an
//!   in-memory scripted store and a PostgreSQL store ship with the crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use market::prelude::*;
//!
//! let config = MarketConfig::from_yaml_file("market.yaml")?.with_env_overrides()?;
//! logging::init(&config.logging)?;
//!
//! let pool = storage::postgres::connect(config.database_url(), &config.database).await?;
//! let store: Arc<dyn RowStore> = Arc::new(PostgresStore::new(pool));
//!
//! let mut filters = FilterRequest::new();
//! filters.insert("name".into(), "lamp".into());
//! filters.insert("maxPrice".into(), "100".into());
//! let listings = item::find_all(store.as_ref(), &filters).await?;
//!
//! let engine = RecommendationEngine::with_config(store, config.recommendations);
//! let picks = engine.recommend_for_user("u1").await?;
//! ```

pub mod config;
pub mod core;
#[macro_use]
pub mod entities;
pub mod logging;
pub mod merge;
pub mod query;
pub mod recommend;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Core ===
    pub use crate::core::{
        error::{ConfigError, ErrorResponse, MarketError, MarketResult, StorageError},
        field::FieldValue,
        query::QueryFragment,
        store::{Row, RowStore},
    };

    // === Query builders ===
    pub use crate::query::{
        Changes, FilterColumns, FilterOp, FilterRequest, IdentityColumns, UpdateColumns,
        ValidatedId, ValueKind, any_id_matches, build_filter, build_filter_from,
        build_partial_update, multi_row_values,
    };

    // === Macros ===
    pub use crate::{filter_columns, update_columns};

    // === Entities ===
    pub use crate::entities::{
        Category, CoarseLocation, ConversationEntry, Item, ItemColumn, ItemDetail, ItemFilter,
        ItemListing, ItemPatch, Location, Message, NewMessage, Purchase, User, UserColumn,
        UserPatch, item, message, user,
    };

    // === Merge ===
    pub use crate::merge::{MergeDescending, merge_descending};

    // === Recommendations ===
    pub use crate::recommend::{Candidate, CategoryAffinity, RecommendationEngine};

    // === Storage ===
    #[cfg(feature = "in-memory")]
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresStore;

    // === Config ===
    pub use crate::config::{
        DatabaseConfig, Environment, LoggingConfig, MarketConfig, RecommendationConfig,
    };
    pub use crate::{logging, storage};

    // === External dependencies ===
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
}
