//! Personalized item recommendations
//!
//! The pipeline has two stages:
//!
//! 1. **Affinity**: count the user's purchases per category.
//! 2. **Ranking**: retrieve unsold items from other, non-suspended sellers in
//!    those categories, score each by how many of the categories it belongs
//!    to, and attach the seller's coarse location.
//!
//! A user without purchases gets an empty list, never an error.

pub mod affinity;
pub mod ranking;

pub use affinity::{CategoryAffinity, order_affinities};
pub use ranking::{Candidate, CandidateRow, order_candidates, retain_eligible};

use crate::config::RecommendationConfig;
use crate::core::error::{MarketError, MarketResult};
use crate::core::field::FieldValue;
use crate::core::query::QueryFragment;
use crate::core::store::{RowStore, decode_rows};
use crate::entities::user;
use crate::query::ValidatedId;
use futures::future::try_join_all;
use std::sync::Arc;

/// Runs the recommendation pipeline against a row store
#[derive(Clone)]
pub struct RecommendationEngine {
    store: Arc<dyn RowStore>,
    config: RecommendationConfig,
}

impl RecommendationEngine {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self::with_config(store, RecommendationConfig::default())
    }

    pub fn with_config(store: Arc<dyn RowStore>, config: RecommendationConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &RecommendationConfig {
        &self.config
    }

    /// Categories the user has bought from, most purchased first
    ///
    /// Ties are broken by category id ascending. Empty when the user has no
    /// categorized purchases.
    pub async fn category_affinities(&self, username: &str) -> MarketResult<Vec<CategoryAffinity>> {
        let rows = self
            .store
            .fetch(affinity::AFFINITY_SQL, &[FieldValue::from(username)])
            .await?;
        let mut affinities: Vec<CategoryAffinity> = decode_rows("category affinity", rows)?;
        order_affinities(&mut affinities);

        tracing::debug!(categories = affinities.len(), "computed category affinities");
        Ok(affinities)
    }

    /// Rank items in `category_ids` for `username`
    ///
    /// Issues no retrieval when `category_ids` is empty. Rows for the user's
    /// own items or for suspended sellers are discarded even if the store
    /// returns them.
    pub async fn rank_candidates(
        &self,
        username: &str,
        category_ids: &[ValidatedId],
    ) -> MarketResult<Vec<Candidate>> {
        if category_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query =
            ranking::category_candidates_query(username, category_ids, self.config.max_candidates);
        self.ranked(username, query, true).await
    }

    /// Affinity followed by ranking
    pub async fn recommend_for_user(&self, username: &str) -> MarketResult<Vec<Candidate>> {
        let affinities = self.category_affinities(username).await?;
        let category_ids: Vec<ValidatedId> = affinities.iter().map(|a| a.category_id).collect();

        let candidates = self.rank_candidates(username, &category_ids).await?;
        tracing::info!(
            categories = category_ids.len(),
            candidates = candidates.len(),
            "recommendations ready"
        );
        Ok(candidates)
    }

    /// Unsold items from other, non-suspended sellers near a location
    ///
    /// Matches on zip code, on city and region together, or on region alone.
    /// Results are ordered by item id.
    ///
    /// # Errors
    /// `InvalidArgument` when every location part is blank.
    pub async fn items_near(
        &self,
        username: &str,
        zip_code: &str,
        city: &str,
        region_or_state: &str,
    ) -> MarketResult<Vec<Candidate>> {
        if [zip_code, city, region_or_state]
            .iter()
            .all(|part| part.trim().is_empty())
        {
            return Err(MarketError::invalid_argument(
                "a zip code, city or region is required",
            ));
        }

        let query = ranking::nearby_candidates_query(
            username,
            zip_code,
            city,
            region_or_state,
            self.config.max_candidates,
        );
        self.ranked(username, query, false).await
    }

    async fn ranked(
        &self,
        username: &str,
        query: QueryFragment,
        by_score: bool,
    ) -> MarketResult<Vec<Candidate>> {
        let rows = self.store.fetch(&query.text, &query.values).await?;
        let mut rows: Vec<ranking::CandidateRow> = decode_rows("candidate", rows)?;

        retain_eligible(&mut rows, username);
        if by_score {
            order_candidates(&mut rows);
        } else {
            rows.sort_by_key(|row| row.id);
        }
        if let Some(max) = self.config.max_candidates {
            rows.truncate(max as usize);
        }

        let store = self.store.as_ref();
        try_join_all(rows.into_iter().map(|row| async move {
            let location = user::coarse_location(store, &row.seller_username).await?;
            Ok::<_, MarketError>(Candidate::from_row(row, location))
        }))
        .await
    }
}
