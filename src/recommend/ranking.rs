//! Candidate retrieval and ordering

use crate::core::field::FieldValue;
use crate::core::query::QueryFragment;
use crate::entities::user::CoarseLocation;
use crate::query::{ValidatedId, any_id_matches};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// Columns shared by the category and location candidate queries
const CANDIDATE_COLUMNS: &str = "i.id, i.name, i.image_url, i.initial_price, i.seller_username, \
     i.condition, i.description, u.is_flagged AS seller_suspended";

/// A candidate row as returned by the store, before enrichment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRow {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub initial_price: f64,
    pub seller_username: String,
    pub condition: Option<String>,
    pub description: Option<String>,
    /// Required: a row without it cannot pass the eligibility re-check
    pub seller_suspended: bool,
    #[serde(default)]
    pub score: i64,
}

/// A ranked recommendation, carrying the seller's coarse location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub initial_price: f64,
    pub seller_username: String,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub score: i64,
    pub location: CoarseLocation,
}

impl Candidate {
    pub(crate) fn from_row(row: CandidateRow, location: CoarseLocation) -> Self {
        Self {
            id: row.id,
            name: row.name,
            image_url: row.image_url,
            initial_price: row.initial_price,
            seller_username: row.seller_username,
            condition: row.condition,
            description: row.description,
            score: row.score,
            location,
        }
    }
}

/// Drop rows the requester must never be shown
///
/// A row survives only if its seller is neither `requester` nor suspended.
pub fn retain_eligible(rows: &mut Vec<CandidateRow>, requester: &str) {
    let before = rows.len();
    rows.retain(|row| row.seller_username != requester && !row.seller_suspended);

    let dropped = before - rows.len();
    if dropped > 0 {
        tracing::warn!(dropped, "store returned ineligible candidates");
    }
}

/// Order candidates by score descending, then item id ascending
pub fn order_candidates(rows: &mut [CandidateRow]) {
    rows.sort_by_key(|row| (Reverse(row.score), row.id));
}

/// Unsold items from other, non-suspended sellers in any of `category_ids`
///
/// The requester is bound at `$1`; category ids are inlined. `category_ids`
/// must be non-empty.
pub(crate) fn category_candidates_query(
    requester: &str,
    category_ids: &[ValidatedId],
    limit: Option<u32>,
) -> QueryFragment {
    let mut text = format!(
        "SELECT {}, COUNT(*) AS score \
         FROM items AS i \
         JOIN items_to_types AS it ON i.id = it.item_id \
         JOIN users AS u ON i.seller_username = u.username \
         WHERE i.is_sold = false AND i.seller_username != $1 AND u.is_flagged = false \
         AND ({}) \
         GROUP BY i.id, u.is_flagged \
         ORDER BY score DESC, i.id ASC",
        CANDIDATE_COLUMNS,
        any_id_matches("it.type_id", category_ids)
    );
    if let Some(limit) = limit {
        text.push_str(&format!(" LIMIT {}", limit));
    }

    QueryFragment {
        text,
        values: vec![FieldValue::from(requester)],
    }
}

/// Unsold items from other, non-suspended sellers near a location
///
/// A seller is near when the zip code matches, or the city and region match,
/// or the region matches.
pub(crate) fn nearby_candidates_query(
    requester: &str,
    zip_code: &str,
    city: &str,
    region_or_state: &str,
    limit: Option<u32>,
) -> QueryFragment {
    let mut text = format!(
        "SELECT {} \
         FROM items AS i \
         JOIN users AS u ON i.seller_username = u.username \
         WHERE i.is_sold = false AND i.seller_username != $1 AND u.is_flagged = false \
         AND (u.zip_code = $2 OR (u.city = $3 AND u.region_or_state = $4) \
         OR u.region_or_state = $4) \
         ORDER BY i.id ASC",
        CANDIDATE_COLUMNS
    );
    if let Some(limit) = limit {
        text.push_str(&format!(" LIMIT {}", limit));
    }

    QueryFragment {
        text,
        values: vec![
            requester.into(),
            zip_code.into(),
            city.into(),
            region_or_state.into(),
        ],
    }
}
