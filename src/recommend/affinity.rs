//! Category affinity from purchase history

use crate::query::ValidatedId;
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;

/// How many of a user's purchases fall into one category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAffinity {
    pub category_id: ValidatedId,
    pub name: String,
    pub count: i64,
}

/// Purchases per category for the user bound at `$1`
pub(crate) const AFFINITY_SQL: &str = "SELECT it.type_id AS category_id, t.name, COUNT(*) AS count \
     FROM purchases AS p \
     JOIN items_to_types AS it ON p.item_id = it.item_id \
     JOIN item_types AS t ON it.type_id = t.id \
     WHERE p.username = $1 \
     GROUP BY it.type_id, t.name \
     ORDER BY count DESC, it.type_id ASC";

/// Order affinities by count descending, then category id ascending
pub fn order_affinities(affinities: &mut [CategoryAffinity]) {
    affinities.sort_by_key(|a| (Reverse(a.count), a.category_id));
}
