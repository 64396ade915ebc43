//! Multi-row value lists and id disjunctions with inlined ids
//!
//! These builders write ids straight into the query text instead of binding
//! them. They only accept [`ValidatedId`], so the text can never contain
//! anything but base-10 integers.

use crate::core::error::{MarketError, MarketResult};
use crate::core::field::FieldValue;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An integer identifier that is safe to inline into query text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidatedId(i64);

impl ValidatedId {
    /// Wrap an integer id
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// The wrapped integer
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Parse an id from text, accepting only an optionally signed base-10 integer
    pub fn parse(raw: &str) -> MarketResult<Self> {
        raw.parse::<i64>()
            .map(Self)
            .map_err(|_| MarketError::invalid_argument(format!("'{}' is not a valid id", raw)))
    }
}

impl fmt::Display for ValidatedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for ValidatedId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

impl From<i32> for ValidatedId {
    fn from(id: i32) -> Self {
        Self(id.into())
    }
}

impl From<ValidatedId> for FieldValue {
    fn from(id: ValidatedId) -> Self {
        FieldValue::Integer(id.0)
    }
}

impl FromStr for ValidatedId {
    type Err = MarketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<&FieldValue> for ValidatedId {
    type Error = MarketError;

    fn try_from(value: &FieldValue) -> Result<Self, Self::Error> {
        match value {
            FieldValue::Integer(i) => Ok(Self(*i)),
            FieldValue::String(s) => Self::parse(s),
            other => Err(MarketError::invalid_argument(format!(
                "'{}' is not a valid id",
                other
            ))),
        }
    }
}

/// Render `(anchor, r1), (anchor, r2), ...` for a multi-row `VALUES` clause
///
/// Returns an empty string for an empty `related` list; the caller must not
/// issue an insert in that case.
pub fn multi_row_values(anchor: ValidatedId, related: &[ValidatedId]) -> String {
    related
        .iter()
        .map(|id| format!("({}, {})", anchor, id))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render `column=i1 OR column=i2 OR ...`
///
/// Returns an empty string for an empty id list; the caller must special-case
/// zero ids rather than splice an empty disjunction into a predicate.
pub fn any_id_matches(column: &'static str, ids: &[ValidatedId]) -> String {
    ids.iter()
        .map(|id| format!("{}={}", column, id))
        .collect::<Vec<_>>()
        .join(" OR ")
}
