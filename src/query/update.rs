//! Assignment-list construction for partial updates

use crate::core::error::{MarketError, MarketResult};
use crate::core::field::FieldValue;
use crate::core::query::{QueryFragment, placeholder};
use indexmap::IndexMap;

/// Field → new value, in the order the assignments should be emitted
pub type Changes = IndexMap<String, FieldValue>;

/// Closed set of updatable fields for one entity type
///
/// A field absent from `ALL` is written to a column of the same name, so the
/// map only needs entries where the field and column names differ.
pub trait UpdateColumns: Copy + Sized + 'static {
    /// Every field with an explicit column mapping
    const ALL: &'static [Self];

    /// Semantic field name as it appears in [`Changes`]
    fn field(self) -> &'static str;

    /// Unquoted column name
    fn column(self) -> &'static str;

    /// Resolve a field name to its column, if mapped
    fn column_for(field: &str) -> Option<&'static str> {
        Self::ALL
            .iter()
            .find(|candidate| candidate.field() == field)
            .map(|candidate| candidate.column())
    }
}

/// Column map that maps nothing, so every field is its own column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityColumns {}

impl UpdateColumns for IdentityColumns {
    const ALL: &'static [Self] = &[];

    fn field(self) -> &'static str {
        match self {}
    }

    fn column(self) -> &'static str {
        match self {}
    }
}

/// Build `"col1"=$1, "col2"=$2, ...` plus the ordered values
///
/// Field names missing from `C` are used verbatim as column names. Call sites
/// must only pass field names from a typed patch or another allow-list.
///
/// # Errors
/// `InvalidArgument` when `changes` is empty.
pub fn build_partial_update<C: UpdateColumns>(changes: &Changes) -> MarketResult<QueryFragment> {
    if changes.is_empty() {
        return Err(MarketError::invalid_argument("no data to update"));
    }

    let mut assignments = Vec::with_capacity(changes.len());
    let mut values = Vec::with_capacity(changes.len());

    for (idx, (field, value)) in changes.iter().enumerate() {
        let column = C::column_for(field).unwrap_or(field.as_str());
        assignments.push(format!("\"{}\"={}", column, placeholder(idx + 1)));
        values.push(value.clone());
    }

    Ok(QueryFragment {
        text: assignments.join(", "),
        values,
    })
}
