//! Parameterized query fragments

use crate::core::field::FieldValue;
use serde::Serialize;

/// Query text with positional placeholders plus the values bound to them
///
/// Placeholders use the PostgreSQL `$n` form. A fragment built by this crate
/// always satisfies: the placeholders in `text` are exactly `$start..$start+len-1`,
/// each appearing once, in the same order as `values`.
///
/// # Example
/// ```rust,ignore
/// let fragment = build_filter::<ItemFilter>(&request)?;
/// let sql = format!("SELECT id FROM items WHERE {} is_sold = false", fragment.text);
/// store.fetch(&sql, &fragment.values).await?;
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryFragment {
    /// Predicate or assignment text
    pub text: String,

    /// Values bound to the placeholders, in placeholder order
    pub values: Vec<FieldValue>,
}

impl QueryFragment {
    /// The fragment that contributes nothing: `("", [])`
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check whether the fragment carries any terms
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.values.is_empty()
    }

    /// Number of bound values
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Index of the placeholder a caller should use for its next bound value
    ///
    /// An update built from three fields occupies `$1..$3`, so the trailing
    /// `WHERE id = $4` uses `next_placeholder() == 4`.
    pub fn next_placeholder(&self) -> usize {
        self.values.len() + 1
    }

    /// Consume the fragment, appending `extra` to the bound values
    pub fn into_values_with(mut self, extra: impl IntoIterator<Item = FieldValue>) -> Vec<FieldValue> {
        self.values.extend(extra);
        self.values
    }
}

/// Render the positional placeholder for a 1-based index
pub fn placeholder(index: usize) -> String {
    format!("${}", index)
}

/// Extract placeholder indices from query text in order of appearance
///
/// Scans for `$` followed by ASCII digits. Used by tests and debug assertions
/// to check the placeholder invariant.
pub fn placeholder_indices(text: &str) -> Vec<usize> {
    let bytes = text.as_bytes();
    let mut indices = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if end > start {
                if let Ok(index) = text[start..end].parse() {
                    indices.push(index);
                }
            }
            i = end.max(i + 1);
        } else {
            i += 1;
        }
    }

    indices
}
