//! Predicate construction from loosely structured filter input
//!
//! A request carries arbitrary keys; only the fields a [`FilterColumns`]
//! enumeration declares ever reach the query text. Values are always bound,
//! never interpolated.

use crate::core::error::{MarketError, MarketResult};
use crate::core::field::FieldValue;
use crate::core::query::{QueryFragment, placeholder};
use indexmap::IndexMap;

/// Raw filter input, in the order the caller supplied it
///
/// Deserializes from any JSON object whose values are scalars, e.g.
/// `{"name": "lamp", "maxPrice": "100"}`.
pub type FilterRequest = IndexMap<String, FieldValue>;

/// Comparison applied between a column and its bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// `column = $n`
    Equals,
    /// `column ILIKE $n`, with the bound value wrapped as `%value%`
    Contains,
    /// `column <= $n`
    AtMost,
    /// `column >= $n`
    AtLeast,
}

impl FilterOp {
    /// SQL operator token
    pub fn as_sql(self) -> &'static str {
        match self {
            FilterOp::Equals => "=",
            FilterOp::Contains => "ILIKE",
            FilterOp::AtMost => "<=",
            FilterOp::AtLeast => ">=",
        }
    }
}

/// How a raw input value is prepared before binding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Bound as supplied
    Text,
    /// Numeric text such as `"100"` is converted to a number first
    Numeric,
}

/// Closed set of filterable fields for one entity type
///
/// Implemented by a fieldless enum. `ALL` lists every variant in the order
/// predicate terms are emitted; the request never influences that order.
///
/// # Example
/// ```rust,ignore
/// #[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// enum CarFilter { Make, MaxMileage }
///
/// impl FilterColumns for CarFilter {
///     const ALL: &'static [Self] = &[CarFilter::Make, CarFilter::MaxMileage];
///     fn key(self) -> &'static str { match self { Self::Make => "make", Self::MaxMileage => "maxMileage" } }
///     fn column(self) -> &'static str { match self { Self::Make => "make", Self::MaxMileage => "mileage" } }
///     fn op(self) -> FilterOp { match self { Self::Make => FilterOp::Contains, Self::MaxMileage => FilterOp::AtMost } }
/// }
/// ```
pub trait FilterColumns: Copy + Sized + 'static {
    /// Every filterable field, in emission order
    const ALL: &'static [Self];

    /// Key the field is looked up by in a [`FilterRequest`]
    fn key(self) -> &'static str;

    /// Unquoted column name
    fn column(self) -> &'static str;

    /// Comparison operator
    fn op(self) -> FilterOp;

    /// Value preparation, text by default
    fn kind(self) -> ValueKind {
        ValueKind::Text
    }

    /// Resolve a request key to its field
    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

/// Build the conjunction of every recognized filter in `request`
///
/// See [`build_filter_from`]; placeholders start at `$1`.
pub fn build_filter<C: FilterColumns>(request: &FilterRequest) -> MarketResult<QueryFragment> {
    build_filter_from::<C>(request, 1)
}

/// Build the conjunction of every recognized filter, numbering placeholders from `first`
///
/// - Terms follow `C::ALL` order and are joined by `AND`.
/// - A non-empty result ends with a trailing ` AND` so the caller can append
///   its own baseline condition directly.
/// - Unrecognized keys are dropped. Null values count as absent.
/// - No recognized keys yields `("", [])`.
///
/// # Errors
/// `InvalidArgument` when a numeric field receives a value that is not a number.
pub fn build_filter_from<C: FilterColumns>(
    request: &FilterRequest,
    first: usize,
) -> MarketResult<QueryFragment> {
    let mut terms = Vec::new();
    let mut values = Vec::new();

    for &field in C::ALL {
        let Some(raw) = request.get(field.key()) else {
            continue;
        };
        if raw.is_null() {
            continue;
        }

        let value = prepare_value(field, raw)?;
        terms.push(format!(
            "\"{}\" {} {}",
            field.column(),
            field.op().as_sql(),
            placeholder(first + values.len())
        ));
        values.push(value);
    }

    let dropped = request
        .keys()
        .filter(|key| C::from_key(key).is_none())
        .count();
    tracing::debug!(terms = terms.len(), dropped, "built filter predicate");

    if terms.is_empty() {
        return Ok(QueryFragment::empty());
    }

    Ok(QueryFragment {
        text: format!("{} AND", terms.join(" AND ")),
        values,
    })
}

fn prepare_value<C: FilterColumns>(field: C, raw: &FieldValue) -> MarketResult<FieldValue> {
    let value = match field.kind() {
        ValueKind::Text => raw.clone(),
        ValueKind::Numeric => raw.to_numeric().ok_or_else(|| {
            MarketError::invalid_argument(format!("{} must be a number", field.key()))
        })?,
    };

    Ok(match field.op() {
        FilterOp::Contains => value.to_contains_pattern(),
        _ => value,
    })
}
