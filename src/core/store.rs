//! Storage collaborator contract

use crate::core::error::{MarketResult, StorageError};
use crate::core::field::FieldValue;
use anyhow::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A single result row, keyed by output column name
pub type Row = Map<String, Value>;

/// Trait for stores that execute parameterized SQL
///
/// The core hands over query text with `$n` placeholders and the values bound
/// to them, and gets rows back in the order the statement produced them.
/// Implementations report failures as opaque `anyhow::Error`s; the core
/// propagates them without retrying.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Run a statement that returns rows
    async fn fetch(&self, sql: &str, values: &[FieldValue]) -> Result<Vec<Row>>;

    /// Run a statement for its side effect, returning the affected row count
    async fn execute(&self, sql: &str, values: &[FieldValue]) -> Result<u64>;
}

/// Decode a row into a typed record
pub fn decode_row<T: DeserializeOwned>(entity_type: &str, row: Row) -> MarketResult<T> {
    serde_json::from_value(Value::Object(row)).map_err(|e| {
        StorageError::Decode {
            entity_type: entity_type.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Decode every row into a typed record, failing on the first bad row
pub fn decode_rows<T: DeserializeOwned>(entity_type: &str, rows: Vec<Row>) -> MarketResult<Vec<T>> {
    rows.into_iter()
        .map(|row| decode_row(entity_type, row))
        .collect()
}
