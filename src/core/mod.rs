//! Core module containing the fundamental types shared by every layer

pub mod error;
pub mod field;
pub mod query;
pub mod store;

pub use error::{ConfigError, ErrorResponse, MarketError, MarketResult, StorageError};
pub use field::FieldValue;
pub use query::{QueryFragment, placeholder};
pub use store::{Row, RowStore, decode_row, decode_rows};
