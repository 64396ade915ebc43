//! Typed error handling for the marketplace core
//!
//! Query builders, repositories and the recommendation engine all return
//! [`MarketResult`]. Storage failures stay opaque: the core never interprets
//! or retries them, it only wraps them so callers can map them to a response.
//!
//! # Error Categories
//!
//! - [`MarketError::InvalidArgument`]: caller supplied unusable input
//!   (empty update payload, malformed id, non-numeric price filter)
//! - [`MarketError::NotFound`]: an entity the operation needs does not exist
//! - [`MarketError::Conflict`]: the entity is in a state that forbids the operation
//! - [`StorageError`]: failures surfaced by the storage collaborator
//! - [`ConfigError`]: configuration loading failures
//!
//! # Example
//!
//! ```rust,ignore
//! match item::update(&store, id, &patch).await {
//!     Ok(item) => println!("updated {}", item.id),
//!     Err(MarketError::NotFound { key, .. }) => println!("no item {}", key),
//!     Err(e) => eprintln!("other error: {}", e),
//! }
//! ```

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// The main error type for the marketplace core
#[derive(Debug, thiserror::Error)]
pub enum MarketError {
    /// Input rejected before anything reached the store
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Entity was not found
    #[error("{entity_type} '{key}' not found")]
    NotFound { entity_type: String, key: String },

    /// Entity state forbids the operation
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Storage backend errors
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Error response structure for HTTP responses
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl MarketError {
    /// Shorthand for [`MarketError::InvalidArgument`]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        MarketError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`MarketError::NotFound`]
    pub fn not_found(entity_type: &str, key: impl ToString) -> Self {
        MarketError::NotFound {
            entity_type: entity_type.to_string(),
            key: key.to_string(),
        }
    }

    /// Shorthand for [`MarketError::Conflict`]
    pub fn conflict(message: impl Into<String>) -> Self {
        MarketError::Conflict {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            MarketError::InvalidArgument { .. } => StatusCode::BAD_REQUEST,
            MarketError::NotFound { .. } => StatusCode::NOT_FOUND,
            MarketError::Conflict { .. } => StatusCode::CONFLICT,
            MarketError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            MarketError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            MarketError::InvalidArgument { .. } => "INVALID_ARGUMENT",
            MarketError::NotFound { .. } => "NOT_FOUND",
            MarketError::Conflict { .. } => "CONFLICT",
            MarketError::Storage(_) => "STORAGE_ERROR",
            MarketError::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Convert to an error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.error_code().to_string(),
            message: self.to_string(),
            details: self.details(),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            MarketError::NotFound { entity_type, key } => Some(serde_json::json!({
                "entity_type": entity_type,
                "key": key
            })),
            _ => None,
        }
    }
}

impl IntoResponse for MarketError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(self.to_response());
        (status, body).into_response()
    }
}

// =============================================================================
// Storage Errors
// =============================================================================

/// Errors surfaced by the storage collaborator
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Connection error
    #[error("Failed to connect to {backend}: {message}")]
    Connection { backend: String, message: String },

    /// Query execution error
    #[error("{backend} query error: {message}")]
    Query { backend: String, message: String },

    /// A row came back in a shape the caller could not decode
    #[error("Failed to decode {entity_type} row: {message}")]
    Decode {
        entity_type: String,
        message: String,
    },

    /// Anything else reported by the backend, passed through untouched
    #[error("Storage failure: {0}")]
    Opaque(String),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors related to configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to parse configuration
    #[error("Failed to parse config{}: {message}", file_suffix(.file))]
    Parse {
        file: Option<String>,
        message: String,
    },

    /// Configuration file could not be read
    #[error("Failed to read config file '{path}': {message}")]
    Io { path: String, message: String },

    /// Invalid value in configuration
    #[error("Invalid value '{value}' for field '{field}': {message}")]
    InvalidValue {
        field: String,
        value: String,
        message: String,
    },
}

fn file_suffix(file: &Option<String>) -> String {
    file.as_deref()
        .map(|f| format!(" file '{}'", f))
        .unwrap_or_default()
}

// =============================================================================
// Conversions from external errors
// =============================================================================

impl From<serde_yaml::Error> for MarketError {
    fn from(err: serde_yaml::Error) -> Self {
        MarketError::Config(ConfigError::Parse {
            file: None,
            message: err.to_string(),
        })
    }
}

/// Store implementations report failures as `anyhow::Error`.
///
/// A `MarketError` raised inside a store (e.g. by a scripted test store) is
/// recovered as-is; anything else becomes an opaque storage failure.
impl From<anyhow::Error> for MarketError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<MarketError>() {
            Ok(market_err) => market_err,
            Err(err) => match err.downcast::<StorageError>() {
                Ok(storage_err) => MarketError::Storage(storage_err),
                Err(err) => MarketError::Storage(StorageError::Opaque(format!("{:#}", err))),
            },
        }
    }
}

// =============================================================================
// Result type alias
// =============================================================================

/// A specialized Result type for marketplace operations
pub type MarketResult<T> = Result<T, MarketError>;
