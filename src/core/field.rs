//! Bound value types passed alongside query text

use serde::{Deserialize, Serialize};
use std::fmt;

/// A polymorphic value bound to a positional placeholder
///
/// Request payloads arrive as loosely typed JSON, so this mirrors the JSON
/// scalar shapes. Arrays and objects are never bound.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FieldValue {
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Null,
}

impl FieldValue {
    /// Get the value as a string if possible
    pub fn as_string(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the value as an integer if possible
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get the value as a float, widening integers
    pub fn as_float(&self) -> Option<f64> {
        match self {
            FieldValue::Float(f) => Some(*f),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Read the value as a number, accepting numeric text like `"100"` or `" 12.5 "`.
    ///
    /// Integers stay integers so they bind as `BIGINT`; everything else becomes
    /// a float. Returns `None` for booleans, null, non-numeric text and
    /// non-finite floats.
    pub fn to_numeric(&self) -> Option<FieldValue> {
        match self {
            FieldValue::Integer(_) => Some(self.clone()),
            FieldValue::Float(f) => Some(*f).filter(|f| f.is_finite()).map(FieldValue::Float),
            FieldValue::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Some(FieldValue::Integer(i))
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(FieldValue::Float)
                }
            }
            FieldValue::Boolean(_) | FieldValue::Null => None,
        }
    }

    /// Wrap the value in `%` markers for a substring match
    ///
    /// Non-string scalars are rendered to text first so `ILIKE` always receives text.
    pub fn to_contains_pattern(&self) -> FieldValue {
        FieldValue::String(format!("%{}%", self))
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Boolean(b) => write!(f, "{}", b),
            FieldValue::Integer(i) => write!(f, "{}", i),
            FieldValue::Float(x) => write!(f, "{}", x),
            FieldValue::String(s) => f.write_str(s),
            FieldValue::Null => Ok(()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::String(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Integer(value.into())
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}
