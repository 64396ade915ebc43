//! In-memory scripted implementation of RowStore for testing and development
//!
//! The store does not interpret SQL. Replies are registered against a
//! substring of the statement text; every statement is recorded so callers
//! can assert on the exact text and bound values that reached the store.

use crate::core::field::FieldValue;
use crate::core::store::{Row, RowStore};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, RwLock};

/// A statement as received by the store
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub values: Vec<FieldValue>,
}

#[derive(Debug, Clone)]
enum Reply {
    Rows(Vec<Row>),
    Affected(u64),
    Fail(String),
}

#[derive(Debug)]
struct Script {
    pattern: String,
    replies: VecDeque<Reply>,
}

#[derive(Debug, Default)]
struct State {
    scripts: Vec<Script>,
    statements: Vec<Statement>,
}

/// Scripted row store
///
/// Replies queued for the same pattern are consumed in order; the last one
/// keeps answering. Patterns are tried in registration order. A statement
/// matching no pattern yields no rows (fetch) or zero affected rows (execute).
///
/// # Example
/// ```rust,ignore
/// let store = InMemoryStore::new();
/// store.on_fetch("FROM items", json_rows(json!([{"id": 1, "name": "lamp"}])));
/// let rows = store.fetch("SELECT id, name FROM items", &[]).await?;
/// assert_eq!(store.statements().len(), 1);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer fetches whose text contains `pattern` with `rows`
    pub fn on_fetch(&self, pattern: &str, rows: Vec<Row>) -> &Self {
        self.script(pattern, Reply::Rows(rows));
        self
    }

    /// Answer executes whose text contains `pattern` with an affected-row count
    pub fn on_execute(&self, pattern: &str, affected: u64) -> &Self {
        self.script(pattern, Reply::Affected(affected));
        self
    }

    /// Fail any statement whose text contains `pattern`
    pub fn fail_on(&self, pattern: &str, message: &str) -> &Self {
        self.script(pattern, Reply::Fail(message.to_string()));
        self
    }

    /// Every statement received so far, oldest first
    pub fn statements(&self) -> Vec<Statement> {
        self.state
            .read()
            .map(|state| state.statements.clone())
            .unwrap_or_default()
    }

    /// Statements whose text contains `pattern`
    pub fn statements_matching(&self, pattern: &str) -> Vec<Statement> {
        self.statements()
            .into_iter()
            .filter(|statement| statement.sql.contains(pattern))
            .collect()
    }

    fn script(&self, pattern: &str, reply: Reply) {
        let Ok(mut state) = self.state.write() else {
            return;
        };
        match state.scripts.iter_mut().find(|s| s.pattern == pattern) {
            Some(script) => script.replies.push_back(reply),
            None => state.scripts.push(Script {
                pattern: pattern.to_string(),
                replies: VecDeque::from([reply]),
            }),
        }
    }

    fn answer(&self, sql: &str, values: &[FieldValue]) -> Result<Option<Reply>> {
        let mut state = self
            .state
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        state.statements.push(Statement {
            sql: sql.to_string(),
            values: values.to_vec(),
        });

        let Some(script) = state.scripts.iter_mut().find(|s| sql.contains(&s.pattern)) else {
            return Ok(None);
        };
        let reply = if script.replies.len() > 1 {
            script.replies.pop_front()
        } else {
            script.replies.front().cloned()
        };
        Ok(reply)
    }
}

#[async_trait]
impl RowStore for InMemoryStore {
    async fn fetch(&self, sql: &str, values: &[FieldValue]) -> Result<Vec<Row>> {
        match self.answer(sql, values)? {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            Some(Reply::Affected(_)) => Err(anyhow!("statement was scripted as execute, not fetch")),
            None => Ok(Vec::new()),
        }
    }

    async fn execute(&self, sql: &str, values: &[FieldValue]) -> Result<u64> {
        match self.answer(sql, values)? {
            Some(Reply::Affected(affected)) => Ok(affected),
            Some(Reply::Rows(rows)) => Ok(rows.len() as u64),
            Some(Reply::Fail(message)) => Err(anyhow!(message)),
            None => Ok(0),
        }
    }
}

/// Convert a JSON array of objects into rows, skipping anything that is not an object
pub fn json_rows(value: Value) -> Vec<Row> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(row) => Some(row),
                _ => None,
            })
            .collect(),
        Value::Object(row) => vec![row],
        _ => Vec::new(),
    }
}
