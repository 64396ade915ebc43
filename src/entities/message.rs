//! Messages exchanged between two users, assembled into threads

use crate::core::error::{MarketResult, StorageError};
use crate::core::field::FieldValue;
use crate::core::store::{RowStore, decode_row, decode_rows};
use crate::merge::merge_descending;
use crate::query::ValidatedId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "message";

const ENTRY_COLUMNS: &str =
    "m.id, m.from_username, m.to_username, i.name AS item_name, m.body, m.sent_at";

/// A message about to be sent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMessage {
    pub from_username: String,
    pub to_username: String,
    pub item_id: ValidatedId,
    pub body: String,
}

/// A stored message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub item_id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// One message within a conversation thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    pub id: i64,
    pub from_username: String,
    pub to_username: String,
    pub item_name: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

/// Store a message, stamped with the database's current time
pub async fn create(store: &dyn RowStore, message: &NewMessage) -> MarketResult<Message> {
    let row = store
        .fetch(
            "INSERT INTO messages (from_username, to_username, item_id, body, sent_at) \
             VALUES ($1, $2, $3, $4, current_timestamp) \
             RETURNING id, from_username, to_username, item_id, body, sent_at",
            &[
                message.from_username.as_str().into(),
                message.to_username.as_str().into(),
                message.item_id.into(),
                message.body.as_str().into(),
            ],
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| StorageError::Opaque("no message row returned".to_string()))?;

    let stored: Message = decode_row(ENTITY, row)?;
    tracing::debug!(message_id = stored.id, item_id = stored.item_id, "stored message");
    Ok(stored)
}

/// Messages between two users about one item, newest first
///
/// Reads each direction of the exchange separately and merges the two
/// id-descending results.
pub async fn conversation(
    store: &dyn RowStore,
    item_id: ValidatedId,
    user_one: &str,
    user_two: &str,
) -> MarketResult<Vec<ConversationEntry>> {
    let sql = format!(
        "SELECT {} FROM messages AS m JOIN items AS i ON m.item_id = i.id \
         WHERE m.item_id = $1 AND m.from_username = $2 AND m.to_username = $3 \
         ORDER BY m.id DESC",
        ENTRY_COLUMNS
    );

    let sent = directional(
        store,
        &sql,
        &[item_id.into(), user_one.into(), user_two.into()],
    )
    .await?;
    let received = directional(
        store,
        &sql,
        &[item_id.into(), user_two.into(), user_one.into()],
    )
    .await?;

    let thread = merge_descending(sent, received, |entry| entry.id);
    tracing::debug!(item_id = %item_id, messages = thread.len(), "assembled conversation");
    Ok(thread)
}

/// Messages between two users across every item, newest first
pub async fn messages_between(
    store: &dyn RowStore,
    user_one: &str,
    user_two: &str,
) -> MarketResult<Vec<ConversationEntry>> {
    let sql = format!(
        "SELECT {} FROM messages AS m JOIN items AS i ON m.item_id = i.id \
         WHERE m.from_username = $1 AND m.to_username = $2 \
         ORDER BY m.id DESC",
        ENTRY_COLUMNS
    );

    let sent = directional(store, &sql, &[user_one.into(), user_two.into()]).await?;
    let received = directional(store, &sql, &[user_two.into(), user_one.into()]).await?;

    let thread = merge_descending(sent, received, |entry| entry.id);
    tracing::debug!(messages = thread.len(), "assembled message history");
    Ok(thread)
}

async fn directional(
    store: &dyn RowStore,
    sql: &str,
    values: &[FieldValue],
) -> MarketResult<Vec<ConversationEntry>> {
    let rows = store.fetch(sql, values).await?;
    decode_rows(ENTITY, rows)
}
