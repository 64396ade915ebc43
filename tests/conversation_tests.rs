//! Conversation assembly against a scripted store

use market::prelude::*;
use market::storage::json_rows;
use serde_json::{Value, json};

fn entry(id: i64, from: &str, to: &str) -> Value {
    json!({
        "id": id,
        "from_username": from,
        "to_username": to,
        "item_name": "i4",
        "body": format!("message {}", id),
        "sent_at": format!("2024-03-01T10:00:{:02}+00:00", id)
    })
}

fn ids(thread: &[ConversationEntry]) -> Vec<i64> {
    thread.iter().map(|m| m.id).collect()
}

#[tokio::test]
async fn test_conversation_interleaves_both_directions() {
    let store = InMemoryStore::new();
    store
        .on_fetch(
            "FROM messages",
            json_rows(json!([entry(9, "u1", "u3"), entry(5, "u1", "u3"), entry(1, "u1", "u3")])),
        )
        .on_fetch(
            "FROM messages",
            json_rows(json!([entry(7, "u3", "u1"), entry(3, "u3", "u1")])),
        );

    let thread = message::conversation(&store, ValidatedId::new(4), "u1", "u3")
        .await
        .unwrap();

    assert_eq!(ids(&thread), vec![9, 7, 5, 3, 1]);
    assert_eq!(thread[1].from_username, "u3");
}

#[tokio::test]
async fn test_conversation_binds_each_direction() {
    let store = InMemoryStore::new();

    message::conversation(&store, ValidatedId::new(4), "u1", "u3")
        .await
        .unwrap();

    let statements = store.statements();
    assert_eq!(statements.len(), 2);
    assert_eq!(
        statements[0].values,
        vec![FieldValue::Integer(4), "u1".into(), "u3".into()]
    );
    assert_eq!(
        statements[1].values,
        vec![FieldValue::Integer(4), "u3".into(), "u1".into()]
    );
    assert!(statements[0].sql.contains("ORDER BY m.id DESC"));
}

#[tokio::test]
async fn test_conversation_one_sided() {
    let store = InMemoryStore::new();
    store
        .on_fetch("FROM messages", Vec::new())
        .on_fetch(
            "FROM messages",
            json_rows(json!([entry(2, "u3", "u1"), entry(1, "u3", "u1")])),
        );

    let thread = message::conversation(&store, ValidatedId::new(4), "u1", "u3")
        .await
        .unwrap();
    assert_eq!(ids(&thread), vec![2, 1]);
}

#[tokio::test]
async fn test_empty_conversation() {
    let store = InMemoryStore::new();
    let thread = message::conversation(&store, ValidatedId::new(4), "u1", "u2")
        .await
        .unwrap();
    assert!(thread.is_empty());
}

#[tokio::test]
async fn test_messages_between_spans_items() {
    let store = InMemoryStore::new();
    store
        .on_fetch("FROM messages", json_rows(json!([entry(8, "u1", "u2")])))
        .on_fetch(
            "FROM messages",
            json_rows(json!([entry(10, "u2", "u1"), entry(6, "u2", "u1")])),
        );

    let thread = message::messages_between(&store, "u1", "u2").await.unwrap();
    assert_eq!(ids(&thread), vec![10, 8, 6]);

    let statements = store.statements();
    assert!(!statements[0].sql.contains("m.item_id = $1"));
    assert_eq!(
        statements[0].values,
        vec![FieldValue::from("u1"), FieldValue::from("u2")]
    );
}

#[tokio::test]
async fn test_store_failure_propagates() {
    let store = InMemoryStore::new();
    store.fail_on("FROM messages", "timeout");

    let err = message::messages_between(&store, "u1", "u2")
        .await
        .unwrap_err();
    assert!(matches!(err, MarketError::Storage(_)));
}

#[tokio::test]
async fn test_create_message_binds_in_column_order() {
    let store = InMemoryStore::new();
    store.on_fetch(
        "INSERT INTO messages",
        json_rows(json!([{
            "id": 11,
            "from_username": "u1",
            "to_username": "u3",
            "item_id": 4,
            "body": "still available?",
            "sent_at": "2024-03-01T10:01:00+00:00"
        }])),
    );
    let outgoing = NewMessage {
        from_username: "u1".to_string(),
        to_username: "u3".to_string(),
        item_id: ValidatedId::new(4),
        body: "still available?".to_string(),
    };

    let stored = message::create(&store, &outgoing).await.unwrap();

    assert_eq!(stored.id, 11);
    assert_eq!(stored.item_id, 4);
    let statement = &store.statements()[0];
    assert!(statement.sql.contains("current_timestamp"));
    assert_eq!(
        statement.values,
        vec![
            FieldValue::from("u1"),
            FieldValue::from("u3"),
            FieldValue::Integer(4),
            FieldValue::from("still available?"),
        ]
    );
}
