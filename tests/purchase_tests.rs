//! Recording sales against a scripted store

use market::prelude::*;
use market::storage::json_rows;
use serde_json::json;

const CLAIM: &str = "SET is_sold = true";
const RELEASE: &str = "SET is_sold = false";
const SOLD_CHECK: &str = "SELECT is_sold";
const INSERT: &str = "INSERT INTO purchases";

fn purchase_row(item_id: i64, username: &str) -> Vec<Row> {
    json_rows(json!([{
        "id": 1,
        "item_id": item_id,
        "username": username,
        "final_price": null,
        "exchange_method": null,
        "sale_made": "2024-06-01T09:15:00.5+00:00"
    }]))
}

#[tokio::test]
async fn test_make_sale_claims_item_then_records_purchase() {
    let store = InMemoryStore::new();
    store
        .on_fetch(CLAIM, json_rows(json!([{"id": 3}])))
        .on_fetch(INSERT, purchase_row(3, "u1"));

    let purchase = user::make_sale(&store, "u1", ValidatedId::new(3))
        .await
        .unwrap();

    assert_eq!(purchase.item_id, 3);
    assert_eq!(purchase.username, "u1");
    assert!(purchase.final_price.is_none());

    let statements = store.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].sql.contains("WHERE id = $1 AND is_sold = false"));
    assert_eq!(statements[0].values, vec![FieldValue::Integer(3)]);
    assert!(statements[1].sql.starts_with(INSERT));
    assert_eq!(
        statements[1].values,
        vec![FieldValue::Integer(3), FieldValue::from("u1")]
    );
}

#[tokio::test]
async fn test_make_sale_on_sold_item_conflicts() {
    let store = InMemoryStore::new();
    store.on_fetch(SOLD_CHECK, json_rows(json!([{"is_sold": true}])));

    let err = user::make_sale(&store, "u1", ValidatedId::new(4))
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::Conflict { .. }));
    assert!(store.statements_matching(INSERT).is_empty());
}

#[tokio::test]
async fn test_make_sale_on_missing_item() {
    let store = InMemoryStore::new();

    let err = user::make_sale(&store, "u1", ValidatedId::new(99))
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::NotFound { .. }));
    assert!(store.statements_matching(INSERT).is_empty());
}

#[tokio::test]
async fn test_failed_purchase_releases_item() {
    let store = InMemoryStore::new();
    store
        .on_fetch(CLAIM, json_rows(json!([{"id": 3}])))
        .fail_on(INSERT, "insert or update on table \"purchases\" violates foreign key constraint");

    let err = user::make_sale(&store, "ghost", ValidatedId::new(3))
        .await
        .unwrap_err();

    assert!(matches!(err, MarketError::Storage(_)));
    let release = &store.statements_matching(RELEASE)[0];
    assert_eq!(release.values, vec![FieldValue::Integer(3)]);
}
