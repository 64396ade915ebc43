//! Items: search, lookup, updates and category membership

use crate::core::error::{MarketError, MarketResult};
use crate::core::field::FieldValue;
use crate::core::store::{Row, RowStore, decode_row, decode_rows};
use crate::entities::user::{self, CoarseLocation, Location};
use crate::query::{
    Changes, FilterRequest, UpdateColumns, ValidatedId, build_filter, build_partial_update,
    multi_row_values,
};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};

const ENTITY: &str = "item";

const ITEM_COLUMNS: &str =
    "id, name, image_url, initial_price, condition, description, seller_username, is_sold";

filter_columns! {
    /// Filters accepted by the item search
    pub enum ItemFilter {
        Name => ("name", "name", Contains),
        Condition => ("condition", "condition", Contains),
        MaxPrice => ("maxPrice", "initial_price", AtMost, Numeric),
    }
}

update_columns! {
    /// Updatable item fields and the columns they write to
    pub enum ItemColumn {
        Name => ("name", "name"),
        Condition => ("condition", "condition"),
        Description => ("description", "description"),
        InitialPrice => ("initialPrice", "initial_price"),
    }
}

/// An item listed for sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub image_url: Option<String>,
    pub initial_price: f64,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub seller_username: String,
    #[serde(default)]
    pub is_sold: bool,
}

/// An item category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: ValidatedId,
    pub name: String,
}

/// Search result: an item with its categories and its seller's coarse location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemListing {
    #[serde(flatten)]
    pub item: Item,
    pub categories: Vec<Category>,
    pub location: CoarseLocation,
}

/// Single item view, carrying the seller's full location
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: Item,
    pub categories: Vec<Category>,
    pub location: Location,
}

/// Partial item update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    pub name: Option<String>,
    pub condition: Option<String>,
    pub description: Option<String>,
    pub initial_price: Option<f64>,
}

impl ItemPatch {
    /// Fields that are set, keyed by their semantic name
    pub fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        if let Some(name) = &self.name {
            changes.insert(ItemColumn::Name.field().to_string(), name.as_str().into());
        }
        if let Some(condition) = &self.condition {
            changes.insert(
                ItemColumn::Condition.field().to_string(),
                condition.as_str().into(),
            );
        }
        if let Some(description) = &self.description {
            changes.insert(
                ItemColumn::Description.field().to_string(),
                description.as_str().into(),
            );
        }
        if let Some(price) = self.initial_price {
            changes.insert(ItemColumn::InitialPrice.field().to_string(), price.into());
        }
        changes
    }
}

/// Unsold items matching `filters`, ordered by id
///
/// Unknown filter keys are ignored. Each result carries its categories and
/// the seller's coarse location.
pub async fn find_all(store: &dyn RowStore, filters: &FilterRequest) -> MarketResult<Vec<ItemListing>> {
    let predicate = build_filter::<ItemFilter>(filters)?;
    let sql = format!(
        "SELECT {} FROM items WHERE {} is_sold = false ORDER BY id",
        ITEM_COLUMNS, predicate.text
    );

    let items: Vec<Item> = decode_rows(ENTITY, store.fetch(&sql, &predicate.values).await?)?;
    tracing::debug!(count = items.len(), "found items");

    try_join_all(items.into_iter().map(|item| async move {
        let categories = categories_of(store, ValidatedId::new(item.id)).await?;
        let location = user::coarse_location(store, &item.seller_username).await?;
        Ok::<_, MarketError>(ItemListing {
            item,
            categories,
            location,
        })
    }))
    .await
}

/// A single item with its categories and the seller's full location
///
/// # Errors
/// `NotFound` when no item has `id`.
pub async fn find_by_id(store: &dyn RowStore, id: ValidatedId) -> MarketResult<ItemDetail> {
    let item = fetch_item(store, id).await?;
    let location = user::location(store, &item.seller_username).await?;
    let categories = categories_of(store, id).await?;

    Ok(ItemDetail {
        item,
        categories,
        location,
    })
}

async fn fetch_item(store: &dyn RowStore, id: ValidatedId) -> MarketResult<Item> {
    let sql = format!("SELECT {} FROM items WHERE id = $1", ITEM_COLUMNS);
    let row = first_row(store.fetch(&sql, &[id.into()]).await?)
        .ok_or_else(|| MarketError::not_found(ENTITY, id))?;
    decode_row(ENTITY, row)
}

/// Every category, ordered by id
pub async fn all_categories(store: &dyn RowStore) -> MarketResult<Vec<Category>> {
    let rows = store
        .fetch("SELECT id, name FROM item_types ORDER BY id", &[])
        .await?;
    decode_rows("category", rows)
}

/// Categories an item belongs to, ordered by id
pub async fn categories_of(store: &dyn RowStore, item_id: ValidatedId) -> MarketResult<Vec<Category>> {
    let rows = store
        .fetch(
            "SELECT t.id, t.name FROM item_types AS t \
             JOIN items_to_types AS it ON t.id = it.type_id \
             WHERE it.item_id = $1 ORDER BY t.id",
            &[item_id.into()],
        )
        .await?;
    decode_rows("category", rows)
}

/// Full location of the user selling an item
pub async fn seller_location(store: &dyn RowStore, seller_username: &str) -> MarketResult<Location> {
    user::location(store, seller_username).await
}

/// Apply a partial update to an unsold item
///
/// # Errors
/// - `NotFound` when no item has `id`
/// - `Conflict` when the item has already been sold, or is sold while the
///   update is in flight
/// - `InvalidArgument` for an empty patch
pub async fn update(store: &dyn RowStore, id: ValidatedId, patch: &ItemPatch) -> MarketResult<Item> {
    let changes = patch.changes();
    let assignments = build_partial_update::<ItemColumn>(&changes)?;

    let sold_row = first_row(
        store
            .fetch("SELECT is_sold FROM items WHERE id = $1", &[id.into()])
            .await?,
    )
    .ok_or_else(|| MarketError::not_found(ENTITY, id))?;
    if sold_row.get("is_sold").and_then(|v| v.as_bool()) == Some(true) {
        return Err(already_sold(id));
    }

    // A sale landing between the check and the write leaves no row to return.
    let sql = format!(
        "UPDATE items SET {} WHERE id = ${} AND is_sold = false RETURNING {}",
        assignments.text,
        assignments.next_placeholder(),
        ITEM_COLUMNS
    );
    let values = assignments.into_values_with([FieldValue::from(id)]);

    let row = first_row(store.fetch(&sql, &values).await?).ok_or_else(|| already_sold(id))?;

    tracing::info!(item_id = %id, fields = changes.len(), "updated item");
    decode_row(ENTITY, row)
}

/// Associate an item with categories in a single multi-row insert
///
/// Returns the number of associations written. An empty category list issues
/// no statement.
pub async fn add_to_categories(
    store: &dyn RowStore,
    item_id: ValidatedId,
    category_ids: &[ValidatedId],
) -> MarketResult<u64> {
    if category_ids.is_empty() {
        return Ok(0);
    }

    let sql = format!(
        "INSERT INTO items_to_types (item_id, type_id) VALUES {}",
        multi_row_values(item_id, category_ids)
    );
    let written = store.execute(&sql, &[]).await?;

    tracing::debug!(item_id = %item_id, written, "added item to categories");
    Ok(written)
}

pub(crate) fn already_sold(id: ValidatedId) -> MarketError {
    MarketError::conflict(format!("item {} has already been sold", id))
}

fn first_row(rows: Vec<Row>) -> Option<Row> {
    rows.into_iter().next()
}
