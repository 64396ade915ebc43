//! Users: profile updates, purchases and seller location lookups

use crate::core::error::{MarketError, MarketResult, StorageError};
use crate::core::field::FieldValue;
use crate::core::store::{RowStore, decode_row};
use crate::entities::item;
use crate::query::{Changes, UpdateColumns, ValidatedId, build_partial_update};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ENTITY: &str = "user";

update_columns! {
    /// Updatable user fields and the columns they write to
    pub enum UserColumn {
        FirstName => ("firstName", "first_name"),
        LastName => ("lastName", "last_name"),
        IsAdmin => ("isAdmin", "is_admin"),
        IsFlagged => ("isFlagged", "is_flagged"),
        Address => ("address", "address"),
        ZipCode => ("zipCode", "zip_code"),
        City => ("city", "city"),
        RegionOrState => ("regionOrState", "region_or_state"),
        Country => ("country", "country"),
        Latitude => ("latitude", "latitude"),
        Longitude => ("longitude", "longitude"),
    }
}

/// Public view of a user account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub city: Option<String>,
    pub region_or_state: Option<String>,
    pub country: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_flagged: bool,
}

/// Full location of a user, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub region_or_state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Location safe to show other users: no street address, no coordinates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoarseLocation {
    pub city: Option<String>,
    pub region_or_state: Option<String>,
    pub zip_code: Option<String>,
    pub country: Option<String>,
}

impl From<Location> for CoarseLocation {
    fn from(location: Location) -> Self {
        Self {
            city: location.city,
            region_or_state: location.region_or_state,
            zip_code: location.zip_code,
            country: location.country,
        }
    }
}

/// Partial user update
///
/// Only the fields listed here can be changed through [`update`]; credentials
/// and the username are managed elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: Option<bool>,
    pub is_flagged: Option<bool>,
    pub address: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub region_or_state: Option<String>,
    pub country: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

impl UserPatch {
    /// Fields that are set, keyed by their semantic name
    pub fn changes(&self) -> Changes {
        let mut changes = Changes::new();
        let mut set = |field: UserColumn, value: Option<FieldValue>| {
            if let Some(value) = value {
                changes.insert(field.field().to_string(), value);
            }
        };

        set(UserColumn::FirstName, self.first_name.clone().map(Into::into));
        set(UserColumn::LastName, self.last_name.clone().map(Into::into));
        set(UserColumn::IsAdmin, self.is_admin.map(Into::into));
        set(UserColumn::IsFlagged, self.is_flagged.map(Into::into));
        set(UserColumn::Address, self.address.clone().map(Into::into));
        set(UserColumn::ZipCode, self.zip_code.clone().map(Into::into));
        set(UserColumn::City, self.city.clone().map(Into::into));
        set(
            UserColumn::RegionOrState,
            self.region_or_state.clone().map(Into::into),
        );
        set(UserColumn::Country, self.country.clone().map(Into::into));
        set(UserColumn::Latitude, self.latitude.map(Into::into));
        set(UserColumn::Longitude, self.longitude.map(Into::into));

        changes
    }
}

/// Apply a partial update to a user
///
/// # Errors
/// `InvalidArgument` for an empty patch, `NotFound` when no user has `username`.
pub async fn update(store: &dyn RowStore, username: &str, patch: &UserPatch) -> MarketResult<User> {
    let assignments = build_partial_update::<UserColumn>(&patch.changes())?;
    let sql = format!(
        "UPDATE users SET {} WHERE username = ${} \
         RETURNING username, first_name, last_name, email, city, region_or_state, country, \
         is_admin, is_flagged",
        assignments.text,
        assignments.next_placeholder()
    );
    let values = assignments.into_values_with([FieldValue::from(username)]);

    let row = store
        .fetch(&sql, &values)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::not_found(ENTITY, username))?;

    tracing::info!(username, "updated user");
    decode_row(ENTITY, row)
}

/// A completed purchase of one item by one user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: i64,
    pub item_id: i64,
    pub username: String,
    pub final_price: Option<f64>,
    pub exchange_method: Option<String>,
    pub sale_made: DateTime<Utc>,
}

/// Record that `username` bought an item, marking the item sold
///
/// The item is claimed with a guarded `UPDATE` so two buyers can never both
/// succeed. If the purchase row cannot be written the claim is released.
///
/// # Errors
/// - `NotFound` when no item has `item_id`
/// - `Conflict` when the item has already been sold
pub async fn make_sale(
    store: &dyn RowStore,
    username: &str,
    item_id: ValidatedId,
) -> MarketResult<Purchase> {
    let claimed = store
        .fetch(
            "UPDATE items SET is_sold = true WHERE id = $1 AND is_sold = false RETURNING id",
            &[item_id.into()],
        )
        .await?;
    if claimed.is_empty() {
        let existing = store
            .fetch("SELECT is_sold FROM items WHERE id = $1", &[item_id.into()])
            .await?;
        return Err(if existing.is_empty() {
            MarketError::not_found("item", item_id)
        } else {
            item::already_sold(item_id)
        });
    }

    let inserted = store
        .fetch(
            "INSERT INTO purchases (item_id, username) VALUES ($1, $2) \
             RETURNING id, item_id, username, final_price, exchange_method, sale_made",
            &[item_id.into(), username.into()],
        )
        .await;

    let rows = match inserted {
        Ok(rows) => rows,
        Err(e) => {
            release_claim(store, item_id).await;
            return Err(e.into());
        }
    };
    let row = rows.into_iter().next().ok_or_else(|| {
        StorageError::Opaque(format!("no purchase row returned for item {}", item_id))
    })?;

    tracing::info!(username, item_id = %item_id, "recorded sale");
    decode_row("purchase", row)
}

async fn release_claim(store: &dyn RowStore, item_id: ValidatedId) {
    if let Err(e) = store
        .execute(
            "UPDATE items SET is_sold = false WHERE id = $1",
            &[item_id.into()],
        )
        .await
    {
        tracing::warn!(item_id = %item_id, error = %e, "failed to release item after a failed sale");
    }
}

/// Full stored location of a user
///
/// # Errors
/// `NotFound` when no user has `username`.
pub async fn location(store: &dyn RowStore, username: &str) -> MarketResult<Location> {
    let row = store
        .fetch(
            "SELECT address, city, region_or_state, zip_code, country, latitude, longitude \
             FROM users WHERE username = $1",
            &[FieldValue::from(username)],
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| MarketError::not_found("location", username))?;

    decode_row("location", row)
}

/// Location of a user with the street address and coordinates removed
pub async fn coarse_location(store: &dyn RowStore, username: &str) -> MarketResult<CoarseLocation> {
    location(store, username).await.map(CoarseLocation::from)
}
