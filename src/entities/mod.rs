//! Entity repositories
//!
//! Each module exposes free functions over a [`RowStore`](crate::core::store::RowStore)
//! plus the typed records, patches and column maps of one entity.

#[macro_use]
pub mod macros;

pub mod item;
pub mod message;
pub mod user;

pub use item::{Category, Item, ItemColumn, ItemDetail, ItemFilter, ItemListing, ItemPatch};
pub use message::{ConversationEntry, Message, NewMessage};
pub use user::{CoarseLocation, Location, Purchase, User, UserColumn, UserPatch};
