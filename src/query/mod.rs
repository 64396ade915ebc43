//! Safe query fragment builders
//!
//! - [`filter`]: conjunctive `WHERE` predicates from request filters
//! - [`update`]: `SET` assignment lists from partial payloads
//! - [`batch`]: multi-row `VALUES` lists and id disjunctions over validated ids

pub mod batch;
pub mod filter;
pub mod update;

pub use batch::{ValidatedId, any_id_matches, multi_row_values};
pub use filter::{
    FilterColumns, FilterOp, FilterRequest, ValueKind, build_filter, build_filter_from,
};
pub use update::{Changes, IdentityColumns, UpdateColumns, build_partial_update};
