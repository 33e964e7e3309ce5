//! Ordered multi-writer table
//!
//! Schema, title, theme, sort directive and rows of one table, kept in three
//! host-provided maps. Rows are keyed by fractional order keys; vote columns
//! are derived from per-user facts; two counters signal changes to pollers.

mod field;
mod sort;
mod store;
mod theme;
mod versioning;

use crate::order_key::{OrderKey, OrderKeyError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

pub use field::{CurrencyPosition, FieldId, FieldKind, FieldType, TableField};
pub use sort::{compare_values, sort_rows, SortOrder};
pub use store::{
    SharedTableStore, TableStore, ROW_ANCHOR_KEY, TABLE_SCHEMA_KEY, TABLE_SORT_ORDER_KEY,
    TABLE_THEME_KEY, TABLE_TITLE_KEY,
};
pub use theme::{Palette, Theme};
pub use versioning::{
    Changes, Counter, VersionCursor, Versions, ROWS_VERSION_KEY, SCHEMA_VERSION_KEY,
};

/// Cell values of one row, keyed by field id
pub type RowData = BTreeMap<FieldId, serde_json::Value>;

/// A row as handed to readers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    pub row_id: OrderKey,
    pub row_data: RowData,
}

#[derive(Error, Debug)]
pub enum TableError {
    #[error("Order key error: {0}")]
    OrderKey(#[from] OrderKeyError),

    #[error("Encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}
