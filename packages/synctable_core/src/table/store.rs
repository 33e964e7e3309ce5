//! The table store
//!
//! Every operation is a short, bounded sequence of reads and writes on the
//! three backing maps and returns before another operation can interleave.
//! Operations on a row that has disappeared (deleted or moved by another
//! collaborator) are logged no-ops; only malformed key ranges are errors.

use super::field::{FieldId, TableField};
use super::sort::{sort_rows, SortOrder};
use super::theme::Theme;
use super::versioning::{bump, read_versions, Counter, Versions};
use super::{Row, RowData, TableError};
use crate::order_key::{self, OrderKey};
use crate::substrate::{MemoryMap, SharedMap, SyncedMap};
use crate::votes::{VoteKey, VoteLedger};
use serde_json::Value;
use std::collections::HashSet;

pub const TABLE_TITLE_KEY: &str = "table-title-key";
pub const TABLE_SCHEMA_KEY: &str = "table-schema-key";
pub const TABLE_THEME_KEY: &str = "table-theme-key";
pub const TABLE_SORT_ORDER_KEY: &str = "table-sort-order-key";
/// Highest key ever handed out by `append_row`
pub const ROW_ANCHOR_KEY: &str = "row-auto-incr-key";

/// One table over its three backing maps
pub struct TableStore<R = MemoryMap<RowData>, M = MemoryMap<Value>, V = MemoryMap<bool>> {
    metadata: M,
    rows: R,
    votes: VoteLedger<V>,
}

/// A table whose maps can be handed to other collaborators
pub type SharedTableStore = TableStore<SharedMap<RowData>, SharedMap<Value>, SharedMap<bool>>;

impl TableStore {
    /// A table backed by private in-memory maps
    pub fn in_memory() -> Self {
        Self::new(MemoryMap::new(), MemoryMap::new(), MemoryMap::new())
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl SharedTableStore {
    pub fn shared() -> Self {
        Self::new(SharedMap::new(), SharedMap::new(), SharedMap::new())
    }

    /// Another writer on the same document
    pub fn collaborator(&self) -> Self {
        Self::new(
            self.metadata.clone(),
            self.rows.clone(),
            self.votes.facts().clone(),
        )
    }
}

impl<R, M, V> TableStore<R, M, V>
where
    R: SyncedMap<RowData>,
    M: SyncedMap<Value>,
    V: SyncedMap<bool>,
{
    pub fn new(metadata: M, rows: R, votes: V) -> Self {
        Self {
            metadata,
            rows,
            votes: VoteLedger::new(votes),
        }
    }

    // ---------------------------------------------------------------------
    // Metadata
    // ---------------------------------------------------------------------

    pub fn schema(&self) -> Vec<TableField> {
        let Some(raw) = self.metadata.get(TABLE_SCHEMA_KEY) else {
            return Vec::new();
        };
        serde_json::from_value(raw).unwrap_or_else(|e| {
            log::warn!("Stored schema is unreadable, treating it as empty: {}", e);
            Vec::new()
        })
    }

    /// Replace the schema wholesale.
    ///
    /// The first schema assignment also picks a random theme when none is
    /// stored yet. Duplicate field ids are accepted but reported.
    pub fn set_schema(&mut self, fields: Vec<TableField>) -> Result<(), TableError> {
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.field_id.as_str()) {
                log::warn!("Schema contains duplicate field id {:?}", field.field_id);
            }
        }

        self.metadata
            .set(TABLE_SCHEMA_KEY, serde_json::to_value(&fields)?);
        if !self.metadata.contains(TABLE_THEME_KEY) {
            self.metadata
                .set(TABLE_THEME_KEY, Value::from(Theme::random().name()));
        }
        let version = bump(&mut self.metadata, Counter::Schema);
        log::debug!("Schema replaced with {} fields (v{})", fields.len(), version);
        Ok(())
    }

    pub fn title(&self) -> String {
        self.metadata
            .get(TABLE_TITLE_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    pub fn set_title(&mut self, name: &str) {
        self.metadata.set(TABLE_TITLE_KEY, Value::from(name));
    }

    /// The stored theme name, if any
    pub fn theme_name(&self) -> Option<String> {
        self.metadata
            .get(TABLE_THEME_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub fn theme(&self) -> Theme {
        Theme::from_name(self.theme_name().as_deref().unwrap_or_default())
    }

    pub fn set_theme(&mut self, name: &str) {
        self.metadata.set(TABLE_THEME_KEY, Value::from(name));
    }

    pub fn sort_order(&self) -> Option<SortOrder> {
        let raw = self.metadata.get(TABLE_SORT_ORDER_KEY)?;
        if raw.is_null() {
            return None;
        }
        serde_json::from_value(raw)
            .map_err(|e| log::warn!("Stored sort order is unreadable, ignoring it: {}", e))
            .ok()
    }

    pub fn set_sort_order(&mut self, order: Option<SortOrder>) -> Result<(), TableError> {
        match order {
            Some(order) => self
                .metadata
                .set(TABLE_SORT_ORDER_KEY, serde_json::to_value(order)?),
            None => self.metadata.delete(TABLE_SORT_ORDER_KEY),
        }
        Ok(())
    }

    pub fn versions(&self) -> Versions {
        read_versions(&self.metadata)
    }

    // ---------------------------------------------------------------------
    // Rows
    // ---------------------------------------------------------------------

    /// Keep only cells of current, non-vote columns
    pub fn sanitize(&self, row_data: RowData) -> RowData {
        let writable: HashSet<FieldId> = self
            .schema()
            .into_iter()
            .filter(|f| !f.is_vote())
            .map(|f| f.field_id)
            .collect();

        let (kept, dropped): (RowData, RowData) = row_data
            .into_iter()
            .partition(|(field_id, _)| writable.contains(field_id));
        if !dropped.is_empty() {
            log::debug!(
                "Dropped cells outside the writable schema: {:?}",
                dropped.keys().collect::<Vec<_>>()
            );
        }
        kept
    }

    /// All row ids in display order
    pub fn row_ids(&self) -> Vec<OrderKey> {
        let mut ids = self.rows.keys();
        ids.sort();
        ids
    }

    pub fn row(&self, row_id: &str) -> Option<RowData> {
        self.rows.get(row_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Highest well-formed key among the current rows and the append anchor
    fn append_base(&self) -> Option<OrderKey> {
        let anchor = self
            .metadata
            .get(ROW_ANCHOR_KEY)
            .and_then(|v| v.as_str().map(str::to_string));

        self.rows
            .keys()
            .into_iter()
            .chain(anchor)
            .filter(|key| match order_key::validate(key) {
                Ok(()) => true,
                Err(e) => {
                    log::warn!("Ignoring foreign row key while appending: {}", e);
                    false
                }
            })
            .max()
    }

    /// Store a new row after the current last row and return its id
    pub fn append_row(&mut self, row_data: RowData) -> Result<OrderKey, TableError> {
        let base = self.append_base();
        let row_id = order_key::generate(base.as_deref(), None)?;

        let row_data = self.sanitize(row_data);
        self.rows.set(&row_id, row_data);
        self.metadata.set(ROW_ANCHOR_KEY, Value::from(row_id.as_str()));
        bump(&mut self.metadata, Counter::Rows);
        log::debug!("Appended row {}", row_id);
        Ok(row_id)
    }

    /// Overwrite a row's content. Returns false when the row is gone.
    pub fn update_row(&mut self, row_id: &str, row_data: RowData) -> bool {
        if !self.rows.contains(row_id) {
            log::warn!("Attempting to update non-existent row {}", row_id);
            return false;
        }
        let row_data = self.sanitize(row_data);
        self.rows.set(row_id, row_data);
        bump(&mut self.metadata, Counter::Rows);
        true
    }

    /// Merge one cell into a row. Returns false when the row is gone.
    pub fn set_row_field_value(&mut self, row_id: &str, field_id: &str, value: Value) -> bool {
        let Some(mut row_data) = self.rows.get(row_id) else {
            log::warn!("Attempting to set {} on non-existent row {}", field_id, row_id);
            return false;
        };
        row_data.insert(field_id.to_string(), value);
        let row_data = self.sanitize(row_data);
        self.rows.set(row_id, row_data);
        bump(&mut self.metadata, Counter::Rows);
        true
    }

    /// Remove a row and its votes. Returns false when the row is gone.
    pub fn delete_row(&mut self, row_id: &str) -> bool {
        if !self.rows.contains(row_id) {
            log::warn!("Attempting to delete non-existent row {}", row_id);
            return false;
        }
        self.rows.delete(row_id);
        self.votes.clear_row(row_id);
        bump(&mut self.metadata, Counter::Rows);
        true
    }

    /// Remove every row and vote. Returns how many rows were removed.
    pub fn delete_all_rows(&mut self) -> usize {
        let ids = self.rows.keys();
        for id in &ids {
            self.rows.delete(id);
        }
        self.votes.clear();
        bump(&mut self.metadata, Counter::Rows);
        ids.len()
    }

    /// Re-key a row between two neighbours.
    ///
    /// `before` is the row that will sit directly above the moved row and
    /// `after` the row directly below; either may be `None` for an open end.
    /// Returns the row's new id, or `None` if the row does not exist.
    pub fn move_row(
        &mut self,
        row_id: &str,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Option<OrderKey>, TableError> {
        let Some(row_data) = self.rows.get(row_id) else {
            log::warn!("Attempting to re-order non-existent row {}", row_id);
            return Ok(None);
        };

        let mut new_id = order_key::generate(before, after)?;
        if new_id == row_id {
            return Ok(Some(new_id));
        }
        // Another writer may already have landed a row on the same key
        while self.rows.contains(&new_id) {
            new_id = order_key::generate(Some(&new_id), after)?;
        }

        self.rows.set(&new_id, row_data);
        self.rows.delete(row_id);
        let relabeled = self.votes.relabel_row(row_id, &new_id);
        bump(&mut self.metadata, Counter::Rows);
        log::debug!(
            "Moved row {} to {} ({} votes relabeled)",
            row_id,
            new_id,
            relabeled
        );
        Ok(Some(new_id))
    }

    /// Flip one user's vote on a row's vote column.
    ///
    /// A toggle addressed to a row that no longer exists, such as the id a
    /// row had before a concurrent move, is dropped so it cannot leave an
    /// orphan fact. Returns false in that case.
    pub fn toggle_vote(&mut self, row_id: &str, field_id: &str, user_id: &str) -> bool {
        if !self.rows.contains(row_id) {
            log::warn!("Attempting to vote on non-existent row {}", row_id);
            return false;
        }
        self.votes.toggle(&VoteKey::new(row_id, field_id, user_id));
        bump(&mut self.metadata, Counter::Rows);
        true
    }

    pub fn votes(&self) -> &VoteLedger<V> {
        &self.votes
    }

    /// All rows in key order with vote counts merged in, re-sorted by the
    /// stored sort directive when there is one.
    pub fn snapshot(&self) -> Vec<Row> {
        let schema = self.schema();
        let vote_fields: HashSet<&str> = schema
            .iter()
            .filter(|f| f.is_vote())
            .map(|f| f.field_id.as_str())
            .collect();
        let tally = self.votes.tally();

        let mut rows: Vec<Row> = self
            .row_ids()
            .into_iter()
            .filter_map(|row_id| {
                let mut row_data = self.rows.get(&row_id)?;
                if let Some(counts) = tally.get(&row_id) {
                    for (field_id, count) in counts {
                        if vote_fields.contains(field_id.as_str()) {
                            row_data.insert(field_id.clone(), Value::from(*count));
                        }
                    }
                }
                Some(Row { row_id, row_data })
            })
            .collect();

        if let Some(order) = self.sort_order() {
            sort_rows(&mut rows, &schema, &order);
        }
        rows
    }
}
