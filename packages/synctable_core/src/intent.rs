//! Edit intents from the detached editor and the canvas
//!
//! The form editor receives an [`EditorPayload`] when it opens and sends
//! back [`EditIntent`]s; each intent maps onto exactly one table operation.
//! Field ids for columns typed in by a user are derived here, once, so the
//! store itself never invents identity.

use crate::order_key::OrderKey;
use crate::substrate::SyncedMap;
use crate::table::{
    FieldId, FieldKind, Row, RowData, SortOrder, TableError, TableField, TableStore, Theme,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IntentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed intent script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Table error: {0}")]
    Table(#[from] TableError),
}

/// A column as typed into the schema editor; the id may still be missing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDraft {
    #[serde(rename = "fieldId", default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<FieldId>,
    #[serde(rename = "fieldName")]
    pub field_name: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl From<TableField> for FieldDraft {
    fn from(field: TableField) -> Self {
        Self {
            field_id: Some(field.field_id),
            field_name: field.field_name,
            kind: field.kind,
        }
    }
}

/// Turn editor drafts into a schema.
///
/// Explicit ids are kept as given. A missing id becomes the lower-cased
/// display name; when that collides with an id already in the schema it
/// gets a numeric suffix (`status`, `status_2`, ...).
pub fn build_schema(drafts: Vec<FieldDraft>) -> Vec<TableField> {
    let mut used: HashSet<FieldId> = drafts
        .iter()
        .filter_map(|d| d.field_id.clone())
        .filter(|id| !id.is_empty())
        .collect();

    drafts
        .into_iter()
        .map(|draft| {
            let field_id = match draft.field_id {
                Some(id) if !id.is_empty() => id,
                _ => {
                    let id = derive_field_id(&draft.field_name, &used);
                    used.insert(id.clone());
                    id
                }
            };
            TableField::new(field_id, draft.field_name, draft.kind)
        })
        .collect()
}

fn derive_field_id(field_name: &str, used: &HashSet<FieldId>) -> FieldId {
    let base = match field_name.trim().to_lowercase() {
        name if name.is_empty() => "field".to_string(),
        name => name,
    };
    if !used.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !used.contains(candidate))
        .unwrap_or(base)
}

/// One edit coming back from the editor or a canvas gesture
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EditIntent {
    NewRow {
        #[serde(rename = "rowData", default)]
        row_data: RowData,
    },
    /// Update a row, or append it when no id is given
    UpsertRow {
        #[serde(rename = "rowId", default)]
        row_id: Option<OrderKey>,
        #[serde(rename = "rowData", default)]
        row_data: RowData,
    },
    DeleteRow {
        #[serde(rename = "rowId")]
        row_id: OrderKey,
    },
    DeleteAllRows,
    RenameTable {
        name: String,
    },
    UpdateSchema {
        fields: Vec<FieldDraft>,
    },
    /// Drop a row between two neighbours (either may be an open end)
    ReorderRow {
        #[serde(rename = "rowId")]
        row_id: OrderKey,
        #[serde(rename = "beforeRowId", default)]
        before_row_id: Option<OrderKey>,
        #[serde(rename = "afterRowId", default)]
        after_row_id: Option<OrderKey>,
    },
    UpdateSortOrder {
        #[serde(rename = "sortOrder", default)]
        sort_order: Option<SortOrder>,
    },
    SetTheme {
        theme: String,
    },
    SetFieldValue {
        #[serde(rename = "rowId")]
        row_id: OrderKey,
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        value: Value,
    },
    ToggleVote {
        #[serde(rename = "rowId")]
        row_id: OrderKey,
        #[serde(rename = "fieldId")]
        field_id: FieldId,
        /// Defaults to the acting user
        #[serde(rename = "userId", default)]
        user_id: Option<String>,
    },
}

/// What applying an intent did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentOutcome {
    RowCreated(OrderKey),
    RowMoved { from: OrderKey, to: OrderKey },
    Applied,
    /// The target row no longer exists
    Skipped,
}

fn applied_if(done: bool) -> IntentOutcome {
    if done {
        IntentOutcome::Applied
    } else {
        IntentOutcome::Skipped
    }
}

/// Apply one intent on behalf of `user_id`
pub fn apply_intent<R, M, V>(
    store: &mut TableStore<R, M, V>,
    user_id: &str,
    intent: EditIntent,
) -> Result<IntentOutcome, TableError>
where
    R: SyncedMap<RowData>,
    M: SyncedMap<Value>,
    V: SyncedMap<bool>,
{
    let outcome = match intent {
        EditIntent::NewRow { row_data }
        | EditIntent::UpsertRow {
            row_id: None,
            row_data,
        } => IntentOutcome::RowCreated(store.append_row(row_data)?),
        EditIntent::UpsertRow {
            row_id: Some(row_id),
            row_data,
        } => applied_if(store.update_row(&row_id, row_data)),
        EditIntent::DeleteRow { row_id } => applied_if(store.delete_row(&row_id)),
        EditIntent::DeleteAllRows => {
            store.delete_all_rows();
            IntentOutcome::Applied
        }
        EditIntent::RenameTable { name } => {
            store.set_title(&name);
            IntentOutcome::Applied
        }
        EditIntent::UpdateSchema { fields } => {
            store.set_schema(build_schema(fields))?;
            IntentOutcome::Applied
        }
        EditIntent::ReorderRow {
            row_id,
            before_row_id,
            after_row_id,
        } => match store.move_row(&row_id, before_row_id.as_deref(), after_row_id.as_deref())? {
            Some(to) => IntentOutcome::RowMoved { from: row_id, to },
            None => IntentOutcome::Skipped,
        },
        EditIntent::UpdateSortOrder { sort_order } => {
            store.set_sort_order(sort_order)?;
            IntentOutcome::Applied
        }
        EditIntent::SetTheme { theme } => {
            store.set_theme(&theme);
            IntentOutcome::Applied
        }
        EditIntent::SetFieldValue {
            row_id,
            field_id,
            value,
        } => applied_if(store.set_row_field_value(&row_id, &field_id, value)),
        EditIntent::ToggleVote {
            row_id,
            field_id,
            user_id: voter,
        } => applied_if(store.toggle_vote(
            &row_id,
            &field_id,
            voter.as_deref().unwrap_or(user_id),
        )),
    };
    Ok(outcome)
}

/// Translate a drag from index `from` to index `to` of the displayed rows
/// into the neighbours the dragged row lands between.
///
/// Returns `None` when nothing moves or an index is out of range.
pub fn reorder_neighbors(
    row_ids: &[OrderKey],
    from: usize,
    to: usize,
) -> Option<(Option<OrderKey>, Option<OrderKey>)> {
    if from == to || from >= row_ids.len() || to >= row_ids.len() {
        return None;
    }
    let mut reordered: Vec<&OrderKey> = row_ids.iter().collect();
    let moving = reordered.remove(from);
    reordered.insert(to, moving);

    let before = to.checked_sub(1).map(|i| reordered[i].clone());
    let after = reordered.get(to + 1).map(|id| (*id).clone());
    Some((before, after))
}

/// Everything the editor needs when it opens
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorPayload {
    pub title: String,
    pub fields: Vec<TableField>,
    pub rows: Vec<Row>,
    pub theme: Theme,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl EditorPayload {
    pub fn from_store<R, M, V>(store: &TableStore<R, M, V>) -> Self
    where
        R: SyncedMap<RowData>,
        M: SyncedMap<Value>,
        V: SyncedMap<bool>,
    {
        Self {
            title: store.title(),
            fields: store.schema(),
            rows: store.snapshot(),
            theme: store.theme(),
            sort_order: store.sort_order(),
        }
    }
}

/// Read a JSON array of intents from a file
pub fn load_script(path: &Path) -> Result<Vec<EditIntent>, IntentError> {
    let data = std::fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

/// Apply a list of intents in order, stopping at the first caller error
pub fn replay<R, M, V>(
    store: &mut TableStore<R, M, V>,
    user_id: &str,
    intents: Vec<EditIntent>,
) -> Result<Vec<IntentOutcome>, IntentError>
where
    R: SyncedMap<RowData>,
    M: SyncedMap<Value>,
    V: SyncedMap<bool>,
{
    intents
        .into_iter()
        .map(|intent| apply_intent(store, user_id, intent).map_err(IntentError::from))
        .collect()
}
