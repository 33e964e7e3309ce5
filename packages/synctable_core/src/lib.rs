// Synctable - Ordered, multi-writer table storage

pub mod intent;
pub mod order_key;
pub mod substrate;
pub mod table;
pub mod templates;
pub mod votes;

pub use intent::{apply_intent, EditIntent, EditorPayload, FieldDraft, IntentError, IntentOutcome};
pub use order_key::{OrderKey, OrderKeyError};
pub use substrate::{MemoryMap, SharedMap, SyncedMap};
pub use table::{
    FieldKind, FieldType, Row, RowData, SharedTableStore, SortOrder, TableError, TableField,
    TableStore, Theme, VersionCursor, Versions,
};
pub use votes::{VoteKey, VoteLedger};
