//! Change versioning
//!
//! Two monotonic counters kept in the metadata map: one bumped by every
//! row-affecting mutation, one by every schema replacement. A polling
//! consumer compares them against what it last saw and re-reads only the
//! part that moved. No deltas are computed here.

use crate::substrate::SyncedMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ROWS_VERSION_KEY: &str = "rows-version";
pub const SCHEMA_VERSION_KEY: &str = "schema-version";

/// Which counter a mutation bumps
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    Rows,
    Schema,
}

impl Counter {
    pub fn key(self) -> &'static str {
        match self {
            Counter::Rows => ROWS_VERSION_KEY,
            Counter::Schema => SCHEMA_VERSION_KEY,
        }
    }
}

/// Both counters, as read at one point in time
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versions {
    pub rows: u64,
    pub schema: u64,
}

pub(crate) fn read_counter<M: SyncedMap<Value>>(metadata: &M, counter: Counter) -> u64 {
    metadata
        .get(counter.key())
        .and_then(|v| v.as_u64())
        .unwrap_or(0)
}

/// Increment a counter once and return its new value
pub(crate) fn bump<M: SyncedMap<Value>>(metadata: &mut M, counter: Counter) -> u64 {
    let next = read_counter(metadata, counter).saturating_add(1);
    metadata.set(counter.key(), Value::from(next));
    next
}

pub(crate) fn read_versions<M: SyncedMap<Value>>(metadata: &M) -> Versions {
    Versions {
        rows: read_counter(metadata, Counter::Rows),
        schema: read_counter(metadata, Counter::Schema),
    }
}

/// What moved since the last poll
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Changes {
    pub rows: bool,
    pub schema: bool,
}

impl Changes {
    pub fn any(&self) -> bool {
        self.rows || self.schema
    }
}

/// Consumer-side bookkeeping of the last versions seen.
///
/// The first poll reports everything as changed so the consumer performs
/// its initial load.
#[derive(Clone, Debug, Default)]
pub struct VersionCursor {
    seen: Option<Versions>,
}

impl VersionCursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll(&mut self, current: Versions) -> Changes {
        let changes = match self.seen {
            None => Changes {
                rows: true,
                schema: true,
            },
            Some(seen) => Changes {
                rows: current.rows != seen.rows,
                schema: current.schema != seen.schema,
            },
        };
        self.seen = Some(current);
        changes
    }

    pub fn last_seen(&self) -> Option<Versions> {
        self.seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::MemoryMap;

    #[test]
    fn test_counters_are_independent() {
        let mut metadata: MemoryMap<Value> = MemoryMap::new();
        assert_eq!(read_versions(&metadata), Versions::default());

        assert_eq!(bump(&mut metadata, Counter::Rows), 1);
        assert_eq!(bump(&mut metadata, Counter::Rows), 2);
        assert_eq!(bump(&mut metadata, Counter::Schema), 1);

        assert_eq!(read_versions(&metadata), Versions { rows: 2, schema: 1 });
    }

    #[test]
    fn test_cursor_reports_changes() {
        let mut cursor = VersionCursor::new();
        let first = cursor.poll(Versions::default());
        assert!(first.rows && first.schema);

        assert!(!cursor.poll(Versions::default()).any());

        let changes = cursor.poll(Versions { rows: 1, schema: 0 });
        assert!(changes.rows);
        assert!(!changes.schema);
        assert_eq!(cursor.last_seen(), Some(Versions { rows: 1, schema: 0 }));
    }
}
