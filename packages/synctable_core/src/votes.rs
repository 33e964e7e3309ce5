//! Per-user vote facts
//!
//! A vote is stored as one boolean fact per (row, field, user), never as a
//! counter. Two users voting at the same time write different keys, so
//! neither can clobber the other; counts are derived by scanning the facts.

use crate::substrate::SyncedMap;
use std::collections::BTreeMap;

/// Separator between the three parts of a ledger key.
pub const VOTE_KEY_DELIMITER: char = ':';

/// Sparse counts: row id -> field id -> number of voters.
pub type Tally = BTreeMap<String, BTreeMap<String, u64>>;

/// The identity of a single vote fact.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoteKey {
    pub row_id: String,
    pub field_id: String,
    pub user_id: String,
}

impl VoteKey {
    pub fn new(
        row_id: impl Into<String>,
        field_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            row_id: row_id.into(),
            field_id: field_id.into(),
            user_id: user_id.into(),
        }
    }

    /// Encode as `rowId:fieldId:userId`
    pub fn encode(&self) -> String {
        format!(
            "{}{d}{}{d}{}",
            self.row_id,
            self.field_id,
            self.user_id,
            d = VOTE_KEY_DELIMITER
        )
    }

    /// Decode a ledger key, splitting at the first two delimiters.
    ///
    /// A user id may contain the delimiter; a row or field id that does
    /// will decode wrongly.
    pub fn decode(raw: &str) -> Option<Self> {
        let mut parts = raw.splitn(3, VOTE_KEY_DELIMITER);
        let row_id = parts.next()?;
        let field_id = parts.next()?;
        let user_id = parts.next()?;
        Some(Self::new(row_id, field_id, user_id))
    }
}

/// Vote facts over a host-provided map.
#[derive(Clone, Debug, Default)]
pub struct VoteLedger<M> {
    facts: M,
}

impl<M: SyncedMap<bool>> VoteLedger<M> {
    pub fn new(facts: M) -> Self {
        Self { facts }
    }

    /// Flip the presence of a fact. Returns whether the fact is now present.
    pub fn toggle(&mut self, key: &VoteKey) -> bool {
        let raw = key.encode();
        if self.facts.get(&raw).unwrap_or(false) {
            self.facts.delete(&raw);
            false
        } else {
            self.facts.set(&raw, true);
            true
        }
    }

    pub fn has_voted(&self, key: &VoteKey) -> bool {
        self.facts.get(&key.encode()).unwrap_or(false)
    }

    fn iter_facts(&self) -> impl Iterator<Item = VoteKey> + '_ {
        self.facts.keys().into_iter().filter_map(move |raw| {
            if !self.facts.get(&raw).unwrap_or(false) {
                return None;
            }
            let decoded = VoteKey::decode(&raw);
            if decoded.is_none() {
                log::warn!("Ignoring malformed vote key {:?}", raw);
            }
            decoded
        })
    }

    /// Count every fact, grouped by row and field. Zero counts are absent.
    pub fn tally(&self) -> Tally {
        let mut tally = Tally::new();
        for key in self.iter_facts() {
            *tally
                .entry(key.row_id)
                .or_default()
                .entry(key.field_id)
                .or_insert(0) += 1;
        }
        tally
    }

    /// Number of voters on one (row, field)
    pub fn count(&self, row_id: &str, field_id: &str) -> u64 {
        self.iter_facts()
            .filter(|k| k.row_id == row_id && k.field_id == field_id)
            .count() as u64
    }

    /// Move every fact of `old_row_id` onto `new_row_id`.
    ///
    /// Facts are re-applied with [`toggle`](Self::toggle) rather than copied,
    /// so a fact that already exists at the destination is flipped by the
    /// incoming one instead of silently overwritten. Returns how many facts
    /// were moved.
    pub fn relabel_row(&mut self, old_row_id: &str, new_row_id: &str) -> usize {
        if old_row_id == new_row_id {
            return 0;
        }
        let moving: Vec<VoteKey> = self
            .iter_facts()
            .filter(|k| k.row_id == old_row_id)
            .collect();

        for key in &moving {
            self.facts.delete(&key.encode());
            self.toggle(&VoteKey::new(new_row_id, &key.field_id, &key.user_id));
        }
        moving.len()
    }

    /// Drop every fact of one row. Returns how many were removed.
    pub fn clear_row(&mut self, row_id: &str) -> usize {
        let doomed: Vec<VoteKey> = self.iter_facts().filter(|k| k.row_id == row_id).collect();
        for key in &doomed {
            self.facts.delete(&key.encode());
        }
        doomed.len()
    }

    /// Drop every fact.
    pub fn clear(&mut self) {
        for raw in self.facts.keys() {
            self.facts.delete(&raw);
        }
    }

    /// Access the underlying map
    pub fn facts(&self) -> &M {
        &self.facts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substrate::MemoryMap;

    fn ledger() -> VoteLedger<MemoryMap<bool>> {
        VoteLedger::new(MemoryMap::new())
    }

    #[test]
    fn test_key_roundtrip_keeps_delimiter_in_user_id() {
        let key = VoteKey::new("a0", "votes", "user:42");
        assert_eq!(key.encode(), "a0:votes:user:42");
        assert_eq!(VoteKey::decode(&key.encode()), Some(key));
        assert_eq!(VoteKey::decode("a0:votes"), None);
    }

    #[test]
    fn test_toggle_is_per_user_binary() {
        let mut votes = ledger();
        for user in ["u1", "u2", "u3"] {
            assert!(votes.toggle(&VoteKey::new("a0", "v", user)));
        }
        assert_eq!(votes.count("a0", "v"), 3);

        assert!(!votes.toggle(&VoteKey::new("a0", "v", "u2")));
        assert_eq!(votes.count("a0", "v"), 2);
        assert!(!votes.has_voted(&VoteKey::new("a0", "v", "u2")));

        assert!(votes.toggle(&VoteKey::new("a0", "v", "u2")));
        assert_eq!(votes.count("a0", "v"), 3);
    }

    #[test]
    fn test_tally_is_sparse() {
        let mut votes = ledger();
        votes.toggle(&VoteKey::new("a0", "v", "u1"));
        votes.toggle(&VoteKey::new("a1", "w", "u1"));
        votes.toggle(&VoteKey::new("a1", "w", "u2"));
        votes.toggle(&VoteKey::new("a2", "v", "u1"));
        votes.toggle(&VoteKey::new("a2", "v", "u1"));

        let tally = votes.tally();
        assert_eq!(tally.len(), 2);
        assert_eq!(tally["a0"]["v"], 1);
        assert_eq!(tally["a1"]["w"], 2);
        assert!(!tally.contains_key("a2"));
    }

    #[test]
    fn test_relabel_moves_facts() {
        let mut votes = ledger();
        votes.toggle(&VoteKey::new("a1", "v", "u1"));
        votes.toggle(&VoteKey::new("a1", "v", "u2"));
        votes.toggle(&VoteKey::new("a1", "w", "u1"));
        votes.toggle(&VoteKey::new("a2", "v", "u1"));

        assert_eq!(votes.relabel_row("a1", "Zz"), 3);

        let tally = votes.tally();
        assert!(!tally.contains_key("a1"));
        assert_eq!(tally["Zz"]["v"], 2);
        assert_eq!(tally["Zz"]["w"], 1);
        assert_eq!(tally["a2"]["v"], 1);
    }

    #[test]
    fn test_relabel_toggles_existing_destination_fact() {
        let mut votes = ledger();
        votes.toggle(&VoteKey::new("a1", "v", "u1"));
        votes.toggle(&VoteKey::new("a1", "v", "u2"));
        votes.toggle(&VoteKey::new("b0", "v", "u1"));

        votes.relabel_row("a1", "b0");

        assert!(!votes.has_voted(&VoteKey::new("b0", "v", "u1")));
        assert!(votes.has_voted(&VoteKey::new("b0", "v", "u2")));
        assert_eq!(votes.count("b0", "v"), 1);
    }

    #[test]
    fn test_clear_row_and_clear() {
        let mut votes = ledger();
        votes.toggle(&VoteKey::new("a0", "v", "u1"));
        votes.toggle(&VoteKey::new("a1", "v", "u1"));
        votes.toggle(&VoteKey::new("a1", "v", "u2"));

        assert_eq!(votes.clear_row("a1"), 2);
        assert_eq!(votes.tally().len(), 1);

        votes.clear();
        assert!(votes.facts().is_empty());
    }
}
