//! Exact-match index from literal names to identity sets.

use crate::node::NodeId;
use std::collections::{BTreeSet, HashMap};

/// A mapping from exact name (original case) to the set of identities
/// currently holding that name anywhere in the tree. Entries whose set
/// empties are dropped outright, so the index never accumulates stale
/// empty names.
#[derive(Debug, Default)]
pub struct NameIndex {
    entries: HashMap<String, BTreeSet<NodeId>>,
}

impl NameIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: &str, id: NodeId) {
        self.entries.entry(name.to_string()).or_default().insert(id);
    }

    /// Removes `id` from the set for `name`, dropping the whole entry when
    /// the set empties. Returns `false` if nothing was removed.
    pub fn remove(&mut self, name: &str, id: NodeId) -> bool {
        match self.entries.get_mut(name) {
            Some(ids) => {
                let removed = ids.remove(&id);
                if ids.is_empty() {
                    self.entries.remove(name);
                }
                removed
            }
            None => false,
        }
    }

    /// Exact lookup: a single key fetch.
    pub fn get(&self, name: &str) -> Option<&BTreeSet<NodeId>> {
        self.entries.get(name)
    }

    /// Case-insensitive substring scan over every distinct name. This is
    /// intentionally O(total distinct names): a diagnostic path, not a hot
    /// one.
    pub fn search_substring(&self, pattern: &str) -> Vec<NodeId> {
        let pattern = pattern.to_lowercase();
        let mut ids: Vec<NodeId> = self
            .entries
            .iter()
            .filter(|(name, _)| name.to_lowercase().contains(&pattern))
            .flat_map(|(_, ids)| ids.iter().copied())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of distinct names currently indexed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
