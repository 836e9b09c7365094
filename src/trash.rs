//! Bounded soft-delete staging area.
//!
//! The bin is an ordered list of detached subtrees, each paired with the
//! absolute path it was deleted from and a deletion timestamp. The nodes
//! themselves stay resident in the engine's arena; an entry only records
//! the subtree root. When capacity is exceeded the oldest entry is dropped
//! to admit the new one — the engine is handed the evicted entry so it can
//! deindex and drop the subtree, after which it is not restorable.

use crate::node::NodeId;
use std::collections::VecDeque;

pub const DEFAULT_TRASH_CAPACITY: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashEntry {
    /// Entry identity, assigned monotonically per bin.
    pub id: u64,
    /// Root of the detached subtree, still resident in the arena.
    pub root: NodeId,
    /// Absolute path the subtree root held at deletion time, computed
    /// before detachment.
    pub original_path: String,
    /// Deletion timestamp, nanoseconds since the UNIX epoch.
    pub deleted_at: u64,
}

#[derive(Debug)]
pub struct TrashBin {
    entries: VecDeque<TrashEntry>,
    capacity: usize,
    next_entry_id: u64,
}

impl Default for TrashBin {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRASH_CAPACITY)
    }
}

impl TrashBin {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
            next_entry_id: 0,
        }
    }

    /// Admit a detached subtree. Returns the new entry id and, when the
    /// bin was full, the evicted oldest entry.
    pub fn push(
        &mut self,
        root: NodeId,
        original_path: String,
        deleted_at: u64,
    ) -> (u64, Option<TrashEntry>) {
        let evicted = if self.entries.len() >= self.capacity {
            self.entries.pop_front()
        } else {
            None
        };
        let id = self.next_entry_id;
        self.next_entry_id += 1;
        self.entries.push_back(TrashEntry {
            id,
            root,
            original_path,
            deleted_at,
        });
        (id, evicted)
    }

    /// Remove and return the entry at `index`, oldest first. `None` when
    /// the index is out of range.
    pub fn restore(&mut self, index: usize) -> Option<TrashEntry> {
        self.entries.remove(index)
    }

    /// Drain every entry unconditionally. The caller is responsible for
    /// dropping the detached subtrees; this is irreversible.
    pub fn purge(&mut self) -> Vec<TrashEntry> {
        self.entries.drain(..).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrashEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Replace the whole entry list, e.g. when loading a persisted trash
    /// document. The entry id counter continues above the restored ids.
    pub(crate) fn replace_entries(&mut self, entries: Vec<TrashEntry>) {
        self.next_entry_id = entries
            .iter()
            .map(|entry| entry.id + 1)
            .max()
            .unwrap_or(0)
            .max(self.next_entry_id);
        self.entries = entries.into();
    }
}
