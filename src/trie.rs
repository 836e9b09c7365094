//! Prefix trie over lowercased node names.
//!
//! Matching is case-insensitive (keys are lowercased on the way in);
//! case-sensitive storage lives in the name index. Several identities can
//! terminate at the same word because names are only unique within a
//! sibling set, not globally.

use crate::node::NodeId;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Default)]
struct TrieNode {
    children: BTreeMap<char, TrieNode>,
    is_end_of_word: bool,
    ids: BTreeSet<NodeId>,
}

#[derive(Debug, Default)]
pub struct Trie {
    root: TrieNode,
}

impl Trie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks (creating levels as needed) the lowercased word and adds `id`
    /// to the terminal identity set.
    pub fn insert(&mut self, word: &str, id: NodeId) {
        let mut node = &mut self.root;
        for ch in word.to_lowercase().chars() {
            node = node.children.entry(ch).or_default();
        }
        node.is_end_of_word = true;
        node.ids.insert(id);
    }

    /// Removes `id` from the terminal set of `word`, clearing the
    /// end-of-word marker when the set empties. Interior trie nodes are
    /// never pruned; stale empty paths persist as a memory/perf tradeoff,
    /// not a correctness one.
    ///
    /// Returns `false` if the path or the id was absent. That is an
    /// expected no-op against already-consistent state, not an error.
    pub fn delete(&mut self, word: &str, id: NodeId) -> bool {
        let mut node = &mut self.root;
        for ch in word.to_lowercase().chars() {
            node = match node.children.get_mut(&ch) {
                Some(child) => child,
                None => return false,
            };
        }
        if node.is_end_of_word && node.ids.remove(&id) {
            if node.ids.is_empty() {
                node.is_end_of_word = false;
            }
            true
        } else {
            false
        }
    }

    /// The identity set terminating exactly at `word`, or empty when the
    /// word is absent or not marked end-of-word.
    pub fn search_exact(&self, word: &str) -> BTreeSet<NodeId> {
        match self.walk(word) {
            Some(node) if node.is_end_of_word => node.ids.clone(),
            _ => BTreeSet::new(),
        }
    }

    /// The union of every end-of-word identity set at or below `prefix`.
    pub fn search_prefix(&self, prefix: &str) -> BTreeSet<NodeId> {
        let mut ids = BTreeSet::new();
        if let Some(node) = self.walk(prefix) {
            collect_ids(node, &mut ids);
        }
        ids
    }

    fn walk(&self, word: &str) -> Option<&TrieNode> {
        let mut node = &self.root;
        for ch in word.to_lowercase().chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }
}

fn collect_ids(node: &TrieNode, ids: &mut BTreeSet<NodeId>) {
    if node.is_end_of_word {
        ids.extend(node.ids.iter().copied());
    }
    for child in node.children.values() {
        collect_ids(child, ids);
    }
}
