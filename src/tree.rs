//! Node storage and structural tree operations.
//!
//! The arena owns every node — live, or detached into the trash bin — and
//! doubles as the identity index: looking a node up by [`NodeId`] is one
//! map fetch regardless of tree depth. Identities come from the engine's
//! monotonic counter and are never reused, so a plain map is used rather
//! than a slot arena whose keys would be recycled after removal.

use crate::node::{Node, NodeId, NodeKind};
use std::collections::HashMap;

#[derive(Debug, Default)]
pub(crate) struct Arena {
    nodes: HashMap<NodeId, Node>,
}

impl Arena {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, node: Node) {
        self.nodes.insert(node.id(), node);
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<Node> {
        self.nodes.remove(&id)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn clear(&mut self) {
        self.nodes.clear();
    }

    /// Link `child` under `parent`: reassigns the child's back-reference
    /// and appends it to the parent's ordered child list. No duplicate-name
    /// check happens at this layer; that is the engine's job.
    ///
    /// Returns `false` when `parent` is not a folder.
    pub(crate) fn add_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        match self.nodes.get_mut(&parent).and_then(Node::children_mut) {
            Some(children) => {
                children.push(child);
            }
            None => return false,
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.set_parent(Some(parent));
        }
        true
    }

    /// Detach `child` from `parent`'s child list and clear its
    /// back-reference. Returns `false` if the child was not present.
    /// The child stays resident in the arena.
    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        let removed = match self.nodes.get_mut(&parent).and_then(Node::children_mut) {
            Some(children) => match children.iter().position(|c| *c == child) {
                Some(position) => {
                    children.remove(position);
                    true
                }
                None => false,
            },
            None => false,
        };
        if removed {
            if let Some(node) = self.nodes.get_mut(&child) {
                node.set_parent(None);
            }
        }
        removed
    }

    /// First child of `parent` carrying `name`, by linear scan over the
    /// ordered child list. Sibling names are unique under the engine's
    /// contract, but this layer does not rely on it.
    pub(crate) fn find_child_by_name(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.nodes
            .get(&parent)?
            .children()?
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find(|node| node.name() == name)
            .map(Node::id)
    }

    /// Whether `ancestor` lies on the parent chain of `id` (or is `id`
    /// itself). Used to reject cycle-creating moves.
    pub(crate) fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(c) = current {
            if c == ancestor {
                return true;
            }
            current = self.nodes.get(&c).and_then(Node::parent);
        }
        false
    }

    /// Pre-order traversal of the subtree rooted at `from`: the node
    /// itself, then each child's pre-order, left to right. Eagerly
    /// materialized.
    pub(crate) fn preorder(&self, from: NodeId) -> Vec<(String, NodeKind, NodeId)> {
        let mut out = Vec::new();
        self.preorder_into(from, &mut out);
        out
    }

    fn preorder_into(&self, from: NodeId, out: &mut Vec<(String, NodeKind, NodeId)>) {
        if let Some(node) = self.nodes.get(&from) {
            out.push((node.name().to_string(), node.kind(), node.id()));
            for child in node.children().unwrap_or(&[]) {
                self.preorder_into(*child, out);
            }
        }
    }

    /// Number of nodes in the subtree rooted at `id`, self-inclusive.
    /// A file contributes 1 with no recursion.
    pub(crate) fn size_of(&self, id: NodeId) -> usize {
        match self.nodes.get(&id) {
            Some(node) => {
                1 + node
                    .children()
                    .unwrap_or(&[])
                    .iter()
                    .map(|child| self.size_of(*child))
                    .sum::<usize>()
            }
            None => 0,
        }
    }

    /// Longest downward edge count below `id`: 0 for files and childless
    /// folders.
    pub(crate) fn height_of(&self, id: NodeId) -> usize {
        match self.nodes.get(&id).and_then(Node::children) {
            Some(children) if !children.is_empty() => {
                1 + children
                    .iter()
                    .map(|child| self.height_of(*child))
                    .max()
                    .unwrap_or(0)
            }
            _ => 0,
        }
    }

    /// Absolute path of `id` built from the parent chain, `/root/...`
    /// form. Must be computed before detaching a node whose provenance is
    /// being recorded.
    pub(crate) fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(c) = current {
            match self.nodes.get(&c) {
                Some(node) => {
                    segments.push(node.name().to_string());
                    current = node.parent();
                }
                None => break,
            }
        }
        segments.reverse();
        format!("/{}", segments.join("/"))
    }
}
