//! The namespace engine.
//!
//! [`Namespace`] owns the node arena, the three lookup indices and the
//! trash bin, and is the only writer to any of them. Every mutating
//! operation re-synchronizes the indices before returning, so the
//! three-way invariant (name index, trie and arena all agree about every
//! reachable node) holds between operations. Failed operations leave the
//! whole state untouched.

use crate::name_index::NameIndex;
use crate::node::{is_valid_name, Node, NodeId, NodeKind};
use crate::snapshot::{self, SnapshotDoc, TrashDoc, TrashRecord, FORMAT_VERSION};
use crate::trash::{TrashBin, TrashEntry, DEFAULT_TRASH_CAPACITY};
use crate::tree::Arena;
use crate::trie::Trie;
use crate::{FsError, Result};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Suffix appended to a restored node's name when its target position is
/// already taken.
const RESTORE_SUFFIX: &str = "_restored";

/// A notification emitted after an operation completes or degrades.
/// Callers that want status lines or an audit log install a hook; the
/// engine itself never prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    FolderCreated { id: NodeId, name: String },
    FileCreated { id: NodeId, name: String },
    /// Subtree detached into the trash bin; still indexed and findable.
    SoftDeleted { id: NodeId, name: String, original_path: String },
    /// Subtree deindexed and dropped outright.
    Deleted { id: NodeId, name: String },
    Renamed { id: NodeId, old_name: String, new_name: String },
    Moved { id: NodeId, into: NodeId },
    NavigatedTo { path: String },
    Restored { id: NodeId, path: String },
    /// The original parent folder no longer exists; restored under root.
    RestoreFellBack { id: NodeId, original_path: String },
    /// The target name was taken; restored under a suffixed name.
    RestoreRenamed { id: NodeId, new_name: String },
    /// Capacity eviction; the entry is no longer restorable.
    TrashEvicted { entry_id: u64, name: String },
    TrashPurged { count: usize },
    Saved { path: PathBuf },
    Loaded { path: PathBuf },
}

pub type EventHook = Box<dyn FnMut(&Event) + Send>;

/// One row of a cursor listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    /// Subtree node count, self-inclusive.
    pub size: usize,
}

/// One hit of a substring pattern search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternHit {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub path: String,
}

/// One row of a trash listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrashListing {
    pub index: usize,
    pub entry_id: u64,
    pub name: String,
    pub kind: NodeKind,
    pub original_path: String,
    pub deleted_at: u64,
}

/// A point-in-time statistics snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stats {
    pub height: usize,
    pub nodes: usize,
    pub folders: usize,
    pub files: usize,
    pub trashed: usize,
    pub distinct_names: usize,
    pub version: &'static str,
}

/// The in-memory hierarchical namespace.
///
/// Lifecycle: construct, operate, optionally persist, drop. There is no
/// process-wide state; callers own the engine value outright.
pub struct Namespace {
    arena: Arena,
    root: NodeId,
    cursor: NodeId,
    cursor_path: Vec<String>,
    next_id: u64,
    trie: Trie,
    names: NameIndex,
    trash: TrashBin,
    hook: Option<EventHook>,
}

impl Default for Namespace {
    fn default() -> Self {
        Self::new()
    }
}

impl Namespace {
    pub fn new() -> Self {
        Self::with_trash_capacity(DEFAULT_TRASH_CAPACITY)
    }

    pub fn with_trash_capacity(capacity: usize) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(0);
        arena.insert(Node::new_folder(root, "root"));
        let mut ns = Self {
            arena,
            root,
            cursor: root,
            cursor_path: vec!["root".to_string()],
            next_id: 1,
            trie: Trie::new(),
            names: NameIndex::new(),
            trash: TrashBin::with_capacity(capacity),
            hook: None,
        };
        ns.index_subtree(root);
        ns
    }

    /// Install the event/notification hook. The engine invokes it once per
    /// completed mutation and once per degraded path (fallback, eviction,
    /// collision rename).
    pub fn set_event_hook(&mut self, hook: EventHook) {
        self.hook = Some(hook);
    }

    /// The caller's current location, analogous to a working directory.
    pub fn current_path(&self) -> String {
        format!("/{}", self.cursor_path.join("/"))
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn cursor_id(&self) -> NodeId {
        self.cursor
    }

    // ---- mutations -----------------------------------------------------

    /// Create a folder under the cursor and index it.
    pub fn create_folder(&mut self, name: &str) -> Result<NodeId> {
        self.check_new_name(name)?;
        let id = self.alloc_id();
        self.arena.insert(Node::new_folder(id, name));
        self.arena.add_child(self.cursor, id);
        self.index_subtree(id);
        debug!(%id, name, "folder created");
        self.emit(Event::FolderCreated {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Create a file with an opaque text payload under the cursor and
    /// index it.
    pub fn create_file(&mut self, name: &str, content: &str) -> Result<NodeId> {
        self.check_new_name(name)?;
        let id = self.alloc_id();
        self.arena.insert(Node::new_file(id, name, content));
        self.arena.add_child(self.cursor, id);
        self.index_subtree(id);
        debug!(%id, name, "file created");
        self.emit(Event::FileCreated {
            id,
            name: name.to_string(),
        });
        Ok(id)
    }

    /// Delete the named child of the cursor.
    ///
    /// When `permanent`, the entire subtree is deindexed and dropped.
    /// Otherwise the subtree is detached into the trash bin with its
    /// original path recorded first; its entries deliberately remain in
    /// all indices so trashed items stay findable by identity, name and
    /// prefix search.
    pub fn delete(&mut self, name: &str, permanent: bool) -> Result<()> {
        let id = self
            .arena
            .find_child_by_name(self.cursor, name)
            .ok_or(FsError::NotFound)?;
        // Unreachable via sibling lookup since the root is nobody's child,
        // but defended explicitly.
        if id == self.root {
            return Err(FsError::PermissionDenied);
        }

        if permanent {
            self.deindex_subtree(id);
            self.arena.remove_child(self.cursor, id);
            self.drop_subtree(id);
            debug!(%id, name, "deleted permanently");
            self.emit(Event::Deleted {
                id,
                name: name.to_string(),
            });
        } else {
            // Provenance must be captured before detaching.
            let original_path = self.arena.path_of(id);
            self.arena.remove_child(self.cursor, id);
            let (_, evicted) = self.trash.push(id, original_path.clone(), crate::time());
            if let Some(evicted) = evicted {
                self.drop_evicted(evicted);
            }
            debug!(%id, name, %original_path, "moved to trash");
            self.emit(Event::SoftDeleted {
                id,
                name: name.to_string(),
                original_path,
            });
        }
        Ok(())
    }

    /// Rename the named child of the cursor in place. Descendants keep
    /// their own names and index entries.
    pub fn rename(&mut self, old_name: &str, new_name: &str) -> Result<()> {
        if !is_valid_name(new_name) {
            return Err(FsError::InvalidPath);
        }
        let id = self
            .arena
            .find_child_by_name(self.cursor, old_name)
            .ok_or(FsError::NotFound)?;
        if self.arena.find_child_by_name(self.cursor, new_name).is_some() {
            return Err(FsError::AlreadyExists);
        }

        if let Some(node) = self.arena.get_mut(id) {
            node.set_name(new_name);
        }
        // No atomic rename primitive: delete-old then insert-new, which is
        // fine in this single-threaded model.
        self.trie.delete(old_name, id);
        self.trie.insert(new_name, id);
        self.names.remove(old_name, id);
        self.names.insert(new_name, id);

        debug!(%id, old_name, new_name, "renamed");
        self.emit(Event::Renamed {
            id,
            old_name: old_name.to_string(),
            new_name: new_name.to_string(),
        });
        Ok(())
    }

    /// Move the `source` child of the cursor under the `dest` child, which
    /// must be a folder. Only the tree shape changes; identity and name
    /// stay as they are, so the indices are untouched.
    pub fn move_node(&mut self, source: &str, dest: &str) -> Result<()> {
        let src = self
            .arena
            .find_child_by_name(self.cursor, source)
            .ok_or(FsError::NotFound)?;
        let dst = match self.arena.find_child_by_name(self.cursor, dest) {
            Some(id) if matches!(self.arena.get(id).map(Node::kind), Some(NodeKind::Folder)) => id,
            _ => return Err(FsError::InvalidType),
        };
        // Placing a folder beneath itself or its own descendant would turn
        // the tree into a graph.
        if self.arena.is_ancestor_or_self(src, dst) {
            return Err(FsError::CyclicMove);
        }
        let src_name = self
            .arena
            .get(src)
            .map(|node| node.name().to_string())
            .ok_or(FsError::NotFound)?;
        if self.arena.find_child_by_name(dst, &src_name).is_some() {
            return Err(FsError::AlreadyExists);
        }

        self.arena.remove_child(self.cursor, src);
        self.arena.add_child(dst, src);
        debug!(%src, %dst, "moved");
        self.emit(Event::Moved { id: src, into: dst });
        Ok(())
    }

    /// Change the cursor. Absolute paths (leading `/`) reset to the root;
    /// `..` steps to the parent (a warned no-op at the root); `.` and
    /// empty segments are skipped. The walk is all-or-nothing: on failure
    /// the cursor and current path are left unchanged.
    pub fn navigate(&mut self, path: &str) -> Result<()> {
        let (mut node, mut segments, rest) = match path.strip_prefix('/') {
            Some(rest) => {
                let root_name = self
                    .arena
                    .get(self.root)
                    .map(|n| n.name().to_string())
                    .unwrap_or_else(|| "root".to_string());
                (self.root, vec![root_name], rest)
            }
            None => (self.cursor, self.cursor_path.clone(), path),
        };

        for segment in rest.split('/') {
            match segment {
                "" | "." => continue,
                ".." => match self.arena.get(node).and_then(|n| n.parent()) {
                    Some(parent) => {
                        node = parent;
                        segments.pop();
                    }
                    None => warn!("already at the root"),
                },
                name => {
                    let child = self
                        .arena
                        .find_child_by_name(node, name)
                        .ok_or(FsError::NotFound)?;
                    match self.arena.get(child).map(Node::kind) {
                        Some(NodeKind::Folder) => {
                            node = child;
                            segments.push(name.to_string());
                        }
                        _ => return Err(FsError::InvalidType),
                    }
                }
            }
        }

        self.cursor = node;
        self.cursor_path = segments;
        let path = self.current_path();
        debug!(%path, "navigated");
        self.emit(Event::NavigatedTo { path });
        Ok(())
    }

    // ---- trash ---------------------------------------------------------

    pub fn trash_list(&self) -> Vec<TrashListing> {
        self.trash
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let (name, kind) = match self.arena.get(entry.root) {
                    Some(node) => (node.name().to_string(), node.kind()),
                    None => (String::new(), NodeKind::File),
                };
                TrashListing {
                    index,
                    entry_id: entry.id,
                    name,
                    kind,
                    original_path: entry.original_path.clone(),
                    deleted_at: entry.deleted_at,
                }
            })
            .collect()
    }

    /// Re-attach the trash entry at `index`, resolving its original path
    /// against the current tree. If any intermediate segment is missing or
    /// not a folder, the node is restored under the root with a warning.
    /// If the target name collides with an existing sibling, the restored
    /// node is renamed with a fixed suffix rather than failing.
    pub fn restore(&mut self, index: usize) -> Result<NodeId> {
        let entry = self.trash.restore(index).ok_or(FsError::NotFound)?;
        let id = entry.root;

        let mut dest = self.root;
        let segments: Vec<&str> = entry
            .original_path
            .trim_start_matches('/')
            .split('/')
            .collect();
        // segments[0] is the root itself, the last one is the node's own
        // name; only the folders in between need to resolve.
        if segments.len() > 2 {
            for segment in &segments[1..segments.len() - 1] {
                match self.arena.find_child_by_name(dest, segment) {
                    Some(child)
                        if matches!(
                            self.arena.get(child).map(Node::kind),
                            Some(NodeKind::Folder)
                        ) =>
                    {
                        dest = child;
                    }
                    _ => {
                        warn!(
                            original_path = %entry.original_path,
                            "original folder is gone, restoring under the root",
                        );
                        dest = self.root;
                        self.emit(Event::RestoreFellBack {
                            id,
                            original_path: entry.original_path.clone(),
                        });
                        break;
                    }
                }
            }
        }

        let name = self
            .arena
            .get(id)
            .map(|node| node.name().to_string())
            .ok_or(FsError::NotFound)?;
        if self.arena.find_child_by_name(dest, &name).is_some() {
            let new_name = format!("{name}{RESTORE_SUFFIX}");
            warn!(name, new_name, "name taken at the restore point, renaming");
            // Silent no-ops when the entry came from a loaded trash
            // document and was never indexed.
            self.trie.delete(&name, id);
            self.names.remove(&name, id);
            if let Some(node) = self.arena.get_mut(id) {
                node.set_name(&new_name);
            }
            self.emit(Event::RestoreRenamed { id, new_name });
        }

        self.arena.add_child(dest, id);
        // Idempotent for subtrees that stayed indexed while trashed.
        self.index_subtree(id);

        let path = self.arena.path_of(id);
        debug!(%id, %path, "restored from trash");
        self.emit(Event::Restored { id, path });
        Ok(id)
    }

    /// Drop every trash entry unconditionally. Irreversible.
    pub fn purge_trash(&mut self) -> Result<usize> {
        if self.trash.is_empty() {
            return Err(FsError::TrashEmpty);
        }
        let drained = self.trash.purge();
        let count = drained.len();
        for entry in drained {
            self.deindex_subtree(entry.root);
            self.drop_subtree(entry.root);
        }
        debug!(count, "trash purged");
        self.emit(Event::TrashPurged { count });
        Ok(count)
    }

    pub fn trash_len(&self) -> usize {
        self.trash.len()
    }

    // ---- queries -------------------------------------------------------

    /// Identities currently holding exactly `name` (case-sensitive),
    /// anywhere in the tree or the trash.
    pub fn search_exact(&self, name: &str) -> Vec<NodeId> {
        self.names
            .get(name)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    /// O(1) identity lookup, independent of name or position.
    pub fn search_by_id(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id)
    }

    /// Distinct names starting with `prefix` (case-insensitive), at most
    /// `limit` of them.
    pub fn autocomplete(&self, prefix: &str, limit: usize) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for id in self.trie.search_prefix(prefix) {
            if let Some(node) = self.arena.get(id) {
                if seen.insert(node.name().to_string()) {
                    out.push(node.name().to_string());
                    if out.len() >= limit {
                        break;
                    }
                }
            }
        }
        out
    }

    /// Case-insensitive substring search over every indexed name,
    /// optionally filtered by kind.
    pub fn search_pattern(&self, pattern: &str, kind: Option<NodeKind>) -> Vec<PatternHit> {
        self.names
            .search_substring(pattern)
            .into_iter()
            .filter_map(|id| self.arena.get(id))
            .filter(|node| kind.map_or(true, |k| node.kind() == k))
            .map(|node| PatternHit {
                id: node.id(),
                name: node.name().to_string(),
                kind: node.kind(),
                path: self.arena.path_of(node.id()),
            })
            .collect()
    }

    /// Ordered listing of the cursor's children.
    pub fn list_children(&self) -> Vec<ChildEntry> {
        self.arena
            .get(self.cursor)
            .and_then(|node| node.children())
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.arena.get(*id))
            .map(|node| ChildEntry {
                id: node.id(),
                name: node.name().to_string(),
                kind: node.kind(),
                size: self.arena.size_of(node.id()),
            })
            .collect()
    }

    /// Box-drawing rendering of the cursor's subtree.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(self.cursor, "", true, &mut out);
        out
    }

    fn render_into(&self, id: NodeId, prefix: &str, is_last: bool, out: &mut String) {
        let node = match self.arena.get(id) {
            Some(node) => node,
            None => return,
        };
        out.push_str(prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(node.name());
        out.push('\n');
        if let Some(children) = node.children() {
            let child_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
            for (nth, child) in children.iter().enumerate() {
                self.render_into(*child, &child_prefix, nth + 1 == children.len(), out);
            }
        }
    }

    pub fn stats(&self) -> Stats {
        let mut folders = 0;
        let mut files = 0;
        for (_, kind, _) in self.arena.preorder(self.root) {
            match kind {
                NodeKind::Folder => folders += 1,
                NodeKind::File => files += 1,
            }
        }
        Stats {
            height: self.arena.height_of(self.root),
            nodes: self.arena.size_of(self.root),
            folders,
            files,
            trashed: self.trash.len(),
            distinct_names: self.names.len(),
            version: FORMAT_VERSION,
        }
    }

    /// Write the whole tree as a plain-text pre-order listing, one line
    /// per node: `<KIND>: <name> (ID: <id>)`.
    pub fn export_preorder<W: Write>(&self, writer: &mut W) -> Result<()> {
        for (name, kind, id) in self.arena.preorder(self.root) {
            writeln!(writer, "{}: {} (ID: {})", kind.as_upper_str(), name, id)?;
        }
        Ok(())
    }

    pub fn export_preorder_to_path(&self, path: &Path) -> Result<()> {
        let mut file = fs::File::create(path)?;
        self.export_preorder(&mut file)
    }

    // ---- persistence ---------------------------------------------------

    /// Persist the tree to `path` and the trash bin to its sibling
    /// document. An existing snapshot is copied aside first, best-effort.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let doc = SnapshotDoc {
            version: FORMAT_VERSION.to_string(),
            saved_at: crate::time(),
            next_id: self.next_id,
            root: snapshot::encode_subtree(&self.arena, self.root)?,
        };
        snapshot::store_document(path, &doc)?;

        let trash_doc = TrashDoc {
            capacity: self.trash.capacity(),
            entries: self
                .trash
                .iter()
                .map(|entry| {
                    Ok(TrashRecord {
                        id: entry.id,
                        node: snapshot::encode_subtree(&self.arena, entry.root)?,
                        original_path: entry.original_path.clone(),
                        deleted_at: entry.deleted_at,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
        };
        snapshot::store_trash_document(&snapshot::trash_path(path), &trash_doc)?;

        debug!(path = %path.display(), "saved");
        self.emit(Event::Saved {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    /// Replace the in-memory state with the snapshot at `path`. The
    /// document is parsed and validated before anything is touched; a
    /// rejected load leaves the prior state intact. On success all indices
    /// are rebuilt from scratch and the cursor resets to the root. A
    /// missing or corrupt trash document degrades to an empty trash.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let doc = snapshot::load_document(path)?;

        self.arena.clear();
        self.trie = Trie::new();
        self.names.clear();

        let root = snapshot::decode_subtree(&mut self.arena, &doc.root);
        self.root = root;
        self.cursor = root;
        self.cursor_path = vec![self
            .arena
            .get(root)
            .map(|n| n.name().to_string())
            .unwrap_or_else(|| "root".to_string())];
        self.next_id = doc.next_id.max(snapshot::max_id(&doc.root) + 1);
        self.index_subtree(root);

        let mut bin = TrashBin::with_capacity(self.trash.capacity());
        let trash_path = snapshot::trash_path(path);
        if trash_path.exists() {
            match snapshot::load_trash_document(&trash_path) {
                Ok(trash_doc) => {
                    bin = TrashBin::with_capacity(trash_doc.capacity);
                    let mut entries = Vec::new();
                    for record in &trash_doc.entries {
                        let entry_root = snapshot::decode_subtree(&mut self.arena, &record.node);
                        self.next_id = self.next_id.max(snapshot::max_id(&record.node) + 1);
                        entries.push(TrashEntry {
                            id: record.id,
                            root: entry_root,
                            original_path: record.original_path.clone(),
                            deleted_at: record.deleted_at,
                        });
                    }
                    bin.replace_entries(entries);
                }
                Err(error) => {
                    warn!(path = %trash_path.display(), %error, "trash document ignored");
                }
            }
        }
        self.trash = bin;

        debug!(path = %path.display(), nodes = self.arena.len(), "loaded");
        self.emit(Event::Loaded {
            path: path.to_path_buf(),
        });
        Ok(())
    }

    // ---- internals -----------------------------------------------------

    fn alloc_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    fn check_new_name(&self, name: &str) -> Result<()> {
        if !is_valid_name(name) {
            return Err(FsError::InvalidPath);
        }
        if self.arena.find_child_by_name(self.cursor, name).is_some() {
            return Err(FsError::AlreadyExists);
        }
        Ok(())
    }

    /// Add every node of the subtree to the trie and the name index.
    /// Idempotent: the identity sets absorb re-insertion.
    fn index_subtree(&mut self, id: NodeId) {
        for (name, _, node_id) in self.arena.preorder(id) {
            self.trie.insert(&name, node_id);
            self.names.insert(&name, node_id);
        }
    }

    /// Remove every node of the subtree from the trie and the name index.
    fn deindex_subtree(&mut self, id: NodeId) {
        for (name, _, node_id) in self.arena.preorder(id) {
            self.trie.delete(&name, node_id);
            self.names.remove(&name, node_id);
        }
    }

    /// Drop every node of the subtree from the arena.
    fn drop_subtree(&mut self, id: NodeId) {
        for (_, _, node_id) in self.arena.preorder(id) {
            self.arena.remove(node_id);
        }
    }

    fn drop_evicted(&mut self, evicted: TrashEntry) {
        let name = self
            .arena
            .get(evicted.root)
            .map(|node| node.name().to_string())
            .unwrap_or_default();
        warn!(entry_id = evicted.id, name, "trash full, dropping the oldest entry");
        self.deindex_subtree(evicted.root);
        self.drop_subtree(evicted.root);
        self.emit(Event::TrashEvicted {
            entry_id: evicted.id,
            name,
        });
    }

    fn emit(&mut self, event: Event) {
        if let Some(hook) = self.hook.as_mut() {
            hook(&event);
        }
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "\n{id:<8}    {ty:<6}    name", id = "id", ty = "kind")?;

        fn debug(
            ns: &Namespace,
            id: NodeId,
            formatter: &mut fmt::Formatter<'_>,
            indentation: usize,
        ) -> fmt::Result {
            let node = match ns.arena.get(id) {
                Some(node) => node,
                None => return Ok(()),
            };
            writeln!(
                formatter,
                "{id:<8}    {ty:<6}   {indentation_symbol:indentation_width$}{name}",
                id = node.id().0,
                ty = node.kind().as_str(),
                name = node.name(),
                indentation_symbol = " ",
                indentation_width = indentation * 2 + 1,
            )?;
            for child in node.children().unwrap_or(&[]) {
                debug(ns, *child, formatter, indentation + 1)?;
            }
            Ok(())
        }

        debug(self, self.root, formatter, 0)
    }
}

#[cfg(test)]
mod test_namespace {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// The three-way invariant: every node reachable from the root is in
    /// the name index, the trie and the arena under its current name.
    fn assert_indices_consistent(ns: &Namespace) {
        for (name, _, id) in ns.arena.preorder(ns.root) {
            assert!(
                ns.names.get(&name).is_some_and(|ids| ids.contains(&id)),
                "name index should hold {name:?} -> {id:?}",
            );
            assert!(
                ns.trie.search_exact(&name).contains(&id),
                "trie should hold {name:?} -> {id:?}",
            );
            let node = ns.arena.get(id).expect("arena should hold the node");
            assert_eq!(node.name(), name, "arena and traversal agree on the name");
        }
    }

    #[test]
    fn test_new_namespace() {
        let ns = Namespace::new();

        assert_eq!(ns.current_path(), "/root");
        assert_eq!(ns.stats().nodes, 1, "only the root exists");
        assert_eq!(
            ns.search_exact("root"),
            vec![ns.root_id()],
            "the root itself is indexed",
        );
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_create_and_search() {
        let mut ns = Namespace::new();

        let docs = ns.create_folder("Docs").unwrap();
        assert_eq!(ns.navigate("Docs"), Ok(()));
        assert_eq!(ns.current_path(), "/root/Docs");

        let file = ns.create_file("a.txt", "hello").unwrap();
        assert_eq!(ns.search_exact("a.txt"), vec![file], "exactly one identity");
        assert!(
            ns.autocomplete("a", 10).contains(&"a.txt".to_string()),
            "prefix search sees the new file",
        );
        assert_eq!(ns.search_by_id(docs).unwrap().name(), "Docs");
        assert_eq!(ns.search_by_id(file).unwrap().content(), Some("hello"));
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_create_rejects_invalid_names() {
        let mut ns = Namespace::new();

        for bad in ["", "a/b", "/leading", ".", ".."] {
            assert_eq!(
                ns.create_folder(bad),
                Err(FsError::InvalidPath),
                "{bad:?} is not a valid name",
            );
        }
        assert_eq!(ns.stats().nodes, 1, "the tree is unchanged");
        assert!(ns.search_pattern("a", None).is_empty(), "the indices too");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_create_rejects_duplicate_siblings() {
        let mut ns = Namespace::new();

        ns.create_folder("Docs").unwrap();
        assert_eq!(ns.create_folder("Docs"), Err(FsError::AlreadyExists));
        assert_eq!(
            ns.create_file("Docs", ""),
            Err(FsError::AlreadyExists),
            "a file cannot shadow a folder either",
        );
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_delete_missing_is_a_no_op() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();

        assert_eq!(ns.delete("nope", false), Err(FsError::NotFound));
        assert_eq!(ns.delete("nope", true), Err(FsError::NotFound));
        assert_eq!(ns.stats().nodes, 2, "no partial mutation");
        assert_eq!(ns.trash_len(), 0);
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_soft_delete_records_provenance_and_keeps_indices() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        let file = ns.create_file("a.txt", "x").unwrap();

        assert_eq!(ns.delete("a.txt", false), Ok(()));

        let listing = ns.trash_list();
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].original_path, "/root/Docs/a.txt");
        assert_eq!(listing[0].name, "a.txt");

        // Trashed items stay findable by identity, name and prefix.
        assert_eq!(ns.search_exact("a.txt"), vec![file]);
        assert!(ns.search_by_id(file).is_some());
        assert!(ns.autocomplete("a", 10).contains(&"a.txt".to_string()));
        assert_eq!(ns.stats().nodes, 2, "but it is out of the live tree");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_restore_reattaches_under_the_original_folder() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        let file = ns.create_file("a.txt", "x").unwrap();
        ns.delete("a.txt", false).unwrap();

        assert_eq!(ns.restore(0), Ok(file));
        assert_eq!(ns.trash_len(), 0);
        assert_eq!(
            ns.search_by_id(file).unwrap().parent(),
            ns.arena.find_child_by_name(ns.root_id(), "Docs"),
            "back under Docs",
        );
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_restore_falls_back_to_root_when_the_folder_is_gone() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        let file = ns.create_file("a.txt", "x").unwrap();
        ns.delete("a.txt", false).unwrap();
        ns.navigate("..").unwrap();
        ns.delete("Docs", true).unwrap();

        assert_eq!(ns.restore(0), Ok(file));
        assert_eq!(
            ns.search_by_id(file).unwrap().parent(),
            Some(ns.root_id()),
            "restored under the root instead",
        );
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_restore_renames_on_collision() {
        let mut ns = Namespace::new();
        let original = ns.create_file("a.txt", "old").unwrap();
        ns.delete("a.txt", false).unwrap();
        ns.create_file("a.txt", "new").unwrap();

        assert_eq!(ns.restore(0), Ok(original));
        assert_eq!(
            ns.search_by_id(original).unwrap().name(),
            "a.txt_restored",
            "the restored copy takes the suffixed name",
        );
        assert_eq!(ns.search_exact("a.txt_restored"), vec![original]);
        assert_eq!(ns.search_exact("a.txt").len(), 1, "the new file keeps the plain name");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_rename_keeps_descendants_indexed() {
        let mut ns = Namespace::new();
        let docs = ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        let file = ns.create_file("a.txt", "x").unwrap();
        ns.navigate("/").unwrap();

        assert_eq!(ns.rename("Docs", "Documents"), Ok(()));
        assert_eq!(ns.search_exact("Documents"), vec![docs]);
        assert!(ns.search_exact("Docs").is_empty(), "the old name is gone");
        assert_eq!(ns.search_exact("a.txt"), vec![file], "the child is unaffected");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_rename_error_taxonomy() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.create_folder("Media").unwrap();

        assert_eq!(ns.rename("Docs", "bad/name"), Err(FsError::InvalidPath));
        assert_eq!(ns.rename("missing", "x"), Err(FsError::NotFound));
        assert_eq!(ns.rename("Docs", "Media"), Err(FsError::AlreadyExists));
        assert_eq!(ns.search_exact("Docs").len(), 1, "nothing changed");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_move_changes_shape_but_not_indices() {
        let mut ns = Namespace::new();
        let docs = ns.create_folder("Docs").unwrap();
        let file = ns.create_file("a.txt", "x").unwrap();

        assert_eq!(ns.move_node("a.txt", "Docs"), Ok(()));
        assert_eq!(ns.search_by_id(file).unwrap().parent(), Some(docs));
        assert_eq!(ns.search_exact("a.txt"), vec![file], "indices untouched");
        assert_eq!(ns.list_children().len(), 1, "only Docs remains at the root");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_move_error_taxonomy() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.create_file("a.txt", "x").unwrap();
        ns.navigate("Docs").unwrap();
        ns.create_file("a.txt", "inner").unwrap();
        ns.navigate("..").unwrap();

        assert_eq!(ns.move_node("missing", "Docs"), Err(FsError::NotFound));
        assert_eq!(
            ns.move_node("Docs", "a.txt"),
            Err(FsError::InvalidType),
            "a file is not a destination",
        );
        assert_eq!(
            ns.move_node("Docs", "missing"),
            Err(FsError::InvalidType),
            "neither is an absent sibling",
        );
        assert_eq!(
            ns.move_node("a.txt", "Docs"),
            Err(FsError::AlreadyExists),
            "the destination already has an a.txt",
        );
        assert_eq!(
            ns.move_node("Docs", "Docs"),
            Err(FsError::CyclicMove),
            "a folder cannot move beneath itself",
        );
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_navigate_is_all_or_nothing() {
        let mut ns = Namespace::new();
        ns.create_folder("A").unwrap();
        ns.navigate("A").unwrap();
        ns.create_folder("B").unwrap();
        ns.navigate("/").unwrap();

        assert_eq!(ns.navigate("A/missing/deeper"), Err(FsError::NotFound));
        assert_eq!(ns.current_path(), "/root", "the cursor did not move");

        assert_eq!(ns.navigate("A/B"), Ok(()));
        assert_eq!(ns.current_path(), "/root/A/B");

        assert_eq!(ns.navigate("../.."), Ok(()));
        assert_eq!(ns.current_path(), "/root");

        assert_eq!(ns.navigate(".."), Ok(()), "parent of the root is a warned no-op");
        assert_eq!(ns.current_path(), "/root");

        assert_eq!(ns.navigate("."), Ok(()));
        assert_eq!(ns.navigate(""), Ok(()));
        assert_eq!(ns.current_path(), "/root");

        ns.create_file("f.txt", "").unwrap();
        assert_eq!(
            ns.navigate("f.txt"),
            Err(FsError::InvalidType),
            "cannot cd into a file",
        );
    }

    #[test]
    fn test_permanent_delete_deindexes_the_whole_subtree() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        let file = ns.create_file("a.txt", "x").unwrap();
        ns.navigate("..").unwrap();

        assert_eq!(ns.delete("Docs", true), Ok(()));
        assert!(ns.search_exact("Docs").is_empty());
        assert!(ns.search_exact("a.txt").is_empty());
        assert!(ns.search_by_id(file).is_none(), "gone from the arena too");
        assert_eq!(ns.stats().nodes, 1);
        assert_eq!(ns.trash_len(), 0, "permanent deletion bypasses the trash");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_trash_eviction_drops_the_oldest_for_good() {
        let mut ns = Namespace::with_trash_capacity(2);
        let first = ns.create_file("one.txt", "").unwrap();
        ns.create_file("two.txt", "").unwrap();
        ns.create_file("three.txt", "").unwrap();
        ns.delete("one.txt", false).unwrap();
        ns.delete("two.txt", false).unwrap();
        ns.delete("three.txt", false).unwrap();

        assert_eq!(ns.trash_len(), 2, "capacity bounds the bin");
        assert!(ns.search_exact("one.txt").is_empty(), "the evicted entry is deindexed");
        assert!(ns.search_by_id(first).is_none(), "and dropped from the arena");

        let names: Vec<String> = ns.trash_list().into_iter().map(|item| item.name).collect();
        assert_eq!(names, ["two.txt", "three.txt"]);
        assert_eq!(ns.restore(2), Err(FsError::NotFound), "index out of range");
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_purge_trash() {
        let mut ns = Namespace::new();

        assert_eq!(ns.purge_trash(), Err(FsError::TrashEmpty));

        let file = ns.create_file("a.txt", "").unwrap();
        ns.delete("a.txt", false).unwrap();
        assert_eq!(ns.purge_trash(), Ok(1));
        assert_eq!(ns.trash_len(), 0);
        assert!(ns.search_by_id(file).is_none(), "purged subtrees are dropped");
        assert!(ns.search_exact("a.txt").is_empty());
        assert_indices_consistent(&ns);
    }

    #[test]
    fn test_pattern_search_filters_by_kind() {
        let mut ns = Namespace::new();
        ns.create_folder("reports").unwrap();
        ns.navigate("reports").unwrap();
        ns.create_file("Report.pdf", "").unwrap();
        ns.create_file("notes.txt", "").unwrap();

        let all = ns.search_pattern("report", None);
        assert_eq!(all.len(), 2, "case-insensitive substring match");

        let files = ns.search_pattern("report", Some(NodeKind::File));
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "Report.pdf");
        assert_eq!(files[0].path, "/root/reports/Report.pdf");

        let folders = ns.search_pattern("report", Some(NodeKind::Folder));
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "reports");
    }

    #[test]
    fn test_list_children_and_stats() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        ns.create_file("a.txt", "").unwrap();
        ns.navigate("/").unwrap();
        ns.create_file("top.txt", "").unwrap();

        let children = ns.list_children();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "Docs");
        assert_eq!(children[0].kind, NodeKind::Folder);
        assert_eq!(children[0].size, 2, "Docs plus the file inside");
        assert_eq!(children[1].name, "top.txt");
        assert_eq!(children[1].size, 1);

        let stats = ns.stats();
        assert_eq!(stats.nodes, 4);
        assert_eq!(stats.folders, 2, "root and Docs");
        assert_eq!(stats.files, 2);
        assert_eq!(stats.height, 2);
        assert_eq!(stats.distinct_names, 4);
        assert_eq!(stats.trashed, 0);
        assert_eq!(stats.version, "1.0");
    }

    #[test]
    fn test_export_preorder_format() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.navigate("Docs").unwrap();
        ns.create_file("a.txt", "x").unwrap();

        let mut out = Vec::new();
        ns.export_preorder(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "FOLDER: root (ID: 0)\nFOLDER: Docs (ID: 1)\nFILE: a.txt (ID: 2)\n",
        );
    }

    #[test]
    fn test_render_tree() {
        let mut ns = Namespace::new();
        ns.create_folder("Docs").unwrap();
        ns.create_file("top.txt", "").unwrap();
        ns.navigate("Docs").unwrap();
        ns.create_file("a.txt", "").unwrap();
        ns.navigate("/").unwrap();

        let rendered = ns.render_tree();
        assert_eq!(
            rendered,
            "└── root\n    ├── Docs\n    │   └── a.txt\n    └── top.txt\n",
        );
    }

    #[test]
    fn test_event_hook_sees_mutations() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let mut ns = Namespace::new();
        ns.set_event_hook(Box::new(move |event| {
            sink.lock().unwrap().push(event.clone());
        }));

        let id = ns.create_folder("Docs").unwrap();
        ns.rename("Docs", "Documents").unwrap();
        ns.delete("Documents", false).unwrap();

        let events = events.lock().unwrap();
        assert_eq!(
            events[0],
            Event::FolderCreated {
                id,
                name: "Docs".to_string(),
            },
        );
        assert_eq!(
            events[1],
            Event::Renamed {
                id,
                old_name: "Docs".to_string(),
                new_name: "Documents".to_string(),
            },
        );
        assert!(matches!(
            events[2],
            Event::SoftDeleted { id: deleted, .. } if deleted == id,
        ));
    }

    #[test]
    fn test_identities_are_never_reused() {
        let mut ns = Namespace::new();
        let first = ns.create_file("a.txt", "").unwrap();
        ns.delete("a.txt", true).unwrap();
        let second = ns.create_file("a.txt", "").unwrap();

        assert_ne!(first, second, "permanent deletion does not recycle ids");
        assert!(second > first, "the counter is monotonic");
    }
}
