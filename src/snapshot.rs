//! Snapshot codec: whole-tree JSON persistence with structural validation
//! and best-effort backup rotation on overwrite.
//!
//! The persisted form is a versioned document holding the next-identity
//! counter and a recursive node record per tree element. The trash bin is
//! persisted as a separate document in the same spirit. Indices are never
//! persisted; they are rebuilt from scratch after a successful load.

use crate::node::{Node, NodeId, NodeKind};
use crate::tree::Arena;
use crate::{FsError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub(crate) const FORMAT_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub(crate) struct NodeRecord {
    pub id: u64,
    pub name: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<NodeRecord>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct SnapshotDoc {
    pub version: String,
    pub saved_at: u64,
    pub next_id: u64,
    pub root: NodeRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TrashRecord {
    pub id: u64,
    pub node: NodeRecord,
    pub original_path: String,
    pub deleted_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct TrashDoc {
    pub capacity: usize,
    pub entries: Vec<TrashRecord>,
}

/// Structural validation of a node record tree: every record must carry a
/// recognized kind, folder records must carry a children array (validated
/// recursively) and file records must not.
pub(crate) fn validate_record(record: &NodeRecord) -> Result<()> {
    match record.kind.as_str() {
        "folder" => match &record.children {
            Some(children) => {
                for child in children {
                    validate_record(child)?;
                }
                Ok(())
            }
            None => Err(FsError::InvalidSnapshot),
        },
        "file" => {
            if record.children.is_some() {
                return Err(FsError::InvalidSnapshot);
            }
            Ok(())
        }
        _ => Err(FsError::InvalidSnapshot),
    }
}

/// Encode the subtree rooted at `id` into its persisted record form.
pub(crate) fn encode_subtree(arena: &Arena, id: NodeId) -> Result<NodeRecord> {
    let node = arena.get(id).ok_or(FsError::InvalidSnapshot)?;
    Ok(match node.kind() {
        NodeKind::Folder => NodeRecord {
            id: id.0,
            name: node.name().to_string(),
            kind: "folder".to_string(),
            content: None,
            children: Some(
                node.children()
                    .unwrap_or(&[])
                    .iter()
                    .map(|child| encode_subtree(arena, *child))
                    .collect::<Result<Vec<_>>>()?,
            ),
        },
        NodeKind::File => NodeRecord {
            id: id.0,
            name: node.name().to_string(),
            kind: "file".to_string(),
            content: Some(node.content().unwrap_or("").to_string()),
            children: None,
        },
    })
}

/// Materialize a validated record tree into the arena as a detached
/// subtree (the top node gets no parent). Returns the subtree root id.
pub(crate) fn decode_subtree(arena: &mut Arena, record: &NodeRecord) -> NodeId {
    decode_with_parent(arena, record, None)
}

fn decode_with_parent(arena: &mut Arena, record: &NodeRecord, parent: Option<NodeId>) -> NodeId {
    let id = NodeId(record.id);
    let mut node = match record.kind.as_str() {
        "folder" => Node::new_folder(id, record.name.clone()),
        // Validation only admits the two kinds.
        _ => Node::new_file(id, record.name.clone(), record.content.clone().unwrap_or_default()),
    };
    node.set_parent(parent);
    arena.insert(node);
    if let Some(children) = &record.children {
        for child_record in children {
            let child_id = decode_with_parent(arena, child_record, Some(id));
            if let Some(children) = arena.get_mut(id).and_then(Node::children_mut) {
                children.push(child_id);
            }
        }
    }
    id
}

/// Largest id appearing in a record tree, used to keep the identity
/// counter ahead of everything a snapshot brings back in.
pub(crate) fn max_id(record: &NodeRecord) -> u64 {
    let mut max = record.id;
    for child in record.children.as_deref().unwrap_or(&[]) {
        max = max.max(max_id(child));
    }
    max
}

pub(crate) fn load_document(path: &Path) -> Result<SnapshotDoc> {
    let raw = fs::read_to_string(path)?;
    let doc: SnapshotDoc = serde_json::from_str(&raw).map_err(|error| {
        warn!(path = %path.display(), %error, "snapshot failed to parse");
        FsError::InvalidSnapshot
    })?;
    validate_record(&doc.root)?;
    Ok(doc)
}

pub(crate) fn store_document(path: &Path, doc: &SnapshotDoc) -> Result<()> {
    backup_existing(path);
    let raw = serde_json::to_string_pretty(doc).map_err(|_| FsError::InvalidSnapshot)?;
    fs::write(path, raw)?;
    debug!(path = %path.display(), "snapshot written");
    Ok(())
}

pub(crate) fn load_trash_document(path: &Path) -> Result<TrashDoc> {
    let raw = fs::read_to_string(path)?;
    let doc: TrashDoc = serde_json::from_str(&raw).map_err(|error| {
        warn!(path = %path.display(), %error, "trash document failed to parse");
        FsError::InvalidSnapshot
    })?;
    for entry in &doc.entries {
        validate_record(&entry.node)?;
    }
    Ok(doc)
}

pub(crate) fn store_trash_document(path: &Path, doc: &TrashDoc) -> Result<()> {
    let raw = serde_json::to_string_pretty(doc).map_err(|_| FsError::InvalidSnapshot)?;
    fs::write(path, raw)?;
    Ok(())
}

/// Sibling path holding the persisted trash document for a given snapshot
/// path: `system.json` keeps its trash in `system.trash.json`.
pub(crate) fn trash_path(snapshot_path: &Path) -> PathBuf {
    snapshot_path.with_extension("trash.json")
}

/// Copy an existing file aside before it is overwritten. Best-effort: a
/// backup failure is reported and the save proceeds.
fn backup_existing(path: &Path) {
    if !path.exists() {
        return;
    }
    let base_name = match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => return,
    };
    let seconds = crate::time() / 1_000_000_000;
    let backup_name = format!("backup_{seconds}_{base_name}");
    let backup_path = path.with_file_name(backup_name);
    match fs::copy(path, &backup_path) {
        Ok(_) => debug!(backup = %backup_path.display(), "backup created"),
        Err(error) => {
            warn!(path = %path.display(), %error, "backup failed, overwriting anyway")
        }
    }
}
