//! Tree elements: folders and files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A unique, stable token assigned to a node at creation, used for index
/// lookups independent of name or position. Identities are assigned from a
/// monotonic counter and survive snapshot round-trips; they are never
/// reused, even after permanent deletion.
#[derive(Serialize, Deserialize, Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// The two node kinds of the namespace.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Folder,
    File,
}

impl NodeKind {
    /// The lowercase tag used in persisted snapshots.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::File => "file",
        }
    }

    /// The uppercase tag used in pre-order exports.
    pub fn as_upper_str(&self) -> &'static str {
        match self {
            Self::Folder => "FOLDER",
            Self::File => "FILE",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FolderNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub(crate) struct FileNode {
    pub(crate) id: NodeId,
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) content: String,
}

/// A tree element. Folders carry an ordered child list, files carry an
/// opaque text payload. The parent back-reference is non-owning: ownership
/// flows from the arena, and the child order lives in the parent's list.
#[derive(Debug, Clone)]
pub enum Node {
    Folder(FolderNode),
    File(FileNode),
}

impl Node {
    pub(crate) fn new_folder(id: NodeId, name: impl Into<String>) -> Self {
        Self::Folder(FolderNode {
            id,
            name: name.into(),
            parent: None,
            children: Vec::new(),
        })
    }

    pub(crate) fn new_file(id: NodeId, name: impl Into<String>, content: impl Into<String>) -> Self {
        Self::File(FileNode {
            id,
            name: name.into(),
            parent: None,
            content: content.into(),
        })
    }

    pub fn id(&self) -> NodeId {
        *match self {
            Self::Folder(FolderNode { id, .. }) => id,
            Self::File(FileNode { id, .. }) => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Folder(FolderNode { name, .. }) => name,
            Self::File(FileNode { name, .. }) => name,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Folder(..) => NodeKind::Folder,
            Self::File(..) => NodeKind::File,
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        *match self {
            Self::Folder(FolderNode { parent, .. }) => parent,
            Self::File(FileNode { parent, .. }) => parent,
        }
    }

    /// The ordered children of a folder; `None` for files.
    pub fn children(&self) -> Option<&[NodeId]> {
        match self {
            Self::Folder(FolderNode { children, .. }) => Some(children),
            Self::File(..) => None,
        }
    }

    /// The text payload of a file; `None` for folders.
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::Folder(..) => None,
            Self::File(FileNode { content, .. }) => Some(content),
        }
    }

    pub(crate) fn set_name(&mut self, new_name: impl Into<String>) {
        match self {
            Self::Folder(FolderNode { name, .. }) => *name = new_name.into(),
            Self::File(FileNode { name, .. }) => *name = new_name.into(),
        }
    }

    pub(crate) fn set_parent(&mut self, new_parent: Option<NodeId>) {
        match self {
            Self::Folder(FolderNode { parent, .. }) => *parent = new_parent,
            Self::File(FileNode { parent, .. }) => *parent = new_parent,
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match self {
            Self::Folder(FolderNode { children, .. }) => Some(children),
            Self::File(..) => None,
        }
    }
}

/// Whether `name` is usable as a node name: non-empty, no `/` separator,
/// and not one of the reserved path components.
pub(crate) fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && name != "." && name != ".."
}
