//! An in-memory hierarchical namespace: a tree of folders and files with
//! exact-name and prefix lookup indices, a bounded soft-delete trash bin,
//! and whole-tree JSON snapshot persistence.
//!
//! The entry point is [`Namespace`], which owns the tree, keeps the trie,
//! the name index and the identity arena consistent after every mutation,
//! and drives the snapshot codec at explicit save/load boundaries.
//!
//! The engine is single-threaded and synchronous: every operation runs to
//! completion before the next is accepted, and persistence is a blocking
//! foreground call. Callers that need concurrent access must wrap the whole
//! engine behind one mutual-exclusion boundary, since the index invariants
//! are violated if observed mid-update.

use std::io;
use thiserror::Error;

pub mod engine;
pub mod name_index;
pub mod node;
mod snapshot;
pub mod trash;
mod tree;
pub mod trie;

pub use engine::{
    ChildEntry, Event, EventHook, Namespace, PatternHit, Stats, TrashListing,
};
pub use node::{Node, NodeId, NodeKind};

pub type Result<T, E = FsError> = std::result::Result<T, E>;

/// Error type for external users.
///
/// Every failure is locally recoverable: a mutating operation that returns
/// an error has left the tree, the indices and the trash bin unchanged.
#[derive(Error, Copy, Clone, Debug, PartialEq, Eq)]
pub enum FsError {
    /// The requested entry could not be found under the current folder.
    #[error("entry not found")]
    NotFound,
    /// An entry with that name already exists where one is being placed.
    #[error("entry already exists")]
    AlreadyExists,
    /// The entry has the wrong kind for the requested operation, e.g.
    /// moving into a file.
    #[error("wrong entry kind for this operation")]
    InvalidType,
    /// Caller was not allowed to perform this operation (root deletion).
    #[error("permission denied")]
    PermissionDenied,
    /// A malformed name or path: empty, or containing the `/` separator,
    /// or one of the reserved `.`/`..` components.
    #[error("invalid name or path")]
    InvalidPath,
    /// The trash bin holds no entries.
    #[error("trash bin is empty")]
    TrashEmpty,
    /// The move would place a folder beneath its own descendant.
    #[error("move would create a cycle")]
    CyclicMove,
    /// A persisted snapshot failed structural validation. The load is
    /// rejected and the in-memory state is left untouched.
    #[error("snapshot structure is invalid")]
    InvalidSnapshot,
    /// Something failed when doing IO. It may work if tried again.
    #[error("io error")]
    Io,
}

impl From<io::Error> for FsError {
    fn from(_: io::Error) -> Self {
        FsError::Io
    }
}

/// Nanoseconds since the UNIX epoch, used for trash timestamps, snapshot
/// save times and backup file names.
pub(crate) fn time() -> u64 {
    // SAFETY: It's very unlikely that the system returns a time that
    // is before `UNIX_EPOCH` :-).
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos() as u64
}
