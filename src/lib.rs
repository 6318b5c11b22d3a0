//! Marksync: Bookmark Snapshot Reconciliation
//!
//! Exports a browser bookmark tree to an editable snapshot and reconciles the
//! edited snapshot back into the native tree, reusing native ids, timestamps
//! and metadata wherever a node can be matched by kind, name and url.

pub mod backend;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod reconcile;
pub mod snapshot;
pub mod tooling;
pub mod tree;
pub mod types;

pub use backend::{BookmarkBackend, ChromeBookmarksFile, MemoryBackend};
pub use error::{ApiError, BackendError, SnapshotError};
pub use index::MatchIndex;
pub use reconcile::{ReconcileReport, Reconciler};
pub use tree::{DesiredNode, MatchKey, NativeNode};
pub use types::{NodeId, NodeKind};
