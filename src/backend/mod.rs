//! Bookmark Backends
//!
//! The reconciler only talks to the native tree through [`BookmarkBackend`]:
//! read a subtree, create, update, move and delete-subtree. Implementations
//! are an in-memory arena ([`MemoryBackend`]) and a Chrome profile
//! `Bookmarks` file ([`ChromeBookmarksFile`]) loaded into that arena.

pub mod chrome;
pub mod memory;

use crate::error::BackendError;
use crate::tree::NativeNode;
use crate::types::{NodeId, NodeKind};
use async_trait::async_trait;
use serde::Serialize;

pub use chrome::{ChromeBookmarksFile, ChromeStamper, RootName};
pub use memory::{MemoryBackend, NodeStamper, RfcStamper};

/// Parameters for a create call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateRequest {
    pub parent_id: NodeId,
    pub index: usize,
    pub name: String,
    /// Present for links only.
    pub url: Option<String>,
    pub kind: NodeKind,
}

/// Fields to change on an update call. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeChanges {
    pub name: Option<String>,
    pub url: Option<String>,
}

/// Target position for a move call.
///
/// `index` is the final position among the destination's children; moving
/// within the same parent removes the node before inserting it. Indexes past
/// the end append.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveDestination {
    pub parent_id: NodeId,
    pub index: usize,
}

/// Capability set of a native bookmark store.
///
/// Calls are issued one at a time by the reconciler; each call completes
/// before the next one is made.
#[async_trait]
pub trait BookmarkBackend: Send + Sync {
    /// Read the current tree rooted at `anchor`.
    async fn get_subtree(&self, anchor: &NodeId) -> Result<NativeNode, BackendError>;

    /// Create a node; the backend assigns the id and timestamps.
    async fn create(&self, request: CreateRequest) -> Result<NativeNode, BackendError>;

    async fn update(&self, id: &NodeId, changes: NodeChanges) -> Result<(), BackendError>;

    async fn move_node(&self, id: &NodeId, destination: MoveDestination)
        -> Result<(), BackendError>;

    /// Remove a node together with its whole subtree.
    async fn delete_subtree(&self, id: &NodeId) -> Result<(), BackendError>;
}

/// Kind of a backend mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Create,
    Update,
    Move,
    Delete,
}

impl MutationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Move => "move",
            MutationKind::Delete => "delete",
        }
    }
}

/// One mutation call as received by a backend, whether or not it succeeded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Mutation {
    Create {
        parent_id: NodeId,
        index: usize,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Update {
        id: NodeId,
        #[serde(skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
    Move {
        id: NodeId,
        parent_id: NodeId,
        index: usize,
    },
    Delete {
        id: NodeId,
    },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Create { .. } => MutationKind::Create,
            Mutation::Update { .. } => MutationKind::Update,
            Mutation::Move { .. } => MutationKind::Move,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    /// Id of the node the call targets; creates have none yet.
    pub fn target(&self) -> Option<&NodeId> {
        match self {
            Mutation::Create { .. } => None,
            Mutation::Update { id, .. } | Mutation::Move { id, .. } | Mutation::Delete { id } => {
                Some(id)
            }
        }
    }
}
