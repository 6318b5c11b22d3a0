//! Error types
//!
//! `BackendError` is returned by bookmark backend calls, `SnapshotError` by the
//! snapshot reader, and `ApiError` wraps both for callers of the public API.

use crate::types::NodeId;
use thiserror::Error;

/// Errors raised by a bookmark backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Node not found: {0}")]
    NotFound(NodeId),

    #[error("Node {0} is not a folder")]
    NotAFolder(NodeId),

    #[error("Invalid move of {id}: {reason}")]
    InvalidMove { id: NodeId, reason: String },

    #[error("Invalid node: {0}")]
    InvalidNode(String),

    #[error("Bookmark root not found: {0}")]
    RootNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Backend call failed: {0}")]
    Rejected(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        BackendError::SerializationError(err.to_string())
    }
}

/// Errors raised while reading or writing a snapshot document.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("Snapshot is empty")]
    Empty,

    #[error("Failed to parse snapshot: {0}")]
    Parse(String),

    #[error("Snapshot format is invalid: root needs a \"children\" array")]
    MissingChildren,

    #[error("Invalid snapshot node {name:?}: {reason}")]
    InvalidNode { name: String, reason: String },

    #[error("Failed to render snapshot: {0}")]
    Render(String),
}

/// Top-level error for the public API.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Snapshot error: {0}")]
    SnapshotError(#[from] SnapshotError),

    #[error("Backend error: {0}")]
    BackendError(#[from] BackendError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Aborted: {0}")]
    Aborted(String),
}
