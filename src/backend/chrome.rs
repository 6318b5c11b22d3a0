//! Chrome profile `Bookmarks` file
//!
//! Loads one of the document's roots into a [`MemoryBackend`], lets the
//! reconciler mutate it through [`BookmarkBackend`], and writes the result
//! back into the document on [`ChromeBookmarksFile::save`]. Every field the
//! reconciler does not understand (`checksum`, `version`, `guid`,
//! `meta_info`, other roots) is written back untouched.

use super::{BookmarkBackend, CreateRequest, MemoryBackend, MoveDestination, NodeChanges, NodeStamper};
use crate::error::BackendError;
use crate::tree::NativeNode;
use crate::types::{NodeId, NodeKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Microseconds between 1601-01-01 (WebKit epoch) and 1970-01-01.
const WEBKIT_EPOCH_OFFSET_MICROS: i64 = 11_644_473_600_000_000;

/// Top-level roots of a Chrome bookmarks document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RootName {
    #[default]
    BookmarkBar,
    Other,
    Synced,
}

impl RootName {
    pub fn as_key(&self) -> &'static str {
        match self {
            RootName::BookmarkBar => "bookmark_bar",
            RootName::Other => "other",
            RootName::Synced => "synced",
        }
    }
}

impl fmt::Display for RootName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_key())
    }
}

/// WebKit timestamps and a fresh `guid` for created nodes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChromeStamper;

impl NodeStamper for ChromeStamper {
    fn timestamp(&self) -> String {
        webkit_timestamp(chrono::Utc::now())
    }

    fn fresh_extra(&self, _kind: NodeKind) -> Map<String, Value> {
        let mut extra = Map::new();
        extra.insert(
            "guid".to_string(),
            Value::String(uuid::Uuid::new_v4().to_string()),
        );
        extra
    }
}

/// Chrome stores times as decimal microseconds since 1601-01-01 UTC.
pub fn webkit_timestamp(at: chrono::DateTime<chrono::Utc>) -> String {
    (at.timestamp_micros() + WEBKIT_EPOCH_OFFSET_MICROS).to_string()
}

/// Node as laid out in the Chrome document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChromeNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    children: Option<Vec<ChromeNode>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_added: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_last_used: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    date_modified: Option<String>,
    #[serde(flatten)]
    extra: Map<String, Value>,
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "type")]
    node_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
}

impl ChromeNode {
    fn into_native(self) -> Result<NativeNode, BackendError> {
        let kind = match self.node_type.as_str() {
            "url" => NodeKind::Link,
            "folder" => NodeKind::Folder,
            other => {
                return Err(BackendError::InvalidNode(format!(
                    "node {} has unknown type {:?}",
                    self.id, other
                )))
            }
        };
        let children = self
            .children
            .unwrap_or_default()
            .into_iter()
            .map(ChromeNode::into_native)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NativeNode {
            id: NodeId::new(self.id),
            kind,
            name: self.name,
            url: self.url,
            children,
            created_at: self.date_added,
            modified_at: self.date_modified,
            last_used_at: self.date_last_used,
            extra: self.extra,
        })
    }

    fn from_native(node: NativeNode) -> ChromeNode {
        let (node_type, children) = match node.kind {
            NodeKind::Link => ("url", None),
            NodeKind::Folder => (
                "folder",
                Some(node.children.into_iter().map(ChromeNode::from_native).collect()),
            ),
        };
        ChromeNode {
            children,
            date_added: node.created_at,
            date_last_used: node.last_used_at,
            date_modified: node.modified_at,
            extra: node.extra,
            id: node.id.to_string(),
            name: node.name,
            node_type: node_type.to_string(),
            url: node.url,
        }
    }

    fn max_numeric_id(&self) -> u64 {
        let own = self.id.parse::<u64>().unwrap_or(0);
        self.children
            .iter()
            .flatten()
            .map(ChromeNode::max_numeric_id)
            .fold(own, u64::max)
    }
}

/// A Chrome `Bookmarks` file opened for reconciliation of one root.
pub struct ChromeBookmarksFile {
    path: PathBuf,
    raw: String,
    /// Whole document, key order kept; only `roots.<root>` is ever replaced.
    document: Map<String, Value>,
    root: RootName,
    anchor_id: NodeId,
    backend: MemoryBackend,
}

impl ChromeBookmarksFile {
    /// Read `path` and load `root` into memory.
    pub fn open(path: &Path, root: RootName) -> Result<Self, BackendError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(path, raw, root)
    }

    /// Load `root` from an already-read document.
    pub fn from_json(path: &Path, raw: String, root: RootName) -> Result<Self, BackendError> {
        let document: Map<String, Value> = serde_json::from_str(&raw)?;
        let roots = document
            .get("roots")
            .and_then(Value::as_object)
            .ok_or_else(|| BackendError::InvalidNode("document has no roots object".to_string()))?;

        let mut max_id = 0u64;
        let mut anchor = None;
        for (key, value) in roots {
            // Non-node entries (e.g. sync_transaction_version) sit next to the roots.
            let Ok(node) = serde_json::from_value::<ChromeNode>(value.clone()) else {
                continue;
            };
            max_id = max_id.max(node.max_numeric_id());
            if key == root.as_key() {
                anchor = Some(node);
            }
        }
        let anchor = anchor
            .ok_or_else(|| BackendError::RootNotFound(root.as_key().to_string()))?
            .into_native()?;
        if !anchor.is_folder() {
            return Err(BackendError::NotAFolder(anchor.id));
        }

        debug!(
            path = %path.display(),
            root = %root,
            nodes = anchor.descendant_count(),
            next_id = max_id + 1,
            "Loaded Chrome bookmarks"
        );
        let anchor_id = anchor.id.clone();
        let backend = MemoryBackend::new(anchor)?
            .with_stamper(Box::new(ChromeStamper))
            .with_next_id(max_id + 1);

        Ok(ChromeBookmarksFile {
            path: path.to_path_buf(),
            raw,
            document,
            root,
            anchor_id,
            backend,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn root(&self) -> RootName {
        self.root
    }

    /// Id of the loaded root node.
    pub fn anchor_id(&self) -> &NodeId {
        &self.anchor_id
    }

    /// In-memory tree the reconciler mutates.
    pub fn backend(&self) -> &MemoryBackend {
        &self.backend
    }

    /// Current state of the loaded root.
    pub fn anchor(&self) -> Result<NativeNode, BackendError> {
        self.backend.subtree(&self.anchor_id)
    }

    /// Serialize the document with the current root state, Chrome's 3-space layout.
    pub fn to_json(&self) -> Result<String, BackendError> {
        let mut document = self.document.clone();
        let root = serde_json::to_value(ChromeNode::from_native(self.anchor()?))?;
        if let Some(roots) = document.get_mut("roots").and_then(Value::as_object_mut) {
            roots.insert(self.root.as_key().to_string(), root);
        }

        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
        document.serialize(&mut serializer)?;
        String::from_utf8(out).map_err(|e| BackendError::SerializationError(e.to_string()))
    }

    /// Write the document back to its path, copying the original contents to
    /// `backup` first when given.
    pub fn save(&self, backup: Option<&Path>) -> Result<(), BackendError> {
        let json = self.to_json()?;
        if let Some(backup) = backup {
            if let Some(parent) = backup.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            std::fs::write(backup, &self.raw)?;
            info!(backup = %backup.display(), "Created bookmarks backup");
        }
        std::fs::write(&self.path, json)?;
        info!(path = %self.path.display(), root = %self.root, "Wrote Chrome bookmarks");
        Ok(())
    }
}

#[async_trait]
impl BookmarkBackend for ChromeBookmarksFile {
    async fn get_subtree(&self, anchor: &NodeId) -> Result<NativeNode, BackendError> {
        self.backend.get_subtree(anchor).await
    }

    async fn create(&self, request: CreateRequest) -> Result<NativeNode, BackendError> {
        self.backend.create(request).await
    }

    async fn update(&self, id: &NodeId, changes: NodeChanges) -> Result<(), BackendError> {
        self.backend.update(id, changes).await
    }

    async fn move_node(
        &self,
        id: &NodeId,
        destination: MoveDestination,
    ) -> Result<(), BackendError> {
        self.backend.move_node(id, destination).await
    }

    async fn delete_subtree(&self, id: &NodeId) -> Result<(), BackendError> {
        self.backend.delete_subtree(id).await
    }
}
