//! Snapshot Documents
//!
//! The human-editable representation of a bookmark tree: nested
//! `{ name, type, url, children }` records in YAML or JSON. Exporting turns a
//! native tree into a snapshot; parsing turns an edited snapshot into
//! [`DesiredNode`]s. A root without a `children` array is rejected before
//! anything touches the backend.

use crate::error::SnapshotError;
use crate::tree::{DesiredNode, NativeNode};
use crate::types::NodeKind;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Serialization format of a snapshot document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotFormat {
    #[default]
    Yaml,
    Json,
}

impl SnapshotFormat {
    /// `.json` files are JSON, everything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => SnapshotFormat::Json,
            _ => SnapshotFormat::Yaml,
        }
    }
}

/// `type` field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotKind {
    Url,
    Folder,
}

impl From<SnapshotKind> for NodeKind {
    fn from(kind: SnapshotKind) -> Self {
        match kind {
            SnapshotKind::Url => NodeKind::Link,
            SnapshotKind::Folder => NodeKind::Folder,
        }
    }
}

/// One record of a snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotNode {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SnapshotKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SnapshotNode>>,
}

impl SnapshotNode {
    /// Snapshot of a native node and its descendants.
    pub fn from_native(node: &NativeNode) -> Self {
        match node.kind {
            NodeKind::Link => SnapshotNode {
                name: node.name.clone(),
                kind: Some(SnapshotKind::Url),
                url: node.url.clone(),
                children: None,
            },
            NodeKind::Folder => SnapshotNode {
                name: node.name.clone(),
                kind: Some(SnapshotKind::Folder),
                url: None,
                children: Some(node.children.iter().map(SnapshotNode::from_native).collect()),
            },
        }
    }

    fn into_desired(self) -> Result<DesiredNode, SnapshotError> {
        let kind = self.kind.map(NodeKind::from);
        let desired = DesiredNode {
            name: self.name,
            kind,
            url: self.url,
            children: Vec::new(),
        };
        if desired.is_link() {
            if desired.url.is_none() {
                return Err(SnapshotError::InvalidNode {
                    name: desired.name,
                    reason: "type is url but no url is given".to_string(),
                });
            }
            return Ok(desired);
        }
        let children = self
            .children
            .unwrap_or_default()
            .into_iter()
            .map(SnapshotNode::into_desired)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(DesiredNode {
            children,
            ..desired
        })
    }
}

/// A validated snapshot document: the root's name and its desired children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub name: String,
    pub children: Vec<DesiredNode>,
}

impl Snapshot {
    /// Total number of desired nodes below the root.
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[DesiredNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.children)
    }
}

/// Parse and validate an edited snapshot.
pub fn parse(text: &str, format: SnapshotFormat) -> Result<Snapshot, SnapshotError> {
    if text.trim().is_empty() {
        return Err(SnapshotError::Empty);
    }
    let root: SnapshotNode = match format {
        SnapshotFormat::Yaml => {
            serde_yaml::from_str(text).map_err(|e| SnapshotError::Parse(e.to_string()))?
        }
        SnapshotFormat::Json => {
            serde_json::from_str(text).map_err(|e| SnapshotError::Parse(e.to_string()))?
        }
    };
    let children = root.children.ok_or(SnapshotError::MissingChildren)?;
    let children = children
        .into_iter()
        .map(SnapshotNode::into_desired)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Snapshot {
        name: root.name,
        children,
    })
}

/// Export the tree under `anchor` as a snapshot root.
///
/// The root is always written as a folder with a `children` list, even when
/// the anchor is empty.
pub fn export(anchor: &NativeNode) -> SnapshotNode {
    SnapshotNode {
        name: anchor.name.clone(),
        kind: Some(SnapshotKind::Folder),
        url: None,
        children: Some(anchor.children.iter().map(SnapshotNode::from_native).collect()),
    }
}

/// Render a snapshot root as text.
pub fn render(root: &SnapshotNode, format: SnapshotFormat) -> Result<String, SnapshotError> {
    match format {
        SnapshotFormat::Yaml => {
            serde_yaml::to_string(root).map_err(|e| SnapshotError::Render(e.to_string()))
        }
        SnapshotFormat::Json => serde_json::to_string_pretty(root)
            .map(|mut json| {
                json.push('\n');
                json
            })
            .map_err(|e| SnapshotError::Render(e.to_string())),
    }
}
