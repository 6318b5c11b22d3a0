//! Bookmark node types and MatchKey derivation

use crate::types::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Node of the authoritative tree, owned by the backend.
///
/// `created_at`, `modified_at`, `last_used_at` and `extra` are opaque to the
/// reconciler. They are carried verbatim for reused nodes and only ever
/// synthesized by the backend on create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NativeNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub extra: Map<String, Value>,
}

impl NativeNode {
    pub fn folder(id: impl Into<NodeId>, name: impl Into<String>, children: Vec<NativeNode>) -> Self {
        NativeNode {
            id: id.into(),
            kind: NodeKind::Folder,
            name: name.into(),
            url: None,
            children,
            created_at: None,
            modified_at: None,
            last_used_at: None,
            extra: Map::new(),
        }
    }

    pub fn link(id: impl Into<NodeId>, name: impl Into<String>, url: impl Into<String>) -> Self {
        NativeNode {
            id: id.into(),
            kind: NodeKind::Link,
            name: name.into(),
            url: Some(url.into()),
            children: Vec::new(),
            created_at: None,
            modified_at: None,
            last_used_at: None,
            extra: Map::new(),
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }

    pub fn match_key(&self) -> MatchKey {
        match self.kind {
            NodeKind::Link => MatchKey::Link {
                url: self.url.clone().unwrap_or_default(),
                name: self.name.clone(),
            },
            NodeKind::Folder => MatchKey::Folder {
                name: self.name.clone(),
            },
        }
    }

    /// Number of nodes below this one (this node excluded).
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.descendant_count())
            .sum()
    }

    /// Find a node by id in this subtree (this node included).
    pub fn find(&self, id: &NodeId) -> Option<&NativeNode> {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

/// Node of the edited snapshot. Carries no identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredNode {
    pub name: String,
    pub kind: Option<NodeKind>,
    pub url: Option<String>,
    pub children: Vec<DesiredNode>,
}

impl DesiredNode {
    pub fn folder(name: impl Into<String>, children: Vec<DesiredNode>) -> Self {
        DesiredNode {
            name: name.into(),
            kind: Some(NodeKind::Folder),
            url: None,
            children,
        }
    }

    pub fn link(name: impl Into<String>, url: impl Into<String>) -> Self {
        DesiredNode {
            name: name.into(),
            kind: Some(NodeKind::Link),
            url: Some(url.into()),
            children: Vec::new(),
        }
    }

    /// A node is a link when declared as one, or when the kind is omitted and a url is present.
    pub fn is_link(&self) -> bool {
        match self.kind {
            Some(kind) => kind == NodeKind::Link,
            None => self.url.is_some(),
        }
    }

    pub fn effective_kind(&self) -> NodeKind {
        if self.is_link() {
            NodeKind::Link
        } else {
            NodeKind::Folder
        }
    }

    pub fn match_key(&self) -> MatchKey {
        if self.is_link() {
            MatchKey::Link {
                url: self.url.clone().unwrap_or_default(),
                name: self.name.clone(),
            }
        } else {
            MatchKey::Folder {
                name: self.name.clone(),
            }
        }
    }
}

/// Structural identity used to pair desired nodes with native nodes.
///
/// Links are keyed by (url, name), folders by name alone. Position in the
/// tree plays no part: equal keys anywhere in the tree are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatchKey {
    Link { url: String, name: String },
    Folder { name: String },
}

impl std::fmt::Display for MatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKey::Link { url, name } => write!(f, "url:{}|name:{}", url, name),
            MatchKey::Folder { name } => write!(f, "folder:{}", name),
        }
    }
}
