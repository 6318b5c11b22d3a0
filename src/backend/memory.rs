//! In-memory bookmark store
//!
//! Arena of nodes behind a `parking_lot::RwLock`. Every mutation call is
//! journaled before it is validated, so callers can inspect exactly which
//! calls a run made. Failures can be injected per operation and target for
//! exercising best-effort paths.

use super::{BookmarkBackend, CreateRequest, MoveDestination, Mutation, MutationKind, NodeChanges};
use crate::error::BackendError;
use crate::tree::NativeNode;
use crate::types::{NodeId, NodeKind};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::{HashMap, HashSet};

/// Source of fresh auxiliary values for created nodes.
pub trait NodeStamper: Send + Sync {
    /// Timestamp recorded as `created_at` (and `modified_at` for folders).
    fn timestamp(&self) -> String;

    /// Opaque metadata attached to a created node.
    fn fresh_extra(&self, _kind: NodeKind) -> Map<String, Value> {
        Map::new()
    }
}

/// RFC 3339 UTC timestamps, no extra metadata.
#[derive(Debug, Default, Clone, Copy)]
pub struct RfcStamper;

impl NodeStamper for RfcStamper {
    fn timestamp(&self) -> String {
        chrono::Utc::now().to_rfc3339()
    }
}

#[derive(Debug, Clone)]
struct StoredNode {
    id: NodeId,
    kind: NodeKind,
    name: String,
    url: Option<String>,
    created_at: Option<String>,
    modified_at: Option<String>,
    last_used_at: Option<String>,
    extra: Map<String, Value>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

#[derive(Debug, Default)]
struct ArenaState {
    nodes: HashMap<NodeId, StoredNode>,
    roots: Vec<NodeId>,
    next_id: u64,
    journal: Vec<Mutation>,
    failures: HashSet<(MutationKind, String)>,
}

impl ArenaState {
    fn insert_tree(&mut self, node: &NativeNode, parent: Option<&NodeId>) -> Result<(), BackendError> {
        if self.nodes.contains_key(&node.id) {
            return Err(BackendError::InvalidNode(format!(
                "duplicate node id {}",
                node.id
            )));
        }
        self.nodes.insert(
            node.id.clone(),
            StoredNode {
                id: node.id.clone(),
                kind: node.kind,
                name: node.name.clone(),
                url: node.url.clone(),
                created_at: node.created_at.clone(),
                modified_at: node.modified_at.clone(),
                last_used_at: node.last_used_at.clone(),
                extra: node.extra.clone(),
                parent: parent.cloned(),
                children: node.children.iter().map(|c| c.id.clone()).collect(),
            },
        );
        if let Ok(numeric) = node.id.as_str().parse::<u64>() {
            self.next_id = self.next_id.max(numeric + 1);
        }
        for child in &node.children {
            self.insert_tree(child, Some(&node.id))?;
        }
        Ok(())
    }

    fn materialize(&self, id: &NodeId) -> Result<NativeNode, BackendError> {
        let stored = self
            .nodes
            .get(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        let children = stored
            .children
            .iter()
            .map(|child| self.materialize(child))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(NativeNode {
            id: stored.id.clone(),
            kind: stored.kind,
            name: stored.name.clone(),
            url: stored.url.clone(),
            children,
            created_at: stored.created_at.clone(),
            modified_at: stored.modified_at.clone(),
            last_used_at: stored.last_used_at.clone(),
            extra: stored.extra.clone(),
        })
    }

    fn allocate_id(&mut self) -> NodeId {
        loop {
            let candidate = NodeId::new(self.next_id.to_string());
            self.next_id += 1;
            if !self.nodes.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    fn folder(&self, id: &NodeId) -> Result<&StoredNode, BackendError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        if node.kind != NodeKind::Folder {
            return Err(BackendError::NotAFolder(id.clone()));
        }
        Ok(node)
    }

    fn is_ancestor_or_self(&self, candidate: &NodeId, of: &NodeId) -> bool {
        let mut cursor = Some(of.clone());
        while let Some(current) = cursor {
            if &current == candidate {
                return true;
            }
            cursor = self.nodes.get(&current).and_then(|n| n.parent.clone());
        }
        false
    }

    fn check_injected(&self, kind: MutationKind, target: &str) -> Result<(), BackendError> {
        if self.failures.contains(&(kind, target.to_string())) {
            return Err(BackendError::Rejected(format!(
                "injected {} failure for {}",
                kind.as_str(),
                target
            )));
        }
        Ok(())
    }

    fn detach(&mut self, id: &NodeId) {
        let parent = self.nodes.get(id).and_then(|n| n.parent.clone());
        if let Some(parent_id) = parent {
            if let Some(parent) = self.nodes.get_mut(&parent_id) {
                parent.children.retain(|child| child != id);
            }
        }
    }

    fn remove_subtree(&mut self, id: &NodeId) {
        if let Some(node) = self.nodes.remove(id) {
            for child in node.children {
                self.remove_subtree(&child);
            }
        }
    }
}

/// In-memory bookmark backend.
pub struct MemoryBackend {
    state: RwLock<ArenaState>,
    stamper: Box<dyn NodeStamper>,
}

impl MemoryBackend {
    /// Create a backend holding a single root tree.
    pub fn new(root: NativeNode) -> Result<Self, BackendError> {
        Self::with_roots(vec![root])
    }

    /// Create a backend holding several independent root trees.
    pub fn with_roots(roots: Vec<NativeNode>) -> Result<Self, BackendError> {
        let mut state = ArenaState {
            next_id: 1,
            ..ArenaState::default()
        };
        for root in &roots {
            state.insert_tree(root, None)?;
            state.roots.push(root.id.clone());
        }
        Ok(MemoryBackend {
            state: RwLock::new(state),
            stamper: Box::new(RfcStamper),
        })
    }

    /// Replace the source of fresh timestamps and metadata.
    pub fn with_stamper(mut self, stamper: Box<dyn NodeStamper>) -> Self {
        self.stamper = stamper;
        self
    }

    /// Start id allocation at `next_id` (or above, if that id is taken).
    pub fn with_next_id(self, next_id: u64) -> Self {
        {
            let mut state = self.state.write();
            state.next_id = state.next_id.max(next_id);
        }
        self
    }

    /// Make every future call of `kind` against `target` fail.
    ///
    /// `target` is the node id for update, move and delete, and the node name
    /// for create (the id does not exist yet).
    pub fn inject_failure(&self, kind: MutationKind, target: impl Into<String>) {
        self.state.write().failures.insert((kind, target.into()));
    }

    /// Every mutation call received so far, in call order.
    pub fn journal(&self) -> Vec<Mutation> {
        self.state.read().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.state.write().journal.clear();
    }

    /// Current tree rooted at `id`.
    pub fn subtree(&self, id: &NodeId) -> Result<NativeNode, BackendError> {
        self.state.read().materialize(id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.state.read().nodes.contains_key(id)
    }

    /// Total number of nodes held, roots included.
    pub fn len(&self) -> usize {
        self.state.read().nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().nodes.is_empty()
    }

    /// Deep copy of the current trees, with an empty journal and no injected failures.
    pub fn fork(&self) -> Result<MemoryBackend, BackendError> {
        let state = self.state.read();
        let roots = state
            .roots
            .iter()
            .map(|root| state.materialize(root))
            .collect::<Result<Vec<_>, _>>()?;
        let next_id = state.next_id;
        drop(state);
        Ok(MemoryBackend::with_roots(roots)?.with_next_id(next_id))
    }
}

#[async_trait]
impl BookmarkBackend for MemoryBackend {
    async fn get_subtree(&self, anchor: &NodeId) -> Result<NativeNode, BackendError> {
        self.subtree(anchor)
    }

    async fn create(&self, request: CreateRequest) -> Result<NativeNode, BackendError> {
        let mut state = self.state.write();
        state.journal.push(Mutation::Create {
            parent_id: request.parent_id.clone(),
            index: request.index,
            name: request.name.clone(),
            url: request.url.clone(),
        });
        state.check_injected(MutationKind::Create, &request.name)?;
        state.folder(&request.parent_id)?;
        if request.kind == NodeKind::Link && request.url.is_none() {
            return Err(BackendError::InvalidNode(format!(
                "link {:?} has no url",
                request.name
            )));
        }

        let id = state.allocate_id();
        let now = self.stamper.timestamp();
        let stored = StoredNode {
            id: id.clone(),
            kind: request.kind,
            name: request.name,
            url: match request.kind {
                NodeKind::Link => request.url,
                NodeKind::Folder => None,
            },
            created_at: Some(now.clone()),
            modified_at: match request.kind {
                NodeKind::Folder => Some(now),
                NodeKind::Link => None,
            },
            last_used_at: None,
            extra: self.stamper.fresh_extra(request.kind),
            parent: Some(request.parent_id.clone()),
            children: Vec::new(),
        };
        state.nodes.insert(id.clone(), stored);
        if let Some(parent) = state.nodes.get_mut(&request.parent_id) {
            let at = request.index.min(parent.children.len());
            parent.children.insert(at, id.clone());
        }
        state.materialize(&id)
    }

    async fn update(&self, id: &NodeId, changes: NodeChanges) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.journal.push(Mutation::Update {
            id: id.clone(),
            name: changes.name.clone(),
            url: changes.url.clone(),
        });
        state.check_injected(MutationKind::Update, id.as_str())?;
        let node = state
            .nodes
            .get_mut(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?;
        if let Some(name) = changes.name {
            node.name = name;
        }
        if let Some(url) = changes.url {
            if node.kind == NodeKind::Link {
                node.url = Some(url);
            }
        }
        Ok(())
    }

    async fn move_node(
        &self,
        id: &NodeId,
        destination: MoveDestination,
    ) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.journal.push(Mutation::Move {
            id: id.clone(),
            parent_id: destination.parent_id.clone(),
            index: destination.index,
        });
        state.check_injected(MutationKind::Move, id.as_str())?;
        let current_parent = state
            .nodes
            .get(id)
            .ok_or_else(|| BackendError::NotFound(id.clone()))?
            .parent
            .clone();
        if current_parent.is_none() {
            return Err(BackendError::InvalidMove {
                id: id.clone(),
                reason: "root nodes cannot be moved".to_string(),
            });
        }
        state.folder(&destination.parent_id)?;
        if state.is_ancestor_or_self(id, &destination.parent_id) {
            return Err(BackendError::InvalidMove {
                id: id.clone(),
                reason: format!("{} is inside the moved subtree", destination.parent_id),
            });
        }

        state.detach(id);
        if let Some(parent) = state.nodes.get_mut(&destination.parent_id) {
            let at = destination.index.min(parent.children.len());
            parent.children.insert(at, id.clone());
        }
        if let Some(node) = state.nodes.get_mut(id) {
            node.parent = Some(destination.parent_id);
        }
        Ok(())
    }

    async fn delete_subtree(&self, id: &NodeId) -> Result<(), BackendError> {
        let mut state = self.state.write();
        state.journal.push(Mutation::Delete { id: id.clone() });
        state.check_injected(MutationKind::Delete, id.as_str())?;
        if !state.nodes.contains_key(id) {
            return Err(BackendError::NotFound(id.clone()));
        }
        if state.roots.contains(id) {
            return Err(BackendError::Rejected(format!(
                "root node {} cannot be deleted",
                id
            )));
        }
        state.detach(id);
        state.remove_subtree(id);
        Ok(())
    }
}
