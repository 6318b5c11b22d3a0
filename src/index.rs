//! Match Index
//!
//! Lookup index over the native subtree under an anchor. Native nodes are
//! grouped by [`MatchKey`]; nodes sharing a key queue up in pre-order encounter
//! order and are handed out first-in first-out. The index owns the set of ids
//! consumed during a run, so whatever is left unconsumed after the desired tree
//! has been walked is an orphan.

use crate::tree::{MatchKey, NativeNode};
use crate::types::{NodeId, NodeKind};
use std::collections::{HashMap, HashSet, VecDeque};

/// A native node as recorded by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexedNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub name: String,
    pub url: Option<String>,
    /// Parent at index time; the anchor for top-level nodes.
    pub parent_id: NodeId,
    /// Pre-order position in the indexed subtree.
    pub order: usize,
}

/// Match index: MatchKey -> queue of candidates, plus the consumed-id set.
#[derive(Debug, Default)]
pub struct MatchIndex {
    queues: HashMap<MatchKey, VecDeque<IndexedNode>>,
    consumed: HashSet<NodeId>,
    node_count: usize,
}

impl MatchIndex {
    /// Create an empty index
    pub fn new() -> Self {
        MatchIndex::default()
    }

    /// Index every descendant of `anchor`. The anchor itself is not a candidate.
    pub fn build(anchor: &NativeNode) -> Self {
        let mut index = MatchIndex::new();
        for child in &anchor.children {
            index.add_subtree(child, &anchor.id);
        }
        index
    }

    fn add_subtree(&mut self, node: &NativeNode, parent_id: &NodeId) {
        self.add_node(node, parent_id);
        for child in &node.children {
            self.add_subtree(child, &node.id);
        }
    }

    /// Append a single node to the back of its key's queue.
    pub fn add_node(&mut self, node: &NativeNode, parent_id: &NodeId) {
        let entry = IndexedNode {
            id: node.id.clone(),
            kind: node.kind,
            name: node.name.clone(),
            url: node.url.clone(),
            parent_id: parent_id.clone(),
            order: self.node_count,
        };
        self.queues
            .entry(node.match_key())
            .or_default()
            .push_back(entry);
        self.node_count += 1;
    }

    /// Dequeue the head candidate for `key` and mark it consumed.
    ///
    /// Consumption is irrevocable for the lifetime of the index.
    pub fn take(&mut self, key: &MatchKey) -> Option<IndexedNode> {
        let queue = self.queues.get_mut(key)?;
        while let Some(candidate) = queue.pop_front() {
            if self.consumed.insert(candidate.id.clone()) {
                return Some(candidate);
            }
        }
        None
    }

    /// Number of candidates still queued for `key`.
    pub fn pending(&self, key: &MatchKey) -> usize {
        self.queues.get(key).map(|q| q.len()).unwrap_or(0)
    }

    pub fn is_consumed(&self, id: &NodeId) -> bool {
        self.consumed.contains(id)
    }

    /// Total number of nodes indexed at build time.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn consumed_count(&self) -> usize {
        self.consumed.len()
    }

    /// Number of distinct keys in the index
    pub fn key_count(&self) -> usize {
        self.queues.len()
    }

    /// Drain every never-consumed candidate, ancestors before descendants.
    pub fn take_orphans(&mut self) -> Vec<IndexedNode> {
        let consumed = &self.consumed;
        let mut orphans: Vec<IndexedNode> = self
            .queues
            .drain()
            .flat_map(|(_, queue)| queue.into_iter())
            .filter(|candidate| !consumed.contains(&candidate.id))
            .collect();
        orphans.sort_by_key(|candidate| candidate.order);
        orphans
    }
}
