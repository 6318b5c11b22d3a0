//! Tree Reconciliation
//!
//! Brings the native subtree under an anchor in line with a desired tree while
//! keeping native ids wherever a [`MatchKey`](crate::tree::MatchKey) match exists.
//!
//! The desired tree is walked top-down, left to right. Each desired node takes
//! the head candidate for its key from the [`MatchIndex`]: a hit is moved into
//! place (and renamed/retargeted if needed), a miss is created. Once the whole
//! tree is placed, every candidate nobody took is deleted with its subtree.
//!
//! Every backend call is awaited before the next one is issued. Move and
//! create indexes are relative to the parent's current children, which shift
//! after each insertion, so sibling calls must never overlap.
//!
//! A failed call is logged with the node's name and recorded in the report;
//! the walk carries on with the remaining siblings. Nothing is rolled back.

use crate::backend::{
    BookmarkBackend, CreateRequest, MemoryBackend, MoveDestination, Mutation, MutationKind,
    NodeChanges,
};
use crate::error::{ApiError, BackendError};
use crate::index::{IndexedNode, MatchIndex};
use crate::tree::{DesiredNode, NativeNode};
use crate::types::NodeId;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// A backend call that failed for one node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeFailure {
    pub op: MutationKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    pub error: String,
}

/// Outcome of one reconciliation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Native nodes indexed under the anchor
    pub indexed: usize,
    /// Desired nodes that reused a native node
    pub matched: usize,
    pub created: usize,
    /// Successful move calls, no-op moves included
    pub moved: usize,
    pub updated: usize,
    /// Orphans removed by their own delete call
    pub deleted: usize,
    /// Orphans removed along with an orphaned ancestor
    pub deleted_with_ancestor: usize,
    /// Desired nodes never created because their folder could not be created
    pub skipped: usize,
    pub failures: Vec<NodeFailure>,
    pub duration_ms: u64,
}

impl ReconcileReport {
    /// True when the run created, updated and deleted nothing.
    pub fn is_structural_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.deleted == 0 && self.deleted_with_ancestor == 0
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }
}

/// State owned by a single run: the match index and the report being built.
pub struct ReconcileSession {
    index: MatchIndex,
    report: ReconcileReport,
}

impl ReconcileSession {
    /// Index the native subtree under `anchor`.
    pub fn new(anchor: &NativeNode) -> Self {
        let index = MatchIndex::build(anchor);
        let report = ReconcileReport {
            indexed: index.node_count(),
            ..ReconcileReport::default()
        };
        ReconcileSession { index, report }
    }

    pub fn into_report(self) -> ReconcileReport {
        self.report
    }

    fn record_failure(
        &mut self,
        op: MutationKind,
        name: &str,
        id: Option<&NodeId>,
        error: &BackendError,
    ) {
        self.report.failures.push(NodeFailure {
            op,
            name: name.to_string(),
            id: id.cloned(),
            error: error.to_string(),
        });
    }
}

/// Drives backend mutations for one anchor.
pub struct Reconciler<'a, B: BookmarkBackend + ?Sized> {
    backend: &'a B,
}

impl<'a, B: BookmarkBackend + ?Sized> Reconciler<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Reconciler { backend }
    }

    /// Reconcile the anchor's children against `desired`.
    ///
    /// Fails only if the anchor cannot be read; in that case no mutation has
    /// been issued.
    pub async fn run(
        &self,
        anchor_id: &NodeId,
        desired: &[DesiredNode],
    ) -> Result<ReconcileReport, ApiError> {
        let started = Instant::now();
        let anchor = self.backend.get_subtree(anchor_id).await?;
        if !anchor.is_folder() {
            return Err(BackendError::NotAFolder(anchor.id).into());
        }

        let mut session = ReconcileSession::new(&anchor);
        info!(
            anchor = %anchor_id,
            indexed = session.index.node_count(),
            keys = session.index.key_count(),
            "Reconciling bookmark tree"
        );

        self.reconcile(&mut session, desired, anchor_id).await;
        self.sweep_orphans(&mut session).await;

        let mut report = session.into_report();
        report.duration_ms = started.elapsed().as_millis() as u64;
        info!(
            matched = report.matched,
            created = report.created,
            updated = report.updated,
            deleted = report.deleted,
            failures = report.failures.len(),
            duration_ms = report.duration_ms,
            "Reconciliation finished"
        );
        Ok(report)
    }

    /// Place `desired` under `parent_id` in order, recursing into folders.
    pub fn reconcile<'s>(
        &'s self,
        session: &'s mut ReconcileSession,
        desired: &'s [DesiredNode],
        parent_id: &'s NodeId,
    ) -> BoxFuture<'s, ()> {
        async move {
            let mut index_in_parent = 0usize;
            for node in desired {
                let is_link = node.is_link();
                let key = node.match_key();

                let node_id = match session.index.take(&key) {
                    Some(existing) => {
                        self.reuse(session, &existing, node, is_link, parent_id, index_in_parent)
                            .await;
                        existing.id
                    }
                    None => match self.create(session, node, is_link, parent_id, index_in_parent).await {
                        Some(id) => id,
                        // No folder to hold the children; the slot stays free for the next sibling.
                        None => continue,
                    },
                };

                if !is_link && !node.children.is_empty() {
                    self.reconcile(session, &node.children, &node_id).await;
                }
                index_in_parent += 1;
            }
        }
        .boxed()
    }

    async fn reuse(
        &self,
        session: &mut ReconcileSession,
        existing: &IndexedNode,
        node: &DesiredNode,
        is_link: bool,
        parent_id: &NodeId,
        index: usize,
    ) {
        session.report.matched += 1;

        let destination = MoveDestination {
            parent_id: parent_id.clone(),
            index,
        };
        match self.backend.move_node(&existing.id, destination).await {
            Ok(()) => {
                session.report.moved += 1;
                debug!(id = %existing.id, name = %node.name, parent = %parent_id, index, "Moved node");
            }
            Err(e) => {
                warn!(id = %existing.id, name = %node.name, error = %e, "Failed to move node");
                session.record_failure(MutationKind::Move, &node.name, Some(&existing.id), &e);
            }
        }

        let url_differs = is_link && existing.url != node.url;
        if existing.name != node.name || url_differs {
            let changes = NodeChanges {
                name: Some(node.name.clone()),
                url: if is_link { node.url.clone() } else { None },
            };
            match self.backend.update(&existing.id, changes).await {
                Ok(()) => {
                    session.report.updated += 1;
                    debug!(id = %existing.id, name = %node.name, "Updated node");
                }
                Err(e) => {
                    warn!(id = %existing.id, name = %node.name, error = %e, "Failed to update node");
                    session.record_failure(MutationKind::Update, &node.name, Some(&existing.id), &e);
                }
            }
        }
    }

    async fn create(
        &self,
        session: &mut ReconcileSession,
        node: &DesiredNode,
        is_link: bool,
        parent_id: &NodeId,
        index: usize,
    ) -> Option<NodeId> {
        let request = CreateRequest {
            parent_id: parent_id.clone(),
            index,
            name: node.name.clone(),
            url: if is_link { node.url.clone() } else { None },
            kind: node.effective_kind(),
        };
        match self.backend.create(request).await {
            Ok(created) => {
                session.report.created += 1;
                debug!(id = %created.id, name = %node.name, parent = %parent_id, index, "Created node");
                Some(created.id)
            }
            Err(e) => {
                warn!(name = %node.name, parent = %parent_id, error = %e, "Failed to create node");
                session.record_failure(MutationKind::Create, &node.name, None, &e);
                session.report.skipped += count_desired(&node.children);
                None
            }
        }
    }

    /// Delete every candidate left unconsumed in the index.
    ///
    /// Orphans are visited ancestors first. An orphan whose indexed parent is
    /// already gone was removed with it, so it gets no call of its own.
    pub async fn sweep_orphans(&self, session: &mut ReconcileSession) {
        let orphans = session.index.take_orphans();
        let mut removed: HashSet<NodeId> = HashSet::new();

        for orphan in orphans {
            if removed.contains(&orphan.parent_id) {
                session.report.deleted_with_ancestor += 1;
                removed.insert(orphan.id);
                continue;
            }
            info!(id = %orphan.id, name = %orphan.name, "Removing orphan");
            match self.backend.delete_subtree(&orphan.id).await {
                Ok(()) => {
                    session.report.deleted += 1;
                    removed.insert(orphan.id);
                }
                Err(BackendError::NotFound(_)) => {
                    debug!(id = %orphan.id, name = %orphan.name, "Orphan already gone");
                    removed.insert(orphan.id);
                }
                Err(e) => {
                    warn!(id = %orphan.id, name = %orphan.name, error = %e, "Failed to remove orphan");
                    session.record_failure(MutationKind::Delete, &orphan.name, Some(&orphan.id), &e);
                }
            }
        }
    }
}

fn count_desired(nodes: &[DesiredNode]) -> usize {
    nodes.iter().map(|n| 1 + count_desired(&n.children)).sum()
}

/// Reconcile against a copy of `source`, leaving `source` untouched.
///
/// Returns the report and every mutation call the run would make.
pub async fn dry_run(
    source: &MemoryBackend,
    anchor_id: &NodeId,
    desired: &[DesiredNode],
) -> Result<(ReconcileReport, Vec<Mutation>), ApiError> {
    let scratch = source.fork()?;
    let report = Reconciler::new(&scratch).run(anchor_id, desired).await?;
    Ok((report, scratch.journal()))
}
