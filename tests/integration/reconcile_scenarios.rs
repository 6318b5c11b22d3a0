use super::support::{child_names, created_names, deleted_ids, shape};
use marksync::backend::{Mutation, MutationKind};
use marksync::{DesiredNode, MemoryBackend, NativeNode, NodeId, NodeKind, Reconciler};
use serde_json::{Map, Value};

fn anchor_id() -> NodeId {
    NodeId::from("1")
}

async fn reconcile(backend: &MemoryBackend, desired: &[DesiredNode]) -> marksync::ReconcileReport {
    Reconciler::new(backend)
        .run(&anchor_id(), desired)
        .await
        .expect("anchor is readable")
}

fn current(backend: &MemoryBackend) -> NativeNode {
    backend.subtree(&anchor_id()).expect("anchor exists")
}

fn work_tree() -> NativeNode {
    NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![NativeNode::folder(
            "2",
            "Work",
            vec![NativeNode::link("3", "Docs", "http://d")],
        )],
    )
}

#[tokio::test]
async fn appending_a_link_keeps_existing_ids() {
    let backend = MemoryBackend::new(work_tree()).unwrap();
    let desired = vec![DesiredNode::folder(
        "Work",
        vec![
            DesiredNode::link("Docs", "http://d"),
            DesiredNode::link("Mail", "http://m"),
        ],
    )];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(shape(&root), desired);
    assert_eq!(root.children[0].id, NodeId::from("2"));
    assert_eq!(root.children[0].children[0].id, NodeId::from("3"));
    assert_eq!(created_names(&backend.journal()), vec!["Mail"]);
    assert!(deleted_ids(&backend.journal()).is_empty());
    assert_eq!(report.matched, 2);
    assert_eq!(report.created, 1);
}

#[tokio::test]
async fn deleting_a_folder_issues_a_single_call() {
    let backend = MemoryBackend::new(work_tree()).unwrap();

    let report = reconcile(&backend, &[]).await;

    let journal = backend.journal();
    assert_eq!(journal, vec![Mutation::Delete { id: NodeId::from("2") }]);
    assert!(current(&backend).children.is_empty());
    assert_eq!(report.deleted, 1);
    assert_eq!(report.deleted_with_ancestor, 1);
}

#[tokio::test]
async fn reordering_siblings_only_moves() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![
            NativeNode::link("2", "A", "http://a"),
            NativeNode::link("3", "B", "http://b"),
            NativeNode::link("4", "C", "http://c"),
        ],
    ))
    .unwrap();
    let desired = vec![
        DesiredNode::link("C", "http://c"),
        DesiredNode::link("A", "http://a"),
        DesiredNode::link("B", "http://b"),
    ];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    let ids: Vec<&str> = root.children.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "2", "3"]);
    assert!(report.is_structural_noop());
    assert!(backend
        .journal()
        .iter()
        .all(|m| m.kind() == MutationKind::Move));
}

#[tokio::test]
async fn link_moved_between_folders_keeps_its_id() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![
            NativeNode::folder("2", "Work", vec![NativeNode::link("3", "Docs", "http://d")]),
            NativeNode::folder("4", "Home", vec![]),
        ],
    ))
    .unwrap();
    let desired = vec![
        DesiredNode::folder("Work", vec![]),
        DesiredNode::folder("Home", vec![DesiredNode::link("Docs", "http://d")]),
    ];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(shape(&root), desired);
    assert_eq!(root.children[1].children[0].id, NodeId::from("3"));
    assert!(report.is_structural_noop());
}

#[tokio::test]
async fn swapping_nesting_moves_parent_under_child() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![NativeNode::folder(
            "2",
            "Outer",
            vec![NativeNode::folder(
                "3",
                "Inner",
                vec![NativeNode::link("4", "Leaf", "http://leaf")],
            )],
        )],
    ))
    .unwrap();
    let desired = vec![DesiredNode::folder(
        "Inner",
        vec![DesiredNode::folder(
            "Outer",
            vec![DesiredNode::link("Leaf", "http://leaf")],
        )],
    )];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(shape(&root), desired);
    assert_eq!(root.children[0].id, NodeId::from("3"));
    assert_eq!(root.children[0].children[0].id, NodeId::from("2"));
    assert_eq!(root.children[0].children[0].children[0].id, NodeId::from("4"));
    assert!(report.failures.is_empty());
    assert!(report.is_structural_noop());
}

#[tokio::test]
async fn duplicate_keys_are_taken_in_encounter_order() {
    // Pre-order encounter: Docs(2), Folder(3), Docs(4).
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![
            NativeNode::link("2", "Docs", "http://d"),
            NativeNode::folder("3", "Folder", vec![NativeNode::link("4", "Docs", "http://d")]),
        ],
    ))
    .unwrap();
    let desired = vec![
        DesiredNode::folder("Folder", vec![DesiredNode::link("Docs", "http://d")]),
        DesiredNode::link("Docs", "http://d"),
    ];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(shape(&root), desired);
    // The first desired Docs (inside Folder) takes the first encountered one.
    assert_eq!(root.children[0].children[0].id, NodeId::from("2"));
    assert_eq!(root.children[1].id, NodeId::from("4"));
    assert_eq!(report.matched, 3);
    assert!(report.is_structural_noop());
}

#[tokio::test]
async fn surplus_duplicates_are_deleted() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![
            NativeNode::link("2", "Docs", "http://d"),
            NativeNode::link("3", "Docs", "http://d"),
            NativeNode::link("4", "Docs", "http://d"),
        ],
    ))
    .unwrap();
    let desired = vec![DesiredNode::link("Docs", "http://d")];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].id, NodeId::from("2"));
    assert_eq!(
        deleted_ids(&backend.journal()),
        vec![NodeId::from("3"), NodeId::from("4")]
    );
    assert_eq!(report.deleted, 2);
}

#[tokio::test]
async fn renamed_link_is_recreated() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![NativeNode::link("2", "Docs", "http://d")],
    ))
    .unwrap();
    let desired = vec![DesiredNode::link("Documentation", "http://d")];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(shape(&root), desired);
    assert_ne!(root.children[0].id, NodeId::from("2"));
    assert!(!backend.contains(&NodeId::from("2")));
    assert_eq!(report.created, 1);
    assert_eq!(report.deleted, 1);
    assert_eq!(report.updated, 0);
}

#[tokio::test]
async fn nested_orphans_get_no_calls_of_their_own() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![
            NativeNode::folder(
                "2",
                "Work",
                vec![
                    NativeNode::link("3", "Docs", "http://d"),
                    NativeNode::folder(
                        "4",
                        "Old",
                        vec![
                            NativeNode::link("5", "x", "http://x"),
                            NativeNode::link("6", "y", "http://y"),
                        ],
                    ),
                ],
            ),
            NativeNode::folder("7", "Junk", vec![NativeNode::link("8", "z", "http://z")]),
        ],
    ))
    .unwrap();
    let desired = vec![DesiredNode::folder(
        "Work",
        vec![DesiredNode::link("Docs", "http://d")],
    )];

    let report = reconcile(&backend, &desired).await;

    assert_eq!(
        deleted_ids(&backend.journal()),
        vec![NodeId::from("4"), NodeId::from("7")]
    );
    assert_eq!(report.deleted, 2);
    assert_eq!(report.deleted_with_ancestor, 3);
    assert_eq!(backend.len(), 3);
    assert_eq!(shape(&current(&backend)), desired);
}

#[tokio::test]
async fn node_kept_out_of_a_deleted_folder_survives() {
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![NativeNode::folder(
            "2",
            "Work",
            vec![
                NativeNode::link("3", "Docs", "http://d"),
                NativeNode::link("4", "Stale", "http://s"),
            ],
        )],
    ))
    .unwrap();
    let desired = vec![DesiredNode::link("Docs", "http://d")];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(root.children.len(), 1);
    assert_eq!(root.children[0].id, NodeId::from("3"));
    assert_eq!(deleted_ids(&backend.journal()), vec![NodeId::from("2")]);
    assert_eq!(report.deleted_with_ancestor, 1);
}

#[tokio::test]
async fn empty_desired_folder_clears_its_native_children() {
    let backend = MemoryBackend::new(work_tree()).unwrap();
    let desired = vec![DesiredNode::folder("Work", vec![])];

    reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(root.children[0].id, NodeId::from("2"));
    assert!(root.children[0].children.is_empty());
    assert_eq!(deleted_ids(&backend.journal()), vec![NodeId::from("3")]);
}

#[tokio::test]
async fn link_without_declared_kind_matches_native_link() {
    let backend = MemoryBackend::new(work_tree()).unwrap();
    let desired = vec![DesiredNode {
        name: "Work".to_string(),
        kind: None,
        url: None,
        children: vec![DesiredNode {
            name: "Docs".to_string(),
            kind: None,
            url: Some("http://d".to_string()),
            children: Vec::new(),
        }],
    }];

    let report = reconcile(&backend, &desired).await;

    assert_eq!(report.matched, 2);
    assert!(report.is_structural_noop());
    let root = current(&backend);
    assert_eq!(root.children[0].kind, NodeKind::Folder);
    assert_eq!(root.children[0].children[0].id, NodeId::from("3"));
}

#[tokio::test]
async fn reused_nodes_keep_timestamps_and_metadata() {
    let mut docs = NativeNode::link("3", "Docs", "http://d");
    docs.created_at = Some("13300000000000000".to_string());
    docs.last_used_at = Some("13310000000000000".to_string());
    let mut extra = Map::new();
    extra.insert("guid".to_string(), Value::String("guid-3".to_string()));
    docs.extra = extra.clone();
    let backend = MemoryBackend::new(NativeNode::folder(
        "1",
        "Bookmarks bar",
        vec![NativeNode::folder("2", "Work", vec![docs]), NativeNode::folder("4", "Home", vec![])],
    ))
    .unwrap();
    let desired = vec![DesiredNode::folder(
        "Home",
        vec![DesiredNode::link("Docs", "http://d")],
    )];

    reconcile(&backend, &desired).await;

    let root = current(&backend);
    let moved = &root.children[0].children[0];
    assert_eq!(moved.id, NodeId::from("3"));
    assert_eq!(moved.created_at.as_deref(), Some("13300000000000000"));
    assert_eq!(moved.last_used_at.as_deref(), Some("13310000000000000"));
    assert_eq!(moved.extra, extra);
}

#[tokio::test]
async fn second_run_is_a_structural_noop() {
    let backend = MemoryBackend::new(work_tree()).unwrap();
    let desired = vec![
        DesiredNode::link("Mail", "http://m"),
        DesiredNode::folder(
            "Reading",
            vec![DesiredNode::folder("Later", vec![DesiredNode::link("Paper", "http://p")])],
        ),
        DesiredNode::folder("Work", vec![DesiredNode::link("Docs", "http://d")]),
    ];

    reconcile(&backend, &desired).await;
    let after_first = current(&backend);
    backend.clear_journal();

    let report = reconcile(&backend, &desired).await;

    assert!(report.is_structural_noop());
    assert_eq!(report.matched, 6);
    assert!(backend
        .journal()
        .iter()
        .all(|m| m.kind() == MutationKind::Move));
    assert_eq!(current(&backend), after_first);
    assert_eq!(child_names(&after_first), vec!["Mail", "Reading", "Work"]);
}

#[tokio::test]
async fn failed_folder_create_leaves_following_siblings_in_order() {
    let backend = MemoryBackend::new(work_tree()).unwrap();
    backend.inject_failure(MutationKind::Create, "News");
    let desired = vec![
        DesiredNode::link("Mail", "http://m"),
        DesiredNode::folder("News", vec![DesiredNode::link("Paper", "http://p")]),
        DesiredNode::folder("Work", vec![DesiredNode::link("Docs", "http://d")]),
    ];

    let report = reconcile(&backend, &desired).await;

    let root = current(&backend);
    assert_eq!(child_names(&root), vec!["Mail", "Work"]);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.failure_count(), 1);
    assert!(!created_names(&backend.journal()).contains(&"Paper".to_string()));
}
