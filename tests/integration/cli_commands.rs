use super::support::BOOKMARKS_JSON;
use marksync::config::MarksyncConfig;
use marksync::snapshot::{self, SnapshotFormat};
use marksync::tooling::{CliContext, Commands};
use marksync::{ApiError, SnapshotError};
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const EDITED: &str = r#"name: Bookmarks bar
type: folder
children:
  - name: Work
    type: folder
    children:
      - name: Docs
        type: url
        url: https://docs.example.com/
      - name: Mail
        url: https://mail.example.com/
"#;

struct Fixture {
    _dir: TempDir,
    workspace: PathBuf,
    bookmarks: PathBuf,
    context: CliContext,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("workspace");
    let profile = dir.path().join("profile");
    fs::create_dir_all(&workspace).unwrap();
    fs::create_dir_all(&profile).unwrap();
    let bookmarks = profile.join("Bookmarks");
    fs::write(&bookmarks, BOOKMARKS_JSON).unwrap();

    let mut config = MarksyncConfig::default();
    config.bookmarks.path = Some(bookmarks.clone());
    let context = CliContext::with_config(workspace.clone(), config);
    Fixture {
        _dir: dir,
        workspace,
        bookmarks,
        context,
    }
}

fn import(yes: bool, no_backup: bool, format: &str) -> Commands {
    Commands::Import {
        input: None,
        snapshot_format: None,
        yes,
        no_backup,
        format: format.to_string(),
    }
}

#[tokio::test]
async fn export_writes_the_managed_root() {
    let fx = fixture();
    let out = fx
        .context
        .execute(&Commands::Export {
            out: None,
            snapshot_format: None,
            stdout: false,
        })
        .await
        .unwrap();
    assert!(out.contains("Exported 3 bookmarks"));

    let text = fs::read_to_string(fx.workspace.join("bookmarks.yaml")).unwrap();
    let parsed = snapshot::parse(&text, SnapshotFormat::Yaml).unwrap();
    assert_eq!(parsed.name, "Bookmarks bar");
    assert_eq!(parsed.node_count(), 3);
    assert_eq!(parsed.children[0].name, "Work");
    assert!(!text.contains("13300000000000001"));
    assert!(!text.contains("guid"));
}

#[tokio::test]
async fn export_to_stdout_as_json() {
    let fx = fixture();
    let out = fx
        .context
        .execute(&Commands::Export {
            out: Some(PathBuf::from("snapshot.json")),
            snapshot_format: None,
            stdout: true,
        })
        .await
        .unwrap();
    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["children"][0]["children"][1]["name"], "Tracker");
    assert!(!fx.workspace.join("snapshot.json").exists());
}

#[tokio::test]
async fn plan_reports_changes_without_writing() {
    let fx = fixture();
    fs::write(fx.workspace.join("bookmarks.yaml"), EDITED).unwrap();

    let out = fx
        .context
        .execute(&Commands::Plan {
            input: None,
            snapshot_format: None,
            moves: false,
            format: "json".to_string(),
        })
        .await
        .unwrap();

    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["report"]["created"], 1);
    assert_eq!(value["report"]["deleted"], 1);
    let ops: Vec<&str> = value["mutations"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|m| m["op"].as_str())
        .filter(|op| *op != "move")
        .collect();
    assert_eq!(ops, vec!["create", "delete"]);
    assert_eq!(fs::read_to_string(&fx.bookmarks).unwrap(), BOOKMARKS_JSON);
}

#[tokio::test]
async fn import_applies_snapshot_and_backs_up() {
    let fx = fixture();
    fs::write(fx.workspace.join("bookmarks.yaml"), EDITED).unwrap();

    let out = fx.context.execute(&import(true, false, "json")).await.unwrap();

    let value: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(value["report"]["matched"], 2);
    assert_eq!(value["report"]["created"], 1);
    assert_eq!(value["report"]["deleted"], 1);

    let backup = fx.bookmarks.with_file_name("Bookmarks.bak");
    assert_eq!(fs::read_to_string(&backup).unwrap(), BOOKMARKS_JSON);

    let written: Value = serde_json::from_str(&fs::read_to_string(&fx.bookmarks).unwrap()).unwrap();
    let work = &written["roots"]["bookmark_bar"]["children"][0];
    assert_eq!(work["id"], "2");
    let names: Vec<&str> = work["children"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|c| c["name"].as_str())
        .collect();
    assert_eq!(names, vec!["Docs", "Mail"]);
    assert_eq!(work["children"][0]["id"], "3");
    assert_eq!(work["children"][1]["id"], "11");
}

#[tokio::test]
async fn import_then_export_round_trips() {
    let fx = fixture();
    fs::write(fx.workspace.join("bookmarks.yaml"), EDITED).unwrap();
    fx.context.execute(&import(true, true, "text")).await.unwrap();
    assert!(!fx.bookmarks.with_file_name("Bookmarks.bak").exists());

    fx.context
        .execute(&Commands::Export {
            out: Some(PathBuf::from("again.yaml")),
            snapshot_format: None,
            stdout: false,
        })
        .await
        .unwrap();

    let exported = snapshot::parse(
        &fs::read_to_string(fx.workspace.join("again.yaml")).unwrap(),
        SnapshotFormat::Yaml,
    )
    .unwrap();
    let edited = snapshot::parse(EDITED, SnapshotFormat::Yaml).unwrap();
    assert_eq!(exported.node_count(), edited.node_count());
    assert_eq!(exported.children[0].children[1].name, "Mail");
    assert_eq!(
        exported.children[0].children[1].url.as_deref(),
        Some("https://mail.example.com/")
    );
}

#[tokio::test]
async fn snapshot_without_children_is_rejected_before_writing() {
    let fx = fixture();
    fs::write(fx.workspace.join("bookmarks.yaml"), "name: Bookmarks bar\ntype: folder\n").unwrap();

    let result = fx.context.execute(&import(true, false, "text")).await;

    assert!(matches!(
        result,
        Err(ApiError::SnapshotError(SnapshotError::MissingChildren))
    ));
    assert_eq!(fs::read_to_string(&fx.bookmarks).unwrap(), BOOKMARKS_JSON);
    assert!(!fx.bookmarks.with_file_name("Bookmarks.bak").exists());
}

#[tokio::test]
async fn missing_snapshot_is_a_config_error() {
    let fx = fixture();
    let result = fx.context.execute(&import(true, false, "text")).await;
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}

#[tokio::test]
async fn missing_bookmarks_file_is_a_config_error() {
    let fx = fixture();
    fs::remove_file(&fx.bookmarks).unwrap();
    let result = fx
        .context
        .execute(&Commands::Export {
            out: None,
            snapshot_format: None,
            stdout: true,
        })
        .await;
    assert!(matches!(result, Err(ApiError::ConfigError(_))));
}
