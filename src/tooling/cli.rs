//! CLI Tooling
//!
//! Command-line interface: export the managed bookmark root to a snapshot,
//! preview an edited snapshot, and import it back into the Chrome profile.

use crate::backend::{ChromeBookmarksFile, RootName};
use crate::config::{ConfigLoader, MarksyncConfig};
use crate::error::ApiError;
use crate::logging::{LogFormat, LogOutput, LoggingConfig};
use crate::reconcile::{dry_run, Reconciler};
use crate::snapshot::{self, Snapshot, SnapshotFormat};
use crate::tooling::format::{format_plan_text, format_report_text};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;

/// Marksync CLI - edit bookmarks as YAML, reconcile them back
#[derive(Parser)]
#[command(name = "marksync")]
#[command(about = "Edit browser bookmarks as a YAML snapshot and reconcile the edits back")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace directory (snapshot and marksync.toml live here)
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Chrome `Bookmarks` file (default: the platform's default profile)
    #[arg(long)]
    pub bookmarks: Option<PathBuf>,

    /// Bookmark root to manage
    #[arg(long, value_enum)]
    pub root: Option<RootName>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<LogFormat>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<LogOutput>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Logging config with CLI flags applied over `base`.
    pub fn logging_config(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut config = base.clone();
        if let Some(level) = &self.log_level {
            config.level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.format = format;
        }
        if let Some(output) = self.log_output {
            config.output = output;
        }
        if let Some(file) = &self.log_file {
            config.file = Some(file.clone());
        }
        config
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export the managed bookmark root to a snapshot file
    Export {
        /// Snapshot file to write (default: snapshot.path from config)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Snapshot format (default: from the file extension)
        #[arg(long, value_enum)]
        snapshot_format: Option<SnapshotFormat>,
        /// Print the snapshot instead of writing a file
        #[arg(long)]
        stdout: bool,
    },
    /// Apply an edited snapshot to the bookmarks file
    Import {
        /// Snapshot file to read (default: snapshot.path from config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Snapshot format (default: from the file extension)
        #[arg(long, value_enum)]
        snapshot_format: Option<SnapshotFormat>,
        /// Skip the confirmation that Chrome is closed
        #[arg(long)]
        yes: bool,
        /// Do not copy the bookmarks file aside before writing
        #[arg(long)]
        no_backup: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show what an import would change, without writing anything
    Plan {
        /// Snapshot file to read (default: snapshot.path from config)
        #[arg(long)]
        input: Option<PathBuf>,
        /// Snapshot format (default: from the file extension)
        #[arg(long, value_enum)]
        snapshot_format: Option<SnapshotFormat>,
        /// List move calls too (every kept node gets one)
        #[arg(long)]
        moves: bool,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Export { .. } => "export",
        Commands::Import { .. } => "import",
        Commands::Plan { .. } => "plan",
    }
}

/// CLI context: resolved configuration for one invocation
pub struct CliContext {
    workspace_root: PathBuf,
    config: MarksyncConfig,
}

impl CliContext {
    /// Create a new CLI context, loading configuration for `workspace_root`.
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, ApiError> {
        let config = ConfigLoader::resolve(&workspace_root, config_path.as_deref())?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: MarksyncConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    /// Apply `--bookmarks` / `--root` overrides.
    pub fn with_overrides(mut self, bookmarks: Option<PathBuf>, root: Option<RootName>) -> Self {
        if let Some(path) = bookmarks {
            self.config.bookmarks.path = Some(path);
        }
        if let Some(root) = root {
            self.config.bookmarks.root = root;
        }
        self
    }

    pub fn config(&self) -> &MarksyncConfig {
        &self.config
    }

    /// Execute a CLI command, returning the text to print.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        info!(command = command_name(command), "Executing command");
        match command {
            Commands::Export {
                out,
                snapshot_format,
                stdout,
            } => self.handle_export(out.as_deref(), *snapshot_format, *stdout),
            Commands::Import {
                input,
                snapshot_format,
                yes,
                no_backup,
                format,
            } => {
                self.handle_import(input.as_deref(), *snapshot_format, *yes, *no_backup, format)
                    .await
            }
            Commands::Plan {
                input,
                snapshot_format,
                moves,
                format,
            } => {
                self.handle_plan(input.as_deref(), *snapshot_format, *moves, format)
                    .await
            }
        }
    }

    fn snapshot_path(&self, explicit: Option<&Path>) -> PathBuf {
        let path = explicit.unwrap_or(self.config.snapshot.path.as_path());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        }
    }

    fn open_bookmarks(&self) -> Result<ChromeBookmarksFile, ApiError> {
        let path = self.config.bookmarks.resolve_path()?;
        if !path.exists() {
            return Err(ApiError::ConfigError(format!(
                "Bookmarks file not found at: {}",
                path.display()
            )));
        }
        Ok(ChromeBookmarksFile::open(&path, self.config.bookmarks.root)?)
    }

    fn read_snapshot(
        &self,
        input: Option<&Path>,
        format: Option<SnapshotFormat>,
    ) -> Result<Snapshot, ApiError> {
        let path = self.snapshot_path(input);
        let text = std::fs::read_to_string(&path).map_err(|e| {
            ApiError::ConfigError(format!(
                "Failed to read snapshot {} (run `marksync export` first?): {}",
                path.display(),
                e
            ))
        })?;
        let format = format.unwrap_or_else(|| SnapshotFormat::from_path(&path));
        let snapshot = snapshot::parse(&text, format)?;
        info!(
            path = %path.display(),
            nodes = snapshot.node_count(),
            "Parsed snapshot"
        );
        Ok(snapshot)
    }

    fn handle_export(
        &self,
        out: Option<&Path>,
        format: Option<SnapshotFormat>,
        to_stdout: bool,
    ) -> Result<String, ApiError> {
        let file = self.open_bookmarks()?;
        let anchor = file.anchor()?;
        let path = self.snapshot_path(out);
        let format = format.unwrap_or_else(|| SnapshotFormat::from_path(&path));
        let text = snapshot::render(&snapshot::export(&anchor), format)?;
        if to_stdout {
            return Ok(text);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&path, text)?;
        info!(path = %path.display(), nodes = anchor.descendant_count(), "Exported snapshot");
        Ok(format!(
            "Exported {} bookmarks from {} to {}\nEdit the file, then run `marksync import` to apply the changes.",
            anchor.descendant_count(),
            file.root(),
            path.display()
        ))
    }

    async fn handle_import(
        &self,
        input: Option<&Path>,
        snapshot_format: Option<SnapshotFormat>,
        yes: bool,
        no_backup: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        // Input and read errors surface before anything is written.
        let snapshot = self.read_snapshot(input, snapshot_format)?;
        let file = self.open_bookmarks()?;

        if !yes && !confirm_chrome_closed()? {
            return Err(ApiError::Aborted("import cancelled".to_string()));
        }

        let report = Reconciler::new(&file)
            .run(file.anchor_id(), &snapshot.children)
            .await?;
        let backup = if no_backup {
            None
        } else {
            self.config.bookmarks.resolve_backup_path(file.path())
        };
        file.save(backup.as_deref())?;

        if format == "json" {
            let out = json!({
                "bookmarks": file.path(),
                "backup": backup,
                "report": report,
            });
            return serde_json::to_string_pretty(&out)
                .map_err(|e| ApiError::ConfigError(format!("Failed to serialize report: {}", e)));
        }
        let mut text = format_report_text(&report);
        if let Some(backup) = backup {
            text.push_str(&format!("Backup: {}\n", backup.display()));
        }
        Ok(text)
    }

    async fn handle_plan(
        &self,
        input: Option<&Path>,
        snapshot_format: Option<SnapshotFormat>,
        include_moves: bool,
        format: &str,
    ) -> Result<String, ApiError> {
        let snapshot = self.read_snapshot(input, snapshot_format)?;
        let file = self.open_bookmarks()?;
        let (report, journal) =
            dry_run(file.backend(), file.anchor_id(), &snapshot.children).await?;

        if format == "json" {
            let out = json!({
                "report": report,
                "mutations": journal,
            });
            return serde_json::to_string_pretty(&out)
                .map_err(|e| ApiError::ConfigError(format!("Failed to serialize plan: {}", e)));
        }
        Ok(format_plan_text(&journal, &report, include_moves))
    }
}

fn confirm_chrome_closed() -> Result<bool, ApiError> {
    dialoguer::Confirm::new()
        .with_prompt(
            "Chrome must be completely closed, or it may overwrite these changes. Continue?",
        )
        .default(false)
        .interact()
        .map_err(|e| ApiError::ConfigError(format!("Failed to get user input: {}", e)))
}
