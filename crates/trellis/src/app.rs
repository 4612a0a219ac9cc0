//! Application context for CLI command execution.
//!
//! [`App`] locates the workspace, loads its configuration and wires the
//! JSONL-backed graph and session stores with the configured defaults.

use crate::config::{TRELLIS_DIR_NAME, TrellisConfig, find_workspace_root, load_workspace_config};
use crate::error::{Error, Result};
use crate::graph::GraphStore;
use crate::session::{JsonlSessionStore, SessionWorkflow};
use crate::storage::JsonlGraphBackend;
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
pub struct App {
    graph: GraphStore,
    sessions: JsonlSessionStore,
    root_dir: PathBuf,
    config: TrellisConfig,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("root_dir", &self.root_dir)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an App from the given working directory.
    ///
    /// Searches up the directory tree for `.trellis/` and loads its
    /// configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No workspace is found in the directory tree
    /// - Configuration cannot be loaded
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_workspace_root(working_dir).ok_or_else(|| {
            Error::Config(format!(
                "Not a trellis workspace (no '{TRELLIS_DIR_NAME}' found). Run 'trellis init' first"
            ))
        })?;

        let config = load_workspace_config(&root_dir).await?;
        let graph = GraphStore::new(JsonlGraphBackend::new(config.graph_path(&root_dir)))
            .with_upcoming_window(config.defaults.upcoming_window_days);
        let sessions = JsonlSessionStore::new(config.sessions_path(&root_dir));

        tracing::debug!(root = %root_dir.display(), "Opened trellis workspace");

        Ok(Self {
            graph,
            sessions,
            root_dir,
            config,
        })
    }

    /// The graph store.
    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    /// A session workflow over this workspace's stores.
    pub fn workflow(&self) -> SessionWorkflow<'_> {
        SessionWorkflow::new(&self.graph, &self.sessions)
    }

    /// The loaded configuration.
    pub fn config(&self) -> &TrellisConfig {
        &self.config
    }

    /// Directory containing `.trellis/`.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }
}
