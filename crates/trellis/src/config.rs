//! Workspace configuration.
//!
//! A trellis workspace is a directory containing `.trellis/` with a YAML
//! configuration file, the graph file and the sessions file. Paths in the
//! configuration are relative to the workspace root.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the trellis directory
pub const TRELLIS_DIR_NAME: &str = ".trellis";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the graph data file
pub const GRAPH_FILE_NAME: &str = "graph.jsonl";

/// Name of the sessions data file
pub const SESSIONS_FILE_NAME: &str = "sessions.jsonl";

/// Name of the gitignore file within .trellis
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the workspace root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Largest accepted look-ahead for upcoming due dates, in days
pub const MAX_UPCOMING_WINDOW_DAYS: i64 = 3650;

/// Configuration file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrellisConfig {
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Defaults for analytics parameters
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

/// Storage configuration section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Path to the graph file, relative to the workspace root
    pub graph_file: String,

    /// Path to the sessions file, relative to the workspace root
    pub sessions_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            graph_file: format!("{TRELLIS_DIR_NAME}/{GRAPH_FILE_NAME}"),
            sessions_file: format!("{TRELLIS_DIR_NAME}/{SESSIONS_FILE_NAME}"),
        }
    }
}

/// Analytics defaults section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Depth bound for dependency resolution
    pub dependency_depth: usize,

    /// Depth bound for related-project exploration
    pub related_depth: usize,

    /// Look-ahead, in days, for upcoming due dates
    pub upcoming_window_days: i64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            dependency_depth: crate::graph::dependencies::DEFAULT_DEPENDENCY_DEPTH,
            related_depth: crate::analytics::related::DEFAULT_RELATED_DEPTH,
            upcoming_window_days: crate::graph::DEFAULT_UPCOMING_WINDOW_DAYS,
        }
    }
}

impl TrellisConfig {
    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        let config: Self =
            serde_yaml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// Reject values that would make analytics meaningless.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` describing the first invalid value.
    pub fn validate(&self) -> Result<()> {
        if self.storage.graph_file.trim().is_empty() {
            return Err(Error::Config("storage.graph_file must not be empty".to_string()));
        }
        if self.storage.sessions_file.trim().is_empty() {
            return Err(Error::Config("storage.sessions_file must not be empty".to_string()));
        }
        if !(0..=MAX_UPCOMING_WINDOW_DAYS).contains(&self.defaults.upcoming_window_days) {
            return Err(Error::Config(format!(
                "defaults.upcoming_window_days must be between 0 and {MAX_UPCOMING_WINDOW_DAYS}"
            )));
        }
        Ok(())
    }

    /// Absolute path of the graph file for a workspace rooted at `root`.
    #[must_use]
    pub fn graph_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.graph_file)
    }

    /// Absolute path of the sessions file for a workspace rooted at `root`.
    #[must_use]
    pub fn sessions_path(&self, root: &Path) -> PathBuf {
        root.join(&self.storage.sessions_file)
    }
}

/// Result of [`init_workspace`]
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created trellis directory
    pub trellis_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created graph file
    pub graph_file: PathBuf,
    /// Path to the created sessions file
    pub sessions_file: PathBuf,
    /// Path to the created gitignore file
    pub gitignore_file: PathBuf,
}

/// Initialize a new trellis workspace in `base_dir`.
///
/// # Errors
///
/// Returns an error if:
/// - The `.trellis/` directory already exists
/// - File system operations fail
pub async fn init_workspace(base_dir: &Path) -> Result<InitResult> {
    let trellis_dir = base_dir.join(TRELLIS_DIR_NAME);

    if trellis_dir.exists() {
        return Err(Error::Config(format!(
            "Trellis is already initialized in this directory. Found existing '{TRELLIS_DIR_NAME}'"
        )));
    }

    fs::create_dir_all(&trellis_dir).await?;

    let config = TrellisConfig::default();
    let config_file = trellis_dir.join(CONFIG_FILE_NAME);
    config.save(&config_file).await?;

    let graph_file = config.graph_path(base_dir);
    fs::write(&graph_file, "").await?;

    let sessions_file = config.sessions_path(base_dir);
    fs::write(&sessions_file, "").await?;

    let gitignore_file = trellis_dir.join(GITIGNORE_FILE_NAME);
    let gitignore_content = "\
# Temporary files left by interrupted atomic writes
*.tmp
";
    fs::write(&gitignore_file, gitignore_content).await?;

    Ok(InitResult {
        trellis_dir,
        config_file,
        graph_file,
        sessions_file,
        gitignore_file,
    })
}

/// Load the configuration of the workspace rooted at `root`.
///
/// A missing config file yields the defaults.
///
/// # Errors
///
/// Returns `Error::Config` if the file exists but is invalid.
pub async fn load_workspace_config(root: &Path) -> Result<TrellisConfig> {
    let path = root.join(TRELLIS_DIR_NAME).join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(TrellisConfig::default());
    }
    TrellisConfig::load(&path).await
}

/// Find the workspace root by searching up the directory tree.
///
/// Returns the directory containing `.trellis/`, or `None` if none is found
/// within [`MAX_TRAVERSAL_DEPTH`] levels.
pub fn find_workspace_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(TRELLIS_DIR_NAME).exists() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
