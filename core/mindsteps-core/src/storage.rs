//! Storage configuration and path management for MindSteps.
//!
//! All local-file path decisions live here so tests can inject temp
//! directories. MindSteps keeps very little on disk by design: session
//! history is owned by the backend, and the only durable local state is the
//! per-installation device id.

use std::path::{Path, PathBuf};

/// Central configuration for all MindSteps storage paths.
///
/// Production code uses `StorageConfig::default()` which points to
/// `~/.mindsteps/`. Tests use `StorageConfig::with_root(temp_dir)` for
/// isolation.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Root directory for all MindSteps data (default: ~/.mindsteps)
    root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let home = dirs::home_dir().expect("Could not find home directory");
        Self {
            root: home.join(".mindsteps"),
        }
    }
}

impl StorageConfig {
    /// Creates a StorageConfig with a custom root directory.
    /// Used for testing with temp directories.
    pub fn with_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// Returns the root directory for MindSteps data.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the persisted per-installation device id.
    pub fn device_id_file(&self) -> PathBuf {
        self.root.join("device-id")
    }
}
