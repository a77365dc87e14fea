//! Shared fixtures for integration tests

use metamap::{OpenStore, SqliteStore};
use std::path::PathBuf;
use tempfile::TempDir;

/// A scratch directory holding a database and settings files
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join("data").join("metamap.db")
    }

    /// Open (or reopen) the workspace database
    pub fn open_store(&self) -> SqliteStore {
        SqliteStore::open(self.db_path()).expect("open sqlite store")
    }

    /// Write YAML settings and return their path
    #[allow(dead_code)] // Not every test binary writes settings
    pub fn write_settings(&self, yaml: &str) -> PathBuf {
        let path = self.dir.path().join("settings.yaml");
        std::fs::write(&path, yaml).expect("write settings");
        path
    }
}
