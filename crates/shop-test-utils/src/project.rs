//! [`TestProject`] builder for configuration documents on disk.

use shop_config::{Config, ConfigComposer};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary project directory holding YAML configuration documents.
///
/// # Example
///
/// ```rust,no_run
/// use shop_test_utils::TestProject;
///
/// let project = TestProject::new()
///     .with_file("base.yml", "url: https://base.example\n")
///     .with_file(".shop-sync.yml", "include: [base.yml]\n");
/// let config = project.compose(".shop-sync.yml");
/// assert_eq!(config.url, "https://base.example");
/// ```
pub struct TestProject {
    temp_dir: TempDir,
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

impl TestProject {
    /// Create an empty project directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root().join(name)
    }

    /// Write `content` to `name`, creating parent directories.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn with_file(self, name: &str, content: &str) -> Self {
        self.write(name, content);
        self
    }

    /// Compose `name` without fallback.
    ///
    /// # Panics
    /// Panics if composition fails.
    pub fn compose(&self, name: &str) -> Config {
        ConfigComposer::new()
            .compose(&self.path(name))
            .unwrap_or_else(|e| panic!("Could not compose {name}: {e}"))
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name))
            .unwrap_or_else(|_| panic!("Could not read file: {}", self.path(name).display()))
    }

    /// Assert that the file at `name` contains `content`.
    ///
    /// # Panics
    /// Panics if the file cannot be read or does not contain `content`.
    pub fn assert_file_contains(&self, name: &str, content: &str) {
        let file_content = self.read(name);
        assert!(
            file_content.contains(content),
            "File {} does not contain expected content.\nExpected: {}\nActual: {}",
            name,
            content,
            file_content
        );
    }
}
