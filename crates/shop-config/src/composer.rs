//! Include-aware configuration composition
//!
//! A document may list other documents under `include`. Each include is
//! loaded with the same rules (recursively) and the including document is
//! merged on top of it, so the including document always wins. With several
//! includes the first listed takes precedence over the later ones.

use crate::merge::Merge;
use crate::{Config, Error, Result, io};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Loads a primary document and merges everything it includes
#[derive(Debug, Clone, Default)]
pub struct ConfigComposer {
    allow_fallback: bool,
}

impl ConfigComposer {
    /// Create a composer that fails when the primary document is missing
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow a missing document to resolve to an empty configuration
    pub fn with_fallback(mut self, allow_fallback: bool) -> Self {
        self.allow_fallback = allow_fallback;
        self
    }

    /// Compose the effective configuration rooted at `path`
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigNotFound`] if `path` does not exist and fallback is off
    /// - [`Error::Parse`] / [`Error::InvalidConfig`] for a bad primary document
    /// - [`Error::Include`] naming the include that failed to load
    /// - [`Error::IncludeCycle`] if a document includes itself transitively
    pub fn compose(&self, path: &Path) -> Result<Config> {
        let mut stack = Vec::new();
        let mut config = self.load(path, &mut stack)?;
        config.include.clear();
        Ok(config)
    }

    fn load(&self, path: &Path, stack: &mut Vec<PathBuf>) -> Result<Config> {
        match fs::metadata(path) {
            Ok(_) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                if self.allow_fallback {
                    tracing::debug!(?path, "No config found, using fallback");
                    return Ok(Config::fallback());
                }
                return Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            Err(e) => return Err(Error::io(path, e)),
        }

        let key = path.canonicalize().map_err(|e| Error::io(path, e))?;
        if stack.contains(&key) {
            return Err(Error::IncludeCycle {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(?path, "Loading config");
        let content = io::read_text(path)?;
        let mut config = Config::parse_at(&content, path)?;

        if config.include.is_empty() {
            return Ok(config);
        }

        stack.push(key);
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));

        for include in config.include.clone() {
            let include_path = base_dir.join(&include);
            tracing::debug!(?include_path, parent = ?path, "Resolving include");

            let mut merged = self
                .load(&include_path, stack)
                .map_err(|e| Error::include(&include_path, e))?;
            merged.merge(&config);
            config = merged;
        }

        stack.pop();
        Ok(config)
    }
}

/// Compose the configuration at `path`
///
/// Shorthand for `ConfigComposer::new().with_fallback(allow_fallback).compose(path)`.
pub fn read_config(path: &Path, allow_fallback: bool) -> Result<Config> {
    ConfigComposer::new()
        .with_fallback(allow_fallback)
        .compose(path)
}
