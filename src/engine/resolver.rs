//! Configured path resolution.
//!
//! Expands the configured file/directory entries into the concrete set
//! of files to tail and applies exclusion rules.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::TailConfig;

use super::error::EngineError;

/// How to treat a missing exclusion entry.
///
/// Startup fails fast on operator typos; background rescans must not
/// crash a running engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionMode {
    /// Missing exclusion path is a fatal error.
    Strict,
    /// Missing exclusion path is logged and ignored.
    Lenient,
}

/// Resolves configured entries into a concrete file list.
#[derive(Debug)]
pub struct PathResolver {
    entries: Vec<PathBuf>,
    exclude: Vec<PathBuf>,
    max_open_files: usize,
}

impl PathResolver {
    /// Create a resolver from the engine configuration.
    #[must_use]
    pub fn new(config: &TailConfig) -> Self {
        Self {
            entries: config.path.clone(),
            exclude: config.exclude.clone(),
            max_open_files: config.max_open_files,
        }
    }

    /// Resolve the initial concrete file set.
    ///
    /// Directory entries expand to their immediate children
    /// (non-recursive, files only); file entries are included directly.
    /// Exclusions are applied in strict mode.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured entry does not exist, a strict
    /// exclusion entry does not exist, the resolved set exceeds
    /// `max_open_files`, or a directory cannot be listed.
    pub fn resolve(&self) -> Result<Vec<PathBuf>, EngineError> {
        let mut files = Vec::new();

        for entry in &self.entries {
            if !entry.exists() {
                return Err(EngineError::PathNotFound(entry.clone()));
            }

            if entry.is_dir() {
                files.extend(list_files(entry)?);
            } else {
                files.push(entry.clone());
            }
        }

        let files = self.apply_exclusions(files, ExclusionMode::Strict)?;

        if self.max_open_files > 0 && files.len() > self.max_open_files {
            return Err(EngineError::TooManyFiles {
                count: files.len(),
                limit: self.max_open_files,
            });
        }

        Ok(files)
    }

    /// Remove excluded paths from a candidate file list.
    ///
    /// A directory exclusion removes that directory's immediate
    /// children; a file exclusion removes the exact path.
    ///
    /// # Errors
    ///
    /// In strict mode, returns an error for an exclusion entry that
    /// does not exist. Lenient mode logs and skips it.
    pub fn apply_exclusions(
        &self,
        files: Vec<PathBuf>,
        mode: ExclusionMode,
    ) -> Result<Vec<PathBuf>, EngineError> {
        let mut removed: HashSet<PathBuf> = HashSet::new();

        for entry in &self.exclude {
            if !entry.exists() {
                match mode {
                    ExclusionMode::Strict => {
                        return Err(EngineError::ExcludeNotFound(entry.clone()));
                    }
                    ExclusionMode::Lenient => {
                        tracing::warn!(
                            path = %entry.display(),
                            "Exclusion path does not exist, ignoring"
                        );
                        continue;
                    }
                }
            }

            if entry.is_dir() {
                match list_files(entry) {
                    Ok(children) => removed.extend(children),
                    Err(e) => match mode {
                        ExclusionMode::Strict => return Err(e),
                        ExclusionMode::Lenient => {
                            tracing::warn!(
                                path = %entry.display(),
                                error = %e,
                                "Failed to list exclusion directory, ignoring"
                            );
                        }
                    },
                }
            } else {
                removed.insert(entry.clone());
            }
        }

        Ok(files.into_iter().filter(|f| !removed.contains(f)).collect())
    }

    /// List the current children of the configured directory entries,
    /// with lenient exclusion applied.
    ///
    /// Used by periodic re-discovery; never fails, directories that
    /// cannot be listed are warned about and skipped.
    #[must_use]
    pub fn rescan_directories(&self) -> Vec<PathBuf> {
        let mut found = Vec::new();
        for dir in self.directory_entries() {
            match list_files(&dir) {
                Ok(children) => found.extend(children),
                Err(e) => {
                    tracing::warn!(
                        path = %dir.display(),
                        error = %e,
                        "Failed to list directory during rescan"
                    );
                }
            }
        }

        match self.apply_exclusions(found, ExclusionMode::Lenient) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(error = %e, "Exclusion filtering failed during rescan");
                Vec::new()
            }
        }
    }

    /// The configured directory entries, used by periodic re-discovery.
    #[must_use]
    pub fn directory_entries(&self) -> Vec<PathBuf> {
        self.entries.iter().filter(|p| p.is_dir()).cloned().collect()
    }
}

/// List the immediate file children of a directory.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let entries = std::fs::read_dir(dir)?;
    Ok(entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect())
}
