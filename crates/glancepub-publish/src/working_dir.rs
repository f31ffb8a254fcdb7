//! Per-task working directory resolution.

use std::path::{Path, PathBuf};

use glancepub_common::error::{GlancepubError, Result};

/// Supplies the working directory a publish run stages files in.
pub trait WorkingDirResolver {
    /// Returns a directory that exists and is private to this run.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    fn resolve(&self) -> Result<PathBuf>;
}

/// Creates a fresh `<root>/<uuid>` directory on every resolution.
#[derive(Debug, Clone)]
pub struct TaskWorkingDir {
    root: PathBuf,
}

impl TaskWorkingDir {
    /// Creates a resolver rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl WorkingDirResolver for TaskWorkingDir {
    fn resolve(&self) -> Result<PathBuf> {
        let dir = self.root.join(uuid::Uuid::new_v4().to_string());
        std::fs::create_dir_all(&dir).map_err(GlancepubError::io(&dir))?;
        tracing::debug!(path = %dir.display(), "created working directory");
        Ok(dir)
    }
}

/// Removes a working directory and everything staged in it.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub fn remove_working_dir(dir: &Path) -> Result<()> {
    crate::fs::remove_tree(dir)?;
    tracing::debug!(path = %dir.display(), "removed working directory");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_creates_distinct_directories_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let resolver = TaskWorkingDir::new(dir.path().join("working"));

        let first = resolver.resolve().expect("resolve");
        let second = resolver.resolve().expect("resolve");

        assert!(first.is_dir());
        assert!(second.is_dir());
        assert_ne!(first, second);
        assert!(first.starts_with(dir.path().join("working")));
    }

    #[test]
    fn remove_working_dir_tolerates_missing_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let work = dir.path().join("gone");
        assert!(remove_working_dir(&work).is_ok());

        std::fs::create_dir_all(work.join("web")).expect("mkdir");
        remove_working_dir(&work).expect("remove");
        assert!(!work.exists());
    }
}
