//! Small filesystem helpers shared by the publish steps.

use std::path::Path;

use glancepub_common::error::{GlancepubError, Result};

/// Creates a symlink at `link` pointing to `target`.
///
/// # Errors
///
/// Returns an error if the link cannot be created.
pub fn create_symlink(target: &Path, link: &Path) -> Result<()> {
    platform_symlink(target, link).map_err(GlancepubError::io(link))
}

#[cfg(unix)]
fn platform_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn platform_symlink(target: &Path, link: &Path) -> std::io::Result<()> {
    if target.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

/// Returns true if `path` itself (not its target) exists.
#[must_use]
pub fn entry_exists(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

/// Returns true if `path` is a symlink.
#[must_use]
pub fn is_symlink(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink())
}

/// Creates `dir` and all missing parents.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(GlancepubError::io(dir))
}

/// Removes `dir` recursively; a missing directory is not an error.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be removed.
pub fn remove_tree(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(GlancepubError::Io {
            path: dir.to_path_buf(),
            source: e,
        }),
    }
}
