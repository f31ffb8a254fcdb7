//! Atomic directory publishing.
//!
//! The staged working tree is copied into `<master>/<timestamp>` (symlinks
//! stay symlinks), then every public location is switched to the new tree
//! by renaming a freshly created symlink over it. Readers see either the
//! previous tree or the new one, never a partial copy. Older timestamp
//! directories are removed afterwards.

use std::path::{Path, PathBuf};

use glancepub_common::constants::PUBLISH_STEP_OVER_HTTP;
use glancepub_common::error::{GlancepubError, Result};
use walkdir::WalkDir;

use crate::step::{Step, StepContext};

/// A staged subdirectory and the public path it is published at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishLocation {
    /// Path relative to the source directory.
    pub source_subdir: PathBuf,
    /// Public path that becomes a symlink into the master tree.
    pub destination: PathBuf,
}

impl PublishLocation {
    /// Creates a publish location.
    #[must_use]
    pub fn new(source_subdir: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source_subdir: source_subdir.into(),
            destination: destination.into(),
        }
    }
}

/// Swaps a staged directory tree into its public locations.
#[derive(Debug)]
pub struct AtomicDirectoryPublishStep {
    source_dir: PathBuf,
    locations: Vec<PublishLocation>,
    master_publish_dir: PathBuf,
    description: String,
}

impl AtomicDirectoryPublishStep {
    /// Creates the step.
    #[must_use]
    pub fn new(
        source_dir: impl Into<PathBuf>,
        locations: Vec<PublishLocation>,
        master_publish_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            locations,
            master_publish_dir: master_publish_dir.into(),
            description: "Making files available via web.".to_string(),
        }
    }

    /// Copies the source tree into a new timestamped master directory and
    /// switches every location to it. Returns the new master directory.
    ///
    /// # Errors
    ///
    /// Returns an error if copying fails, a destination is a real
    /// directory, or a symlink cannot be swapped into place.
    pub fn publish(&self) -> Result<PathBuf> {
        let timestamp_dir = self.new_timestamp_dir()?;
        copy_tree(&self.source_dir, &timestamp_dir)?;

        for location in &self.locations {
            let target = timestamp_dir.join(&location.source_subdir);
            crate::fs::ensure_dir(&target)?;
            swap_symlink(&target, &location.destination)?;
            tracing::info!(
                destination = %location.destination.display(),
                target = %target.display(),
                "published directory"
            );
        }

        self.prune_master(&timestamp_dir)?;
        Ok(timestamp_dir)
    }

    fn new_timestamp_dir(&self) -> Result<PathBuf> {
        crate::fs::ensure_dir(&self.master_publish_dir)?;
        let stamp = chrono::Utc::now().format("%Y%m%d%H%M%S%6f").to_string();
        let mut dir = self.master_publish_dir.join(&stamp);
        if crate::fs::entry_exists(&dir) {
            dir = self
                .master_publish_dir
                .join(format!("{stamp}-{}", uuid::Uuid::new_v4().simple()));
        }
        std::fs::create_dir(&dir).map_err(GlancepubError::io(&dir))?;
        Ok(dir)
    }

    fn prune_master(&self, keep: &Path) -> Result<()> {
        let entries = std::fs::read_dir(&self.master_publish_dir)
            .map_err(GlancepubError::io(&self.master_publish_dir))?;
        for entry in entries {
            let path = entry
                .map_err(GlancepubError::io(&self.master_publish_dir))?
                .path();
            if path == keep {
                continue;
            }
            tracing::debug!(path = %path.display(), "removing stale master directory");
            let removed = if crate::fs::is_symlink(&path) || path.is_file() {
                std::fs::remove_file(&path)
            } else {
                std::fs::remove_dir_all(&path)
            };
            removed.map_err(GlancepubError::io(&path))?;
        }
        Ok(())
    }
}

impl Step for AtomicDirectoryPublishStep {
    fn step_type(&self) -> &'static str {
        PUBLISH_STEP_OVER_HTTP
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn process_main(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        let _ = self.publish()?;
        Ok(())
    }
}

/// Copies `source` into the existing directory `target`, recreating
/// symlinks instead of following them.
fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    if !source.is_dir() {
        return Err(GlancepubError::NotFound {
            kind: "publish source directory",
            id: source.display().to_string(),
        });
    }
    for entry in WalkDir::new(source).min_depth(1).follow_links(false) {
        let entry = entry.map_err(|e| GlancepubError::Io {
            path: e.path().unwrap_or(source).to_path_buf(),
            source: e.into(),
        })?;
        let relative = entry.path().strip_prefix(source).map_err(|_| GlancepubError::Config {
            message: format!("{} escapes {}", entry.path().display(), source.display()),
        })?;
        let dest = target.join(relative);
        let file_type = entry.file_type();
        if file_type.is_symlink() {
            let link_target =
                std::fs::read_link(entry.path()).map_err(GlancepubError::io(entry.path()))?;
            crate::fs::create_symlink(&link_target, &dest)?;
        } else if file_type.is_dir() {
            crate::fs::ensure_dir(&dest)?;
        } else {
            let _ = std::fs::copy(entry.path(), &dest).map_err(GlancepubError::io(&dest))?;
        }
    }
    Ok(())
}

/// Points `link` at `target`, replacing an existing symlink in one rename.
fn swap_symlink(target: &Path, link: &Path) -> Result<()> {
    if crate::fs::entry_exists(link) && !crate::fs::is_symlink(link) {
        return Err(GlancepubError::AlreadyExists {
            kind: "non-symlink publish destination",
            id: link.display().to_string(),
        });
    }
    let parent = link.parent().ok_or_else(|| GlancepubError::Config {
        message: format!("publish destination {} has no parent", link.display()),
    })?;
    crate::fs::ensure_dir(parent)?;

    let name = link
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = parent.join(format!(".{name}.{}", uuid::Uuid::new_v4().simple()));
    crate::fs::create_symlink(target, &staging)?;
    if let Err(e) = std::fs::rename(&staging, link) {
        let _ = std::fs::remove_file(&staging);
        return Err(GlancepubError::Io {
            path: link.to_path_buf(),
            source: e,
        });
    }
    Ok(())
}
