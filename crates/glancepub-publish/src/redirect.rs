//! Redirect listing for the web tier.
//!
//! While images are linked, the redirect context collects one entry per
//! image. On finalize the default implementation writes a JSON listing the
//! web server uses to map repository URLs onto published files.

use std::path::{Path, PathBuf};

use glancepub_common::constants::{REDIRECT_FILE_NAME, WEB_URL_PREFIX};
use glancepub_common::error::{GlancepubError, Result};
use glancepub_common::types::RepoId;
use serde::{Deserialize, Serialize};

/// Listing format version.
const REDIRECT_FORMAT_VERSION: u32 = 1;

/// One published image as it appears in the redirect listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectEntry {
    /// Hex MD5 checksum of the image.
    pub checksum: String,
    /// Published file name.
    pub filename: String,
    /// Size of the image in bytes.
    pub size_bytes: u64,
    /// URL path the image is served at.
    pub url: String,
}

/// Serialized redirect listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectListing {
    /// Listing format version.
    pub version: u32,
    /// Repository the listing describes.
    pub repository: String,
    /// URL path prefix of the repository.
    pub base_url: String,
    /// Published images, in processing order.
    pub images: Vec<RedirectEntry>,
}

/// Collaborator that records published images and completes the listing.
pub trait RedirectContext: std::fmt::Debug {
    /// Prepares the context before any image is added.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be prepared.
    fn initialize(&mut self) -> Result<()>;

    /// Records a published image.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be recorded.
    fn add_image(&mut self, entry: RedirectEntry) -> Result<()>;

    /// Completes the listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing cannot be written.
    fn finalize(&mut self) -> Result<()>;
}

/// Returns the URL path prefix of a repository.
#[must_use]
pub fn repo_base_url(repo_id: &RepoId) -> String {
    format!("{WEB_URL_PREFIX}/{repo_id}/")
}

/// Writes the redirect listing as `redirect.json` in a web directory.
#[derive(Debug)]
pub struct RedirectFileContext {
    path: PathBuf,
    listing: RedirectListing,
}

impl RedirectFileContext {
    /// Creates a context writing into `web_dir` for the given repository.
    #[must_use]
    pub fn new(web_dir: &Path, repo_id: &RepoId) -> Self {
        Self {
            path: web_dir.join(REDIRECT_FILE_NAME),
            listing: RedirectListing {
                version: REDIRECT_FORMAT_VERSION,
                repository: repo_id.to_string(),
                base_url: repo_base_url(repo_id),
                images: Vec::new(),
            },
        }
    }

    /// Returns the listing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RedirectContext for RedirectFileContext {
    fn initialize(&mut self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            crate::fs::ensure_dir(parent)?;
        }
        self.listing.images.clear();
        Ok(())
    }

    fn add_image(&mut self, entry: RedirectEntry) -> Result<()> {
        self.listing.images.push(entry);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.listing)?;
        std::fs::write(&self.path, json).map_err(GlancepubError::io(&self.path))?;
        tracing::info!(
            path = %self.path.display(),
            images = self.listing.images.len(),
            "wrote redirect listing"
        );
        Ok(())
    }
}
