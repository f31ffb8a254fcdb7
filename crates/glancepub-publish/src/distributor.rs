//! Distributor entry points: config validation, publish, and removal.

use std::path::Path;

use glancepub_common::config::{GlancepubConfig, PluginConfig};
use glancepub_common::constants::{
    CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY, IMAGE_TYPE_ID, WEB_DISTRIBUTOR_TYPE_ID,
};
use glancepub_common::error::{GlancepubError, Result};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::conduit::PublishConduit;
use crate::publisher::{PublishPaths, PublishReport, WebPublisher};
use crate::unit::Repository;
use crate::working_dir::{TaskWorkingDir, remove_working_dir};

/// Static description of the distributor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DistributorMetadata {
    /// Distributor type id.
    pub id: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
    /// Unit types the distributor publishes.
    pub types: Vec<&'static str>,
}

/// Publishes Glance image repositories over HTTP.
#[derive(Debug, Clone)]
pub struct GlanceDistributor {
    settings: GlancepubConfig,
}

impl GlanceDistributor {
    /// Creates a distributor using the given process settings.
    #[must_use]
    pub const fn new(settings: GlancepubConfig) -> Self {
        Self { settings }
    }

    /// Returns the distributor metadata.
    #[must_use]
    pub fn metadata() -> DistributorMetadata {
        DistributorMetadata {
            id: WEB_DISTRIBUTOR_TYPE_ID,
            display_name: "Glance Web Distributor",
            types: vec![IMAGE_TYPE_ID],
        }
    }

    /// Checks a plugin configuration without touching the filesystem.
    ///
    /// # Errors
    ///
    /// Returns `GlancepubError::Config` describing the first invalid value.
    pub fn validate_config(&self, config: &PluginConfig) -> Result<()> {
        let _ = config.glance_publish_dir()?;
        let _ = config.filename_scheme()?;
        let _ = config.verify_checksum()?;
        Ok(())
    }

    /// Publishes a repository and cleans up the working directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or any step fails.
    pub fn publish_repo(
        &self,
        repo: &Repository,
        conduit: &dyn PublishConduit,
        config: &PluginConfig,
    ) -> Result<PublishReport> {
        self.validate_config(config)?;
        let resolver = TaskWorkingDir::new(&self.settings.working_root);
        let mut publisher = WebPublisher::new(repo, conduit, config, &resolver)?;
        let result = publisher.publish();
        let cleanup = remove_working_dir(publisher.working_dir());
        settle_publish(result, cleanup, publisher.working_dir())
    }

    /// Removes everything published for a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the publish directory is not configured, the web
    /// path is not a symlink, or removal fails.
    pub fn distributor_removed(&self, repo: &Repository, config: &PluginConfig) -> Result<()> {
        let publish_dir = config.glance_publish_dir()?;
        let paths = PublishPaths::new(&publish_dir, repo);

        if crate::fs::entry_exists(&paths.web_dir) {
            if !crate::fs::is_symlink(&paths.web_dir) {
                return Err(GlancepubError::AlreadyExists {
                    kind: "non-symlink publish destination",
                    id: paths.web_dir.display().to_string(),
                });
            }
            std::fs::remove_file(&paths.web_dir).map_err(GlancepubError::io(&paths.web_dir))?;
        }
        crate::fs::remove_tree(&paths.master_dir)?;
        tracing::info!(
            repo = %repo.id,
            publish_dir = %publish_dir.display(),
            "removed published repository"
        );
        Ok(())
    }

    /// Returns the lowest-priority plugin config layer derived from the
    /// process settings.
    #[must_use]
    pub fn default_config(&self) -> Map<String, Value> {
        let mut defaults = Map::new();
        let _ = defaults.insert(
            CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY.to_string(),
            Value::String(self.settings.publish_dir.display().to_string()),
        );
        defaults
    }
}

/// Combines the publish outcome with working directory cleanup. A publish
/// error takes precedence; a cleanup failure after it is only logged.
fn settle_publish(
    result: Result<PublishReport>,
    cleanup: Result<()>,
    working_dir: &Path,
) -> Result<PublishReport> {
    match (result, cleanup) {
        (Err(e), Err(cleanup_err)) => {
            tracing::warn!(
                working_dir = %working_dir.display(),
                error = %cleanup_err,
                "failed to remove working directory after failed publish"
            );
            Err(e)
        }
        (result, cleanup) => {
            cleanup?;
            result
        }
    }
}
