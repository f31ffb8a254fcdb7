//! Web publisher: the root of a repository publish run.
//!
//! Construction resolves the working directory once and wires the two
//! children in their fixed order: images are linked into the staged tree
//! before the atomic swap makes that tree public.

use std::path::{Path, PathBuf};

use glancepub_common::config::PluginConfig;
use glancepub_common::constants::{
    MASTER_DIR_NAME, PUBLISH_STEP_IMAGES, PUBLISH_STEP_WEB_PUBLISHER, WEB_DIR_NAME,
};
use glancepub_common::error::Result;
use glancepub_common::types::StepState;
use serde::{Deserialize, Serialize};

use crate::atomic::{AtomicDirectoryPublishStep, PublishLocation};
use crate::conduit::{PublishConduit, StepProgress};
use crate::images::PublishImagesStep;
use crate::step::{ProgressTracker, Step, StepContext, run_step};
use crate::unit::Repository;
use crate::working_dir::WorkingDirResolver;

/// Outcome of a publish run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishReport {
    /// Whether every step completed.
    pub success: bool,
    /// Number of images linked by the images step.
    pub images_published: usize,
    /// Progress of every step, in execution order.
    pub steps: Vec<StepProgress>,
}

/// Public paths of a published repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishPaths {
    /// Symlink served by the web tier.
    pub web_dir: PathBuf,
    /// Directory holding the timestamped master trees.
    pub master_dir: PathBuf,
}

impl PublishPaths {
    /// Derives the public paths of `repo` under `publish_dir`.
    #[must_use]
    pub fn new(publish_dir: &Path, repo: &Repository) -> Self {
        Self {
            web_dir: publish_dir.join(WEB_DIR_NAME).join(repo.id.as_str()),
            master_dir: publish_dir.join(MASTER_DIR_NAME).join(repo.id.as_str()),
        }
    }
}

/// Root step composing the repository publish pipeline.
pub struct WebPublisher<'a> {
    repo: &'a Repository,
    conduit: &'a dyn PublishConduit,
    config: &'a PluginConfig,
    working_dir: PathBuf,
    paths: PublishPaths,
    children: Vec<Box<dyn Step>>,
}

impl<'a> WebPublisher<'a> {
    /// Builds the publisher and its children.
    ///
    /// # Errors
    ///
    /// Returns an error if the Glance publish directory is not configured
    /// or the working directory cannot be resolved.
    pub fn new(
        repo: &'a Repository,
        conduit: &'a dyn PublishConduit,
        config: &'a PluginConfig,
        resolver: &dyn WorkingDirResolver,
    ) -> Result<Self> {
        let publish_dir = config.glance_publish_dir()?;
        let working_dir = resolver.resolve()?;
        let paths = PublishPaths::new(&publish_dir, repo);

        let atomic_publish_step = AtomicDirectoryPublishStep::new(
            &working_dir,
            vec![PublishLocation::new(WEB_DIR_NAME, &paths.web_dir)],
            &paths.master_dir,
        );
        let children: Vec<Box<dyn Step>> = vec![
            Box::new(PublishImagesStep::new()),
            Box::new(atomic_publish_step),
        ];

        tracing::debug!(
            repo = %repo.id,
            working_dir = %working_dir.display(),
            publish_dir = %publish_dir.display(),
            "constructed web publisher"
        );
        Ok(Self {
            repo,
            conduit,
            config,
            working_dir,
            paths,
            children,
        })
    }

    /// Step type id of the publisher itself.
    #[must_use]
    pub const fn step_type(&self) -> &'static str {
        PUBLISH_STEP_WEB_PUBLISHER
    }

    /// Returns the ordered child steps.
    #[must_use]
    pub fn children(&self) -> &[Box<dyn Step>] {
        &self.children
    }

    /// Returns the working directory resolved at construction.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Returns the public paths this publisher writes.
    #[must_use]
    pub const fn paths(&self) -> &PublishPaths {
        &self.paths
    }

    /// Runs every child in order, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing step; later steps are
    /// reported as skipped.
    pub fn publish(&mut self) -> Result<PublishReport> {
        let ctx = StepContext {
            repo: self.repo,
            conduit: self.conduit,
            config: self.config,
            working_dir: &self.working_dir,
        };
        let mut tracker = ProgressTracker::new(self.conduit, &self.children);
        tracing::info!(
            step = self.step_type(),
            repo = %self.repo.id,
            steps = self.children.len(),
            "publishing repository"
        );

        for (index, child) in self.children.iter_mut().enumerate() {
            if let Err(e) = run_step(child.as_mut(), &ctx, &mut tracker, index) {
                tracker.skip_from(index + 1);
                return Err(e);
            }
        }

        let steps = tracker.into_steps();
        let images_published = steps
            .iter()
            .find(|s| s.step_type == PUBLISH_STEP_IMAGES)
            .map_or(0, |s| s.num_success);
        let success = steps.iter().all(|s| s.state == StepState::Complete);
        tracing::info!(repo = %self.repo.id, images = images_published, "publish finished");
        Ok(PublishReport {
            success,
            images_published,
            steps,
        })
    }
}

impl std::fmt::Debug for WebPublisher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebPublisher")
            .field("repo", &self.repo.id)
            .field("working_dir", &self.working_dir)
            .field("paths", &self.paths)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}
