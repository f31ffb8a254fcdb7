//! Image linking step.
//!
//! Every Glance image unit is exposed by a symlink
//! `<working_dir>/web/<filename>` pointing at the unit's storage path.
//! Nothing is copied; the atomic publish step later makes the staged tree
//! visible.

use std::path::Path;

use glancepub_common::constants::{IMAGE_TYPE_ID, PUBLISH_STEP_IMAGES, REDIRECT_FILE_NAME};
use glancepub_common::error::{GlancepubError, Result};
use glancepub_common::types::{FilenameScheme, ImageChecksum};

use crate::redirect::{RedirectContext, RedirectEntry, RedirectFileContext, repo_base_url};
use crate::step::{Step, StepContext};
use crate::unit::Unit;

/// Links each image unit into the staged web directory.
#[derive(Debug)]
pub struct PublishImagesStep {
    description: String,
    redirect_context: Option<Box<dyn RedirectContext>>,
}

impl Default for PublishImagesStep {
    fn default() -> Self {
        Self::new()
    }
}

impl PublishImagesStep {
    /// Creates the step with no redirect context; one is installed on
    /// initialize unless [`Self::with_redirect_context`] supplied it.
    #[must_use]
    pub fn new() -> Self {
        Self {
            description: "Publishing Image Files.".to_string(),
            redirect_context: None,
        }
    }

    /// Uses the given redirect context instead of the default listing file.
    #[must_use]
    pub fn with_redirect_context(mut self, context: Box<dyn RedirectContext>) -> Self {
        self.redirect_context = Some(context);
        self
    }

    /// Returns true once a redirect context is attached.
    #[must_use]
    pub fn has_redirect_context(&self) -> bool {
        self.redirect_context.is_some()
    }
}

impl Step for PublishImagesStep {
    fn step_type(&self) -> &'static str {
        PUBLISH_STEP_IMAGES
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn unit_type(&self) -> Option<&'static str> {
        Some(IMAGE_TYPE_ID)
    }

    fn initialize(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let web_dir = ctx.web_dir();
        crate::fs::ensure_dir(&web_dir)?;
        let redirect = self
            .redirect_context
            .get_or_insert_with(|| {
                Box::new(RedirectFileContext::new(&web_dir, &ctx.repo.id)) as Box<dyn RedirectContext>
            });
        redirect.initialize()
    }

    fn process_unit(&mut self, ctx: &StepContext<'_>, unit: &Unit) -> Result<()> {
        let checksum = unit.image_checksum()?;
        let source = unit.storage_path.as_path();
        if !source.is_absolute() {
            return Err(GlancepubError::InvalidUnit {
                message: format!("storage path {} is not absolute", source.display()),
            });
        }
        if !source.is_file() {
            return Err(GlancepubError::NotFound {
                kind: "image file",
                id: source.display().to_string(),
            });
        }
        if ctx.config.verify_checksum()? {
            crate::hash::validate_checksum(source, &checksum)?;
        }

        let filename = destination_filename(unit, &checksum, ctx.config.filename_scheme()?)?;
        let web_dir = ctx.web_dir();
        crate::fs::ensure_dir(&web_dir)?;
        let link = web_dir.join(&filename);

        if crate::fs::entry_exists(&link) {
            if links_to(&link, source) {
                tracing::debug!(link = %link.display(), "image already linked");
                return Ok(());
            }
            return Err(GlancepubError::AlreadyExists {
                kind: "published image",
                id: link.display().to_string(),
            });
        }

        crate::fs::create_symlink(source, &link)?;
        tracing::info!(
            checksum = checksum.as_hex(),
            source = %source.display(),
            link = %link.display(),
            "linked image"
        );

        if let Some(redirect) = self.redirect_context.as_mut() {
            let size_bytes = std::fs::metadata(source)
                .map_err(GlancepubError::io(source))?
                .len();
            redirect.add_image(RedirectEntry {
                checksum: checksum.as_hex().to_string(),
                url: format!("{}{filename}", repo_base_url(&ctx.repo.id)),
                filename,
                size_bytes,
            })?;
        }
        Ok(())
    }

    fn finalize(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        match self.redirect_context.as_mut() {
            Some(redirect) => redirect.finalize(),
            None => Ok(()),
        }
    }
}

/// Computes the published file name of an image unit.
///
/// # Errors
///
/// Returns `GlancepubError::InvalidUnit` if the storage path has no file
/// name or the name would collide with the redirect listing.
pub fn destination_filename(
    unit: &Unit,
    checksum: &ImageChecksum,
    scheme: FilenameScheme,
) -> Result<String> {
    let filename = match scheme {
        FilenameScheme::Storage => unit.storage_file_name()?.to_string(),
        FilenameScheme::Checksum => match unit.storage_path.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}.{ext}", checksum.as_hex()),
            None => checksum.as_hex().to_string(),
        },
    };
    if filename == REDIRECT_FILE_NAME {
        return Err(GlancepubError::InvalidUnit {
            message: format!("image file name {filename} is reserved"),
        });
    }
    Ok(filename)
}

fn links_to(link: &Path, target: &Path) -> bool {
    std::fs::read_link(link).is_ok_and(|current| current == target)
}
