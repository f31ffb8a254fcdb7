//! `glancepub publish` — Publish a repository's images.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use glancepub_common::constants::IMAGE_TYPE_ID;
use glancepub_publish::conduit::{ManifestConduit, PublishConduit};
use glancepub_publish::distributor::GlanceDistributor;
use glancepub_publish::unit::Repository;

use super::PluginArgs;

/// Arguments for the `publish` command.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Repository identifier.
    #[arg(long)]
    pub repo_id: String,

    /// JSON manifest listing the repository's units.
    #[arg(long)]
    pub units: PathBuf,

    /// Distributor options.
    #[command(flatten)]
    pub plugin: PluginArgs,
}

/// Executes the `publish` command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or publishing fails.
pub fn execute(distributor: &GlanceDistributor, args: &PublishArgs) -> anyhow::Result<()> {
    let repo = Repository::new(&args.repo_id)?;
    let config = args.plugin.plugin_config(distributor)?;
    let conduit = ManifestConduit::from_file(&args.units)
        .with_context(|| format!("loading units from {}", args.units.display()))?;
    let total_bytes = crate::output::total_size(&conduit.units(IMAGE_TYPE_ID)?);

    tracing::info!(repo = %repo.id, "publishing");
    let report = distributor
        .publish_repo(&repo, &conduit, &config)
        .with_context(|| format!("publishing repository {}", repo.id))?;

    println!("STEP\tSTATE\tPROCESSED\tFAILED");
    for step in &report.steps {
        println!(
            "{}\t{}\t{}/{}\t{}",
            step.step_type, step.state, step.num_processed, step.items_total, step.num_failures
        );
    }
    println!(
        "published {} image(s), {}",
        report.images_published,
        crate::output::format_bytes(total_bytes)
    );
    Ok(())
}
