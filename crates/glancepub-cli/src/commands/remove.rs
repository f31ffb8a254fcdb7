//! `glancepub remove` — Remove a repository's published files.

use clap::Args;
use glancepub_publish::distributor::GlanceDistributor;
use glancepub_publish::unit::Repository;

use super::PluginArgs;

/// Arguments for the `remove` command.
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Repository identifier.
    #[arg(long)]
    pub repo_id: String,

    /// Distributor options.
    #[command(flatten)]
    pub plugin: PluginArgs,
}

/// Executes the `remove` command.
///
/// # Errors
///
/// Returns an error if the published files cannot be removed.
pub fn execute(distributor: &GlanceDistributor, args: &RemoveArgs) -> anyhow::Result<()> {
    let repo = Repository::new(&args.repo_id)?;
    let config = args.plugin.plugin_config(distributor)?;
    distributor.distributor_removed(&repo, &config)?;
    println!("removed published repository {}", repo.id);
    Ok(())
}
