//! `glancepub validate` — Check a distributor configuration.

use clap::Args;
use glancepub_publish::distributor::GlanceDistributor;

use super::PluginArgs;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Distributor options.
    #[command(flatten)]
    pub plugin: PluginArgs,
}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error describing the first invalid configuration value.
pub fn execute(distributor: &GlanceDistributor, args: &ValidateArgs) -> anyhow::Result<()> {
    let config = args.plugin.plugin_config(distributor)?;
    distributor.validate_config(&config)?;
    let meta = GlanceDistributor::metadata();
    println!("{} ({}): configuration is valid", meta.display_name, meta.id);
    println!("publish directory: {}", config.glance_publish_dir()?.display());
    println!("filename scheme:   {}", config.filename_scheme()?);
    println!("verify checksum:   {}", config.verify_checksum()?);
    Ok(())
}
