//! CLI command definitions and dispatch.

pub mod publish;
pub mod remove;
pub mod validate;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use glancepub_common::config::{GlancepubConfig, PluginConfig};
use glancepub_common::constants::{
    CONFIG_KEY_FILENAME_SCHEME, CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY, CONFIG_KEY_VERIFY_CHECKSUM,
};
use glancepub_publish::distributor::GlanceDistributor;
use serde_json::{Map, Value};

/// glancepub — publish Glance image repositories over HTTP.
#[derive(Parser, Debug)]
#[command(name = "glancepub", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to a JSON settings file.
    #[arg(long, global = true, env = "GLANCEPUB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub json_logs: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Publish a repository's images to the web directory.
    Publish(publish::PublishArgs),
    /// Check a distributor configuration.
    Validate(validate::ValidateArgs),
    /// Remove a repository's published files.
    Remove(remove::RemoveArgs),
}

/// Distributor options shared by the subcommands.
#[derive(Args, Debug, Default)]
pub struct PluginArgs {
    /// Directory the web tree is published under.
    #[arg(long)]
    pub publish_dir: Option<PathBuf>,

    /// How published file names are derived (`storage` or `checksum`).
    #[arg(long)]
    pub filename_scheme: Option<String>,

    /// Verify each image's MD5 checksum before linking it. A bare flag
    /// means `true`; `--verify-checksum=false` overrides the repository
    /// settings.
    #[arg(long, num_args = 0..=1, require_equals = true, default_missing_value = "true")]
    pub verify_checksum: Option<bool>,

    /// JSON file with repository-level distributor settings.
    #[arg(long)]
    pub repo_config: Option<PathBuf>,
}

impl PluginArgs {
    /// Builds the layered plugin configuration: command-line flags override
    /// the repository settings file, which overrides the distributor defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository settings file cannot be read.
    pub fn plugin_config(&self, distributor: &GlanceDistributor) -> anyhow::Result<PluginConfig> {
        let repo = match &self.repo_config {
            Some(path) => read_json_object(path)?,
            None => Map::new(),
        };

        let mut overrides = Map::new();
        if let Some(dir) = &self.publish_dir {
            let _ = overrides.insert(
                CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY.to_string(),
                Value::String(dir.display().to_string()),
            );
        }
        if let Some(scheme) = &self.filename_scheme {
            let _ = overrides.insert(
                CONFIG_KEY_FILENAME_SCHEME.to_string(),
                Value::String(scheme.clone()),
            );
        }
        if let Some(verify) = self.verify_checksum {
            let _ = overrides.insert(CONFIG_KEY_VERIFY_CHECKSUM.to_string(), Value::Bool(verify));
        }

        Ok(PluginConfig::new(repo, overrides).with_defaults(distributor.default_config()))
    }
}

fn read_json_object(path: &Path) -> anyhow::Result<Map<String, Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading repository config {}", path.display()))?;
    match serde_json::from_str::<Value>(&content)? {
        Value::Object(map) => Ok(map),
        other => anyhow::bail!(
            "repository config {} must be a JSON object, got {other}",
            path.display()
        ),
    }
}

/// Loads process settings from `path`, or the defaults when none is given.
///
/// # Errors
///
/// Returns an error if the settings file cannot be read or parsed.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<GlancepubConfig> {
    match path {
        Some(path) => GlancepubConfig::load(path)
            .with_context(|| format!("loading settings from {}", path.display())),
        None => Ok(GlancepubConfig::default()),
    }
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let settings = load_settings(cli.config.as_deref())?;
    let distributor = GlanceDistributor::new(settings);
    match cli.command {
        Command::Publish(args) => publish::execute(&distributor, &args),
        Command::Validate(args) => validate::execute(&distributor, &args),
        Command::Remove(args) => remove::execute(&distributor, &args),
    }
}
