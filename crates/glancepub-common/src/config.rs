//! Configuration models.
//!
//! [`GlancepubConfig`] holds process-wide settings (where data and working
//! directories live). [`PluginConfig`] is the per-call distributor
//! configuration: a layered key/value lookup where call overrides win
//! over repository settings, which win over defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{
    CONFIG_KEY_FILENAME_SCHEME, CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY, CONFIG_KEY_VERIFY_CHECKSUM,
};
use crate::error::{GlancepubError, Result};
use crate::types::FilenameScheme;

/// Root configuration for the glancepub tooling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlancepubConfig {
    /// Directory under which per-task working directories are created.
    pub working_root: PathBuf,
    /// Default Glance publish directory when the plugin config has none.
    pub publish_dir: PathBuf,
}

impl Default for GlancepubConfig {
    fn default() -> Self {
        Self {
            working_root: crate::constants::default_working_root(),
            publish_dir: crate::constants::default_publish_dir(),
        }
    }
}

impl GlancepubConfig {
    /// Loads settings from a JSON file. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "loading settings");
        let content = std::fs::read_to_string(path).map_err(GlancepubError::io(path))?;
        Ok(serde_json::from_str(&content)?)
    }
}

/// Layered plugin configuration for a single distributor call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluginConfig {
    override_config: Map<String, Value>,
    repo_plugin_config: Map<String, Value>,
    default_config: Map<String, Value>,
}

impl PluginConfig {
    /// Creates a configuration from repository settings and call overrides.
    #[must_use]
    pub fn new(repo_plugin_config: Map<String, Value>, override_config: Map<String, Value>) -> Self {
        Self {
            override_config,
            repo_plugin_config,
            default_config: Map::new(),
        }
    }

    /// Creates a configuration holding a single layer of values.
    #[must_use]
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let repo = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::new(repo, Map::new())
    }

    /// Sets the lowest-priority defaults layer.
    #[must_use]
    pub fn with_defaults(mut self, defaults: Map<String, Value>) -> Self {
        self.default_config = defaults;
        self
    }

    /// Looks a key up through the override, repository, and default layers.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.override_config
            .get(key)
            .or_else(|| self.repo_plugin_config.get(key))
            .or_else(|| self.default_config.get(key))
            .filter(|v| !v.is_null())
    }

    /// Returns a string value.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is present with a non-string value.
    pub fn get_str(&self, key: &str) -> Result<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(GlancepubError::Config {
                message: format!("{key} must be a string, got {other}"),
            }),
        }
    }

    /// Returns a boolean value, accepting `"true"`/`"false"` strings too.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is neither a boolean nor a boolean string.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("true") => Ok(Some(true)),
            Some(Value::String(s)) if s.eq_ignore_ascii_case("false") => Ok(Some(false)),
            Some(other) => Err(GlancepubError::Config {
                message: format!("{key} must be a boolean, got {other}"),
            }),
        }
    }

    /// Returns the required Glance publish directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is missing, empty, or not an absolute path.
    pub fn glance_publish_dir(&self) -> Result<PathBuf> {
        let key = CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY;
        let raw = self.get_str(key)?.ok_or_else(|| GlancepubError::Config {
            message: format!("{key} is required"),
        })?;
        if raw.is_empty() {
            return Err(GlancepubError::Config {
                message: format!("{key} must not be empty"),
            });
        }
        let path = PathBuf::from(raw);
        if !path.is_absolute() {
            return Err(GlancepubError::Config {
                message: format!("{key} must be an absolute path, got {raw}"),
            });
        }
        Ok(path)
    }

    /// Returns the filename scheme, defaulting to [`FilenameScheme::Storage`].
    ///
    /// # Errors
    ///
    /// Returns an error if the configured scheme is unknown.
    pub fn filename_scheme(&self) -> Result<FilenameScheme> {
        self.get_str(CONFIG_KEY_FILENAME_SCHEME)?
            .map_or(Ok(FilenameScheme::default()), str::parse)
    }

    /// Returns whether image files should be checksummed before linking.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not a boolean.
    pub fn verify_checksum(&self) -> Result<bool> {
        Ok(self.get_bool(CONFIG_KEY_VERIFY_CHECKSUM)?.unwrap_or(false))
    }
}
