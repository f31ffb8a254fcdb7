//! Domain primitive types used across the glancepub workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GlancepubError, Result};

/// Identifier of a content repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoId(String);

impl RepoId {
    /// Creates a repository ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is empty or would escape its parent
    /// directory when used as a path component.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id == "." || id == ".." || id.contains(['/', '\\']) {
            return Err(GlancepubError::Config {
                message: format!("invalid repository id: {id:?}"),
            });
        }
        Ok(Self(id))
    }

    /// Returns the inner string representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// MD5 checksum of a Glance image, stored as lowercase hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageChecksum(String);

impl ImageChecksum {
    /// Creates a checksum from a hex-encoded string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a 32-character hex string.
    pub fn from_hex(hex: impl Into<String>) -> Result<Self> {
        let hex = hex.into();
        if hex.len() != crate::constants::MD5_HEX_LENGTH
            || !hex.chars().all(|c| c.is_ascii_hexdigit())
        {
            return Err(GlancepubError::InvalidUnit {
                message: format!("invalid image checksum: {hex:?}"),
            });
        }
        Ok(Self(hex.to_ascii_lowercase()))
    }

    /// Returns the hex-encoded checksum.
    #[must_use]
    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "md5:{}", self.0)
    }
}

/// How the published filename of an image is derived.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilenameScheme {
    /// Keep the file name of the unit's storage path.
    #[default]
    Storage,
    /// Use the image checksum followed by the original extension.
    Checksum,
}

impl FromStr for FilenameScheme {
    type Err = GlancepubError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "storage" => Ok(Self::Storage),
            "checksum" => Ok(Self::Checksum),
            other => Err(GlancepubError::Config {
                message: format!("unknown filename scheme {other:?} (expected storage or checksum)"),
            }),
        }
    }
}

impl fmt::Display for FilenameScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage => write!(f, "storage"),
            Self::Checksum => write!(f, "checksum"),
        }
    }
}

/// Lifecycle state of a publish step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// The step has not run yet.
    #[default]
    NotStarted,
    /// The step is running.
    InProgress,
    /// The step finished successfully.
    Complete,
    /// The step failed.
    Failed,
    /// The step was not run because an earlier step failed.
    Skipped,
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Complete => write!(f, "complete"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}
