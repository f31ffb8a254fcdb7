//! Content units and repositories as seen by the publish pipeline.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use glancepub_common::constants::{IMAGE_TYPE_ID, UNIT_KEY_IMAGE_CHECKSUM};
use glancepub_common::error::{GlancepubError, Result};
use glancepub_common::types::{ImageChecksum, RepoId};
use serde::{Deserialize, Serialize};

/// A content unit already stored on local disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Unit {
    /// Content type of the unit.
    #[serde(default = "default_type_id")]
    pub type_id: String,
    /// Fields that uniquely identify the unit within its type.
    pub unit_key: BTreeMap<String, String>,
    /// Additional, type-specific metadata.
    #[serde(default)]
    pub metadata: BTreeMap<String, serde_json::Value>,
    /// Absolute location of the stored artifact.
    pub storage_path: PathBuf,
}

fn default_type_id() -> String {
    IMAGE_TYPE_ID.to_string()
}

impl Unit {
    /// Creates a Glance image unit.
    #[must_use]
    pub fn image(checksum: impl Into<String>, storage_path: impl Into<PathBuf>) -> Self {
        let mut unit_key = BTreeMap::new();
        let _ = unit_key.insert(UNIT_KEY_IMAGE_CHECKSUM.to_string(), checksum.into());
        Self {
            type_id: default_type_id(),
            unit_key,
            metadata: BTreeMap::new(),
            storage_path: storage_path.into(),
        }
    }

    /// Returns the validated image checksum from the unit key.
    ///
    /// # Errors
    ///
    /// Returns `GlancepubError::InvalidUnit` if the key is missing or malformed.
    pub fn image_checksum(&self) -> Result<ImageChecksum> {
        let raw = self
            .unit_key
            .get(UNIT_KEY_IMAGE_CHECKSUM)
            .ok_or_else(|| GlancepubError::InvalidUnit {
                message: format!(
                    "unit at {} has no {UNIT_KEY_IMAGE_CHECKSUM}",
                    self.storage_path.display()
                ),
            })?;
        ImageChecksum::from_hex(raw.as_str())
    }

    /// Returns the file name of the storage path.
    ///
    /// # Errors
    ///
    /// Returns `GlancepubError::InvalidUnit` if the storage path has no file name.
    pub fn storage_file_name(&self) -> Result<&str> {
        self.storage_path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| GlancepubError::InvalidUnit {
                message: format!(
                    "storage path {} has no usable file name",
                    self.storage_path.display()
                ),
            })
    }
}

/// Loads a JSON array of units.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_units(path: &Path) -> Result<Vec<Unit>> {
    tracing::debug!(path = %path.display(), "loading unit manifest");
    let content = std::fs::read_to_string(path).map_err(GlancepubError::io(path))?;
    Ok(serde_json::from_str(&content)?)
}

/// A repository being published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    /// Repository identifier; also the public directory name.
    pub id: RepoId,
}

impl Repository {
    /// Creates a repository.
    ///
    /// # Errors
    ///
    /// Returns an error if the ID is not usable as a directory name.
    pub fn new(id: impl Into<String>) -> Result<Self> {
        Ok(Self {
            id: RepoId::new(id)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_unit_exposes_checksum_and_file_name() {
        let unit = Unit::image(
            "d41d8cd98f00b204e9800998ecf8427e",
            "/var/lib/content/fake-zero-byte-image.qcow2",
        );
        assert_eq!(unit.type_id, IMAGE_TYPE_ID);
        assert_eq!(
            unit.image_checksum().unwrap().as_hex(),
            "d41d8cd98f00b204e9800998ecf8427e"
        );
        assert_eq!(unit.storage_file_name().unwrap(), "fake-zero-byte-image.qcow2");
    }

    #[test]
    fn missing_checksum_is_invalid_unit() {
        let mut unit = Unit::image("d41d8cd98f00b204e9800998ecf8427e", "/tmp/a.img");
        unit.unit_key.clear();
        assert!(matches!(
            unit.image_checksum(),
            Err(GlancepubError::InvalidUnit { .. })
        ));
    }

    #[test]
    fn root_storage_path_has_no_file_name() {
        let unit = Unit::image("d41d8cd98f00b204e9800998ecf8427e", "/");
        assert!(unit.storage_file_name().is_err());
    }

    #[test]
    fn load_units_defaults_type_and_metadata() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("units.json");
        std::fs::write(
            &path,
            r#"[{"unit_key": {"image_checksum": "d41d8cd98f00b204e9800998ecf8427e"},
                 "storage_path": "/srv/content/cirros.qcow2"}]"#,
        )
        .expect("write");

        let units = load_units(&path).expect("load");
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].type_id, IMAGE_TYPE_ID);
        assert!(units[0].metadata.is_empty());
    }

    #[test]
    fn repository_rejects_bad_ids() {
        assert!(Repository::new("../etc").is_err());
        assert_eq!(Repository::new("foo").unwrap().id.as_str(), "foo");
    }
}
