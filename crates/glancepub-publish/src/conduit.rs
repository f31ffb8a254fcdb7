//! Publish conduit: the channel steps use to fetch units and report progress.

use std::path::Path;

use glancepub_common::error::Result;
use glancepub_common::types::StepState;
use serde::{Deserialize, Serialize};

use crate::unit::Unit;

/// Progress record of a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepProgress {
    /// Step type id.
    pub step_type: String,
    /// Human-readable description.
    pub description: String,
    /// Current lifecycle state.
    pub state: StepState,
    /// Number of units the step will process.
    pub items_total: usize,
    /// Number of units processed so far.
    pub num_processed: usize,
    /// Number of units processed successfully.
    pub num_success: usize,
    /// Number of units that failed.
    pub num_failures: usize,
    /// Error messages collected while running.
    pub error_details: Vec<String>,
}

impl StepProgress {
    /// Creates a not-started record for a step.
    #[must_use]
    pub fn new(step_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            step_type: step_type.into(),
            description: description.into(),
            ..Self::default()
        }
    }
}

/// Host-side callbacks available to publish steps.
pub trait PublishConduit {
    /// Returns the repository's units of the given type.
    ///
    /// # Errors
    ///
    /// Returns an error if units cannot be fetched.
    fn units(&self, type_id: &str) -> Result<Vec<Unit>>;

    /// Receives the progress of every step after each state change.
    fn set_progress(&self, progress: &[StepProgress]);
}

/// Conduit serving units from an in-memory list, typically a JSON manifest.
#[derive(Debug, Clone, Default)]
pub struct ManifestConduit {
    units: Vec<Unit>,
}

impl ManifestConduit {
    /// Creates a conduit over the given units.
    #[must_use]
    pub const fn new(units: Vec<Unit>) -> Self {
        Self { units }
    }

    /// Loads the units from a JSON manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        Ok(Self::new(crate::unit::load_units(path)?))
    }
}

impl PublishConduit for ManifestConduit {
    fn units(&self, type_id: &str) -> Result<Vec<Unit>> {
        Ok(self
            .units
            .iter()
            .filter(|u| u.type_id == type_id)
            .cloned()
            .collect())
    }

    fn set_progress(&self, progress: &[StepProgress]) {
        for step in progress {
            tracing::debug!(
                step = %step.step_type,
                state = %step.state,
                processed = step.num_processed,
                total = step.items_total,
                "publish progress"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_conduit_filters_by_type() {
        let mut other = Unit::image("d41d8cd98f00b204e9800998ecf8427e", "/tmp/other");
        other.type_id = "iso".into();
        let conduit = ManifestConduit::new(vec![
            Unit::image("d41d8cd98f00b204e9800998ecf8427e", "/tmp/a.qcow2"),
            other,
        ]);

        let images = conduit.units("glance_image").expect("units");
        assert_eq!(images.len(), 1);
        assert!(conduit.units("rpm").expect("units").is_empty());
    }

    #[test]
    fn new_progress_is_not_started() {
        let progress = StepProgress::new("publish_images", "Publishing Image Files.");
        assert_eq!(progress.state, StepState::NotStarted);
        assert_eq!(progress.items_total, 0);
    }
}
