//! Step abstraction and lifecycle.
//!
//! A step is one named piece of publish work. [`run_step`] drives a step
//! through `initialize`, then either `process_unit` for every unit of the
//! step's unit type or `process_main`, then `finalize`, reporting progress
//! through the conduit after every state change.

use std::fmt;
use std::path::{Path, PathBuf};

use glancepub_common::config::PluginConfig;
use glancepub_common::constants::WEB_DIR_NAME;
use glancepub_common::error::Result;
use glancepub_common::types::StepState;

use crate::conduit::{PublishConduit, StepProgress};
use crate::unit::{Repository, Unit};

/// Everything a step may read while running.
#[derive(Clone, Copy)]
pub struct StepContext<'a> {
    /// Repository being published.
    pub repo: &'a Repository,
    /// Conduit for units and progress.
    pub conduit: &'a dyn PublishConduit,
    /// Plugin configuration for this call.
    pub config: &'a PluginConfig,
    /// Working directory the steps stage files in.
    pub working_dir: &'a Path,
}

impl StepContext<'_> {
    /// Returns the staging directory for web-servable files.
    #[must_use]
    pub fn web_dir(&self) -> PathBuf {
        self.working_dir.join(WEB_DIR_NAME)
    }
}

impl fmt::Debug for StepContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepContext")
            .field("repo", &self.repo.id)
            .field("working_dir", &self.working_dir)
            .finish_non_exhaustive()
    }
}

/// A unit of publish work.
pub trait Step: fmt::Debug {
    /// Stable identifier of the step kind.
    fn step_type(&self) -> &'static str;

    /// Human-readable description used in progress reports.
    fn description(&self) -> &str;

    /// Unit type this step iterates, or `None` for steps that only run
    /// [`Step::process_main`].
    fn unit_type(&self) -> Option<&'static str> {
        None
    }

    /// Prepares the step before any processing.
    ///
    /// # Errors
    ///
    /// Returns an error if preparation fails.
    fn initialize(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Processes a single unit.
    ///
    /// # Errors
    ///
    /// Returns an error if the unit cannot be processed.
    fn process_unit(&mut self, _ctx: &StepContext<'_>, _unit: &Unit) -> Result<()> {
        Ok(())
    }

    /// Performs the step's work when it does not iterate units.
    ///
    /// # Errors
    ///
    /// Returns an error if the work fails.
    fn process_main(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Completes the step after processing.
    ///
    /// # Errors
    ///
    /// Returns an error if finalization fails.
    fn finalize(&mut self, _ctx: &StepContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Progress of a sequence of steps, pushed to the conduit on every update.
pub struct ProgressTracker<'a> {
    conduit: &'a dyn PublishConduit,
    steps: Vec<StepProgress>,
}

impl<'a> ProgressTracker<'a> {
    /// Creates a tracker with one not-started record per step.
    #[must_use]
    pub fn new(conduit: &'a dyn PublishConduit, steps: &[Box<dyn Step>]) -> Self {
        Self {
            conduit,
            steps: steps
                .iter()
                .map(|s| StepProgress::new(s.step_type(), s.description()))
                .collect(),
        }
    }

    /// Applies `f` to the record at `index` and reports all records.
    pub fn update(&mut self, index: usize, f: impl FnOnce(&mut StepProgress)) {
        if let Some(progress) = self.steps.get_mut(index) {
            f(progress);
            self.conduit.set_progress(&self.steps);
        }
    }

    /// Marks every not-started step from `index` onwards as skipped.
    pub fn skip_from(&mut self, index: usize) {
        let mut changed = false;
        for progress in self.steps.iter_mut().skip(index) {
            if progress.state == StepState::NotStarted {
                progress.state = StepState::Skipped;
                changed = true;
            }
        }
        if changed {
            self.conduit.set_progress(&self.steps);
        }
    }

    /// Returns the current records.
    #[must_use]
    pub fn steps(&self) -> &[StepProgress] {
        &self.steps
    }

    /// Consumes the tracker, returning the records.
    #[must_use]
    pub fn into_steps(self) -> Vec<StepProgress> {
        self.steps
    }
}

impl fmt::Debug for ProgressTracker<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("steps", &self.steps)
            .finish_non_exhaustive()
    }
}

/// Runs one step through its lifecycle, recording progress at `index`.
///
/// # Errors
///
/// Returns the first error raised by the step; the progress record is
/// marked failed before the error is returned.
pub fn run_step(
    step: &mut dyn Step,
    ctx: &StepContext<'_>,
    tracker: &mut ProgressTracker<'_>,
    index: usize,
) -> Result<()> {
    let step_type = step.step_type();
    tracing::info!(step = step_type, repo = %ctx.repo.id, "starting step");
    tracker.update(index, |p| p.state = StepState::InProgress);

    match run_lifecycle(step, ctx, tracker, index) {
        Ok(()) => {
            tracker.update(index, |p| p.state = StepState::Complete);
            tracing::info!(step = step_type, "step complete");
            Ok(())
        }
        Err(e) => {
            tracing::error!(step = step_type, error = %e, "step failed");
            tracker.update(index, |p| {
                p.state = StepState::Failed;
                p.error_details.push(e.to_string());
            });
            Err(e)
        }
    }
}

fn run_lifecycle(
    step: &mut dyn Step,
    ctx: &StepContext<'_>,
    tracker: &mut ProgressTracker<'_>,
    index: usize,
) -> Result<()> {
    step.initialize(ctx)?;

    if let Some(type_id) = step.unit_type() {
        let units = ctx.conduit.units(type_id)?;
        tracker.update(index, |p| p.items_total = units.len());
        for unit in &units {
            let outcome = step.process_unit(ctx, unit);
            let ok = outcome.is_ok();
            tracker.update(index, |p| {
                p.num_processed += 1;
                if ok {
                    p.num_success += 1;
                } else {
                    p.num_failures += 1;
                }
            });
            outcome?;
        }
    } else {
        step.process_main(ctx)?;
    }

    step.finalize(ctx)
}
