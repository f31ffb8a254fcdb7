//! Integration tests for the Glance publish steps.
//!
//! Covered scenarios:
//! 1. Linking a single image unit into `<working>/web`
//! 2. Finalize delegating to the redirect context exactly once
//! 3. Web publisher construction (child order, working dir resolution)
//! 4. Full publish through the distributor, including failure handling

#![allow(clippy::expect_used, clippy::unwrap_used)]
#![cfg(unix)]

use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use glancepub_common::config::{GlancepubConfig, PluginConfig};
use glancepub_common::constants::{
    CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY, PUBLISH_STEP_IMAGES, PUBLISH_STEP_OVER_HTTP,
    PUBLISH_STEP_WEB_PUBLISHER,
};
use glancepub_common::error::Result;
use glancepub_common::types::StepState;
use glancepub_publish::conduit::{ManifestConduit, PublishConduit, StepProgress};
use glancepub_publish::distributor::GlanceDistributor;
use glancepub_publish::images::PublishImagesStep;
use glancepub_publish::publisher::WebPublisher;
use glancepub_publish::redirect::{RedirectContext, RedirectEntry, RedirectListing};
use glancepub_publish::step::{Step, StepContext};
use glancepub_publish::unit::{Repository, Unit};
use glancepub_publish::working_dir::WorkingDirResolver;

const EMPTY_MD5: &str = "d41d8cd98f00b204e9800998ecf8427e";
const FAKE_IMAGE: &str = "fake-zero-byte-image.qcow2";

// ── Fakes ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct RecordingRedirect {
    initialized: Rc<Cell<usize>>,
    finalized: Rc<Cell<usize>>,
    images: Rc<RefCell<Vec<RedirectEntry>>>,
}

impl RedirectContext for RecordingRedirect {
    fn initialize(&mut self) -> Result<()> {
        self.initialized.set(self.initialized.get() + 1);
        Ok(())
    }

    fn add_image(&mut self, entry: RedirectEntry) -> Result<()> {
        self.images.borrow_mut().push(entry);
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        self.finalized.set(self.finalized.get() + 1);
        Ok(())
    }
}

struct CountingResolver {
    dir: PathBuf,
    calls: Cell<usize>,
}

impl CountingResolver {
    fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            calls: Cell::new(0),
        }
    }
}

impl WorkingDirResolver for CountingResolver {
    fn resolve(&self) -> Result<PathBuf> {
        self.calls.set(self.calls.get() + 1);
        std::fs::create_dir_all(&self.dir).expect("mkdir working");
        Ok(self.dir.clone())
    }
}

#[derive(Default)]
struct RecordingConduit {
    units: Vec<Unit>,
    updates: RefCell<Vec<Vec<StepProgress>>>,
}

impl PublishConduit for RecordingConduit {
    fn units(&self, type_id: &str) -> Result<Vec<Unit>> {
        Ok(self.units.iter().filter(|u| u.type_id == type_id).cloned().collect())
    }

    fn set_progress(&self, progress: &[StepProgress]) {
        self.updates.borrow_mut().push(progress.to_vec());
    }
}

struct Layout {
    _temp: tempfile::TempDir,
    working: PathBuf,
    publish: PathBuf,
    content: PathBuf,
}

impl Layout {
    fn new() -> Self {
        let temp = tempfile::tempdir().expect("tempdir");
        let working = temp.path().join("working");
        let publish = temp.path().join("publish");
        let content = temp.path().join("content");
        for dir in [&working, &publish, &content] {
            std::fs::create_dir_all(dir).expect("mkdir");
        }
        Self {
            _temp: temp,
            working,
            publish,
            content,
        }
    }

    fn touch_image(&self, name: &str) -> Unit {
        let path = self.content.join(name);
        std::fs::write(&path, b"").expect("touch");
        Unit::image(EMPTY_MD5, path)
    }

    fn config(&self) -> PluginConfig {
        PluginConfig::from_pairs([(
            CONFIG_KEY_GLANCE_PUBLISH_DIRECTORY,
            self.publish.display().to_string(),
        )])
    }
}

fn step_context<'a>(
    repo: &'a Repository,
    conduit: &'a dyn PublishConduit,
    config: &'a PluginConfig,
    working_dir: &'a Path,
) -> StepContext<'a> {
    StepContext {
        repo,
        conduit,
        config,
        working_dir,
    }
}

// ── PublishImagesStep ────────────────────────────────────────────────

#[test]
fn process_unit_links_image_into_web_dir() {
    let layout = Layout::new();
    let repo = Repository::new("foo_repo_id").unwrap();
    let conduit = ManifestConduit::default();
    let config = PluginConfig::default();
    let unit = layout.touch_image(FAKE_IMAGE);

    let mut step = PublishImagesStep::new();
    let ctx = step_context(&repo, &conduit, &config, &layout.publish);
    step.process_unit(&ctx, &unit).expect("process_unit");

    let expected_symlink = layout.publish.join("web").join(FAKE_IMAGE);
    assert!(expected_symlink.exists());
    assert_eq!(std::fs::read_link(&expected_symlink).unwrap(), unit.storage_path);
}

#[test]
fn finalize_delegates_to_redirect_context_once() {
    let layout = Layout::new();
    let repo = Repository::new("foo_repo_id").unwrap();
    let conduit = ManifestConduit::default();
    let config = PluginConfig::default();
    let redirect = RecordingRedirect::default();
    let finalized = Rc::clone(&redirect.finalized);

    let mut step = PublishImagesStep::new().with_redirect_context(Box::new(redirect));
    let ctx = step_context(&repo, &conduit, &config, &layout.working);
    step.finalize(&ctx).expect("finalize");

    assert_eq!(finalized.get(), 1);
}

#[test]
fn processed_units_are_reported_to_redirect_context() {
    let layout = Layout::new();
    let repo = Repository::new("foo_repo_id").unwrap();
    let conduit = ManifestConduit::default();
    let config = PluginConfig::default();
    let redirect = RecordingRedirect::default();
    let (initialized, images) = (Rc::clone(&redirect.initialized), Rc::clone(&redirect.images));
    let unit = layout.touch_image(FAKE_IMAGE);

    let mut step = PublishImagesStep::new().with_redirect_context(Box::new(redirect));
    let ctx = step_context(&repo, &conduit, &config, &layout.working);
    step.initialize(&ctx).expect("initialize");
    step.process_unit(&ctx, &unit).expect("process_unit");

    assert_eq!(initialized.get(), 1);
    let images = images.borrow();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].filename, FAKE_IMAGE);
    assert_eq!(images[0].checksum, EMPTY_MD5);
    assert_eq!(images[0].url, format!("/pulp/glance/foo_repo_id/{FAKE_IMAGE}"));
}

// ── WebPublisher ─────────────────────────────────────────────────────

#[test]
fn web_publisher_builds_images_then_directory_step() {
    let layout = Layout::new();
    let repo = Repository::new("foo").unwrap();
    let conduit = RecordingConduit::default();
    let config = layout.config();
    let resolver = CountingResolver::new(layout.working.join("work"));

    let publisher = WebPublisher::new(&repo, &conduit, &config, &resolver).expect("publisher");

    let types: Vec<_> = publisher.children().iter().map(|c| c.step_type()).collect();
    assert_eq!(types, [PUBLISH_STEP_IMAGES, PUBLISH_STEP_OVER_HTTP]);
    assert_eq!(resolver.calls.get(), 1);
    assert_eq!(publisher.working_dir(), layout.working.join("work"));
    assert_eq!(publisher.step_type(), PUBLISH_STEP_WEB_PUBLISHER);
    assert_eq!(publisher.paths().web_dir, layout.publish.join("web").join("foo"));
    assert_eq!(publisher.paths().master_dir, layout.publish.join("master").join("foo"));
}

#[test]
fn web_publisher_requires_publish_directory() {
    let layout = Layout::new();
    let repo = Repository::new("foo").unwrap();
    let conduit = RecordingConduit::default();
    let config = PluginConfig::default();
    let resolver = CountingResolver::new(layout.working.join("work"));

    assert!(WebPublisher::new(&repo, &conduit, &config, &resolver).is_err());
}

#[test]
fn web_publisher_publishes_images_over_http() {
    let layout = Layout::new();
    let repo = Repository::new("foo").unwrap();
    let conduit = RecordingConduit {
        units: vec![layout.touch_image(FAKE_IMAGE), layout.touch_image("cirros.raw")],
        ..RecordingConduit::default()
    };
    let config = layout.config();
    let resolver = CountingResolver::new(layout.working.join("work"));

    let mut publisher = WebPublisher::new(&repo, &conduit, &config, &resolver).expect("publisher");
    let report = publisher.publish().expect("publish");

    assert!(report.success);
    assert_eq!(report.images_published, 2);
    assert!(report.steps.iter().all(|s| s.state == StepState::Complete));

    let public = layout.publish.join("web").join("foo");
    assert!(std::fs::symlink_metadata(&public).unwrap().file_type().is_symlink());
    assert!(public.join(FAKE_IMAGE).exists());
    assert!(public.join("cirros.raw").exists());

    let listing: RedirectListing =
        serde_json::from_str(&std::fs::read_to_string(public.join("redirect.json")).unwrap())
            .unwrap();
    assert_eq!(listing.images.len(), 2);

    let last = conduit.updates.borrow().last().cloned().expect("progress reported");
    assert_eq!(last[0].num_success, 2);
}

#[test]
fn failing_image_skips_directory_publish() {
    let layout = Layout::new();
    let repo = Repository::new("foo").unwrap();
    let conduit = RecordingConduit {
        units: vec![Unit::image(EMPTY_MD5, layout.content.join("missing.qcow2"))],
        ..RecordingConduit::default()
    };
    let config = layout.config();
    let resolver = CountingResolver::new(layout.working.join("work"));

    let mut publisher = WebPublisher::new(&repo, &conduit, &config, &resolver).expect("publisher");
    assert!(publisher.publish().is_err());

    let last = conduit.updates.borrow().last().cloned().expect("progress reported");
    assert_eq!(last[0].state, StepState::Failed);
    assert_eq!(last[1].state, StepState::Skipped);
    assert!(!layout.publish.join("web").join("foo").exists());
}

// ── Distributor ──────────────────────────────────────────────────────

#[test]
fn distributor_publish_cleans_working_directory() {
    let layout = Layout::new();
    let settings = GlancepubConfig {
        working_root: layout.working.clone(),
        ..GlancepubConfig::default()
    };
    let distributor = GlanceDistributor::new(settings);
    let repo = Repository::new("foo").unwrap();
    let conduit = ManifestConduit::new(vec![layout.touch_image(FAKE_IMAGE)]);

    let report = distributor
        .publish_repo(&repo, &conduit, &layout.config())
        .expect("publish");

    assert!(report.success);
    assert!(layout.publish.join("web").join("foo").join(FAKE_IMAGE).exists());
    assert_eq!(std::fs::read_dir(&layout.working).unwrap().count(), 0);

    distributor
        .distributor_removed(&repo, &layout.config())
        .expect("remove");
    assert!(std::fs::symlink_metadata(layout.publish.join("web").join("foo")).is_err());
    assert!(!layout.publish.join("master").join("foo").exists());
}
