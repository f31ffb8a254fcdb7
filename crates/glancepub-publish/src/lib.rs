//! # glancepub-publish
//!
//! Publish pipeline for Glance disk-image repositories.
//!
//! Handles:
//! - **Units**: image units and the repository being published.
//! - **Steps**: the step lifecycle and progress reporting through a conduit.
//! - **Images**: symlinking each image into the staged `web` directory.
//! - **Atomic publish**: swapping the staged tree into its public location.
//! - **Publisher**: the ordered `[images, atomic publish]` pipeline.
//! - **Distributor**: config validation, publish, and removal entry points.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod atomic;
pub mod conduit;
pub mod distributor;
pub mod fs;
pub mod hash;
pub mod images;
pub mod publisher;
pub mod redirect;
pub mod step;
pub mod unit;
pub mod working_dir;
