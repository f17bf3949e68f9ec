//! Shared test utilities for the add-on manager workspace.
//!
//! Dev-dependency only; never published.
//!
//! # Modules
//!
//! - [`project`]: [`TestProject`], a temp project whose actions run locally
//! - [`addon`]: [`AddonFixture`], add-on directories and tarballs on disk
//! - [`release`]: [`StaticReleaseSource`], an offline provider

pub mod addon;
pub mod project;
pub mod release;

pub use addon::AddonFixture;
pub use project::{ExecRecord, TestProject};
pub use release::StaticReleaseSource;
