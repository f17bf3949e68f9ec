//! Add-on subsystem for the add-on manager.
//!
//! This crate fetches add-ons from directories, archives and the hosting
//! provider, installs them into a project together with their
//! dependencies, and removes them again.

pub mod action;
pub mod cancel;
pub mod dependency;
pub mod deploy;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod github;
pub mod installer;
pub mod manifest;
pub mod output;
pub mod project;
pub mod release;
pub mod remover;
pub mod runner;
pub mod source;
pub mod template;
pub mod version;

pub use action::{Action, Flag, Header};
pub use cancel::CancelToken;
pub use dependency::{DependencyChain, RuntimeDeps};
pub use deploy::{Deployment, deploy};
pub use descriptor::{Descriptor, parse_descriptor};
pub use error::{Error, ErrorKind, Result};
pub use fetch::{Downloader, Fetcher, WorkDir};
pub use github::GitHubClient;
pub use installer::{InstallReport, InstallRequest, Installer};
pub use manifest::{Manifest, ManifestStore};
pub use output::{Level, NullOutput, Output, RecordingOutput};
pub use project::{ExecOutput, ExecTarget, Project, ProjectContext};
pub use release::{Release, ReleaseSelector, ReleaseSource, RepositorySummary, ResolvedRelease};
pub use remover::Remover;
pub use runner::{ActionRunner, Outcome};
pub use source::SourceRef;
pub use template::TemplateContext;
pub use version::VersionConstraint;
