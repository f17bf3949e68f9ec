//! The `add-on get` command

use std::path::Path;

use addon_core::{
    CancelToken, Downloader, InstallReport, InstallRequest, Installer, Output, Project, ReleaseSelector,
    ReleaseSource,
};

use crate::error::Result;

/// Flags of `add-on get` after parsing.
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub release_version: Option<String>,
    pub pr: Option<i64>,
    pub default_branch: bool,
    pub skip_deps: bool,
    pub verbose: bool,
    /// Set by the interrupt handler.
    pub cancel: CancelToken,
}

/// Install `source` into `project`. Relative local sources resolve against
/// `base_dir`.
#[allow(clippy::too_many_arguments)]
pub fn run_get(
    project: &dyn Project,
    output: &dyn Output,
    releases: &dyn ReleaseSource,
    downloader: &dyn Downloader,
    host_version: &str,
    base_dir: &Path,
    source: &str,
    options: &GetOptions,
) -> Result<InstallReport> {
    let selector = ReleaseSelector::from_flags(
        options.release_version.as_deref(),
        options.pr,
        options.default_branch,
    )?;

    let request = InstallRequest {
        reference: source.to_string(),
        selector,
        skip_deps: options.skip_deps,
        verbose: options.verbose,
    };
    let report = Installer::new(project, output, releases, downloader, host_version, base_dir)
        .cancel_token(options.cancel.clone())
        .install(&request)?;

    if let Some(root) = report.root() {
        tracing::info!(addon = %root.name, installed = report.installed.len(), "Install complete");
        output.info(&format!(
            "Restart project {} to apply {}",
            project.name(),
            root.name
        ));
    }
    Ok(report)
}
