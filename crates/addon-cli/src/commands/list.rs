//! The `add-on list` command

use addon_core::{ManifestStore, Output, Project, ReleaseSource, RepositorySummary};

use super::{ADDON_TOPIC, OFFICIAL_ORG};
use crate::error::Result;

/// List add-ons in the catalog: the official ones, or every repository with
/// the add-on topic when `all` is set.
pub fn run_list(source: &dyn ReleaseSource, output: &dyn Output, all: bool) -> Result<()> {
    let query = if all {
        format!("topic:{ADDON_TOPIC}")
    } else {
        format!("topic:{ADDON_TOPIC} org:{OFFICIAL_ORG}")
    };
    let mut repositories = source.search_repositories(&query)?;
    repositories.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    let label = if all { "add-ons" } else { "official add-ons" };
    print_repositories(output, &repositories, label);
    Ok(())
}

/// List the add-ons installed in `project`.
pub fn run_list_installed(project: &dyn Project, output: &dyn Output) -> Result<()> {
    let manifests = ManifestStore::new(&project.config_dir()).list()?;

    if manifests.is_empty() {
        output.info(&format!("No add-ons installed in project {}", project.name()));
    } else {
        for manifest in &manifests {
            let version = if manifest.version.is_empty() {
                "-"
            } else {
                manifest.version.as_str()
            };
            output.info(&format!(
                "{:<24} {:<12} {}",
                manifest.name, version, manifest.repository
            ));
        }
        output.info(&format!(
            "{} add-on(s) installed in project {}",
            manifests.len(),
            project.name()
        ));
    }

    let value = serde_json::to_value(&manifests).unwrap_or_default();
    output.payload("installed", &value);
    Ok(())
}

pub(crate) fn print_repositories(output: &dyn Output, repositories: &[RepositorySummary], label: &str) {
    if repositories.is_empty() {
        output.info(&format!("No {label} found"));
    } else {
        for repo in repositories {
            output.info(&format!(
                "{:<40} {}",
                repo.full_name,
                repo.description.as_deref().unwrap_or_default()
            ));
        }
        output.info(&format!("{} {label} found", repositories.len()));
    }

    let value = serde_json::to_value(repositories).unwrap_or_default();
    output.payload("addons", &value);
}
