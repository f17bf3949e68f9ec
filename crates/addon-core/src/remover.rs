//! Add-on removal.
//!
//! Replays the manifest's removal actions in reverse, deletes the files the
//! add-on still owns and finally drops the manifest. Removal is best effort:
//! failing actions and user-owned files produce warnings, never errors.

use std::path::Path;

use addon_fs::Verdict;

use crate::action::{Action, Flag};
use crate::descriptor::Descriptor;
use crate::error::Result;
use crate::manifest::{Manifest, ManifestStore};
use crate::output::Output;
use crate::project::{Project, ProjectContext};
use crate::runner::ActionRunner;
use crate::template::TemplateContext;

/// Removes installed add-ons from one project.
pub struct Remover<'a> {
    project: &'a dyn Project,
    output: &'a dyn Output,
    verbose: bool,
    store: ManifestStore,
}

impl<'a> Remover<'a> {
    pub fn new(project: &'a dyn Project, output: &'a dyn Output) -> Self {
        Self {
            project,
            output,
            verbose: false,
            store: ManifestStore::new(&project.config_dir()),
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Remove the add-on matching `identifier` and return its manifest.
    pub fn remove(&self, identifier: &str) -> Result<Manifest> {
        let manifest = self.store.get(identifier)?;
        tracing::info!(addon = %manifest.name, "Removing add-on");

        self.run_removal_actions(&manifest)?;

        let config_dir = self.project.config_dir();
        let global_dir = self.project.global_config_path();
        for rel in &manifest.project_files {
            self.remove_file(&config_dir.join(rel));
        }
        for rel in &manifest.global_files {
            self.remove_file(&global_dir.join(rel));
        }

        self.store.delete(&manifest.name)?;
        self.output
            .success(&format!("✓ Removed add-on {}", manifest.name));
        if let Ok(value) = serde_json::to_value(&manifest) {
            self.output.payload("removed", &value);
        }
        Ok(manifest)
    }

    fn run_removal_actions(&self, manifest: &Manifest) -> Result<()> {
        if manifest.removal_actions.is_empty() {
            return Ok(());
        }

        let descriptor = Descriptor {
            name: manifest.name.clone(),
            dependencies: manifest.dependencies.clone(),
            project_files: manifest.project_files.clone(),
            global_files: manifest.global_files.clone(),
            removal_actions: manifest.removal_actions.clone(),
            ..Descriptor::default()
        };
        let context = TemplateContext::load(
            &ProjectContext::from_project(self.project),
            &descriptor,
            &self.project.config_dir(),
        )?;
        let runner = ActionRunner::new(self.project, self.output, &context, &manifest.name)
            .verbose(self.verbose);

        for body in manifest.removal_actions.iter().rev() {
            let mut action = Action::parse(body);
            action.flags.insert(Flag::WarningExitCode);
            if let Err(e) = runner.run(&action) {
                tracing::warn!(addon = %manifest.name, error = %e, "Removal action could not run");
                self.output
                    .warning(&format!("⚠ Removal action could not run: {e}"));
            }
        }
        Ok(())
    }

    fn remove_file(&self, path: &Path) {
        if std::fs::symlink_metadata(path).is_err() {
            tracing::debug!(path = %path.display(), "Registered file already gone");
            return;
        }
        match addon_fs::may_overwrite(path) {
            Verdict::Yes => match addon_fs::io::remove_file_if_exists(path) {
                Ok(_) => {
                    tracing::debug!(path = %path.display(), "Removed file");
                    self.output.success(&format!("✓ Removed {}", path.display()));
                }
                Err(e) => self
                    .output
                    .warning(&format!("⚠ Could not remove {}: {e}", path.display())),
            },
            Verdict::No { reason } => {
                tracing::warn!(path = %path.display(), %reason, "Keeping user-owned file");
                self.output.warning(&format!(
                    "⚠ Not removing {}: {reason}",
                    path.display()
                ));
            }
        }
    }
}
