//! Action runner.
//!
//! Renders an action's template, prefixes the project's dotenv exports,
//! writes the result to a temp script under the project configuration
//! directory and runs it through `sh` in the target service (or on the
//! host). The exit status is classified into an [`Outcome`] and reported
//! through the [`Output`] sink.

use std::collections::BTreeMap;
use std::io::Write;

use addon_fs::{ConfigPath, dotenv};

use crate::action::Action;
use crate::dependency::RuntimeDeps;
use crate::error::{Error, Result};
use crate::output::{Level, Output};
use crate::project::{ExecOutput, ExecTarget, Project};
use crate::template::TemplateContext;

const SCRIPT_HEADER: &str = "set -eu\n";

/// How an action ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    /// Non-zero exit downgraded by `#ddev-warning-exit-code`.
    Warning { exit_code: Option<i32> },
    Failure { exit_code: Option<i32> },
}

/// Runs the actions of one add-on against one project.
pub struct ActionRunner<'a> {
    project: &'a dyn Project,
    output: &'a dyn Output,
    context: &'a TemplateContext,
    addon: &'a str,
    runtime_deps: Option<&'a RuntimeDeps>,
    verbose: bool,
}

impl<'a> ActionRunner<'a> {
    pub fn new(
        project: &'a dyn Project,
        output: &'a dyn Output,
        context: &'a TemplateContext,
        addon: &'a str,
    ) -> Self {
        Self {
            project,
            output,
            context,
            addon,
            runtime_deps: None,
            verbose: false,
        }
    }

    /// Echo each rendered script before running it.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Expose the side channel to actions as `DDEV_RUNTIME_DEPS_FILE`.
    pub fn runtime_deps(mut self, deps: &'a RuntimeDeps) -> Self {
        self.runtime_deps = Some(deps);
        self
    }

    /// Run every action in order, stopping at the first failure.
    pub fn run_phase(&self, phase: &str, actions: &[Action]) -> Result<()> {
        for (index, action) in actions.iter().enumerate() {
            tracing::debug!(addon = self.addon, phase, index, "Running action");
            if let Outcome::Failure { exit_code } = self.run(action)? {
                return Err(Error::ActionFailed {
                    addon: self.addon.to_string(),
                    description: action.description().map(str::to_string),
                    exit_code,
                });
            }
        }
        Ok(())
    }

    /// Run a single action and report it.
    pub fn run(&self, action: &Action) -> Result<Outcome> {
        let rendered = self.context.render(&action.body)?;
        if self.verbose {
            self.output
                .info(&format!("Executing action for {}:\n{}", self.addon, rendered.trim_end()));
        }

        let script = format!("{}{SCRIPT_HEADER}{rendered}\n", self.prelude()?);
        let result = self.execute(&action.exec_target(), &script)?;

        let outcome = if result.success() {
            Outcome::Success
        } else if action.warns_on_failure() {
            Outcome::Warning {
                exit_code: result.exit_code,
            }
        } else {
            Outcome::Failure {
                exit_code: result.exit_code,
            }
        };
        tracing::debug!(addon = self.addon, exit_code = ?result.exit_code, outcome = ?outcome, "Action finished");

        self.report(action.description(), &result.combined(), outcome);
        Ok(outcome)
    }

    fn prelude(&self) -> Result<String> {
        let config_dir = self.project.config_dir();
        let mut env = dotenv::read(&config_dir.join(ConfigPath::ProjectEnvFile))?;
        env.extend(dotenv::read(
            &config_dir.join(ConfigPath::addon_env_file(self.addon)),
        )?);
        Ok(dotenv::export_prelude(&env))
    }

    fn environment(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("DDEV_PROJECT".to_string(), self.project.name().to_string());
        env.insert(
            "DDEV_PROJECT_TYPE".to_string(),
            self.project.project_type().to_string(),
        );
        env.insert(
            "DDEV_APPROOT".to_string(),
            self.project.approot().to_string_lossy().into_owned(),
        );
        env.insert("DDEV_ADDON_NAME".to_string(), self.addon.to_string());
        if let Some(deps) = self.runtime_deps {
            env.insert(
                "DDEV_RUNTIME_DEPS_FILE".to_string(),
                deps.env_value().to_string(),
            );
        }
        env
    }

    fn execute(&self, target: &ExecTarget, script: &str) -> Result<ExecOutput> {
        let config_dir = self.project.config_dir();
        std::fs::create_dir_all(&config_dir).map_err(|e| addon_fs::Error::io(&config_dir, e))?;

        let mut file = tempfile::Builder::new()
            .prefix(".addon-action-")
            .suffix(".sh")
            .tempfile_in(&config_dir)?;
        file.write_all(script.as_bytes())?;
        file.as_file().sync_all()?;

        let script_name = file
            .path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let command = vec!["sh".to_string(), script_name];
        let env = self.environment();

        let result = match target {
            ExecTarget::Host => self.project.exec_on_host(&command, &env),
            ExecTarget::Service(service) => self.project.exec_in_service(service, &command, &env),
        };
        drop(file);
        Ok(result?)
    }

    fn report(&self, description: Option<&str>, text: &str, outcome: Outcome) {
        let (level, glyph) = match outcome {
            Outcome::Success => (Level::Success, "✓"),
            Outcome::Warning { .. } => (Level::Warning, "⚠"),
            Outcome::Failure { .. } => (Level::Failure, "✗"),
        };

        match (description, text.is_empty()) {
            (Some(desc), true) => self.output.emit(level, &format!("{glyph} {desc}")),
            (Some(desc), false) => {
                self.output.emit(level, &format!("{glyph} {desc}"));
                self.output.emit(level, text);
            }
            (None, false) => self.output.emit(level, text),
            (None, true) => match outcome {
                Outcome::Success => {}
                Outcome::Warning { exit_code } | Outcome::Failure { exit_code } => {
                    self.output.emit(
                        level,
                        &format!(
                            "{glyph} An action of add-on {} exited with {}",
                            self.addon,
                            exit_code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}"))
                        ),
                    );
                }
            },
        }
    }
}
