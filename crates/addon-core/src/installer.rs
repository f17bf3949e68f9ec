//! Add-on installation.
//!
//! Installation runs in two stages. Planning walks the static dependency
//! tree depth-first with an explicit worklist: every add-on is fetched, its
//! descriptor parsed, its version constraint checked and its place on the
//! [`DependencyChain`] validated before anything touches the project.
//! Execution then installs the plan in dependency order. Runtime
//! dependencies an add-on requests through its side channel are planned
//! and installed before that add-on's manifest is written.
//!
//! Every planned add-on keeps a snapshot of the [`DependencyChain`] that led
//! to it, so a runtime request for one of its ancestors is a cycle even
//! though that ancestor has not been installed yet. A runtime request for a
//! planned but not yet installed add-on installs it on the spot; its later
//! place in the plan is then skipped.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Utc;

use crate::cancel::CancelToken;
use crate::deploy::{Deployment, deploy};
use crate::dependency::{DependencyChain, RuntimeDeps};
use crate::descriptor::Descriptor;
use crate::error::{Error, Result};
use crate::fetch::{Downloader, Fetcher, WorkDir};
use crate::manifest::{Manifest, ManifestStore};
use crate::output::Output;
use crate::project::{Project, ProjectContext};
use crate::release::{self, ReleaseSelector, ReleaseSource};
use crate::runner::ActionRunner;
use crate::source::SourceRef;
use crate::template::TemplateContext;
use crate::version;

/// What the user asked to install.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    pub reference: String,
    pub selector: ReleaseSelector,
    /// Skip static and runtime dependencies.
    pub skip_deps: bool,
    pub verbose: bool,
}

impl InstallRequest {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            ..Self::default()
        }
    }
}

/// Manifests written by one install, in installation order. The requested
/// add-on comes last.
#[derive(Debug, Clone, Default)]
pub struct InstallReport {
    pub installed: Vec<Manifest>,
}

impl InstallReport {
    pub fn root(&self) -> Option<&Manifest> {
        self.installed.last()
    }
}

#[derive(Debug, Clone)]
struct Visit {
    reference: String,
    selector: ReleaseSelector,
    root: bool,
}

impl Visit {
    fn dependency(reference: String) -> Self {
        Self {
            reference,
            selector: ReleaseSelector::Latest,
            root: false,
        }
    }
}

enum PlanStep {
    Visit(Visit),
    Finish,
}

/// A fetched, validated add-on waiting to be installed.
struct Planned {
    repository: String,
    version: String,
    descriptor: Descriptor,
    work: WorkDir,
    root: bool,
    /// The chain that led here, this add-on included.
    chain: DependencyChain,
}

/// An add-on whose actions and files are done, waiting for its manifest.
struct Installed {
    descriptor: Descriptor,
    repository: String,
    version: String,
    project_files: Deployment,
    global_files: Deployment,
    runtime: Vec<String>,
    root: bool,
    chain: DependencyChain,
}

enum Frame {
    Run(Planned),
    Finish(Installed),
}

/// Installs add-ons into one project.
pub struct Installer<'a> {
    project: &'a dyn Project,
    output: &'a dyn Output,
    releases: &'a dyn ReleaseSource,
    downloader: &'a dyn Downloader,
    host_version: String,
    base_dir: PathBuf,
    store: ManifestStore,
    cancel: CancelToken,
}

impl<'a> Installer<'a> {
    /// `base_dir` resolves relative local references, including those of
    /// dependencies.
    pub fn new(
        project: &'a dyn Project,
        output: &'a dyn Output,
        releases: &'a dyn ReleaseSource,
        downloader: &'a dyn Downloader,
        host_version: impl Into<String>,
        base_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            project,
            output,
            releases,
            downloader,
            host_version: host_version.into(),
            base_dir: base_dir.into(),
            store: ManifestStore::new(&project.config_dir()),
            cancel: CancelToken::new(),
        }
    }

    /// Stop between add-ons once `cancel` is set.
    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn install(&self, request: &InstallRequest) -> Result<InstallReport> {
        tracing::info!(reference = %request.reference, skip_deps = request.skip_deps, "Installing add-on");
        let mut chain = DependencyChain::new();
        let mut scheduled = BTreeSet::new();

        let root = Visit {
            reference: request.reference.clone(),
            selector: request.selector.clone(),
            root: true,
        };
        let plan = self.plan(vec![root], &mut chain, &mut scheduled, request)?;
        tracing::debug!(
            order = ?plan.iter().map(|p| p.descriptor.name.as_str()).collect::<Vec<_>>(),
            "Install plan"
        );

        let installed = self.execute(plan, request)?;
        Ok(InstallReport { installed })
    }

    /// Plan `visits` and their static dependencies, dependencies first.
    fn plan(
        &self,
        visits: Vec<Visit>,
        chain: &mut DependencyChain,
        scheduled: &mut BTreeSet<String>,
        request: &InstallRequest,
    ) -> Result<Vec<Planned>> {
        let installed = self.store.list()?;
        let mut steps: Vec<PlanStep> = visits.into_iter().rev().map(PlanStep::Visit).collect();
        let mut pending: Vec<Planned> = Vec::new();
        let mut plan = Vec::new();

        while let Some(step) = steps.pop() {
            self.cancel.check()?;
            match step {
                PlanStep::Visit(visit) => {
                    let Some(item) = self.visit(&visit, chain, scheduled, &installed, request)? else {
                        continue;
                    };
                    let dependencies = if request.skip_deps {
                        Vec::new()
                    } else {
                        item.descriptor.dependencies.clone()
                    };
                    pending.push(item);
                    steps.push(PlanStep::Finish);
                    steps.extend(dependencies.into_iter().rev().map(|d| PlanStep::Visit(Visit::dependency(d))));
                }
                PlanStep::Finish => {
                    chain.leave();
                    if let Some(item) = pending.pop() {
                        scheduled.insert(item.descriptor.name.clone());
                        scheduled.insert(item.repository.clone());
                        plan.push(item);
                    }
                }
            }
        }
        Ok(plan)
    }

    fn visit(
        &self,
        visit: &Visit,
        chain: &mut DependencyChain,
        scheduled: &BTreeSet<String>,
        installed: &[Manifest],
        request: &InstallRequest,
    ) -> Result<Option<Planned>> {
        let source = SourceRef::parse(&visit.reference, &self.base_dir)?;
        let key = source.key();

        if !visit.root
            && !chain.contains(&key)
            && (scheduled.contains(&key) || installed.iter().any(|m| m.repository == key))
        {
            tracing::debug!(dependency = %key, "Dependency already installed");
            return Ok(None);
        }
        chain.enter(&key)?;

        let (work, version) = self.materialize(&source, &visit.selector, request.verbose)?;
        let descriptor = Descriptor::from_dir(work.path())?;
        let name = descriptor.name.clone();
        chain.name_current(&name)?;

        if !visit.root && (scheduled.contains(&name) || installed.iter().any(|m| m.name == name)) {
            tracing::debug!(dependency = %name, "Dependency already installed");
            chain.leave();
            return Ok(None);
        }

        version::check(&name, descriptor.version_constraint(), &self.host_version)?;

        Ok(Some(Planned {
            repository: key,
            version,
            descriptor,
            work,
            root: visit.root,
            chain: chain.clone(),
        }))
    }

    /// Fetch `source`, resolving provider slugs through the release source.
    /// Returns the working directory and the release label.
    fn materialize(
        &self,
        source: &SourceRef,
        selector: &ReleaseSelector,
        keep_failed_downloads: bool,
    ) -> Result<(WorkDir, String)> {
        let fetcher = Fetcher::new(self.downloader).keep_failed_downloads(keep_failed_downloads);
        match source {
            SourceRef::ProviderSlug { owner, repo } => {
                let resolved = release::resolve(self.releases, owner, repo, selector)?;
                let work = fetcher.materialize(&SourceRef::ArchiveUrl(resolved.archive_url))?;
                Ok((work, resolved.label))
            }
            other => {
                if *selector != ReleaseSelector::Latest {
                    self.output.warning(&format!(
                        "⚠ Release selection only applies to owner/repo sources; ignoring it for {other}"
                    ));
                }
                Ok((fetcher.materialize(other)?, String::new()))
            }
        }
    }

    fn execute(&self, plan: Vec<Planned>, request: &InstallRequest) -> Result<Vec<Manifest>> {
        let mut written: Vec<Manifest> = Vec::new();
        let mut stack: Vec<Frame> = plan.into_iter().rev().map(Frame::Run).collect();

        while let Some(frame) = stack.pop() {
            self.cancel.check()?;
            match frame {
                Frame::Run(item) => {
                    if written.iter().any(|m| m.name == item.descriptor.name) {
                        tracing::debug!(addon = %item.descriptor.name, "Already installed as a runtime dependency");
                        continue;
                    }
                    let root = item.root;
                    let name = item.descriptor.name.clone();
                    let done = match self.run_item(item, request) {
                        Ok(done) => done,
                        Err(_) if self.cancel.is_cancelled() => return Err(Error::Cancelled),
                        Err(e) => return Err(self.failed(root, &name, e)),
                    };

                    if done.runtime.is_empty() {
                        written.push(self.finish(done)?);
                        continue;
                    }

                    // Runtime requests are planned from this add-on's own
                    // chain; only add-ons already written count as installed.
                    let mut chain = done.chain.clone();
                    let mut scheduled = BTreeSet::new();
                    let visits = done.runtime.iter().cloned().map(Visit::dependency).collect();
                    let runtime_plan = match self.plan(visits, &mut chain, &mut scheduled, request) {
                        Ok(plan) => plan,
                        Err(Error::Cancelled) => return Err(Error::Cancelled),
                        Err(e) => {
                            let e = Error::DependencyInstall {
                                dependency: done.runtime.join(", "),
                                source: Box::new(e),
                            };
                            return Err(self.failed(done.root, &name, e));
                        }
                    };
                    stack.push(Frame::Finish(done));
                    stack.extend(runtime_plan.into_iter().rev().map(Frame::Run));
                }
                Frame::Finish(done) => {
                    written.push(self.finish(done)?);
                }
            }
        }
        Ok(written)
    }

    /// Run the actions and deploy the files of one planned add-on.
    fn run_item(&self, mut item: Planned, request: &InstallRequest) -> Result<Installed> {
        let descriptor = &item.descriptor;
        let name = descriptor.name.as_str();
        let label = if item.version.is_empty() {
            String::new()
        } else {
            format!(" {}", item.version)
        };
        self.output
            .info(&format!("Installing {name}{label} from {}", item.repository));

        let config_dir = self.project.config_dir();
        let side_channel = RuntimeDeps::for_addon(&config_dir, name);
        side_channel.clear()?;

        let context = TemplateContext::load(
            &ProjectContext::from_project(self.project),
            descriptor,
            &config_dir,
        )?;
        let runner = ActionRunner::new(self.project, self.output, &context, name)
            .verbose(request.verbose)
            .runtime_deps(&side_channel);

        let phases = runner
            .run_phase("pre-install", &descriptor.pre_install())
            .and_then(|()| {
                let project_files = deploy(
                    &descriptor.project_files,
                    item.work.path(),
                    &config_dir,
                    self.output,
                )?;
                let global_files = deploy(
                    &descriptor.global_files,
                    item.work.path(),
                    &self.project.global_config_path(),
                    self.output,
                )?;
                Ok((project_files, global_files))
            })
            .and_then(|files| {
                runner.run_phase("post-install", &descriptor.post_install())?;
                Ok(files)
            });
        let (project_files, global_files) = match phases {
            Ok(files) => files,
            Err(e) => {
                if let Err(clear) = side_channel.clear() {
                    tracing::warn!(addon = name, error = %clear, "Failed to remove runtime dependency file");
                }
                return Err(e);
            }
        };

        let runtime = if request.skip_deps {
            if side_channel.clear()? {
                tracing::info!(addon = name, "Ignoring runtime dependencies (--skip-deps)");
            }
            Vec::new()
        } else {
            side_channel.take()?
        };

        item.work.cleanup();
        Ok(Installed {
            descriptor: item.descriptor,
            repository: item.repository,
            version: item.version,
            project_files,
            global_files,
            runtime,
            root: item.root,
            chain: item.chain,
        })
    }

    fn finish(&self, done: Installed) -> Result<Manifest> {
        let root = done.root;
        let name = done.descriptor.name.clone();
        self.write_manifest(done).map_err(|e| self.failed(root, &name, e))
    }

    fn write_manifest(&self, done: Installed) -> Result<Manifest> {
        let mut dependencies = done.descriptor.dependencies.clone();
        for reference in &done.runtime {
            if !dependencies.contains(reference) {
                dependencies.push(reference.clone());
            }
        }

        let manifest = Manifest {
            name: done.descriptor.name.clone(),
            repository: done.repository,
            version: done.version,
            dependencies,
            install_date: Utc::now(),
            project_files: done.project_files.copied,
            global_files: done.global_files.copied,
            removal_actions: done.descriptor.removal_actions.clone(),
        };
        self.store.write(&manifest)?;

        let label = if manifest.version.is_empty() {
            String::new()
        } else {
            format!(" {}", manifest.version)
        };
        self.output
            .success(&format!("✓ Installed {}{label}", manifest.name));
        if let Ok(value) = serde_json::to_value(&manifest) {
            self.output.payload("installed", &value);
        }
        Ok(manifest)
    }

    fn failed(&self, root: bool, name: &str, error: Error) -> Error {
        if error.is_partial() {
            self.output.warning(&format!(
                "⚠ {name} was only partially installed; run `add-on remove {name}` to clean up"
            ));
        }
        if root {
            error
        } else {
            Error::DependencyInstall {
                dependency: name.to_string(),
                source: Box::new(error),
            }
        }
    }
}
