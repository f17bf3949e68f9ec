//! Add-on manager CLI
//!
//! Installs, lists and removes add-ons in container-based dev projects.

mod cli;
mod commands;
mod context;
mod error;
mod output;

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use addon_core::{CancelToken, GitHubClient, Output};
use cli::{AddOnAction, Cli, Commands};
use commands::get::GetOptions;
use error::{CliError, Result};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    init_tracing(cli.verbose);
    let json_output = cli.json_output;
    let output = output::select(json_output);
    let cancel = install_interrupt_handler();

    if let Err(e) = run(cli, output.as_ref(), &cancel) {
        tracing::debug!(error = ?e, "Command failed");
        if let CliError::Core(core) = &e {
            if core.is_partial() {
                tracing::debug!(root_cause = %core.root_cause(), "Failure after partial execution");
            }
        }
        if json_output {
            output.failure(&e.to_string());
        }
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(e.exit_code());
    }
}

/// First Ctrl-C asks the installer to stop after the current step; running
/// actions receive the same SIGINT from the terminal. A second one exits.
fn install_interrupt_handler() -> CancelToken {
    let cancel = CancelToken::new();
    let flag = cancel.clone();
    let installed = ctrlc::set_handler(move || {
        if flag.cancel() {
            std::process::exit(error::INTERRUPTED_EXIT_CODE);
        }
        eprintln!("Interrupted; cleaning up (press Ctrl-C again to exit immediately)");
    });
    if let Err(e) = installed {
        tracing::debug!(error = %e, "Could not install interrupt handler");
    }
    cancel
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init();
    tracing::debug!("Verbose mode enabled");
}

fn run(cli: Cli, output: &dyn Output, cancel: &CancelToken) -> Result<()> {
    match cli.command {
        Some(Commands::AddOn { action }) => execute_addon(action, cli.verbose, output, cancel),
        None => {
            println!("{} add-on manager", "addon-manager".green().bold());
            println!();
            println!("Run {} for available commands.", "addon-manager --help".cyan());
            Ok(())
        }
    }
}

fn execute_addon(
    action: AddOnAction,
    verbose: bool,
    output: &dyn Output,
    cancel: &CancelToken,
) -> Result<()> {
    let cwd = std::env::current_dir()?;
    match action {
        AddOnAction::Get {
            source,
            release_version,
            pr,
            default_branch,
            project,
            skip_deps,
        } => {
            let global_dir = context::global_config_dir()?;
            let project = context::resolve_project(&cwd, project.as_deref(), &global_dir)?;
            let client = GitHubClient::from_env(context::api_base_url())?;
            let options = GetOptions {
                release_version,
                pr,
                default_branch,
                skip_deps,
                verbose,
                cancel: cancel.clone(),
            };
            commands::run_get(
                &project,
                output,
                &client,
                &client,
                &context::host_version(),
                &cwd,
                &source,
                &options,
            )?;
            Ok(())
        }
        AddOnAction::Remove {
            identifier,
            project,
        } => {
            let global_dir = context::global_config_dir()?;
            let project = context::resolve_project(&cwd, project.as_deref(), &global_dir)?;
            commands::run_remove(&project, output, &identifier, verbose)?;
            Ok(())
        }
        AddOnAction::List {
            all,
            installed,
            project,
        } => {
            if installed {
                let global_dir = context::global_config_dir()?;
                let project = context::resolve_project(&cwd, project.as_deref(), &global_dir)?;
                commands::run_list_installed(&project, output)
            } else {
                let client = GitHubClient::from_env(context::api_base_url())?;
                commands::run_list(&client, output, all)
            }
        }
        AddOnAction::Search { terms } => {
            let client = GitHubClient::from_env(context::api_base_url())?;
            commands::run_search(&client, output, &terms)
        }
    }
}
