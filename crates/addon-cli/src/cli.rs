//! CLI argument parsing using clap derive

use clap::{Parser, Subcommand};

/// Add-on manager - install, list and remove project add-ons
#[derive(Parser, Debug)]
#[command(name = "addon-manager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (echo actions, debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print one JSON object per output line
    #[arg(long, global = true)]
    pub json_output: bool,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Manage add-ons
    #[command(name = "add-on", visible_alias = "addon")]
    AddOn {
        #[command(subcommand)]
        action: AddOnAction,
    },
}

/// Add-on subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AddOnAction {
    /// Install an add-on and its dependencies
    ///
    /// The source is a local directory, a .tar.gz archive, an owner/repo
    /// slug or an archive URL.
    ///
    /// Examples:
    ///   addon-manager add-on get ddev/ddev-redis
    ///   addon-manager add-on get ddev/ddev-redis --version v1.0.4
    ///   addon-manager add-on get ../my-addon
    Get {
        /// Add-on source
        source: String,

        /// Release tag, branch or commit of an owner/repo source
        #[arg(long = "version", value_name = "VERSION")]
        release_version: Option<String>,

        /// Install the head of a pull request
        #[arg(long, allow_negative_numbers = true, conflicts_with = "release_version")]
        pr: Option<i64>,

        /// Install the repository's default branch
        #[arg(long, conflicts_with_all = ["release_version", "pr"])]
        default_branch: bool,

        /// Project to install into (default: discovered from the working directory)
        #[arg(long)]
        project: Option<String>,

        /// Do not install static or runtime dependencies
        #[arg(long)]
        skip_deps: bool,
    },

    /// Remove an installed add-on
    #[command(visible_alias = "rm")]
    Remove {
        /// Add-on name or repository
        identifier: String,

        /// Project to remove from
        #[arg(long)]
        project: Option<String>,
    },

    /// List available or installed add-ons
    List {
        /// Include community add-ons
        #[arg(long)]
        all: bool,

        /// Show add-ons installed in the project
        #[arg(long, conflicts_with = "all")]
        installed: bool,

        /// Project to inspect with --installed
        #[arg(long)]
        project: Option<String>,
    },

    /// Search the add-on catalog
    Search {
        /// Search terms
        #[arg(required = true)]
        terms: Vec<String>,
    },
}
