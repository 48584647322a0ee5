//! CLI subcommands. `install` and `update` both run the same resolve/plan/
//! execute reconciliation — the core defines a single `update()` operation
//! (spec.md §4) and draws no distinction between "fetch what's missing" and
//! "re-resolve everything", since there is no lockfile recording a prior
//! resolution to diff against. `remove` is the one operation that bypasses
//! resolution entirely: it acts directly on a single installed package.

pub mod install;
pub mod remove;
pub mod update;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Libretto - reconciles an application's declared dependencies with its
/// local module tree.
#[derive(Parser, Debug)]
#[command(name = "libretto", version, about, propagate_version = true)]
pub struct Cli {
    /// Use the specified directory as the application root (default: current directory)
    #[arg(short = 'd', long = "working-dir", global = true, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Increase verbosity: -v for info, -vv for debug, -vvv for trace
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all non-error output
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install missing dependencies declared in package.json
    Install(install::InstallArgs),
    /// Re-resolve and reconcile all dependencies against the supplier
    Update(update::UpdateArgs),
    /// Uninstall a package by name, consuming its journal
    Remove(remove::RemoveArgs),
}

impl Cli {
    #[must_use]
    pub fn root(&self) -> PathBuf {
        self.working_dir.clone().unwrap_or_else(|| PathBuf::from("."))
    }

    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match (self.quiet, self.verbose) {
            (true, _) => tracing::Level::ERROR,
            (false, 0) => tracing::Level::WARN,
            (false, 1) => tracing::Level::INFO,
            (false, 2) => tracing::Level::DEBUG,
            (false, _) => tracing::Level::TRACE,
        }
    }
}
