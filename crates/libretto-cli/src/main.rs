//! Libretto CLI: reconciles an application's declared dependencies with its
//! local module tree by wiring the resolver, planner and installer crates
//! together behind three commands.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

mod commands;
mod output;
mod reconcile;

use clap::Parser;
use commands::{Cli, Commands};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(cli.log_level().into())
        .from_env_lossy();
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).without_time().init();

    let root = cli.root();

    let result = match &cli.command {
        Commands::Install(args) => commands::install::run(&root, args),
        Commands::Update(args) => commands::update::run(&root, args),
        Commands::Remove(args) => commands::remove::run(&root, args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
