//! `libretto remove` — uninstall a single package by name, driven entirely
//! by its on-disk journal (spec.md §4.4). Does not touch the manifest: this
//! core defines no manifest-writer (no lockfile, no dependency-declaration
//! mutation — spec.md §1 Non-goals).

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct RemoveArgs {
    /// Name of the installed package to remove
    pub name: String,
}

pub fn run(root: &Path, args: &RemoveArgs) -> Result<()> {
    output::header(&format!("removing {}", args.name));
    libretto_installer::uninstall(&args.name, root)
        .with_context(|| format!("failed to uninstall `{}`", args.name))?;
    output::success(&format!("removed {}", args.name));
    Ok(())
}
