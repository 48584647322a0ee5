//! `libretto install` — fetch and unpack whatever the declared dependencies
//! need but the local module tree doesn't yet have.

use crate::{output, reconcile};
use anyhow::Result;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct InstallArgs {}

pub fn run(root: &Path, _args: &InstallArgs) -> Result<()> {
    output::header("installing dependencies");
    match reconcile::run(root) {
        Ok(count) => {
            if count > 0 {
                output::success(&format!("{count} action(s) applied"));
            }
            Ok(())
        }
        Err(err) => {
            if err.executed > 0 {
                output::warning(&format!("{} action(s) applied before the failure", err.executed));
            }
            Err(err.source)
        }
    }
}
