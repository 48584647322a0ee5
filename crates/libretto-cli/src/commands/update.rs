//! `libretto update` — re-resolve every declared dependency against the
//! supplier and reconcile the module tree, including replacing stale
//! installed versions.

use crate::{output, reconcile};
use anyhow::Result;
use clap::Args;
use std::path::Path;

#[derive(Args, Debug, Clone)]
pub struct UpdateArgs {}

pub fn run(root: &Path, _args: &UpdateArgs) -> Result<()> {
    output::header("updating dependencies");
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
