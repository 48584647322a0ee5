//! Shared resolve → plan → execute pipeline backing both the `install` and
//! `update` subcommands (spec.md §4's single `update()` operation).

use crate::output;
use anyhow::{anyhow, Context};
use libretto_app::ApplicationState;
use libretto_config::AppConfig;
use libretto_planner::{Action, ActionKind};
use libretto_supplier::{FilesystemSupplier, RegistryConfig, RegistrySupplier, Supplier};
use std::fmt;
use std::path::Path;
use tracing::info;

/// Build the supplier from loaded configuration: a local directory tree when
/// `supplier.filesystem_repo` is set (used for mirrors and for integration
/// tests that would otherwise need a live registry), else the registry.
fn build_supplier(config: &AppConfig) -> anyhow::Result<Box<dyn Supplier>> {
    if let Some(repo) = &config.supplier.filesystem_repo {
        return Ok(Box::new(FilesystemSupplier::new(repo.clone())));
    }

    let registry_config = RegistryConfig {
        base_url: config.supplier.base_url.clone(),
        timeout: config.supplier.timeout(),
        max_attempts: config.retry.max_attempts as usize,
        initial_backoff: std::time::Duration::from_millis(config.retry.initial_backoff_ms),
    };
    let supplier = RegistrySupplier::new(registry_config).context("failed to build registry supplier")?;
    Ok(Box::new(supplier))
}

/// Carries the number of actions already executed alongside the error that
/// halted the run, per spec.md:204: "a fatal action-level error halts
/// further actions and returns the partial progress count to the caller."
#[derive(Debug)]
pub struct ReconcileError {
    pub executed: usize,
    pub source: anyhow::Error,
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)
    }
}

impl std::error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.source()
    }
}

impl ReconcileError {
    fn at(executed: usize, source: anyhow::Error) -> Self {
        Self { executed, source }
    }
}

type Result<T> = std::result::Result<T, ReconcileError>;

/// Resolve, plan and execute the full reconciliation against `root`.
///
/// On success, returns the number of actions executed (installs +
/// uninstalls). On a fatal action-level failure partway through execution,
/// returns a [`ReconcileError`] carrying the count of actions that had
/// already completed before the failure.
pub fn run(root: &Path) -> Result<usize> {
    let config = libretto_config::load(root)
        .context("failed to load configuration")
        .map_err(|e| ReconcileError::at(0, e))?;
    let supplier = build_supplier(&config).map_err(|e| ReconcileError::at(0, e))?;

    let mut app = ApplicationState::new(root);
    app.reinit()
        .context("failed to scan application state")
        .map_err(|e| ReconcileError::at(0, e))?;

    let main = app
        .main()
        .context("application has no main manifest")
        .map_err(|e| ReconcileError::at(0, e))?
        .clone();

    info!(name = %main.name, "resolving dependencies");
    let outcome = libretto_resolver::resolve(&main, &supplier);
    let actions = libretto_planner::plan(&outcome, &app);

    let failures: Vec<&Action> = actions.iter().filter(|a| a.kind == ActionKind::Failure).collect();
    let conflicts: Vec<&Action> = actions.iter().filter(|a| a.kind == ActionKind::Conflict).collect();

    if !failures.is_empty() {
        for action in &failures {
            output::error(&format!(
                "could not resolve `{}` (requested {})",
                action.package_name, action.constraint
            ));
        }
        return Err(ReconcileError::at(0, anyhow!("resolution stalled on {} package(s)", failures.len())));
    }

    if !conflicts.is_empty() {
        for action in &conflicts {
            output::error(&format!(
                "conflicting requirements on `{}` (combined: {})",
                action.package_name, action.constraint
            ));
            for (issuer, constraint) in &action.issuers {
                output::error(&format!("  {issuer} requires {constraint}"));
            }
        }
        return Err(ReconcileError::at(0, anyhow!("{} unresolvable conflict(s)", conflicts.len())));
    }

    if actions.is_empty() {
        output::info("nothing to do, already up to date");
        return Ok(0);
    }

    let mut executed = 0usize;
    for action in &actions {
        match action.kind {
            ActionKind::Uninstall => {
                libretto_installer::uninstall(&action.package_name, root).map_err(|e| {
                    ReconcileError::at(executed, anyhow::Error::new(e).context(format!("failed to uninstall `{}`", action.package_name)))
                })?;
                output::success(&format!("removed {}", action.package_name));
            }
            ActionKind::InstallUpdate => {
                libretto_installer::install(&action.package_name, &action.constraint, root, &supplier).map_err(|e| {
                    ReconcileError::at(executed, anyhow::Error::new(e).context(format!("failed to install `{}`", action.package_name)))
                })?;
                output::success(&format!("installed {} ({})", action.package_name, action.constraint));
            }
            ActionKind::Conflict | ActionKind::Failure => unreachable!("handled above"),
        }
        executed += 1;
    }

    Ok(executed)
}
