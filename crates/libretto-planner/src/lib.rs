//! The planner: diffs the resolver's graph-derived `needed` set against the
//! application's currently installed modules, and turns the result into an
//! ordered list of [`Action`]s — uninstalls before installs, so a stale
//! version is never left on disk alongside its replacement.
//!
//! The planner never touches the filesystem; it is a pure function of
//! ([`ResolveOutcome`], [`ApplicationState`]). Executing the plan is
//! `libretto-installer`'s job.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

use libretto_app::ApplicationState;
use libretto_core::Constraint;
use libretto_resolver::ResolveOutcome;
use std::collections::BTreeMap;
use tracing::info;

/// What an [`Action`] asks the installer/uninstaller to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    /// Install a new package, or update an installed one to a version that
    /// satisfies the needed constraint.
    InstallUpdate,
    /// Remove a currently installed package that is no longer needed.
    Uninstall,
    /// Report an unresolvable conflict; no filesystem mutation follows.
    Conflict,
    /// Report that the resolver stalled before this name was resolved; no
    /// filesystem mutation follows.
    Failure,
}

/// One entry in the planner's output: what to do about one package name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub kind: ActionKind,
    pub package_name: String,
    pub constraint: Constraint,
    /// Issuer name -> the constraint that issuer asserts, as recorded on
    /// the dependency graph. Empty for [`ActionKind::Uninstall`], which is
    /// driven by absence from the needed set rather than an asserted
    /// constraint.
    pub issuers: BTreeMap<String, Constraint>,
}

impl Action {
    fn install_update(name: &str, constraint: Constraint, issuers: BTreeMap<String, Constraint>) -> Self {
        Self { kind: ActionKind::InstallUpdate, package_name: name.to_string(), constraint, issuers }
    }

    fn uninstall(name: &str, constraint: Constraint) -> Self {
        Self { kind: ActionKind::Uninstall, package_name: name.to_string(), constraint, issuers: BTreeMap::new() }
    }

    fn conflict(name: &str, constraint: Constraint, issuers: BTreeMap<String, Constraint>) -> Self {
        Self { kind: ActionKind::Conflict, package_name: name.to_string(), constraint, issuers }
    }

    fn failure(name: &str, constraint: Constraint, issuers: BTreeMap<String, Constraint>) -> Self {
        Self { kind: ActionKind::Failure, package_name: name.to_string(), constraint, issuers }
    }
}

/// Build the ordered action list for `outcome` against `app`.
///
/// 1. If the resolver stalled (`gather_failed`), emit one `Failure` per
///    missing name and stop.
/// 2. Else if the graph has conflicts, emit one `Conflict` per conflicted
///    name and stop.
/// 3. Else diff `needed` against `app.installed()`: uninstalls (installed
///    minus needed, root excluded) sorted by name, then installs/updates
///    (needed names missing or unsatisfied by the installed version) sorted
///    by name.
#[must_use]
pub fn plan(outcome: &ResolveOutcome, app: &ApplicationState) -> Vec<Action> {
    if outcome.gather_failed {
        let mut missing = outcome.graph.missing();
        missing.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = missing.len(), "planner emitting failures, resolver stalled");
        return missing
            .into_iter()
            .map(|m| {
                let issuers = issuer_constraints(&m.name, &m.issuers, &outcome.graph);
                Action::failure(&m.name, m.constraint, issuers)
            })
            .collect();
    }

    let mut conflicted = outcome.graph.conflicted();
    if !conflicted.is_empty() {
        conflicted.sort_by(|a, b| a.name.cmp(&b.name));
        info!(count = conflicted.len(), "planner emitting conflicts");
        return conflicted
            .into_iter()
            .map(|c| {
                let issuers = issuer_constraints(&c.name, &c.issuers, &outcome.graph);
                Action::conflict(&c.name, c.constraint, issuers)
            })
            .collect();
    }

    let needed = outcome.graph.needed();
    let needed_by_name: BTreeMap<&str, &libretto_resolver::NeededEntry> =
        needed.iter().map(|n| (n.name.as_str(), n)).collect();

    let root_name = app.main().map(|m| m.name.as_str());

    // A name is uninstalled if it is no longer needed at all, or if it is
    // still needed but the installed version no longer satisfies the needed
    // constraint (a stale dependency, replaced rather than merely removed).
    let mut uninstall_names: Vec<&String> = app
        .installed()
        .keys()
        .filter(|name| {
            if Some(name.as_str()) == root_name {
                return false;
            }
            match needed_by_name.get(name.as_str()) {
                None => true,
                Some(entry) => !entry.constraint.matches(&app.installed()[*name].version),
            }
        })
        .collect();
    uninstall_names.sort();

    let mut install_names: Vec<&libretto_resolver::NeededEntry> = needed
        .iter()
        .filter(|n| {
            app.installed()
                .get(&n.name)
                .is_none_or(|installed| !n.constraint.matches(&installed.version))
        })
        .collect();
    install_names.sort_by(|a, b| a.name.cmp(&b.name));

    let mut actions = Vec::with_capacity(uninstall_names.len() + install_names.len());

    for name in uninstall_names {
        let installed_version = app.installed()[name].version.clone();
        actions.push(Action::uninstall(name, Constraint::exact(installed_version)));
    }
    for needed_entry in install_names {
        let issuers = issuer_constraints(&needed_entry.name, &needed_entry.issuers, &outcome.graph);
        actions.push(Action::install_update(&needed_entry.name, needed_entry.constraint.clone(), issuers));
    }

    info!(
        uninstalls = actions.iter().filter(|a| a.kind == ActionKind::Uninstall).count(),
        installs = actions.iter().filter(|a| a.kind == ActionKind::InstallUpdate).count(),
        "planner emitted action list"
    );
    actions
}

/// Recover each issuer's constraint on `target_name` from the graph, for an
/// `Action::issuers` field. An issuer's descriptor always carries its
/// asserted constraint directly.
fn issuer_constraints(
    target_name: &str,
    issuers: &std::collections::BTreeSet<String>,
    graph: &libretto_resolver::DependencyGraph,
) -> BTreeMap<String, Constraint> {
    issuers
        .iter()
        .filter_map(|issuer| {
            let constraint = graph.descriptor(issuer)?.dependencies.get(target_name)?.clone();
            Some((issuer.clone(), constraint))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use libretto_core::{NumericVersion, PackageDescriptor, Version};
    use libretto_resolver::resolve;
    use libretto_supplier::TestSupplier;
    use std::fs;
    use tempfile::tempdir;

    fn pkg(name: &str, version: (u64, u64, u64), deps: &[(&str, &str)]) -> PackageDescriptor {
        let mut d = PackageDescriptor::new(name, Version::Number(NumericVersion::new(version.0, version.1, version.2)));
        for (dep, constraint) in deps {
            d.dependencies.insert((*dep).to_string(), Constraint::parse(constraint).unwrap());
        }
        d
    }

    fn app_with(root_manifest: &str) -> (tempfile::TempDir, ApplicationState) {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("package.json"), root_manifest).unwrap();
        let mut app = ApplicationState::new(dir.path());
        app.reinit().unwrap();
        (dir, app)
    }

    #[test]
    fn no_dependencies_yields_empty_plan() {
        let (_dir, app) = app_with(r#"{"name":"app","version":"0.0.1"}"#);
        let supplier = TestSupplier::new();
        let outcome = resolve(app.main().unwrap(), &supplier);
        assert!(plan(&outcome, &app).is_empty());
    }

    #[test]
    fn fresh_install_scenario_s1() {
        let (_dir, app) = app_with(r#"{"name":"app","version":"0.0.1","dependencies":{"libA":">=1.0.0"}}"#);
        let supplier = TestSupplier::new();
        supplier.offer(pkg("libA", (1, 2, 0), &[]), vec![]);

        let outcome = resolve(app.main().unwrap(), &supplier);
        let actions = plan(&outcome, &app);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::InstallUpdate);
        assert_eq!(actions[0].package_name, "libA");
    }

    #[test]
    fn conflict_scenario_s3_blocks_all_mutation() {
        let (_dir, app) =
            app_with(r#"{"name":"app","version":"0.0.1","dependencies":{"libA":"*","libC":"*"}}"#);
        let supplier = TestSupplier::new();
        supplier.offer(pkg("libA", (1, 0, 0), &[("libB", ">=2.0.0")]), vec![]);
        supplier.offer(pkg("libC", (1, 0, 0), &[("libB", "<2.0.0")]), vec![]);
        supplier.offer(pkg("libB", (2, 3, 0), &[]), vec![]);
        supplier.offer(pkg("libB", (1, 0, 0), &[]), vec![]);

        let outcome = resolve(app.main().unwrap(), &supplier);
        let actions = plan(&outcome, &app);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Conflict);
        assert_eq!(actions[0].package_name, "libB");
    }

    #[test]
    fn resolver_stall_scenario_s6() {
        let (_dir, app) = app_with(r#"{"name":"app","version":"0.0.1","dependencies":{"libX":"*"}}"#);
        let supplier = TestSupplier::new();
        supplier.always_fail("libX");

        let outcome = resolve(app.main().unwrap(), &supplier);
        let actions = plan(&outcome, &app);

        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].kind, ActionKind::Failure);
        assert_eq!(actions[0].package_name, "libX");
    }

    #[test]
    fn uninstalls_sort_before_installs() {
        let (dir, mut app) =
            app_with(r#"{"name":"app","version":"0.0.1","dependencies":{"libZ":">=1.0.0"}}"#);
        let stale_dir = dir.path().join("modules/libZ");
        fs::create_dir_all(&stale_dir).unwrap();
        fs::write(stale_dir.join("package.json"), r#"{"name":"libZ","version":"0.5.0"}"#).unwrap();
        fs::write(stale_dir.join("journal.json"), r#"[{"type":"RegularFile","path":"journal.json"}]"#).unwrap();
        app.reinit().unwrap();

        let supplier = TestSupplier::new();
        supplier.offer(pkg("libZ", (1, 1, 0), &[]), vec![]);
        let outcome = resolve(app.main().unwrap(), &supplier);
        let actions = plan(&outcome, &app);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, ActionKind::Uninstall);
        assert_eq!(actions[1].kind, ActionKind::InstallUpdate);
    }
}
