//! The resolver loop: interleaves constraint propagation with
//! network-fetched manifest retrieval until the graph reaches a fixpoint.
//!
//! First-fit, no backtracking (§9): the loop trusts the supplier to return a
//! single best manifest per `(name, constraint)` query and never
//! reconsiders a choice once made. Progress is measured purely by whether
//! `missing()` shrinks or any of its constraints change between two
//! consecutive iterations — the only termination signal the loop needs.

use crate::graph::{DependencyGraph, MissingEntry};
use libretto_core::PackageDescriptor;
use libretto_supplier::Supplier;
use std::collections::BTreeMap;
use tracing::{info, trace, warn};

/// The graph at fixpoint, plus whether the loop gave up because no
/// iteration could make further progress on the missing set.
#[derive(Debug)]
pub struct ResolveOutcome {
    pub graph: DependencyGraph,
    pub gather_failed: bool,
}

/// Run the resolver loop to fixpoint against `supplier`, starting from
/// `main`.
///
/// ```text
/// seed graph with main descriptor
/// loop:
///     m := graph.missing()
///     if m is empty: break
///     if m unchanged from the previous iteration: gather_failed := true; break
///     for (name, req) in m:
///         if req.constraint is invalid: skip
///         fetch descriptor = supplier.manifest(name, req.constraint)
///             on failure: log and continue
///         graph.insert(descriptor)
///     graph.clear_unused()
/// ```
pub fn resolve(main: &PackageDescriptor, supplier: &dyn Supplier) -> ResolveOutcome {
    let mut graph = DependencyGraph::seeded_with_root(main);
    let mut previous_missing: Option<BTreeMap<String, libretto_core::Constraint>> = None;
    let mut gather_failed = false;

    loop {
        let missing = graph.missing();
        if missing.is_empty() {
            trace!("resolver reached fixpoint with nothing missing");
            break;
        }

        if no_progress_since(&missing, previous_missing.as_ref()) {
            warn!(stalled = missing.len(), "resolver made no progress across two iterations");
            gather_failed = true;
            break;
        }
        previous_missing = Some(snapshot(&missing));

        info!(
            missing = missing.len(),
            conflicted = graph.conflicted().len(),
            needed = graph.needed().len(),
            "resolver iteration"
        );

        for entry in &missing {
            fetch_and_insert(&mut graph, entry, supplier);
        }

        graph.clear_unused();
    }

    ResolveOutcome { graph, gather_failed }
}

fn fetch_and_insert(graph: &mut DependencyGraph, entry: &MissingEntry, supplier: &dyn Supplier) {
    if !entry.constraint.is_valid() {
        warn!(
            name = %entry.name,
            issuers = ?entry.issuers,
            "skipping fetch for a name whose incoming constraints already intersect to empty"
        );
        return;
    }

    match supplier.manifest(&entry.name, &entry.constraint) {
        Ok(descriptor) if descriptor.name != entry.name => {
            warn!(
                requested = %entry.name,
                returned = %descriptor.name,
                "{}",
                crate::error::ResolveError::NameMismatch {
                    requested: entry.name.clone(),
                    returned: descriptor.name.clone(),
                }
            );
        }
        Ok(descriptor) => {
            trace!(name = %entry.name, version = %descriptor.version, "fetched manifest");
            graph.insert(descriptor);
        }
        Err(err) => {
            warn!(name = %entry.name, error = %err, "supplier failed to resolve manifest, will retry next iteration");
        }
    }
}

fn snapshot(missing: &[MissingEntry]) -> BTreeMap<String, libretto_core::Constraint> {
    missing.iter().map(|m| (m.name.clone(), m.constraint.clone())).collect()
}

fn no_progress_since(
    missing: &[MissingEntry],
    previous: Option<&BTreeMap<String, libretto_core::Constraint>>,
) -> bool {
    let Some(previous) = previous else { return false };
    if missing.len() != previous.len() {
        return false;
    }
    missing
        .iter()
        .all(|m| previous.get(&m.name).is_some_and(|c| c == &m.constraint))
}
