//! Facet-level dependency graph construction.
//!
//! Builds a directed graph over candidate kinds with an edge
//! `dep → dependent` for every dependency declared either by the last hook of
//! the dependent's kind or by the winning facet itself
//! ([`Facet::dependencies`](mosaic_facet::facet::Facet::dependencies)).
//!
//! Self-edges were overwrite-chain bookkeeping at the hook level and are not
//! re-introduced here. A dependency already attached to the container (from a
//! previous build) is satisfied externally and contributes no edge; a
//! dependency satisfied by neither candidates nor attached facets is fatal.

use hashbrown::HashSet;
use indexmap::IndexMap;
use mosaic_facet::error::BuildError;
use mosaic_facet::manager::FacetManager;

use crate::invoke::CandidateSet;

/// Dependency graph over the kinds of a candidate set.
#[derive(Debug, Default)]
pub(crate) struct FacetGraph {
    /// Candidate kinds, in production order.
    pub nodes: Vec<String>,
    /// Adjacency: dependency kind → dependent kinds.
    pub edges: IndexMap<String, Vec<String>>,
    /// Per-kind resolved in-batch dependencies (drives level computation).
    pub deps: IndexMap<String, Vec<String>>,
}

/// Builds the facet graph for a candidate set.
///
/// # Errors
///
/// [`BuildError::MissingDependency`] naming the dependent kind, its source,
/// and the unresolved dependency.
pub(crate) fn build_graph(
    candidates: &CandidateSet,
    manager: &FacetManager,
) -> Result<FacetGraph, BuildError> {
    let mut graph = FacetGraph::default();

    for kind in candidates.kinds() {
        graph.nodes.push(kind.clone());
    }

    for kind in &graph.nodes {
        let Some(winner) = candidates.latest(kind) else {
            continue;
        };

        // Hook-declared requirements first, then facet-declared dependencies,
        // deduplicated in declaration order.
        let mut declared: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        for dep in winner
            .required
            .iter()
            .cloned()
            .chain(winner.facet.dependencies())
        {
            if seen.insert(dep.clone()) {
                declared.push(dep);
            }
        }

        let mut resolved: Vec<String> = Vec::new();
        for dep in declared {
            if dep == *kind {
                // Overwrite-chain bookkeeping, already resolved at hook level.
                continue;
            }
            if candidates.contains(&dep) {
                graph
                    .edges
                    .entry(dep.clone())
                    .or_default()
                    .push(kind.clone());
                resolved.push(dep);
            } else if manager.latest(&dep).is_some() {
                // Satisfied by a facet attached in a previous build.
                tracing::trace!(kind = %kind, dep = %dep, "dependency satisfied externally");
            } else {
                return Err(BuildError::MissingDependency {
                    kind: kind.clone(),
                    source: winner.source.clone(),
                    missing: dep,
                });
            }
        }
        graph.deps.insert(kind.clone(), resolved);
    }

    Ok(graph)
}
