//! Hook ordering.
//!
//! Orders hooks (not yet facets) so overwrite chains and cross-kind
//! requirements execute in a valid sequence. Hooks get a synthetic identity
//! `"<kind>:<chain_index>"` for diagnostics; edges connect producers to the
//! hooks that consume them:
//!
//! - A required kind resolves to the **last** registered producer of that
//!   kind — later-registered producers supersede earlier ones for consumption.
//! - A hook requiring its own kind with `overwrite` set depends on its
//!   immediate predecessor in the overwrite chain instead. These bookkeeping
//!   self-edges never reach the facet-level graph.
//! - A required kind with no producing hook adds no edge here; whether an
//!   already-attached facet satisfies it is decided when the facet graph is
//!   built.
//!
//! Ordering is Kahn's algorithm over hook identities with a FIFO queue seeded
//! in registration order, so independent hooks keep their registration order
//! (the documented tie-break policy).

use std::collections::VecDeque;

use hashbrown::HashSet;
use mosaic_facet::error::{BuildError, CycleError};

use crate::metadata::HookSet;

/// Computes a valid execution order over the hook set.
///
/// Returns meta indices in execution order.
///
/// # Errors
///
/// - [`BuildError::OverwriteWithoutPredecessor`] for an overwrite hook that
///   requires its own kind at the head of its chain.
/// - [`BuildError::Cycle`] naming the stuck hook identities when the
///   requirements cannot be linearized.
pub(crate) fn order_hooks(set: &HookSet) -> Result<Vec<usize>, BuildError> {
    let n = set.metas.len();
    let mut indegree = vec![0usize; n];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut seen: HashSet<(usize, usize)> = HashSet::new();

    for (index, meta) in set.metas.iter().enumerate() {
        for required in &meta.required {
            let producer = if *required == meta.kind && meta.overwrite {
                match set.predecessor(meta) {
                    Some(predecessor) => Some(predecessor),
                    None => {
                        return Err(BuildError::OverwriteWithoutPredecessor {
                            kind: meta.kind.clone(),
                            source: meta.source.clone(),
                        });
                    }
                }
            } else {
                set.last_of(required)
            };

            let Some(producer) = producer else {
                // No hook produces this kind; the facet graph decides whether
                // an attached facet satisfies it or the dependency is missing.
                continue;
            };

            if producer == index {
                // A hook that is its own last producer can never be satisfied.
                return Err(CycleError {
                    kinds: vec![meta.identity()],
                }
                .into());
            }

            if seen.insert((producer, index)) {
                dependents[producer].push(index);
                indegree[index] += 1;
            }
        }
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&index| indegree[index] == 0).collect();
    let mut order = Vec::with_capacity(n);

    while let Some(index) = queue.pop_front() {
        order.push(index);
        for &dependent in &dependents[index] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                queue.push_back(dependent);
            }
        }
    }

    if order.len() != n {
        let stuck: Vec<String> = (0..n)
            .filter(|&index| indegree[index] > 0)
            .map(|index| set.metas[index].identity())
            .collect();
        return Err(CycleError { kinds: stuck }.into());
    }

    Ok(order)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::extract;
    use mosaic_facet::hook::Hook;

    fn hook(kind: &str) -> Hook {
        Hook::from_fn(kind, |_| Ok(None))
    }

    fn identities(set: &HookSet, order: &[usize]) -> Vec<String> {
        order.iter().map(|&i| set.metas[i].identity()).collect()
    }

    #[test]
    fn independents_keep_registration_order() {
        let hooks = vec![hook("c"), hook("a"), hook("b")];
        let set = extract(&hooks).unwrap();
        let order = order_hooks(&set).unwrap();
        assert_eq!(identities(&set, &order), vec!["c:0", "a:0", "b:0"]);
    }

    #[test]
    fn consumers_run_after_their_last_producer() {
        // The consumer registers before the enhanced producer; it must still
        // wait for the enhancement.
        let hooks = vec![
            hook("base"),
            hook("consumer").with_required(["base"]),
            hook("base")
                .with_overwrite(true)
                .with_required(["base"]),
        ];
        let set = extract(&hooks).unwrap();
        let order = order_hooks(&set).unwrap();
        let ids = identities(&set, &order);

        let consumer = ids.iter().position(|id| id == "consumer:0").unwrap();
        let enhanced = ids.iter().position(|id| id == "base:1").unwrap();
        assert!(enhanced < consumer);
    }

    #[test]
    fn overwrite_chain_orders_by_predecessor() {
        let hooks = vec![
            hook("k"),
            hook("k").with_overwrite(true).with_required(["k"]),
            hook("k").with_overwrite(true).with_required(["k"]),
        ];
        let set = extract(&hooks).unwrap();
        let order = order_hooks(&set).unwrap();
        assert_eq!(identities(&set, &order), vec!["k:0", "k:1", "k:2"]);
    }

    #[test]
    fn overwrite_head_requiring_itself_is_rejected() {
        let hooks = vec![
            hook("k")
                .with_overwrite(true)
                .with_required(["k"])
                .with_source("tests::head"),
        ];
        let set = extract(&hooks).unwrap();
        let err = order_hooks(&set).unwrap_err();
        match err {
            BuildError::OverwriteWithoutPredecessor { kind, source } => {
                assert_eq!(kind, "k");
                assert_eq!(source, "tests::head");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cross_kind_cycle_names_hook_identities() {
        let hooks = vec![
            hook("a").with_required(["b"]),
            hook("b").with_required(["a"]),
        ];
        let set = extract(&hooks).unwrap();
        let err = order_hooks(&set).unwrap_err();
        match err {
            BuildError::Cycle(cycle) => {
                assert!(cycle.kinds.contains(&"a:0".to_string()));
                assert!(cycle.kinds.contains(&"b:0".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_requirement_without_overwrite_is_a_cycle() {
        let hooks = vec![hook("a").with_required(["a"])];
        let set = extract(&hooks).unwrap();
        let err = order_hooks(&set).unwrap_err();
        match err {
            BuildError::Cycle(cycle) => assert_eq!(cycle.kinds, vec!["a:0".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_producers_do_not_block_ordering() {
        // "external" has no producing hook; the facet graph decides later
        // whether an attached facet covers it.
        let hooks = vec![hook("a").with_required(["external"])];
        let set = extract(&hooks).unwrap();
        let order = order_hooks(&set).unwrap();
        assert_eq!(order, vec![0]);
    }
}
