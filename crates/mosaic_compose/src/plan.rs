//! Build plans.
//!
//! A [`BuildPlan`] is the output of the pure verify phase: the resolved
//! context's fingerprint, the topological initialization order, the candidate
//! facets, and the resolved in-batch dependency lists. Subsystems memoize
//! their latest plan; a repeated build with an unchanged context reuses it
//! without re-running verify.

use hashbrown::HashSet;
use indexmap::IndexMap;

use crate::invoke::CandidateSet;

/// The verified, executable description of one build.
#[derive(Clone)]
pub struct BuildPlan {
    pub(crate) ctx_fingerprint: u64,
    pub(crate) ordered_kinds: Vec<String>,
    pub(crate) candidates: CandidateSet,
    pub(crate) deps: IndexMap<String, Vec<String>>,
}

impl BuildPlan {
    /// Fingerprint of the context this plan was verified against.
    #[must_use]
    pub fn ctx_fingerprint(&self) -> u64 {
        self.ctx_fingerprint
    }

    /// Facet kinds in initialization order (dependencies first).
    #[must_use]
    pub fn ordered_kinds(&self) -> &[String] {
        &self.ordered_kinds
    }

    /// Number of facets the plan will register.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered_kinds.len()
    }

    /// Returns true if the plan registers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered_kinds.is_empty()
    }

    /// Partitions a batch of kinds into dependency levels.
    ///
    /// Level 0 holds kinds with no in-batch dependencies; each later level
    /// depends only on earlier ones. Dependencies outside the batch (already
    /// attached facets) do not raise a kind's level.
    pub(crate) fn levels_for(&self, batch: &[String]) -> Vec<Vec<String>> {
        let in_batch: HashSet<&str> = batch.iter().map(String::as_str).collect();
        let mut level_of: IndexMap<&str, usize> = IndexMap::new();
        let mut levels: Vec<Vec<String>> = Vec::new();

        for kind in &self.ordered_kinds {
            if !in_batch.contains(kind.as_str()) {
                continue;
            }
            let level = self
                .deps
                .get(kind)
                .map(|deps| {
                    deps.iter()
                        .filter_map(|dep| level_of.get(dep.as_str()).map(|l| l + 1))
                        .max()
                        .unwrap_or(0)
                })
                .unwrap_or(0);
            level_of.insert(kind.as_str(), level);
            if levels.len() <= level {
                levels.resize_with(level + 1, Vec::new);
            }
            levels[level].push(kind.clone());
        }

        levels
    }
}

impl core::fmt::Debug for BuildPlan {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("BuildPlan")
            .field("ctx_fingerprint", &self.ctx_fingerprint)
            .field("ordered_kinds", &self.ordered_kinds)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(ordered: &[&str], deps: &[(&str, &[&str])]) -> BuildPlan {
        BuildPlan {
            ctx_fingerprint: 0,
            ordered_kinds: ordered.iter().map(|k| (*k).to_string()).collect(),
            candidates: CandidateSet::default(),
            deps: deps
                .iter()
                .map(|(kind, ds)| {
                    (
                        (*kind).to_string(),
                        ds.iter().map(|d| (*d).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn independent_kinds_share_level_zero() {
        let plan = plan(&["a", "b"], &[("a", &[]), ("b", &[])]);
        let batch: Vec<String> = vec!["a".into(), "b".into()];
        assert_eq!(plan.levels_for(&batch), vec![vec!["a", "b"]]);
    }

    #[test]
    fn chains_stack_levels() {
        let plan = plan(
            &["base", "mid", "top"],
            &[("base", &[]), ("mid", &["base"]), ("top", &["base", "mid"])],
        );
        let batch: Vec<String> = vec!["base".into(), "mid".into(), "top".into()];
        let levels = plan.levels_for(&batch);
        assert_eq!(
            levels,
            vec![vec!["base".to_string()], vec!["mid".into()], vec!["top".into()]]
        );
    }

    #[test]
    fn out_of_batch_dependencies_do_not_raise_levels() {
        let plan = plan(&["base", "mid"], &[("base", &[]), ("mid", &["base"])]);
        // "base" is already attached, only "mid" is in the batch.
        let batch: Vec<String> = vec!["mid".into()];
        assert_eq!(plan.levels_for(&batch), vec![vec!["mid"]]);
    }
}
