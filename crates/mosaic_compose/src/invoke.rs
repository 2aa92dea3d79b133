//! Hook execution and candidate registration.
//!
//! Runs factories in the order computed by [`crate::order`], collecting the
//! produced facets into a [`CandidateSet`]. Each accepted facet is visible to
//! later factories in the same pass through the [`FacetLookup`] snapshot —
//! candidate registration performs no initialization and never touches the
//! container.

use indexmap::IndexMap;
use mosaic_facet::ctx::Ctx;
use mosaic_facet::error::BuildError;
use mosaic_facet::facet::FacetRef;
use mosaic_facet::hook::{FacetLookup, Hook, HookArgs};
use mosaic_facet::manager::FacetManager;

use crate::metadata::HookSet;

/// A facet produced during verify, not yet registered anywhere.
#[derive(Clone)]
pub(crate) struct Candidate {
    /// The produced facet.
    pub facet: FacetRef,
    /// Provenance of the producing hook.
    pub source: String,
    /// The producing hook's `required` list (last producer wins per kind, so
    /// only the last candidate's list feeds the facet graph).
    pub required: Vec<String>,
    /// Contract declared by the producing hook, if any.
    pub contract: Option<String>,
}

/// Candidate facets per kind, in production order.
///
/// Several candidates under one kind form the overwrite chain built during
/// this pass; the last entry is the one that will be registered.
#[derive(Clone, Default)]
pub(crate) struct CandidateSet {
    pub chains: IndexMap<String, Vec<Candidate>>,
}

impl CandidateSet {
    /// The winning candidate of a kind — the last produced.
    pub fn latest(&self, kind: &str) -> Option<&Candidate> {
        self.chains.get(kind)?.last()
    }

    /// Returns true if any candidate of the kind exists.
    pub fn contains(&self, kind: &str) -> bool {
        self.chains.contains_key(kind)
    }

    /// The candidate kinds, in first-production order.
    pub fn kinds(&self) -> impl Iterator<Item = &String> {
        self.chains.keys()
    }

    /// Every candidate, chain by chain.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Candidate)> {
        self.chains
            .iter()
            .flat_map(|(kind, chain)| chain.iter().map(move |candidate| (kind, candidate)))
    }

    /// Builds the lookup snapshot a factory sees: the latest candidate per
    /// kind, with attached facets from previous builds as fallback.
    fn snapshot(&self, manager: &FacetManager) -> FacetLookup {
        let mut pairs: IndexMap<String, FacetRef> = IndexMap::new();
        for kind in manager.kinds() {
            if let Some(entry) = manager.latest(kind) {
                pairs.insert(kind.to_string(), entry.facet().clone());
            }
        }
        for (kind, chain) in &self.chains {
            if let Some(candidate) = chain.last() {
                pairs.insert(kind.clone(), candidate.facet.clone());
            }
        }
        FacetLookup::from_pairs(pairs)
    }

    fn push(&mut self, kind: String, candidate: Candidate) {
        self.chains.entry(kind).or_default().push(candidate);
    }
}

/// Executes hooks in order, producing the candidate set.
///
/// # Errors
///
/// - [`BuildError::Factory`] wrapping a factory failure with hook context.
/// - [`BuildError::MissingKind`] / [`BuildError::KindMismatch`] for facets
///   whose identity does not line up with the producing hook.
/// - [`BuildError::DuplicateKind`] when a second producer of a kind appears in
///   the same pass and neither the new hook nor the new facet permits
///   overwrite.
pub(crate) async fn execute_hooks(
    hooks: &[Hook],
    set: &HookSet,
    order: &[usize],
    ctx: &Ctx,
    manager: &FacetManager,
) -> Result<CandidateSet, BuildError> {
    let mut candidates = CandidateSet::default();

    for &meta_index in order {
        let meta = &set.metas[meta_index];
        let hook = &hooks[meta.hook_index];

        let args = HookArgs::new(ctx.clone(), candidates.snapshot(manager));
        let produced = hook.invoke(args).await.map_err(|error| BuildError::Factory {
            kind: meta.kind.clone(),
            source: meta.source.clone(),
            error,
        })?;

        let Some(facet) = produced else {
            tracing::trace!(hook = %meta.identity(), "hook produced no facet");
            continue;
        };

        if facet.kind().is_empty() {
            return Err(BuildError::MissingKind {
                index: meta.hook_index,
                source: meta.source.clone(),
            });
        }
        if facet.kind() != meta.kind {
            return Err(BuildError::KindMismatch {
                hook_kind: meta.kind.clone(),
                facet_kind: facet.kind().to_string(),
                source: meta.source.clone(),
            });
        }

        if let Some(existing) = candidates.latest(&meta.kind) {
            let permitted = meta.overwrite || facet.allows_overwrite();
            if !permitted {
                return Err(BuildError::DuplicateKind {
                    kind: meta.kind.clone(),
                    first_source: existing.source.clone(),
                    second_source: meta.source.clone(),
                });
            }
            tracing::debug!(
                kind = %meta.kind,
                superseded = %existing.source,
                by = %meta.source,
                version = meta.version.as_deref().unwrap_or("-"),
                "overwrite candidate supersedes earlier producer"
            );
        }

        candidates.push(
            meta.kind.clone(),
            Candidate {
                facet,
                source: meta.source.clone(),
                required: meta.required.clone(),
                contract: meta.contract.clone(),
            },
        );
    }

    Ok(candidates)
}
