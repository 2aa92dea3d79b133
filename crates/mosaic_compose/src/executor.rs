//! The two-phase build executor.
//!
//! **Verify** is pure: extract hook metadata, order hooks, run factories into
//! a candidate set, enforce contracts, build the facet graph, and sort it
//! through the cache. Nothing on the subsystem changes; every taxonomy error
//! except initialization failures is raised here.
//!
//! **Execute** is transactional: partition the plan against the current
//! registry, remove superseded facets, then register, initialize (level by
//! level), and attach the batch as one atomic unit. Any initialization
//! failure disposes the whole batch in reverse topological order, restores
//! superseded facets, and re-throws the original error — afterwards the
//! subsystem looks exactly as it did before the build.

use futures::future::join_all;
use mosaic_facet::contract::ContractRegistry;
use mosaic_facet::ctx::Ctx;
use mosaic_facet::error::BuildError;
use mosaic_facet::facet::{FacetRef, InitEnv};
use mosaic_facet::hook::Hook;
use mosaic_facet::manager::{FacetEntry, FacetManager, FacetState};

use crate::graph::build_graph;
use crate::invoke::execute_hooks;
use crate::metadata::extract;
use crate::order::order_hooks;
use crate::plan::BuildPlan;
use crate::sort::{GraphCache, sort_with_cache};

/// Runs the pure verify phase and produces a build plan.
///
/// # Errors
///
/// Any structural, dependency, cycle, contract, duplicate-kind, or factory
/// error from the verify pipeline. The subsystem is untouched on failure.
pub(crate) async fn verify(
    hooks: &[Hook],
    ctx: &Ctx,
    manager: &FacetManager,
    contracts: &ContractRegistry,
    cache: &GraphCache,
) -> Result<BuildPlan, BuildError> {
    let set = extract(hooks)?;
    let order = order_hooks(&set)?;
    tracing::debug!(hooks = order.len(), "hooks ordered");

    let candidates = execute_hooks(hooks, &set, &order, ctx, manager).await?;
    validate_contracts(&candidates, ctx, contracts)?;

    let graph = build_graph(&candidates, manager)?;
    let ordered_kinds = sort_with_cache(&graph, cache)?;
    tracing::debug!(facets = ordered_kinds.len(), "facet order resolved");

    Ok(BuildPlan {
        ctx_fingerprint: ctx.fingerprint(),
        ordered_kinds,
        candidates,
        deps: graph.deps,
    })
}

/// Enforces contracts over every candidate, before any graph work.
///
/// The facet's own contract declaration wins over the producing hook's.
fn validate_contracts(
    candidates: &crate::invoke::CandidateSet,
    ctx: &Ctx,
    contracts: &ContractRegistry,
) -> Result<(), BuildError> {
    for (_, candidate) in candidates.iter() {
        let declared = candidate
            .facet
            .contract()
            .map(str::to_string)
            .or_else(|| candidate.contract.clone());
        let Some(name) = declared else {
            continue;
        };
        contracts.enforce(&name, ctx, candidate.facet.as_ref(), &candidate.source)?;
    }
    Ok(())
}

/// One facet scheduled for registration in this execute call.
struct BatchMember {
    kind: String,
    facet: FacetRef,
    source: String,
}

/// Runs the transactional execute phase for a verified plan.
///
/// # Errors
///
/// [`BuildError::Initialization`] after the batch has been rolled back.
pub(crate) async fn execute(
    plan: &BuildPlan,
    ctx: &Ctx,
    manager: &mut FacetManager,
) -> Result<(), BuildError> {
    // Partition the plan against the current registry before touching
    // anything:
    // - *new*: no existing facet of that kind
    // - *same instance*: already attached means nothing to do; still
    //   registered means a previous attempt was rolled back and the facet is
    //   promoted with this batch
    // - *overwrite*: a different instance supersedes the attached facet.
    //   In-pass duplicate collisions were already rejected during verify, so
    //   a differing instance here is a legitimate replacement (an overwrite
    //   chain winner, or the same hook re-run after a context change).
    let mut batch: Vec<BatchMember> = Vec::new();
    let mut superseded: Vec<(String, FacetRef)> = Vec::new();

    for kind in &plan.ordered_kinds {
        let Some(candidate) = plan.candidates.latest(kind) else {
            continue;
        };
        match manager.latest(kind) {
            None => {
                batch.push(BatchMember {
                    kind: kind.clone(),
                    facet: candidate.facet.clone(),
                    source: candidate.source.clone(),
                });
            }
            Some(entry) if std::sync::Arc::ptr_eq(entry.facet(), &candidate.facet) => {
                if entry.state() == FacetState::Registered {
                    batch.push(BatchMember {
                        kind: kind.clone(),
                        facet: candidate.facet.clone(),
                        source: candidate.source.clone(),
                    });
                }
            }
            Some(entry) => {
                superseded.push((kind.clone(), entry.facet().clone()));
                batch.push(BatchMember {
                    kind: kind.clone(),
                    facet: candidate.facet.clone(),
                    source: candidate.source.clone(),
                });
            }
        }
    }

    // Remove superseded facets first. They are dropped without on_dispose;
    // their replacement subsumes them. Kept aside so a failed batch can
    // restore them.
    let mut removed: Vec<(String, FacetEntry)> = Vec::new();
    for (kind, facet) in &superseded {
        if let Some(entry) = manager.remove_entry(kind, facet) {
            tracing::debug!(kind = %kind, source = %entry.source(), "superseded facet removed");
            removed.push((kind.clone(), entry));
        }
    }

    match add_many(plan, &batch, ctx, manager).await {
        Ok(()) => Ok(()),
        Err(error) => {
            for (kind, entry) in removed {
                manager.restore_entry(kind, entry);
            }
            Err(error)
        }
    }
}

/// Registers, initializes, and attaches a batch as one atomic operation.
async fn add_many(
    plan: &BuildPlan,
    batch: &[BatchMember],
    ctx: &Ctx,
    manager: &mut FacetManager,
) -> Result<(), BuildError> {
    if batch.is_empty() {
        return Ok(());
    }

    for member in batch {
        manager.register(member.kind.clone(), member.facet.clone(), member.source.clone());
    }

    let batch_kinds: Vec<String> = batch.iter().map(|member| member.kind.clone()).collect();
    let levels = plan.levels_for(&batch_kinds);

    let shared: &FacetManager = &*manager;
    let mut failure: Option<BuildError> = None;
    for (depth, level) in levels.iter().enumerate() {
        tracing::debug!(level = depth, facets = level.len(), "initializing level");
        let mut futures = Vec::with_capacity(level.len());
        for kind in level {
            let Some(member) = batch.iter().find(|member| member.kind == *kind) else {
                continue;
            };
            let env = InitEnv::new(ctx, shared);
            futures.push(async move {
                member.facet.on_init(env).await.map_err(|error| {
                    BuildError::Initialization {
                        kind: member.kind.clone(),
                        source: member.source.clone(),
                        error,
                    }
                })
            });
        }

        // All futures in the level settle before the outcome is inspected;
        // siblings already in flight are never aborted early.
        for result in join_all(futures).await {
            if let Err(error) = result {
                failure.get_or_insert(error);
            }
        }
        if failure.is_some() {
            break;
        }
    }

    if let Some(error) = failure {
        tracing::debug!(error = %error, "initialization failed, rolling back batch");
        rollback(plan, batch, manager).await;
        return Err(error);
    }

    for member in batch {
        manager.activate(&member.kind, &member.facet, member.facet.expose());
    }

    Ok(())
}

/// Disposes and unregisters every batch member, in reverse topological order.
///
/// Disposal errors are suppressed so the rollback always completes; they are
/// reported through the diagnostic channel instead of masking the original
/// failure.
async fn rollback(plan: &BuildPlan, batch: &[BatchMember], manager: &mut FacetManager) {
    for kind in plan.ordered_kinds.iter().rev() {
        let Some(member) = batch.iter().find(|member| member.kind == *kind) else {
            continue;
        };
        if let Err(error) = member.facet.on_dispose().await {
            tracing::warn!(
                kind = %member.kind,
                error = %error,
                "disposal error suppressed during rollback"
            );
        }
        manager.remove_entry(&member.kind, &member.facet);
    }
}
