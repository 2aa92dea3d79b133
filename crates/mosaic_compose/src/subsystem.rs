//! The subsystem container.
//!
//! A [`Subsystem`] owns hooks, configuration, contracts, the facet registry,
//! and child subsystems, and drives the two-phase build protocol over them.
//!
//! # Philosophy
//!
//! **Everything is a facet.** A bare subsystem does nothing useful; all
//! functionality arrives through hooks, and the subsystem is just the
//! orchestrator that orders, validates, and wires what they produce.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mosaic_compose::subsystem::Subsystem;
//! use mosaic_facet::facet::Facet;
//! use mosaic_facet::hook::Hook;
//!
//! struct Logger;
//! impl Facet for Logger {
//!     fn kind(&self) -> &str {
//!         "logger"
//!     }
//! }
//!
//! # async fn demo() -> Result<(), mosaic_facet::error::BuildError> {
//! let mut subsystem = Subsystem::new();
//! subsystem
//!     .use_hook(Hook::from_fn("logger", |_| Ok(Some(Arc::new(Logger) as _))))
//!     .build()
//!     .await?;
//!
//! assert!(subsystem.find("logger").is_some());
//! # Ok(())
//! # }
//! ```
//!
//! # Lifecycle
//!
//! 1. **Registration** — [`use_hook`](Subsystem::use_hook) queues hooks,
//!    [`with_ctx`](Subsystem::with_ctx) layers configuration.
//! 2. **Build** — [`build`](Subsystem::build) verifies (pure) then executes
//!    (transactional); failures roll back to the pre-build state.
//! 3. **Access** — [`find`](Subsystem::find) and
//!    [`facets`](Subsystem::facets) reach attached facets.
//! 4. **Teardown** — [`dispose`](Subsystem::dispose) tears children down
//!    first, then facets in reverse topological order.

use futures::future::BoxFuture;
use mosaic_facet::contract::ContractRegistry;
use mosaic_facet::ctx::Ctx;
use mosaic_facet::error::BuildError;
use mosaic_facet::facet::FacetRef;
use mosaic_facet::hook::Hook;
use mosaic_facet::manager::FacetManager;

use crate::executor;
use crate::plan::BuildPlan;
use crate::sort::GraphCache;

/// A container of facets assembled by the build orchestrator.
pub struct Subsystem {
    name: String,
    base_ctx: Ctx,
    ctx: Ctx,
    hooks: Vec<Hook>,
    manager: FacetManager,
    contracts: ContractRegistry,
    cache: GraphCache,
    plan: Option<BuildPlan>,
    children: Vec<Subsystem>,
}

impl Default for Subsystem {
    fn default() -> Self {
        Self::new()
    }
}

impl Subsystem {
    /// Creates an empty subsystem.
    #[must_use]
    pub fn new() -> Self {
        Self::named("subsystem")
    }

    /// Creates an empty subsystem with a diagnostic name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_ctx: Ctx::new(),
            ctx: Ctx::new(),
            hooks: Vec::new(),
            manager: FacetManager::new(),
            contracts: ContractRegistry::new(),
            cache: GraphCache::new(),
            plan: None,
            children: Vec::new(),
        }
    }

    /// The subsystem's diagnostic name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────────

    /// Registers a hook. Chainable.
    ///
    /// Hooks run in registration order, subject to their declared
    /// requirements; several hooks of one kind form an overwrite chain.
    pub fn use_hook(&mut self, hook: Hook) -> &mut Self {
        self.hooks.push(hook);
        self
    }

    /// Layers configuration over the subsystem's base context. Chainable.
    ///
    /// Objects merge recursively; scalars and arrays replace.
    pub fn with_ctx(&mut self, ctx: Ctx) -> &mut Self {
        self.base_ctx.merge(&ctx);
        self
    }

    /// Adds a child subsystem, built and disposed recursively. Chainable.
    ///
    /// Children resolve their context by merging their own base context over
    /// this subsystem's resolved context.
    pub fn add_child(&mut self, child: Subsystem) -> &mut Self {
        self.children.push(child);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Build
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs the two-phase build with this subsystem's own graph cache.
    ///
    /// # Errors
    ///
    /// Verify-phase errors leave the subsystem untouched; an initialization
    /// failure is re-thrown after the batch has been rolled back, so a second
    /// `build` may be retried.
    pub async fn build(&mut self) -> Result<&mut Self, BuildError> {
        let cache = self.cache.clone();
        self.build_with_cache(&cache).await
    }

    /// Runs the two-phase build against a shared dependency-graph cache,
    /// enabling cross-subsystem cache reuse.
    ///
    /// # Errors
    ///
    /// Same as [`build`](Subsystem::build).
    pub async fn build_with_cache(&mut self, cache: &GraphCache) -> Result<&mut Self, BuildError> {
        self.build_inner(None, cache).await?;
        Ok(self)
    }

    fn build_inner<'a>(
        &'a mut self,
        parent_ctx: Option<&'a Ctx>,
        cache: &'a GraphCache,
    ) -> BoxFuture<'a, Result<(), BuildError>> {
        Box::pin(async move {
            let resolved = match parent_ctx {
                Some(parent) => parent.merged(&self.base_ctx),
                None => self.base_ctx.clone(),
            };
            let fingerprint = resolved.fingerprint();

            // Verify, memoized per context fingerprint.
            let plan = match &self.plan {
                Some(plan) if plan.ctx_fingerprint() == fingerprint => {
                    tracing::debug!(subsystem = %self.name, "reusing memoized build plan");
                    plan.clone()
                }
                _ => {
                    let plan = executor::verify(
                        &self.hooks,
                        &resolved,
                        &self.manager,
                        &self.contracts,
                        cache,
                    )
                    .await?;
                    self.plan = Some(plan.clone());
                    plan
                }
            };

            // Execute: the resolved context is assigned to the subsystem
            // first, then the plan registers/initializes/attaches facets
            // transactionally.
            self.ctx = resolved;
            executor::execute(&plan, &self.ctx, &mut self.manager).await?;
            tracing::info!(
                subsystem = %self.name,
                facets = plan.len(),
                "build complete"
            );

            let parent = self.ctx.clone();
            for child in &mut self.children {
                child.build_inner(Some(&parent), cache).await?;
            }
            Ok(())
        })
    }

    /// Clears the memoized build plan, allowing incremental
    /// [`use_hook`](Subsystem::use_hook) followed by a fresh
    /// [`build`](Subsystem::build). Chainable.
    pub fn reload(&mut self) -> &mut Self {
        self.plan = None;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access
    // ─────────────────────────────────────────────────────────────────────────

    /// Returns the latest (highest order index) attached facet of a kind.
    #[must_use]
    pub fn find(&self, kind: &str) -> Option<FacetRef> {
        self.manager.find(kind)
    }

    /// Multi-facet access: the full registry with
    /// [`get_all`](FacetManager::get_all),
    /// [`get_by_index`](FacetManager::get_by_index), and
    /// [`has`](FacetManager::has).
    #[must_use]
    pub fn facets(&self) -> &FacetManager {
        &self.manager
    }

    /// The resolved configuration context (assigned by the last build).
    #[must_use]
    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// The contract registry.
    #[must_use]
    pub fn contracts(&self) -> &ContractRegistry {
        &self.contracts
    }

    /// Mutable access to the contract registry, for registering contracts
    /// before a build.
    pub fn contracts_mut(&mut self) -> &mut ContractRegistry {
        &mut self.contracts
    }

    /// This subsystem's own dependency-graph cache.
    #[must_use]
    pub fn graph_cache(&self) -> &GraphCache {
        &self.cache
    }

    /// The memoized plan from the last successful verify, if any.
    #[must_use]
    pub fn plan(&self) -> Option<&BuildPlan> {
        self.plan.as_ref()
    }

    /// Child subsystems.
    #[must_use]
    pub fn children(&self) -> &[Subsystem] {
        &self.children
    }

    /// Mutable access to child subsystems.
    pub fn children_mut(&mut self) -> &mut [Subsystem] {
        &mut self.children
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Teardown
    // ─────────────────────────────────────────────────────────────────────────

    /// Disposes children (in reverse registration order), then every facet in
    /// reverse topological order, then clears the registry and the memoized
    /// plan.
    ///
    /// Disposal errors are suppressed and logged so teardown always
    /// completes.
    pub async fn dispose(&mut self) {
        self.dispose_inner().await;
    }

    fn dispose_inner(&mut self) -> BoxFuture<'_, ()> {
        Box::pin(async move {
            for child in self.children.iter_mut().rev() {
                child.dispose_inner().await;
            }

            for (kind, facet) in self.manager.active_in_order().into_iter().rev() {
                if let Err(error) = facet.on_dispose().await {
                    tracing::warn!(
                        subsystem = %self.name,
                        kind = %kind,
                        error = %error,
                        "disposal error suppressed"
                    );
                }
            }

            self.manager.clear();
            self.plan = None;
            tracing::debug!(subsystem = %self.name, "disposed");
        })
    }
}

impl core::fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Subsystem")
            .field("name", &self.name)
            .field("hooks", &self.hooks.len())
            .field("facets", &self.manager.len())
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
