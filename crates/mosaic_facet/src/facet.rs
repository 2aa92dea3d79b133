//! The facet trait and initialization environment.
//!
//! A facet is a component instance produced by a [`Hook`](crate::hook::Hook)
//! factory. The engine treats facets as opaque beyond this trait: it reads
//! their identity and declared dependencies, enforces contracts against their
//! capability surface, and drives their lifecycle.
//!
//! # Lifecycle
//!
//! 1. **Candidate** — produced during the verify phase, visible only to later
//!    hooks' lookups.
//! 2. **Registered** — inserted into the container's registry at the start of
//!    the transactional execute phase.
//! 3. **Attached** — `on_init` completed; reachable via `find` when
//!    [`expose`](Facet::expose) is true.
//! 4. **Disposed** — `on_dispose` runs in reverse topological order on
//!    teardown, or during rollback after a failed build.
//!
//! # Example
//!
//! ```
//! use mosaic_facet::facet::Facet;
//!
//! struct Cache {
//!     capacity: usize,
//! }
//!
//! impl Facet for Cache {
//!     fn kind(&self) -> &str {
//!         "cache"
//!     }
//!
//!     fn dependencies(&self) -> Vec<String> {
//!         vec!["logger".into()]
//!     }
//!
//!     fn methods(&self) -> &[&'static str] {
//!         &["get", "put"]
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use downcast_rs::{DowncastSync, impl_downcast};
use serde_json::Value;

use crate::ctx::Ctx;
use crate::error::FacetError;
use crate::manager::FacetManager;

/// Shared handle to a type-erased facet.
pub type FacetRef = Arc<dyn Facet>;

/// A component instance managed by the composition engine.
///
/// Only [`kind`](Facet::kind) is mandatory; everything else defaults to the
/// least surprising behavior (no dependencies, no contract, exposed, no-op
/// lifecycle).
#[async_trait]
pub trait Facet: DowncastSync {
    /// The component family this facet belongs to. Must match the producing
    /// hook's kind.
    fn kind(&self) -> &str;

    /// The contract this facet must satisfy, if any.
    fn contract(&self) -> Option<&str> {
        None
    }

    /// Facet-level dependencies, by kind. These are merged with the producing
    /// hook's `required` list when the dependency graph is built.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether this facet may replace an existing facet of the same kind.
    fn allows_overwrite(&self) -> bool {
        false
    }

    /// Whether the facet is attached to the container surface after
    /// initialization. Non-exposed facets are still initialized and reachable
    /// through indexed access, but `find` skips them.
    fn expose(&self) -> bool {
        true
    }

    /// Names of the callable operations this facet provides. Contracts check
    /// their required methods against this listing.
    fn methods(&self) -> &[&'static str] {
        &[]
    }

    /// Looks up a named property. Contracts treat `None` as "property
    /// missing"; `Some(Value::Null)` counts as present.
    fn property(&self, _name: &str) -> Option<Value> {
        None
    }

    /// Called once during the transactional execute phase, after every facet
    /// in the batch has been registered and after all of this facet's
    /// dependencies have finished their own `on_init`.
    ///
    /// Facets in the same dependency level initialize concurrently.
    async fn on_init(&self, _env: InitEnv<'_>) -> Result<(), FacetError> {
        Ok(())
    }

    /// Called in reverse topological order on teardown, and best-effort during
    /// rollback after a failed build.
    async fn on_dispose(&self) -> Result<(), FacetError> {
        Ok(())
    }
}

impl_downcast!(sync Facet);

/// Environment handed to [`Facet::on_init`].
///
/// Gives read access to the resolved context and to the facets of the current
/// batch. Dependencies from earlier levels are fully initialized; within a
/// build, same-level siblings may still be mid-initialization and should not
/// be relied upon.
#[derive(Clone, Copy)]
pub struct InitEnv<'a> {
    ctx: &'a Ctx,
    facets: &'a FacetManager,
}

impl<'a> InitEnv<'a> {
    /// Creates an environment over a resolved context and facet registry.
    #[must_use]
    pub fn new(ctx: &'a Ctx, facets: &'a FacetManager) -> Self {
        Self { ctx, facets }
    }

    /// The resolved configuration context.
    #[must_use]
    pub fn ctx(&self) -> &Ctx {
        self.ctx
    }

    /// Looks up the latest facet of a kind, regardless of attachment state.
    ///
    /// During a build this sees every facet registered in the current batch,
    /// including ones whose `on_init` has not yet run.
    #[must_use]
    pub fn facet(&self, kind: &str) -> Option<FacetRef> {
        self.facets.latest(kind).map(|entry| entry.facet().clone())
    }

    /// Returns true if a facet of the given kind is registered.
    #[must_use]
    pub fn has(&self, kind: &str) -> bool {
        self.facets.latest(kind).is_some()
    }
}
