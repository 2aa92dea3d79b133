//! Build orchestration for the Mosaic composition engine (Layer 2).
//!
//! `mosaic_compose` turns registered hooks into an initialized container:
//!
//! - [`subsystem`] - The container: hook registration, builds, lookup, teardown
//! - [`plan`] - The memoized output of the pure verify phase
//! - [`sort`] - Topological sorting with a shareable LRU result cache
//!
//! # The build protocol
//!
//! Every [`Subsystem::build`](subsystem::Subsystem::build) runs two phases:
//!
//! 1. **Verify** (pure) — hook metadata is extracted and ordered, factories
//!    run against a candidate registry, contracts are enforced, and the facet
//!    dependency graph is sorted (cache-aware) into a [`plan::BuildPlan`].
//!    Errors here leave the subsystem untouched.
//! 2. **Execute** (transactional) — the plan's facets are registered,
//!    initialized level-by-level (facets within a level concurrently), and
//!    attached as one atomic unit. A failing initializer rolls the whole
//!    batch back before the error surfaces.
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
//! struct Store;
//! impl Facet for Store {
//!     fn kind(&self) -> &str {
//!         "store"
//!     }
//! }
//!
//! # async fn demo() -> Result<(), mosaic_facet::error::BuildError> {
//! let mut subsystem = Subsystem::new();
//! subsystem
//!     .use_hook(
//!         Hook::from_fn("store", |_| Ok(Some(Arc::new(Store) as _)))
//!             .with_required(["logger"]),
//!     )
//!     .use_hook(Hook::from_fn("logger", |_| Ok(Some(Arc::new(Logger) as _))))
//!     .build()
//!     .await?;
//!
//! // Dependencies initialized first, regardless of registration order.
//! assert!(subsystem.find("store").is_some());
//! # Ok(())
//! # }
//! ```

mod executor;
mod graph;
mod invoke;
mod metadata;
mod order;

/// Build plans produced by the verify phase.
pub mod plan;

/// Topological sorting and the dependency-graph cache.
pub mod sort;

/// The subsystem container.
pub mod subsystem;

pub use plan::BuildPlan;
pub use sort::{CacheStats, DEFAULT_CACHE_CAPACITY, GraphCache};
pub use subsystem::Subsystem;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::plan::BuildPlan;
    pub use crate::sort::GraphCache;
    pub use crate::subsystem::Subsystem;
}
