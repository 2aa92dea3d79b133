//! Core vocabulary for the Mosaic composition engine (Layer 1).
//!
//! `mosaic_facet` provides the primitives the build orchestrator composes:
//!
//! - [`facet`] - The facet trait, lifecycle callbacks, and init environment
//! - [`hook`] - Factory descriptors that produce facets
//! - [`manager`] - The per-subsystem facet registry
//! - [`contract`] - Named interface specifications and their registry
//! - [`ctx`] - Merged configuration contexts with canonical fingerprints
//! - [`error`] - The build error taxonomy
//!
//! # Architecture
//!
//! This crate is Layer 1 of the Mosaic architecture:
//!
//! - **Layer 1** (`mosaic_facet`): facet/hook/contract vocabulary (this crate)
//! - **Layer 2** (`mosaic_compose`): ordering, planning, and transactional
//!   builds over that vocabulary
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use mosaic_facet::facet::Facet;
//! use mosaic_facet::hook::Hook;
//!
//! struct Logger;
//!
//! impl Facet for Logger {
//!     fn kind(&self) -> &str {
//!         "logger"
//!     }
//!
//!     fn methods(&self) -> &[&'static str] {
//!         &["log"]
//!     }
//! }
//!
//! let hook = Hook::from_fn("logger", |_args| Ok(Some(Arc::new(Logger) as _)));
//! assert_eq!(hook.kind(), "logger");
//! ```

/// Named interface specifications and their registry.
pub mod contract;

/// Merged configuration contexts.
pub mod ctx;

/// Error types for facet composition.
pub mod error;

/// The facet trait and initialization environment.
pub mod facet;

/// Hook descriptors and factory invocation.
pub mod hook;

/// The per-subsystem facet registry.
pub mod manager;

pub use contract::{Contract, ContractRegistry, ContractValidator};
pub use ctx::{Ctx, CtxError};
pub use error::{BuildError, CycleError, FacetError};
pub use facet::{Facet, FacetRef, InitEnv};
pub use hook::{FacetLookup, Hook, HookArgs, HookResult};
pub use manager::{FacetEntry, FacetManager, FacetState};

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::contract::{Contract, ContractRegistry};
    pub use crate::ctx::Ctx;
    pub use crate::error::{BuildError, CycleError, FacetError};
    pub use crate::facet::{Facet, FacetRef, InitEnv};
    pub use crate::hook::{Hook, HookArgs, HookResult};
    pub use crate::manager::{FacetManager, FacetState};
}
