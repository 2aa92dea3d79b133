//! Error types for facet composition.
//!
//! [`BuildError`] covers every failure the build orchestrator can surface.
//! Variants group into the taxonomy the engine documents:
//!
//! - structural: [`MissingKind`](BuildError::MissingKind),
//!   [`KindMismatch`](BuildError::KindMismatch)
//! - dependency: [`MissingDependency`](BuildError::MissingDependency),
//!   [`OverwriteWithoutPredecessor`](BuildError::OverwriteWithoutPredecessor)
//! - cycles: [`Cycle`](BuildError::Cycle)
//! - contracts: [`UnknownContract`](BuildError::UnknownContract),
//!   [`ContractViolation`](BuildError::ContractViolation)
//! - duplicates: [`DuplicateKind`](BuildError::DuplicateKind)
//! - execute phase: [`Factory`](BuildError::Factory),
//!   [`Initialization`](BuildError::Initialization)
//!
//! Everything except the execute-phase variants is detected during the pure
//! verify phase, before any container mutation. `Initialization` is raised
//! after the transactional rollback has completed.

use thiserror::Error;

/// A user-provided failure from a hook factory or facet lifecycle callback.
///
/// Carries a message and an optional boxed cause so callers can propagate
/// arbitrary error types through the engine without losing the chain.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct FacetError {
    message: String,
    #[source]
    cause: Option<Box<dyn core::error::Error + Send + Sync>>,
}

impl FacetError {
    /// Creates an error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn wrap(
        message: impl Into<String>,
        cause: impl Into<Box<dyn core::error::Error + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Returns the error message without the cause chain.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// A dependency cycle among facet kinds or hook identities.
///
/// `kinds` lists the vertices the topological sort could not order, in
/// registration order. Cloneable so the graph cache can store and re-raise
/// negative results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("circular dependency detected among: {}", kinds.join(", "))]
pub struct CycleError {
    /// The stuck vertices, in registration order.
    pub kinds: Vec<String>,
}

/// Errors raised by build-time orchestration.
#[derive(Debug, Error)]
pub enum BuildError {
    /// A hook (or the facet it produced) carries an empty kind.
    #[error("hook at position {index} from {source} has no kind")]
    MissingKind {
        /// Registration position of the offending hook.
        index: usize,
        /// Provenance of the offending hook.
        source: String,
    },

    /// A hook produced a facet whose kind differs from the hook's own.
    #[error(
        "hook '{hook_kind}' from {source} produced a facet of kind '{facet_kind}'"
    )]
    KindMismatch {
        /// The kind declared by the hook.
        hook_kind: String,
        /// The kind reported by the produced facet.
        facet_kind: String,
        /// Provenance of the offending hook.
        source: String,
    },

    /// Two producers yielded the same kind and neither side permits overwrite.
    #[error(
        "facet kind '{kind}' from {second_source} collides with existing facet from \
         {first_source} and neither permits overwrite"
    )]
    DuplicateKind {
        /// The colliding kind.
        kind: String,
        /// Provenance of the facet registered first.
        first_source: String,
        /// Provenance of the facet that collided with it.
        second_source: String,
    },

    /// An overwrite hook sits at the head of its chain with nothing to replace.
    #[error("overwrite hook '{kind}' from {source} has no predecessor to overwrite")]
    OverwriteWithoutPredecessor {
        /// The hook's kind.
        kind: String,
        /// Provenance of the offending hook.
        source: String,
    },

    /// A declared dependency resolves to neither a candidate nor an attached facet.
    #[error("facet '{kind}' from {source} requires missing facet '{missing}'")]
    MissingDependency {
        /// The dependent kind.
        kind: String,
        /// Provenance of the dependent's producing hook.
        source: String,
        /// The dependency that could not be resolved.
        missing: String,
    },

    /// The dependency graph contains a cycle.
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// A facet names a contract that is not in the registry.
    #[error("contract '{contract}' required by facet '{kind}' from {source} is not registered")]
    UnknownContract {
        /// The missing contract name.
        contract: String,
        /// The facet kind that declared it.
        kind: String,
        /// Provenance of the facet's producing hook.
        source: String,
    },

    /// A facet failed its contract's shape or custom checks.
    #[error("facet '{kind}' violates contract '{contract}': {reason}")]
    ContractViolation {
        /// The violated contract.
        contract: String,
        /// The offending facet kind.
        kind: String,
        /// What was missing or rejected.
        reason: String,
    },

    /// A hook factory returned an error.
    #[error("hook '{kind}' from {source} failed")]
    Factory {
        /// The hook's kind.
        kind: String,
        /// Provenance of the hook.
        source: String,
        /// The factory's error.
        #[source]
        error: FacetError,
    },

    /// A facet's `on_init` rejected; the batch has been rolled back.
    #[error("initialization of facet '{kind}' from {source} failed")]
    Initialization {
        /// The facet kind whose initializer failed.
        kind: String,
        /// Provenance of the facet's producing hook.
        source: String,
        /// The original initialization error, preserved.
        #[source]
        error: FacetError,
    },
}
