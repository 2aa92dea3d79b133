//! Hook descriptors and factory invocation.
//!
//! A [`Hook`] is an immutable factory descriptor: a kind, ordering metadata
//! (required kinds, overwrite flag), provenance, an optional contract name,
//! and the factory itself. Hooks are registered on a subsystem in caller
//! order; several hooks may share a kind to form an overwrite chain, where
//! later hooks replace the facet produced by earlier ones.
//!
//! Factories receive an owned [`HookArgs`] snapshot — the resolved context
//! plus a [`FacetLookup`] over facets produced earlier in the same build pass
//! (and facets already attached from previous builds) — and return
//! `Ok(Some(facet))`, `Ok(None)` to produce nothing, or an error.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
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
//! let hook = Hook::from_fn("logger", |_args| Ok(Some(Arc::new(Logger) as _)))
//!     .with_source("example")
//!     .with_version("1.0.0");
//! assert_eq!(hook.kind(), "logger");
//! ```
//!
//! Async factories box their future, mirroring how systems are written
//! elsewhere in the workspace:
//!
//! ```
//! # use std::sync::Arc;
//! # use mosaic_facet::facet::Facet;
//! # use mosaic_facet::hook::Hook;
//! # struct Store;
//! # impl Facet for Store {
//! #     fn kind(&self) -> &str { "store" }
//! # }
//! let hook = Hook::new("store", |args| {
//!     Box::pin(async move {
//!         let _endpoint = args.ctx().get("store.endpoint").cloned();
//!         Ok(Some(Arc::new(Store) as _))
//!     })
//! })
//! .with_required(["logger"]);
//! ```

use futures::future::BoxFuture;
use indexmap::IndexMap;

use crate::ctx::Ctx;
use crate::error::FacetError;
use crate::facet::FacetRef;

/// What a hook factory produces: a facet, nothing, or a failure.
pub type HookResult = Result<Option<FacetRef>, FacetError>;

/// Type-erased hook factory.
type BoxedFactory = Box<dyn Fn(HookArgs) -> BoxFuture<'static, HookResult> + Send + Sync>;

/// Default provenance for hooks that never call [`Hook::with_source`].
pub const ANONYMOUS_SOURCE: &str = "<anonymous>";

/// Snapshot of the facets visible to a factory at invocation time.
///
/// Holds the latest facet per kind: every candidate produced by hooks that ran
/// earlier in the current pass, with facets attached in previous builds as
/// fallback.
#[derive(Clone, Default)]
pub struct FacetLookup {
    facets: IndexMap<String, FacetRef>,
}

impl FacetLookup {
    /// Builds a lookup from `(kind, facet)` pairs; later pairs win.
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, FacetRef)>) -> Self {
        Self {
            facets: pairs.into_iter().collect(),
        }
    }

    /// Returns the latest facet of a kind.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<FacetRef> {
        self.facets.get(kind).cloned()
    }

    /// Returns true if a facet of the kind is visible.
    #[must_use]
    pub fn has(&self, kind: &str) -> bool {
        self.facets.contains_key(kind)
    }

    /// The visible kinds, in first-seen order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.facets.keys().map(String::as_str).collect()
    }
}

impl core::fmt::Debug for FacetLookup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FacetLookup")
            .field("kinds", &self.kinds())
            .finish()
    }
}

/// Owned arguments handed to a hook factory.
pub struct HookArgs {
    ctx: Ctx,
    facets: FacetLookup,
}

impl HookArgs {
    /// Creates factory arguments from a resolved context and facet snapshot.
    #[must_use]
    pub fn new(ctx: Ctx, facets: FacetLookup) -> Self {
        Self { ctx, facets }
    }

    /// The resolved configuration context.
    #[must_use]
    pub fn ctx(&self) -> &Ctx {
        &self.ctx
    }

    /// Facets visible to this factory.
    #[must_use]
    pub fn facets(&self) -> &FacetLookup {
        &self.facets
    }
}

/// An immutable factory descriptor.
pub struct Hook {
    kind: String,
    version: Option<String>,
    required: Vec<String>,
    overwrite: bool,
    source: String,
    contract: Option<String>,
    factory: BoxedFactory,
}

impl Hook {
    /// Creates a hook with an async factory.
    ///
    /// The factory receives owned [`HookArgs`] and returns a boxed future, so
    /// the usual shape is `|args| Box::pin(async move { ... })`.
    pub fn new<F>(kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(HookArgs) -> BoxFuture<'static, HookResult> + Send + Sync + 'static,
    {
        Self {
            kind: kind.into(),
            version: None,
            required: Vec::new(),
            overwrite: false,
            source: ANONYMOUS_SOURCE.to_string(),
            contract: None,
            factory: Box::new(factory),
        }
    }

    /// Creates a hook from a synchronous factory.
    pub fn from_fn<F>(kind: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&HookArgs) -> HookResult + Send + Sync + 'static,
    {
        Self::new(kind, move |args| {
            let outcome = factory(&args);
            Box::pin(async move { outcome })
        })
    }

    /// Sets the hook's version string.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Declares the kinds this hook depends on, in order.
    #[must_use]
    pub fn with_required<I, S>(mut self, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required = required.into_iter().map(Into::into).collect();
        self
    }

    /// Appends a single required kind.
    #[must_use]
    pub fn require(mut self, kind: impl Into<String>) -> Self {
        self.required.push(kind.into());
        self
    }

    /// Permits this hook to replace an existing facet of the same kind.
    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Sets the provenance string used in diagnostics.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Names the contract the produced facet must satisfy.
    #[must_use]
    pub fn with_contract(mut self, contract: impl Into<String>) -> Self {
        self.contract = Some(contract.into());
        self
    }

    /// The component family this hook produces.
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The hook's version, if declared.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// The kinds this hook depends on.
    #[must_use]
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Whether this hook may replace an existing facet of its kind.
    #[must_use]
    pub fn overwrite(&self) -> bool {
        self.overwrite
    }

    /// Provenance string for diagnostics.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The contract name the produced facet must satisfy, if any.
    #[must_use]
    pub fn contract(&self) -> Option<&str> {
        self.contract.as_deref()
    }

    /// Invokes the factory.
    pub fn invoke(&self, args: HookArgs) -> BoxFuture<'static, HookResult> {
        (self.factory)(args)
    }
}

impl core::fmt::Debug for Hook {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hook")
            .field("kind", &self.kind)
            .field("version", &self.version)
            .field("required", &self.required)
            .field("overwrite", &self.overwrite)
            .field("source", &self.source)
            .field("contract", &self.contract)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facet::Facet;
    use std::sync::Arc;

    struct Probe;

    impl Facet for Probe {
        fn kind(&self) -> &str {
            "probe"
        }
    }

    #[test]
    fn builder_sets_all_metadata() {
        let hook = Hook::from_fn("probe", |_| Ok(None))
            .with_version("2.1.0")
            .with_required(["logger", "bus"])
            .require("store")
            .with_overwrite(true)
            .with_source("tests::builder")
            .with_contract("probe-contract");

        assert_eq!(hook.kind(), "probe");
        assert_eq!(hook.version(), Some("2.1.0"));
        assert_eq!(hook.required(), ["logger", "bus", "store"]);
        assert!(hook.overwrite());
        assert_eq!(hook.source(), "tests::builder");
        assert_eq!(hook.contract(), Some("probe-contract"));
    }

    #[test]
    fn default_source_is_anonymous() {
        let hook = Hook::from_fn("probe", |_| Ok(None));
        assert_eq!(hook.source(), ANONYMOUS_SOURCE);
    }

    #[tokio::test]
    async fn sync_factory_produces_a_facet() {
        let hook = Hook::from_fn("probe", |_| Ok(Some(Arc::new(Probe) as FacetRef)));
        let args = HookArgs::new(Ctx::new(), FacetLookup::default());
        let produced = hook.invoke(args).await.unwrap().unwrap();
        assert_eq!(produced.kind(), "probe");
    }

    #[tokio::test]
    async fn async_factory_reads_args() {
        let hook = Hook::new("probe", |args| {
            Box::pin(async move {
                if args.facets().has("logger") {
                    Ok(Some(Arc::new(Probe) as FacetRef))
                } else {
                    Ok(None)
                }
            })
        });

        let empty = HookArgs::new(Ctx::new(), FacetLookup::default());
        assert!(hook.invoke(empty).await.unwrap().is_none());

        let lookup = FacetLookup::from_pairs([("logger".to_string(), Arc::new(Probe) as FacetRef)]);
        let seeded = HookArgs::new(Ctx::new(), lookup);
        assert!(hook.invoke(seeded).await.unwrap().is_some());
    }
}
