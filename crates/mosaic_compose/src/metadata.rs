//! Hook metadata extraction.
//!
//! Normalizes raw [`Hook`] descriptors into [`HookMeta`] records and groups
//! them by kind in registration order. Several hooks sharing a kind form an
//! overwrite chain; each record knows its position within that chain, which
//! the orderer uses to wire predecessor edges.

use indexmap::IndexMap;
use mosaic_facet::error::BuildError;
use mosaic_facet::hook::Hook;

/// Normalized metadata for a single hook.
#[derive(Debug, Clone)]
pub(crate) struct HookMeta {
    /// The component family the hook produces.
    pub kind: String,
    /// Position within the kind's overwrite chain.
    pub chain_index: usize,
    /// Index into the subsystem's hook list.
    pub hook_index: usize,
    /// Kinds the hook depends on, in declaration order.
    pub required: Vec<String>,
    /// Whether the hook may replace an existing facet of its kind.
    pub overwrite: bool,
    /// Provenance for diagnostics.
    pub source: String,
    /// Contract the produced facet must satisfy, if any.
    pub contract: Option<String>,
    /// Declared hook version, for diagnostics.
    pub version: Option<String>,
}

impl HookMeta {
    /// Synthetic identity used in hook-level diagnostics: `"<kind>:<index>"`.
    pub fn identity(&self) -> String {
        format!("{}:{}", self.kind, self.chain_index)
    }
}

/// The extracted hook set: metadata records plus the per-kind grouping.
#[derive(Debug, Default)]
pub(crate) struct HookSet {
    /// Metadata records, in registration order.
    pub metas: Vec<HookMeta>,
    /// Meta indices per kind, in registration order.
    pub by_kind: IndexMap<String, Vec<usize>>,
}

impl HookSet {
    /// The last registered producer of a kind — the "most enhanced" version,
    /// which later consumers resolve against.
    pub fn last_of(&self, kind: &str) -> Option<usize> {
        self.by_kind.get(kind)?.last().copied()
    }

    /// The immediate predecessor of a hook within its overwrite chain.
    pub fn predecessor(&self, meta: &HookMeta) -> Option<usize> {
        let chain = self.by_kind.get(&meta.kind)?;
        let previous = meta.chain_index.checked_sub(1)?;
        chain.get(previous).copied()
    }
}

/// Extracts metadata from a hook list, grouping by kind.
///
/// # Errors
///
/// [`BuildError::MissingKind`] if any hook has an empty kind.
pub(crate) fn extract(hooks: &[Hook]) -> Result<HookSet, BuildError> {
    let mut set = HookSet::default();

    for (hook_index, hook) in hooks.iter().enumerate() {
        if hook.kind().is_empty() {
            return Err(BuildError::MissingKind {
                index: hook_index,
                source: hook.source().to_string(),
            });
        }

        let chain = set.by_kind.entry(hook.kind().to_string()).or_default();
        let meta_index = set.metas.len();
        let meta = HookMeta {
            kind: hook.kind().to_string(),
            chain_index: chain.len(),
            hook_index,
            required: hook.required().to_vec(),
            overwrite: hook.overwrite(),
            source: hook.source().to_string(),
            contract: hook.contract().map(str::to_string),
            version: hook.version().map(str::to_string),
        };
        chain.push(meta_index);
        set.metas.push(meta);
    }

    Ok(set)
}
