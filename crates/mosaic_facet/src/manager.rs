//! Facet registry.
//!
//! The [`FacetManager`] tracks every facet a subsystem owns, per kind and in
//! registration order. Entries move through two states:
//!
//! - [`FacetState::Registered`] — inserted by the transactional execute phase,
//!   `on_init` not yet complete.
//! - [`FacetState::Active`] — initialization finished; the entry carries its
//!   topological `order_index` and whether it is exposed through `find`.
//!
//! Multiple facets may share a kind (historical entries across incremental
//! builds, or deliberately stacked non-exposed facets); `find` answers the
//! exposed active entry with the highest order index, while
//! [`get_all`](FacetManager::get_all) and
//! [`get_by_index`](FacetManager::get_by_index) expose the full chain.

use indexmap::IndexMap;

use crate::facet::FacetRef;

/// Lifecycle state of a registered facet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacetState {
    /// Registered in the current batch; `on_init` has not completed.
    Registered,
    /// Initialized and part of the container.
    Active {
        /// Position in the global attachment sequence (topological order,
        /// monotonically increasing across builds).
        order_index: usize,
        /// Whether `find` may answer with this entry.
        exposed: bool,
    },
}

/// A facet plus its registration bookkeeping.
#[derive(Clone)]
pub struct FacetEntry {
    facet: FacetRef,
    source: String,
    insertion_index: usize,
    state: FacetState,
}

impl FacetEntry {
    /// The facet itself.
    #[must_use]
    pub fn facet(&self) -> &FacetRef {
        &self.facet
    }

    /// Provenance of the hook that produced this facet.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Global insertion sequence number.
    #[must_use]
    pub fn insertion_index(&self) -> usize {
        self.insertion_index
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> FacetState {
        self.state
    }

    /// Topological order index, if the entry is active.
    #[must_use]
    pub fn order_index(&self) -> Option<usize> {
        match self.state {
            FacetState::Active { order_index, .. } => Some(order_index),
            FacetState::Registered => None,
        }
    }

    fn is_exposed_active(&self) -> bool {
        matches!(self.state, FacetState::Active { exposed: true, .. })
    }
}

impl core::fmt::Debug for FacetEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FacetEntry")
            .field("kind", &self.facet.kind())
            .field("source", &self.source)
            .field("insertion_index", &self.insertion_index)
            .field("state", &self.state)
            .finish()
    }
}

/// Registry from kind to the facets currently owned by a subsystem.
#[derive(Default)]
pub struct FacetManager {
    entries: IndexMap<String, Vec<FacetEntry>>,
    next_insertion: usize,
    next_order: usize,
}

impl FacetManager {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a facet under a kind in the [`FacetState::Registered`] state.
    ///
    /// Returns the entry's insertion index.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        facet: FacetRef,
        source: impl Into<String>,
    ) -> usize {
        let insertion_index = self.next_insertion;
        self.next_insertion += 1;
        self.entries.entry(kind.into()).or_default().push(FacetEntry {
            facet,
            source: source.into(),
            insertion_index,
            state: FacetState::Registered,
        });
        insertion_index
    }

    /// Promotes a registered facet to [`FacetState::Active`], assigning it the
    /// next order index.
    ///
    /// The entry is identified by pointer equality. Returns the assigned order
    /// index, or `None` if no matching entry exists.
    pub fn activate(&mut self, kind: &str, facet: &FacetRef, exposed: bool) -> Option<usize> {
        let entry = self
            .entries
            .get_mut(kind)?
            .iter_mut()
            .find(|entry| std::sync::Arc::ptr_eq(&entry.facet, facet))?;
        let order_index = self.next_order;
        self.next_order += 1;
        entry.state = FacetState::Active {
            order_index,
            exposed,
        };
        Some(order_index)
    }

    /// Returns the exposed active facet of a kind with the highest order
    /// index.
    #[must_use]
    pub fn find(&self, kind: &str) -> Option<FacetRef> {
        self.entries
            .get(kind)?
            .iter()
            .filter(|entry| entry.is_exposed_active())
            .max_by_key(|entry| entry.order_index())
            .map(|entry| entry.facet.clone())
    }

    /// Returns the most recently registered entry of a kind, in any state.
    #[must_use]
    pub fn latest(&self, kind: &str) -> Option<&FacetEntry> {
        self.entries.get(kind)?.last()
    }

    /// Returns every facet registered under a kind, in registration order.
    #[must_use]
    pub fn get_all(&self, kind: &str) -> Vec<FacetRef> {
        self.entries
            .get(kind)
            .map(|chain| chain.iter().map(|entry| entry.facet.clone()).collect())
            .unwrap_or_default()
    }

    /// Returns the `index`-th facet registered under a kind.
    #[must_use]
    pub fn get_by_index(&self, kind: &str, index: usize) -> Option<FacetRef> {
        self.entries
            .get(kind)?
            .get(index)
            .map(|entry| entry.facet.clone())
    }

    /// Returns true if any facet of the kind is registered.
    #[must_use]
    pub fn has(&self, kind: &str) -> bool {
        self.entries
            .get(kind)
            .is_some_and(|chain| !chain.is_empty())
    }

    /// Returns the registered kinds, in first-registration order.
    #[must_use]
    pub fn kinds(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, chain)| !chain.is_empty())
            .map(|(kind, _)| kind.as_str())
            .collect()
    }

    /// Total number of registered facets across all kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Returns true if no facets are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the entry holding exactly this facet (pointer equality).
    ///
    /// Used when an overwrite supersedes an attached facet and when a failed
    /// batch is rolled back.
    pub fn remove_entry(&mut self, kind: &str, facet: &FacetRef) -> Option<FacetEntry> {
        let chain = self.entries.get_mut(kind)?;
        let position = chain
            .iter()
            .position(|entry| std::sync::Arc::ptr_eq(&entry.facet, facet))?;
        Some(chain.remove(position))
    }

    /// Re-inserts a previously removed entry, preserving its bookkeeping.
    ///
    /// Used to restore superseded facets when the batch that displaced them
    /// fails and rolls back.
    pub fn restore_entry(&mut self, kind: impl Into<String>, entry: FacetEntry) {
        let chain = self.entries.entry(kind.into()).or_default();
        let position = chain
            .iter()
            .position(|existing| existing.insertion_index > entry.insertion_index)
            .unwrap_or(chain.len());
        chain.insert(position, entry);
    }

    /// Returns all active facets sorted by ascending order index.
    ///
    /// Disposal walks this list in reverse.
    #[must_use]
    pub fn active_in_order(&self) -> Vec<(String, FacetRef)> {
        let mut active: Vec<(usize, String, FacetRef)> = self
            .entries
            .iter()
            .flat_map(|(kind, chain)| {
                chain.iter().filter_map(|entry| {
                    entry
                        .order_index()
                        .map(|order| (order, kind.clone(), entry.facet.clone()))
                })
            })
            .collect();
        active.sort_by_key(|(order, _, _)| *order);
        active
            .into_iter()
            .map(|(_, kind, facet)| (kind, facet))
            .collect()
    }

    /// Removes every entry. Order and insertion counters keep advancing so
    /// indices stay unique across the manager's lifetime.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl core::fmt::Debug for FacetManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FacetManager")
            .field("kinds", &self.kinds())
            .field("len", &self.len())
            .finish()
    }
}
