//! Topological sort with a shareable LRU result cache.
//!
//! Initialization order is computed with Kahn's algorithm over the facet
//! graph. Results — valid orders and cycle errors alike — are cached in a
//! bounded LRU keyed by the sorted, comma-joined kind set. One kind set
//! always maps to one edge set by construction (hooks of a kind declare its
//! dependencies), so the key needs no edge component.
//!
//! A [`GraphCache`] is a cheap-to-clone handle over shared state, so several
//! subsystems can pool their sort results by building with the same cache.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use mosaic_facet::error::{BuildError, CycleError};
use parking_lot::Mutex;

use crate::graph::FacetGraph;

/// Outcome of sorting one kind set: a valid order or the cycle that broke it.
pub type CachedOrder = Result<Vec<String>, CycleError>;

/// Default number of kind sets a cache retains.
pub const DEFAULT_CACHE_CAPACITY: usize = 64;

// ─────────────────────────────────────────────────────────────────────────────
// Kahn's algorithm
// ─────────────────────────────────────────────────────────────────────────────

/// Computes a topological order over the facet graph.
///
/// Ties among same-level independent kinds break by registration order: the
/// queue is seeded in graph insertion order and processed FIFO.
///
/// # Errors
///
/// [`CycleError`] naming the stuck kinds, in insertion order, when the graph
/// cannot be linearized. The result is never silently truncated.
pub(crate) fn topo_sort(graph: &FacetGraph) -> CachedOrder {
    let mut indegree: IndexMap<&str, usize> = graph
        .nodes
        .iter()
        .map(|kind| (kind.as_str(), 0))
        .collect();
    for (_, dependents) in &graph.edges {
        for dependent in dependents {
            if let Some(count) = indegree.get_mut(dependent.as_str()) {
                *count += 1;
            }
        }
    }

    let mut queue: VecDeque<&str> = indegree
        .iter()
        .filter(|(_, &count)| count == 0)
        .map(|(&kind, _)| kind)
        .collect();
    let mut order: Vec<String> = Vec::with_capacity(graph.nodes.len());

    while let Some(kind) = queue.pop_front() {
        order.push(kind.to_string());
        let Some(dependents) = graph.edges.get(kind) else {
            continue;
        };
        for dependent in dependents {
            if let Some(count) = indegree.get_mut(dependent.as_str()) {
                *count -= 1;
                if *count == 0 {
                    queue.push_back(dependent.as_str());
                }
            }
        }
    }

    if order.len() != graph.nodes.len() {
        let stuck: Vec<String> = indegree
            .iter()
            .filter(|(_, &count)| count > 0)
            .map(|(&kind, _)| kind.to_string())
            .collect();
        return Err(CycleError { kinds: stuck });
    }

    Ok(order)
}

/// Sorts through the cache: probe first, compute and store on miss.
///
/// # Errors
///
/// [`BuildError::Cycle`] — freshly computed or re-raised from a cached
/// negative entry.
pub(crate) fn sort_with_cache(graph: &FacetGraph, cache: &GraphCache) -> Result<Vec<String>, BuildError> {
    let key = GraphCache::key(&graph.nodes);
    if let Some(cached) = cache.get(&key) {
        tracing::debug!(key = %key, "dependency graph cache hit");
        return cached.map_err(BuildError::Cycle);
    }

    let outcome = topo_sort(graph);
    cache.insert(key, outcome.clone());
    outcome.map_err(BuildError::Cycle)
}

// ─────────────────────────────────────────────────────────────────────────────
// GraphCache
// ─────────────────────────────────────────────────────────────────────────────

/// Hit/miss counters for a cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Probes answered from the cache.
    pub hits: u64,
    /// Probes that required a fresh sort.
    pub misses: u64,
}

struct CacheInner {
    entries: IndexMap<String, CachedOrder>,
    capacity: usize,
    stats: CacheStats,
}

/// Bounded LRU cache of topological-sort results, keyed by kind set.
///
/// Cloning shares the underlying storage, which is how multiple subsystems
/// pool results: pass one cache to several
/// [`build_with_cache`](crate::subsystem::Subsystem::build_with_cache) calls.
#[derive(Clone)]
pub struct GraphCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphCache {
    /// Creates a cache with [`DEFAULT_CACHE_CAPACITY`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }

    /// Creates a cache retaining at most `capacity` kind sets.
    ///
    /// A capacity of zero is treated as one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                entries: IndexMap::new(),
                capacity: capacity.max(1),
                stats: CacheStats::default(),
            })),
        }
    }

    /// Canonical cache key for a kind set: sorted and comma-joined.
    #[must_use]
    pub fn key(kinds: &[String]) -> String {
        let mut sorted: Vec<&str> = kinds.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.join(",")
    }

    /// Probes the cache, refreshing the entry's recency on a hit.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<CachedOrder> {
        let mut inner = self.inner.lock();
        match inner.entries.shift_remove(key) {
            Some(entry) => {
                // Re-insertion moves the entry to the most-recent end.
                inner.entries.insert(key.to_string(), entry.clone());
                inner.stats.hits += 1;
                Some(entry)
            }
            None => {
                inner.stats.misses += 1;
                None
            }
        }
    }

    /// Stores an outcome, evicting the least-recently-used entry at capacity.
    pub fn insert(&self, key: String, outcome: CachedOrder) {
        let mut inner = self.inner.lock();
        if inner.entries.len() >= inner.capacity && !inner.entries.contains_key(&key) {
            inner.entries.shift_remove_index(0);
        }
        inner.entries.insert(key, outcome);
    }

    /// Returns true if the key is cached (without touching recency).
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    /// Number of cached kind sets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hit/miss counters since creation.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Drops every cached entry. Counters are kept.
    pub fn clear(&self) {
        self.inner.lock().entries.clear();
    }
}

impl core::fmt::Debug for GraphCache {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("GraphCache")
            .field("len", &inner.entries.len())
            .field("capacity", &inner.capacity)
            .field("stats", &inner.stats)
            .finish()
    }
}
