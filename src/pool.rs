//! Hash-consing object pool
//!
//! Repeated state components (stack frames, field vectors, monitor records)
//! are overwhelmingly duplicates of components seen in earlier states. The
//! pool collapses them: the first occurrence of a value (by equality, not
//! identity) is assigned the next sequential index and becomes the canonical
//! instance; every later equal value maps back to that instance and index.
//! Callers are expected to drop their own copy and keep the canonical `Rc`,
//! so structurally identical components share one allocation across all
//! global states.
//!
//! Index assignment order is pool-call order, which makes pool contents
//! fully reproducible for a deterministic caller. Indices are never
//! reassigned or reclaimed for the lifetime of the pool.
//!
//! Implemented as an insertion-ordered `IndexSet` keyed by the value itself,
//! with `FxHasher` for cheap hashing of small keys. Canonicalization is only
//! as good as the caller's `Eq`/`Hash` contract; a value violating it
//! silently corrupts the pool.

use std::hash::{BuildHasherDefault, Hash};
use std::rc::Rc;

use indexmap::IndexSet;
use rustc_hash::FxHasher;
use tracing::trace;

type FxIndexSet<T> = IndexSet<T, BuildHasherDefault<FxHasher>>;

/// Hash-consing pool assigning stable small indices to distinct values.
#[derive(Debug, Clone)]
pub struct Pool<T: Eq + Hash> {
    entries: FxIndexSet<Rc<T>>,
    has_null: bool,
}

impl<T: Eq + Hash> Pool<T> {
    pub fn new() -> Self {
        Pool {
            entries: FxIndexSet::default(),
            has_null: false,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Pool {
            entries: FxIndexSet::with_capacity_and_hasher(capacity, Default::default()),
            has_null: false,
        }
    }

    /// Reserve index 0 for a null sentinel, so that "no component" can be
    /// encoded as index 0 in serialized state vectors.
    ///
    /// # Panics
    ///
    /// Panics if any value has already been pooled. The sentinel must claim
    /// index 0, which is only possible on an empty pool.
    pub fn add_null(&mut self) {
        assert!(
            self.entries.is_empty(),
            "null sentinel must be registered before the first pooled value"
        );
        self.has_null = true;
    }

    /// Index offset introduced by the null sentinel.
    #[inline]
    fn base(&self) -> usize {
        self.has_null as usize
    }

    /// Canonicalize `key`, returning the shared instance and its index.
    ///
    /// The returned `Rc` may not be the instance just passed in, but it is
    /// always equal to it.
    pub fn pool(&mut self, key: T) -> (Rc<T>, usize) {
        if let Some((idx, existing)) = self.entries.get_full(&key) {
            return (existing.clone(), idx + self.base());
        }

        let canonical = Rc::new(key);
        let (idx, inserted) = self.entries.insert_full(canonical.clone());
        debug_assert!(inserted);
        trace!(index = idx + self.base(), "pooled new value");
        (canonical, idx + self.base())
    }

    /// Look up the canonical value stored at `index`.
    ///
    /// Returns `None` for the null sentinel slot and for indices that were
    /// never assigned.
    pub fn get(&self, index: usize) -> Option<&Rc<T>> {
        if self.has_null && index == 0 {
            return None;
        }
        self.entries.get_index(index - self.base())
    }

    /// Number of assigned indices, including the null sentinel if present.
    pub fn size(&self) -> usize {
        self.entries.len() + self.base()
    }

    /// Drop all pooled values for a new verification run. The null sentinel
    /// reservation, being part of the pool's configuration, survives.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<T: Eq + Hash> Default for Pool<T> {
    fn default() -> Self {
        Self::new()
    }
}
