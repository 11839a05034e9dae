//! Key to position-set map with bulk shifting
//!
//! Provides [`MultiValueIndexMap`], the reverse index behind
//! [`IndexedOrderedCollection`](crate::IndexedOrderedCollection).

use std::borrow::Borrow;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::hash::Hash;

static EMPTY_POSITIONS: BTreeSet<usize> = BTreeSet::new();

/// Map from a key to the sorted set of positions it occupies
///
/// Buckets are kept sorted so that the first and last occurrence of a key
/// are O(log n) lookups and range shifting can walk only the affected
/// positions. Empty buckets are pruned, so [`contains_key`](Self::contains_key)
/// is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultiValueIndexMap<K: Eq + Hash> {
    buckets: HashMap<K, BTreeSet<usize>>,
}

impl<K: Eq + Hash> MultiValueIndexMap<K> {
    /// Create empty map
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            buckets: HashMap::new(),
        }
    }

    /// Create empty map with room for `capacity` keys
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity(capacity),
        }
    }

    /// Build the index of a sequence, recording every element at its position
    #[must_use]
    pub fn from_sequence(items: &[K]) -> Self
    where
        K: Clone,
    {
        let mut map = Self::with_capacity(items.len() + 1);
        map.put_incrementing(items, 0);
        map
    }

    /// Positions recorded for `key`; empty when the key is absent
    #[inline]
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> &BTreeSet<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.get(key).unwrap_or(&EMPTY_POSITIONS)
    }

    /// Bucket for `key`, creating an empty one if needed
    ///
    /// Empty buckets left behind by callers are only pruned by
    /// [`remove`](Self::remove); prefer [`put`](Self::put) for plain inserts.
    pub fn fetch(&mut self, key: K) -> &mut BTreeSet<usize> {
        self.buckets.entry(key).or_default()
    }

    /// Record `position` for `key`
    ///
    /// Returns `false` if the position was already recorded for that key.
    pub fn put(&mut self, key: K, position: usize) -> bool {
        self.buckets.entry(key).or_default().insert(position)
    }

    /// Record several positions for `key`
    ///
    /// Returns `true` if at least one position was new.
    pub fn put_all<I>(&mut self, key: K, positions: I) -> bool
    where
        I: IntoIterator<Item = usize>,
    {
        let bucket = self.buckets.entry(key).or_default();
        let mut changed = false;
        for position in positions {
            changed |= bucket.insert(position);
        }
        changed
    }

    /// Assign consecutive positions starting at `start` to successive keys
    ///
    /// Returns `true` if at least one position was recorded.
    pub fn put_incrementing<'a, I>(&mut self, keys: I, start: usize) -> bool
    where
        I: IntoIterator<Item = &'a K>,
        K: Clone + 'a,
    {
        let mut changed = false;
        for (offset, key) in keys.into_iter().enumerate() {
            changed |= self.put(key.clone(), start + offset);
        }
        changed
    }

    /// Forget `position` for `key`
    ///
    /// Returns `false` if it was not recorded.
    pub fn remove<Q>(&mut self, key: &Q, position: usize) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let removed = bucket.remove(&position);
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        removed
    }

    /// Forget several positions for `key`
    ///
    /// Returns `true` if at least one position was removed.
    pub fn remove_all<Q, I>(&mut self, key: &Q, positions: I) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        I: IntoIterator<Item = usize>,
    {
        let Some(bucket) = self.buckets.get_mut(key) else {
            return false;
        };
        let mut changed = false;
        for position in positions {
            changed |= bucket.remove(&position);
        }
        if bucket.is_empty() {
            self.buckets.remove(key);
        }
        changed
    }

    /// Drop a key with all its positions
    pub fn remove_key<Q>(&mut self, key: &Q) -> Option<BTreeSet<usize>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.remove(key)
    }

    /// Shift positions of the given keys lying in `from..to` by `delta`
    ///
    /// Every key is visited once, however often it occurs in `keys`, and an
    /// original position is moved at most once across the whole batch.
    ///
    /// # Panics
    /// Panics if a shifted position would become negative or overflow, which
    /// can only happen when the caller computed the range incorrectly.
    pub fn increment_range<'a, I>(&mut self, keys: I, delta: isize, from: usize, to: usize)
    where
        I: IntoIterator<Item = &'a K>,
        K: 'a,
    {
        if delta == 0 || from >= to {
            return;
        }

        let mut visited: HashSet<&K> = HashSet::new();
        let mut shifted: HashSet<usize> = HashSet::new();

        for key in keys {
            if !visited.insert(key) {
                continue;
            }
            let bucket = self.buckets.get_mut(key);
            debug_assert!(bucket.is_some(), "shifted key has no recorded positions");
            let Some(bucket) = bucket else {
                continue;
            };

            let originals: Vec<usize> = bucket
                .range(from..to)
                .copied()
                .filter(|position| !shifted.contains(position))
                .collect();

            // Take all originals out first so moved positions cannot collide
            // with ones still waiting to move.
            for position in &originals {
                let removed = bucket.remove(position);
                debug_assert!(removed);
            }
            for &position in &originals {
                let moved = shift_position(position, delta);
                let inserted = bucket.insert(moved);
                debug_assert!(inserted, "position {moved} already recorded");
            }

            shifted.extend(originals);
        }
    }

    /// Whether `position` is recorded for `key`
    #[inline]
    #[must_use]
    pub fn contains<Q>(&self, key: &Q, position: usize) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .get(key)
            .is_some_and(|bucket| bucket.contains(&position))
    }

    /// Whether any position is recorded for `key`
    #[inline]
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets.contains_key(key)
    }

    /// Union of the positions of all keys
    #[must_use]
    pub fn all_positions(&self) -> BTreeSet<usize> {
        self.buckets.values().flatten().copied().collect()
    }

    /// Iterate over keys
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.buckets.keys()
    }

    /// Iterate over `(key, positions)` pairs
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&K, &BTreeSet<usize>)> {
        self.buckets.iter()
    }

    /// Number of distinct keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// Check if map holds no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Remove everything
    #[inline]
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

impl<K: Eq + Hash> Default for MultiValueIndexMap<K> {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply a signed shift to a position
///
/// # Panics
/// Panics when the result leaves the `usize` range.
pub(crate) fn shift_position(position: usize, delta: isize) -> usize {
    match position.checked_add_signed(delta) {
        Some(moved) => moved,
        None => panic!("shifting position {position} by {delta} leaves the valid range"),
    }
}
