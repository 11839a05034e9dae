//! Ordered sequence with a multi-position reverse index
//!
//! Provides [`IndexedOrderedCollection`], a `Vec` whose elements can be
//! located by value in O(1) expected time, duplicates included.

use crate::error::{check_element, check_insertion, IndexError};
use crate::multi_value::MultiValueIndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::{BTreeSet, HashSet};
use std::hash::Hash;

/// Ordered sequence that always knows where each value lives
///
/// Every mutation updates the backing sequence and the reverse index
/// together: for every position `i` holding `v`, `positions_of(v)` contains
/// `i`. Neither view is reachable mutably from outside.
#[derive(Debug, Clone)]
pub struct IndexedOrderedCollection<E: Eq + Hash> {
    items: Vec<E>,
    index: MultiValueIndexMap<E>,
}

impl<E: Clone + Eq + Hash> IndexedOrderedCollection<E> {
    /// Create empty collection
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: MultiValueIndexMap::new(),
        }
    }

    /// Create empty collection with room for `capacity` elements
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: MultiValueIndexMap::with_capacity(capacity + 1),
        }
    }

    /// Take ownership of a sequence and index it
    #[must_use]
    pub fn from_vec(items: Vec<E>) -> Self {
        let index = MultiValueIndexMap::from_sequence(&items);
        Self { items, index }
    }

    /// Append to the end
    pub fn append(&mut self, value: E) {
        let position = self.items.len();
        self.items.push(value.clone());
        let recorded = self.index.put(value, position);
        debug_assert!(recorded);
        self.check_invariants();
    }

    /// Insert at `position`, shifting later elements right
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position > len`.
    pub fn insert(&mut self, position: usize, value: E) -> Result<(), IndexError> {
        check_insertion(position, self.items.len())?;

        self.items.insert(position, value.clone());
        let len = self.items.len();
        // Former occupants of position..len-1 now sit one slot to the right
        self.index
            .increment_range(&self.items[position + 1..len], 1, position, len - 1);
        // Record only after shifting: the value may already occur elsewhere
        let recorded = self.index.put(value, position);
        debug_assert!(recorded);

        self.check_invariants();
        Ok(())
    }

    /// Remove and return the element at `position`, shifting later ones left
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position >= len`.
    pub fn remove_at(&mut self, position: usize) -> Result<E, IndexError> {
        check_element(position, self.items.len())?;

        let removed = self.items.remove(position);
        // Unrecord before shifting: other occurrences keep their entries
        let unrecorded = self.index.remove(&removed, position);
        debug_assert!(unrecorded);
        let len = self.items.len();
        self.index
            .increment_range(&self.items[position..len], -1, position + 1, len + 1);

        self.check_invariants();
        Ok(removed)
    }

    /// Replace the element at `position`, returning the old one
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position >= len`.
    pub fn set(&mut self, position: usize, value: E) -> Result<E, IndexError> {
        check_element(position, self.items.len())?;

        let old = std::mem::replace(&mut self.items[position], value.clone());
        let unrecorded = self.index.remove(&old, position);
        debug_assert!(unrecorded);
        let recorded = self.index.put(value, position);
        debug_assert!(recorded);

        self.check_invariants();
        Ok(old)
    }

    /// Remove the first occurrence of `value`
    ///
    /// Returns `false` if the value is absent.
    pub fn remove_value<Q>(&mut self, value: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.index_of(value) {
            Some(position) => self.remove_at(position).is_ok(),
            None => false,
        }
    }

    /// Append every element of `values`
    pub fn append_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = E>,
    {
        let start = self.items.len();
        self.items.extend(values);
        if self.items.len() > start {
            let recorded = self.index.put_incrementing(&self.items[start..], start);
            debug_assert!(recorded);
        }
        self.check_invariants();
    }

    /// Insert every element of `values` starting at `position`
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position > len`.
    pub fn insert_all<I>(&mut self, position: usize, values: I) -> Result<(), IndexError>
    where
        I: IntoIterator<Item = E>,
    {
        check_insertion(position, self.items.len())?;

        let old_len = self.items.len();
        self.items.splice(position..position, values);
        let added = self.items.len() - old_len;
        if added == 0 {
            return Ok(());
        }

        let shift = isize::try_from(added).map_err(|_| IndexError::out_of_bounds(added, old_len))?;
        // Shift existing entries first to avoid clashes with the new ones
        self.index
            .increment_range(&self.items[position + added..], shift, position, old_len);
        let recorded = self
            .index
            .put_incrementing(&self.items[position..position + added], position);
        debug_assert!(recorded);

        self.check_invariants();
        Ok(())
    }

    /// Keep only elements matching `keep`
    ///
    /// The reverse index is rebuilt from scratch when anything was removed.
    /// Returns `true` if the collection changed.
    pub fn retain<F>(&mut self, keep: F) -> bool
    where
        F: FnMut(&E) -> bool,
    {
        let before = self.items.len();
        self.items.retain(keep);
        let changed = self.items.len() != before;
        if changed {
            self.rebuild_index();
        }
        changed
    }

    /// Remove every element equal to one of `values`
    ///
    /// Returns `true` if the collection changed.
    pub fn remove_all<'a, I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        let doomed: HashSet<&E> = values.into_iter().collect();
        if doomed.is_empty() {
            return false;
        }
        let before = self.items.len();
        self.items.retain(|item| !doomed.contains(item));
        let changed = self.items.len() != before;
        if changed {
            self.rebuild_index();
        }
        changed
    }

    /// Remove every element not equal to one of `values`
    ///
    /// Returns `true` if the collection changed.
    pub fn retain_all<'a, I>(&mut self, values: I) -> bool
    where
        I: IntoIterator<Item = &'a E>,
        E: 'a,
    {
        let kept: HashSet<&E> = values.into_iter().collect();
        let before = self.items.len();
        self.items.retain(|item| kept.contains(item));
        let changed = self.items.len() != before;
        if changed {
            self.rebuild_index();
        }
        changed
    }

    /// Remove everything
    pub fn clear(&mut self) {
        self.items.clear();
        self.index.clear();
    }

    /// Discard the reverse index and recompute it from the sequence
    pub fn rebuild_index(&mut self) {
        self.index = MultiValueIndexMap::from_sequence(&self.items);
    }

    /// Check that the incrementally maintained index equals a rebuilt one
    #[must_use]
    pub fn verify_index(&self) -> bool {
        MultiValueIndexMap::from_sequence(&self.items) == self.index
    }

    #[inline]
    fn check_invariants(&self) {
        if cfg!(any(debug_assertions, feature = "strict-debug")) {
            assert!(self.verify_index(), "reverse index out of sync with sequence");
        }
    }
}

impl<E: Eq + Hash> IndexedOrderedCollection<E> {
    /// Element at `position`
    #[inline]
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&E> {
        self.items.get(position)
    }

    /// First position of `value`
    #[inline]
    #[must_use]
    pub fn index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(value).first().copied()
    }

    /// Last position of `value`
    #[inline]
    #[must_use]
    pub fn last_index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(value).last().copied()
    }

    /// All positions of `value`, ascending
    #[inline]
    #[must_use]
    pub fn positions_of<Q>(&self, value: &Q) -> &BTreeSet<usize>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(value)
    }

    /// Check if `value` occurs anywhere
    #[inline]
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(value)
    }

    /// Read-only view of the reverse index
    #[inline]
    #[must_use]
    pub fn reverse_index(&self) -> &MultiValueIndexMap<E> {
        &self.index
    }

    /// Elements in order
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[E] {
        &self.items
    }

    /// Iterate over elements in order
    #[inline]
    pub fn iter(&self) -> std::slice::Iter<'_, E> {
        self.items.iter()
    }

    /// Number of elements
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Give up the index and return the sequence
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<E> {
        self.items
    }
}

impl<E: Clone + Eq + Hash> Default for IndexedOrderedCollection<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Equality looks at the sequence only; the index is derived from it.
impl<E: Eq + Hash> PartialEq for IndexedOrderedCollection<E> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<E: Eq + Hash> Eq for IndexedOrderedCollection<E> {}

impl<E: Clone + Eq + Hash> FromIterator<E> for IndexedOrderedCollection<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        Self::from_vec(iter.into_iter().collect())
    }
}

impl<E: Clone + Eq + Hash> Extend<E> for IndexedOrderedCollection<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.append_all(iter);
    }
}

impl<'a, E: Eq + Hash> IntoIterator for &'a IndexedOrderedCollection<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<E: Eq + Hash + Serialize> Serialize for IndexedOrderedCollection<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, E> Deserialize<'de> for IndexedOrderedCollection<E>
where
    E: Clone + Eq + Hash + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<E>::deserialize(deserializer).map(Self::from_vec)
    }
}
