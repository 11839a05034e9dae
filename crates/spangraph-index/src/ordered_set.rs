//! Ordered set with a one-to-one reverse index
//!
//! Provides [`UniqueIndexedOrderedSet`]: a list that rejects duplicates and
//! answers "where is this value" in O(1) expected time. Positions double as
//! dense integer ids `0..len`.

use crate::error::{check_element, check_insertion, IndexError};
use crate::multi_value::shift_position;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;

/// Duplicate-free ordered sequence with position lookup
///
/// For every position `i` holding `v`, the reverse index maps `v` to exactly
/// `i`, and no other position holds `v`.
#[derive(Debug, Clone)]
pub struct UniqueIndexedOrderedSet<E: Eq + Hash> {
    items: Vec<E>,
    index: HashMap<E, usize>,
}

impl<E: Clone + Eq + Hash> UniqueIndexedOrderedSet<E> {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Create empty set with room for `capacity` elements
    #[inline]
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity + 1),
        }
    }

    /// Take ownership of a sequence of distinct values and index it
    ///
    /// # Errors
    /// Returns [`IndexError::DuplicateValue`] naming the first repeated
    /// position.
    pub fn from_vec(items: Vec<E>) -> Result<Self, IndexError> {
        let index = build_index(&items)?;
        Ok(Self { items, index })
    }

    /// Append `value` unless already present
    ///
    /// Returns `false`, leaving the set untouched, for a duplicate.
    pub fn add(&mut self, value: E) -> bool {
        if self.index.contains_key(&value) {
            return false;
        }
        let position = self.items.len();
        self.items.push(value.clone());
        let previous = self.index.insert(value, position);
        debug_assert!(previous.is_none());
        self.check_invariants();
        true
    }

    /// Insert at `position`, shifting later elements right
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position > len`, or
    /// [`IndexError::DuplicateValue`] if the value is already present.
    pub fn insert(&mut self, position: usize, value: E) -> Result<(), IndexError> {
        check_insertion(position, self.items.len())?;
        if let Some(&existing) = self.index.get(&value) {
            return Err(IndexError::duplicate(existing, position));
        }

        self.items.insert(position, value.clone());
        let len = self.items.len();
        shift_positions(
            &mut self.index,
            &self.items[position + 1..len],
            1,
            position,
            len - 1,
        );
        let previous = self.index.insert(value, position);
        debug_assert!(previous.is_none());

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
        let previous = self.index.remove(&removed);
        debug_assert_eq!(previous, Some(position));
        let len = self.items.len();
        shift_positions(
            &mut self.index,
            &self.items[position..len],
            -1,
            position + 1,
            len + 1,
        );

        self.check_invariants();
        Ok(removed)
    }

    /// Replace the element at `position`, returning the old one
    ///
    /// Replacing a value with itself is allowed.
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position >= len`, or
    /// [`IndexError::DuplicateValue`] if the value lives at another position.
    pub fn set(&mut self, position: usize, value: E) -> Result<E, IndexError> {
        check_element(position, self.items.len())?;
        if let Some(&existing) = self.index.get(&value) {
            if existing != position {
                return Err(IndexError::duplicate(existing, position));
            }
        }

        let old = std::mem::replace(&mut self.items[position], value.clone());
        let previous = self.index.remove(&old);
        debug_assert_eq!(previous, Some(position));
        let previous = self.index.insert(value, position);
        debug_assert!(previous.is_none());

        self.check_invariants();
        Ok(old)
    }

    /// Remove `value` if present
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

    /// Append every value not already present
    ///
    /// Returns the number of values added.
    pub fn append_all<I>(&mut self, values: I) -> usize
    where
        I: IntoIterator<Item = E>,
    {
        let mut added = 0;
        for value in values {
            if self.add(value) {
                added += 1;
            }
        }
        added
    }

    /// Insert values not already present, in order, starting at `position`
    ///
    /// Values already in the set, or repeated within `values`, are skipped.
    /// Returns the number of values inserted.
    ///
    /// # Errors
    /// Returns [`IndexError::OutOfBounds`] if `position > len`.
    pub fn insert_all<I>(&mut self, position: usize, values: I) -> Result<usize, IndexError>
    where
        I: IntoIterator<Item = E>,
    {
        check_insertion(position, self.items.len())?;

        let mut seen = HashSet::new();
        let fresh: Vec<E> = values
            .into_iter()
            .filter(|value| !self.index.contains_key(value) && seen.insert(value.clone()))
            .collect();
        let added = fresh.len();
        if added == 0 {
            return Ok(0);
        }

        let old_len = self.items.len();
        self.items.splice(position..position, fresh);
        let shift = isize::try_from(added).map_err(|_| IndexError::out_of_bounds(added, old_len))?;
        shift_positions(
            &mut self.index,
            &self.items[position + added..],
            shift,
            position,
            old_len,
        );
        for (offset, value) in self.items[position..position + added].iter().enumerate() {
            let previous = self.index.insert(value.clone(), position + offset);
            debug_assert!(previous.is_none());
        }

        self.check_invariants();
        Ok(added)
    }

    /// Keep only elements matching `keep`, rebuilding the index
    ///
    /// Returns `true` if the set changed.
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
        self.index = self
            .items
            .iter()
            .enumerate()
            .map(|(position, value)| (value.clone(), position))
            .collect();
        debug_assert_eq!(self.index.len(), self.items.len());
    }

    /// Check that the incrementally maintained index equals a rebuilt one
    #[must_use]
    pub fn verify_index(&self) -> bool {
        build_index(&self.items).is_ok_and(|rebuilt| rebuilt == self.index)
    }

    #[inline]
    fn check_invariants(&self) {
        if cfg!(any(debug_assertions, feature = "strict-debug")) {
            assert!(self.verify_index(), "reverse index out of sync with sequence");
        }
    }
}

impl<E: Eq + Hash> UniqueIndexedOrderedSet<E> {
    /// Element at `position`
    #[inline]
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&E> {
        self.items.get(position)
    }

    /// Position of `value`
    #[inline]
    #[must_use]
    pub fn index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.get(value).copied()
    }

    /// Same as [`index_of`](Self::index_of); values occur at most once
    #[inline]
    #[must_use]
    pub fn last_index_of<Q>(&self, value: &Q) -> Option<usize>
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index_of(value)
    }

    /// Check if `value` is a member
    #[inline]
    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        E: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(value)
    }

    /// Read-only view of the value → position map
    #[inline]
    #[must_use]
    pub fn position_map(&self) -> &HashMap<E, usize> {
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

impl<E: Clone + Eq + Hash> Default for UniqueIndexedOrderedSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Eq + Hash> PartialEq for UniqueIndexedOrderedSet<E> {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<E: Eq + Hash> Eq for UniqueIndexedOrderedSet<E> {}

/// Collecting silently drops repeated values, keeping first occurrences.
impl<E: Clone + Eq + Hash> FromIterator<E> for UniqueIndexedOrderedSet<E> {
    fn from_iter<I: IntoIterator<Item = E>>(iter: I) -> Self {
        let mut set = Self::new();
        set.append_all(iter);
        set
    }
}

impl<E: Clone + Eq + Hash> Extend<E> for UniqueIndexedOrderedSet<E> {
    fn extend<I: IntoIterator<Item = E>>(&mut self, iter: I) {
        self.append_all(iter);
    }
}

impl<'a, E: Eq + Hash> IntoIterator for &'a UniqueIndexedOrderedSet<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<E: Eq + Hash + Serialize> Serialize for UniqueIndexedOrderedSet<E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.items.serialize(serializer)
    }
}

impl<'de, E> Deserialize<'de> for UniqueIndexedOrderedSet<E>
where
    E: Clone + Eq + Hash + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<E>::deserialize(deserializer)?;
        Self::from_vec(items).map_err(serde::de::Error::custom)
    }
}

fn build_index<E: Clone + Eq + Hash>(items: &[E]) -> Result<HashMap<E, usize>, IndexError> {
    let mut index = HashMap::with_capacity(items.len() + 1);
    for (position, value) in items.iter().enumerate() {
        if let Some(existing) = index.insert(value.clone(), position) {
            return Err(IndexError::duplicate(existing, position));
        }
    }
    Ok(index)
}

/// Shift the positions of `keys` lying in `from..to` by `delta`
///
/// Each original position moves at most once.
fn shift_positions<E: Eq + Hash>(
    index: &mut HashMap<E, usize>,
    keys: &[E],
    delta: isize,
    from: usize,
    to: usize,
) {
    let mut shifted = HashSet::with_capacity(keys.len());
    for key in keys {
        let slot = index.get_mut(key);
        debug_assert!(slot.is_some(), "shifted key is not indexed");
        let Some(slot) = slot else {
            continue;
        };
        let original = *slot;
        if (from..to).contains(&original) && shifted.insert(original) {
            *slot = shift_position(original, delta);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn set_of(items: &[&'static str]) -> UniqueIndexedOrderedSet<&'static str> {
        UniqueIndexedOrderedSet::from_vec(items.to_vec()).unwrap()
    }

    #[test]
    fn add_rejects_duplicate() {
        let mut set = UniqueIndexedOrderedSet::new();
        assert!(set.add("A"));
        assert!(!set.add("A"));
        assert_eq!(set.len(), 1);
        assert_eq!(set.index_of("A"), Some(0));
    }

    #[test]
    fn insert_shifts_following_ids() {
        let mut set = set_of(&["A", "B", "C"]);
        set.insert(1, "X").unwrap();

        assert_eq!(set.as_slice(), &["A", "X", "B", "C"]);
        assert_eq!(set.index_of("A"), Some(0));
        assert_eq!(set.index_of("X"), Some(1));
        assert_eq!(set.index_of("B"), Some(2));
        assert_eq!(set.index_of("C"), Some(3));
    }

    #[test]
    fn insert_duplicate_is_error() {
        let mut set = set_of(&["A", "B"]);
        assert_eq!(set.insert(0, "B"), Err(IndexError::duplicate(1, 0)));
        assert_eq!(set.as_slice(), &["A", "B"]);
    }

    #[test]
    fn remove_at_shifts_back() {
        let mut set = set_of(&["A", "B", "C", "D"]);
        assert_eq!(set.remove_at(1).unwrap(), "B");
        assert_eq!(set.index_of("B"), None);
        assert_eq!(set.index_of("C"), Some(1));
        assert_eq!(set.index_of("D"), Some(2));
        assert!(set.remove_at(3).unwrap_err().is_out_of_bounds());
    }

    #[test]
    fn set_replaces_in_place() {
        let mut set = set_of(&["A", "B", "C"]);
        assert_eq!(set.set(1, "Y").unwrap(), "B");
        assert_eq!(set.index_of("Y"), Some(1));
        assert!(!set.contains("B"));

        assert_eq!(set.set(1, "Y").unwrap(), "Y");
        assert_eq!(set.set(0, "C"), Err(IndexError::duplicate(2, 0)));
    }

    #[test]
    fn from_vec_reports_first_repeat() {
        let err = UniqueIndexedOrderedSet::from_vec(vec!["A", "B", "A"]).unwrap_err();
        assert_eq!(err, IndexError::duplicate(0, 2));
    }

    #[test]
    fn insert_all_skips_present_and_repeated_values() {
        let mut set = set_of(&["A", "B", "C"]);
        let added = set.insert_all(1, ["X", "B", "Y", "X"]).unwrap();

        assert_eq!(added, 2);
        assert_eq!(set.as_slice(), &["A", "X", "Y", "B", "C"]);
        assert_eq!(set.index_of("B"), Some(3));
        assert_eq!(set.index_of("C"), Some(4));
    }

    #[test]
    fn append_all_counts_additions() {
        let mut set = set_of(&["A"]);
        assert_eq!(set.append_all(["A", "B", "B", "C"]), 2);
        assert_eq!(set.index_of("C"), Some(2));
    }

    #[test]
    fn bulk_removal_rebuilds_ids() {
        let mut set = set_of(&["A", "B", "C", "D"]);
        assert!(set.remove_all(&["A", "C"]));
        assert_eq!(set.index_of("B"), Some(0));
        assert_eq!(set.index_of("D"), Some(1));

        assert!(set.retain_all(&["D"]));
        assert_eq!(set.index_of("D"), Some(0));
        assert!(set.verify_index());
    }

    #[test]
    fn remove_value_by_borrowed_key() {
        let mut set: UniqueIndexedOrderedSet<String> =
            ["a", "b"].iter().map(|s| (*s).to_string()).collect();
        assert!(set.remove_value("a"));
        assert_eq!(set.index_of("b"), Some(0));
        assert!(!set.remove_value("a"));
    }
}
