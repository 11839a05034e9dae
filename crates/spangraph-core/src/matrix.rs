//! Sparse span matrix
//!
//! Three-level mapping `begin → end → label → value` in which only occupied
//! cells exist. Begin and end levels are sorted, so iteration walks spans in
//! `(begin, end)` order; labels keep insertion order within a cell.

use indexmap::{Equivalent, IndexMap};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Labels per `(begin, end)` cell
pub type LabelMap<K, V> = IndexMap<K, V>;

/// Cells sharing one begin offset, keyed by end offset
pub type SpanRow<K, V> = BTreeMap<usize, LabelMap<K, V>>;

const DEFAULT_LABEL_CAPACITY: usize = 2;

/// Sparse `begin → end → label → value` matrix
///
/// Lookups through [`get`](Self::get) and [`get_value`](Self::get_value)
/// never create levels. [`fetch`](Self::fetch) and the `fetch_value*`
/// methods create missing levels on demand.
#[derive(Debug, Clone)]
pub struct SparseSpanMatrix<K, V> {
    rows: BTreeMap<usize, SpanRow<K, V>>,
    label_capacity: usize,
    supplier: Option<fn() -> V>,
}

impl<K: Eq + Hash, V> SparseSpanMatrix<K, V> {
    /// Create empty matrix
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_label_capacity(DEFAULT_LABEL_CAPACITY)
    }

    /// Create empty matrix with a capacity hint for new label maps
    #[inline]
    #[must_use]
    pub fn with_label_capacity(label_capacity: usize) -> Self {
        Self {
            rows: BTreeMap::new(),
            label_capacity,
            supplier: None,
        }
    }

    /// Builder: supplier used by [`fetch_value`](Self::fetch_value)
    #[inline]
    #[must_use]
    pub fn with_supplier(mut self, supplier: fn() -> V) -> Self {
        self.supplier = Some(supplier);
        self
    }

    /// Label map at `(begin, end)`, created if missing
    pub fn fetch(&mut self, begin: usize, end: usize) -> &mut LabelMap<K, V> {
        let capacity = self.label_capacity;
        self.rows
            .entry(begin)
            .or_default()
            .entry(end)
            .or_insert_with(|| IndexMap::with_capacity(capacity))
    }

    /// Value at `(begin, end, key)`, materialized by the configured supplier
    ///
    /// Without a supplier this behaves like a mutable lookup and creates
    /// nothing.
    pub fn fetch_value(&mut self, begin: usize, end: usize, key: K) -> Option<&mut V> {
        match self.supplier {
            Some(supplier) => Some(self.fetch_value_with(begin, end, key, supplier)),
            None => self.get_value_mut(begin, end, &key),
        }
    }

    /// Value at `(begin, end, key)`, materialized by `supplier` if missing
    pub fn fetch_value_with<F>(&mut self, begin: usize, end: usize, key: K, supplier: F) -> &mut V
    where
        F: FnOnce() -> V,
    {
        self.fetch(begin, end).entry(key).or_insert_with(supplier)
    }

    /// All cells beginning at `begin`
    #[inline]
    #[must_use]
    pub fn row(&self, begin: usize) -> Option<&SpanRow<K, V>> {
        self.rows.get(&begin)
    }

    /// Label map at `(begin, end)`
    #[inline]
    #[must_use]
    pub fn get(&self, begin: usize, end: usize) -> Option<&LabelMap<K, V>> {
        self.rows.get(&begin)?.get(&end)
    }

    /// Value at `(begin, end, key)`
    #[inline]
    pub fn get_value<Q>(&self, begin: usize, end: usize, key: &Q) -> Option<&V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get(begin, end)?.get(key)
    }

    /// Mutable value at `(begin, end, key)`
    #[inline]
    pub fn get_value_mut<Q>(&mut self, begin: usize, end: usize, key: &Q) -> Option<&mut V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.rows.get_mut(&begin)?.get_mut(&end)?.get_mut(key)
    }

    /// Check if `(begin, end, key)` is occupied
    #[inline]
    pub fn contains<Q>(&self, begin: usize, end: usize, key: &Q) -> bool
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        self.get_value(begin, end, key).is_some()
    }

    /// Store `value` at `(begin, end, key)`
    ///
    /// An occupied cell is overwritten (last write wins); the previous value
    /// is returned and a warning is logged.
    pub fn insert(&mut self, begin: usize, end: usize, key: K, value: V) -> Option<V>
    where
        K: Debug,
    {
        let labels = self.fetch(begin, end);
        if labels.contains_key(&key) {
            tracing::warn!(begin, end, label = ?key, "label already exists for span; overwriting");
        }
        labels.insert(key, value)
    }

    /// Remove `(begin, end, key)`, pruning levels left empty
    pub fn remove<Q>(&mut self, begin: usize, end: usize, key: &Q) -> Option<V>
    where
        Q: ?Sized + Hash + Equivalent<K>,
    {
        let row = self.rows.get_mut(&begin)?;
        let labels = row.get_mut(&end)?;
        let removed = labels.shift_remove(key)?;
        if labels.is_empty() {
            row.remove(&end);
            if row.is_empty() {
                self.rows.remove(&begin);
            }
        }
        Some(removed)
    }

    /// Number of occupied cells
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
            .values()
            .flat_map(BTreeMap::values)
            .map(IndexMap::len)
            .sum()
    }

    /// Check if no cell is occupied
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Begin offsets with at least one (possibly empty) row
    pub fn begins(&self) -> impl Iterator<Item = usize> + '_ {
        self.rows.keys().copied()
    }

    /// Occupied cells as `(begin, end, key, value)` in span order
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, &K, &V)> {
        self.rows.iter().flat_map(|(&begin, row)| {
            row.iter()
                .flat_map(move |(&end, labels)| labels.iter().map(move |(key, value)| (begin, end, key, value)))
        })
    }

    /// Values flattened in span order
    pub fn values_in_order(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, _, _, value)| value)
    }

    /// Remove every cell
    #[inline]
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl<K: Eq + Hash, V> Default for SparseSpanMatrix<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_never_creates_levels() {
        let matrix: SparseSpanMatrix<String, u32> = SparseSpanMatrix::new();
        assert!(matrix.get(0, 5).is_none());
        assert!(matrix.get_value(0, 5, "Claim").is_none());
        assert!(matrix.row(0).is_none());
        assert_eq!(matrix.begins().count(), 0);
    }

    #[test]
    fn fetch_creates_levels() {
        let mut matrix: SparseSpanMatrix<String, u32> = SparseSpanMatrix::new();
        matrix.fetch(0, 5).insert("Claim".to_string(), 1);

        assert_eq!(matrix.get_value(0, 5, "Claim"), Some(&1));
        assert!(matrix.row(0).is_some_and(|row| row.contains_key(&5)));
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn fetch_value_uses_supplier() {
        let mut matrix: SparseSpanMatrix<&str, Vec<u32>> = SparseSpanMatrix::new().with_supplier(Vec::new);
        matrix.fetch_value(2, 4, "Premise").unwrap().push(7);
        matrix.fetch_value(2, 4, "Premise").unwrap().push(8);

        assert_eq!(matrix.get_value(2, 4, "Premise"), Some(&vec![7, 8]));
    }

    #[test]
    fn fetch_value_without_supplier_creates_nothing() {
        let mut matrix: SparseSpanMatrix<&str, u32> = SparseSpanMatrix::new();
        assert!(matrix.fetch_value(2, 4, "Premise").is_none());
        assert!(matrix.row(2).is_none());

        *matrix.fetch_value_with(2, 4, "Premise", || 3) += 1;
        assert_eq!(matrix.fetch_value(2, 4, "Premise"), Some(&mut 4));
    }

    #[test]
    fn insert_overwrites_last_write_wins() {
        let mut matrix = SparseSpanMatrix::new();
        assert_eq!(matrix.insert(0, 5, "Claim", "first"), None);
        assert_eq!(matrix.insert(0, 5, "Claim", "second"), Some("first"));

        assert_eq!(matrix.get_value(0, 5, "Claim"), Some(&"second"));
        assert_eq!(matrix.len(), 1);
    }

    #[test]
    fn remove_prunes_empty_levels() {
        let mut matrix = SparseSpanMatrix::new();
        matrix.insert(0, 5, "Claim", 1);
        matrix.insert(0, 5, "Premise", 2);

        assert_eq!(matrix.remove(0, 5, "Claim"), Some(1));
        assert!(matrix.get(0, 5).is_some());

        assert_eq!(matrix.remove(0, 5, "Premise"), Some(2));
        assert!(matrix.row(0).is_none());
        assert!(matrix.is_empty());
        assert_eq!(matrix.remove(0, 5, "Premise"), None);
    }

    #[test]
    fn iter_walks_span_order_then_label_order() {
        let mut matrix = SparseSpanMatrix::new();
        matrix.insert(4, 9, "Claim", 'c');
        matrix.insert(0, 7, "Premise", 'b');
        matrix.insert(0, 3, "Premise", 'a');
        matrix.insert(4, 9, "MajorClaim", 'd');

        let cells: Vec<_> = matrix.iter().map(|(b, e, k, v)| (b, e, *k, *v)).collect();
        assert_eq!(
            cells,
            vec![
                (0, 3, "Premise", 'a'),
                (0, 7, "Premise", 'b'),
                (4, 9, "Claim", 'c'),
                (4, 9, "MajorClaim", 'd'),
            ]
        );
        assert_eq!(matrix.values_in_order().collect::<String>(), "abcd");
    }

    #[test]
    fn len_ignores_fetched_empty_cells() {
        let mut matrix: SparseSpanMatrix<&str, u32> = SparseSpanMatrix::with_label_capacity(4);
        let _ = matrix.fetch(1, 2);
        assert!(matrix.is_empty());
        assert_eq!(matrix.iter().count(), 0);
        assert_eq!(matrix.begins().collect::<Vec<_>>(), vec![1]);
    }
}
