//! Transition table
//!
//! One outgoing relation slot per annotation id. Slot `i` holds the id of
//! the single target of annotation `i`, or [`NO_RELATION`].
//!
//! Resolving relation pairs into a table runs either sequentially or as a
//! rayon fold/reduce. Each worker fills a sentinel table; partial tables are
//! overlaid in input order, so a later relation for the same source wins in
//! both modes.

use crate::error::{GraphError, GraphResult};
use crate::raw::RawRelation;
use crate::span::SpanKey;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Sentinel for "no outgoing relation"
pub const NO_RELATION: isize = -1;

/// Flat `source id → target id` array
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionTable(Vec<isize>);

impl TransitionTable {
    /// Create table of `len` empty slots
    #[inline]
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self(vec![NO_RELATION; len])
    }

    /// Wrap stored slots without validation
    ///
    /// See [`validate`](Self::validate).
    #[inline]
    #[must_use]
    pub fn from_slots(slots: Vec<isize>) -> Self {
        Self(slots)
    }

    /// Number of slots
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the table has no slots
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Target of `source`, if it has one
    #[inline]
    #[must_use]
    pub fn target(&self, source: usize) -> Option<usize> {
        self.0.get(source).and_then(|&slot| decode(slot))
    }

    /// Point `source` at `target`, returning the previous target
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfBounds`] if either id has no slot
    pub fn set(&mut self, source: usize, target: usize) -> GraphResult<Option<usize>> {
        let len = self.len();
        if target >= len {
            return Err(GraphError::out_of_bounds(target, len));
        }
        let slot = self
            .0
            .get_mut(source)
            .ok_or_else(|| GraphError::out_of_bounds(source, len))?;
        Ok(decode(std::mem::replace(slot, encode(target))))
    }

    /// Reset `source` to the sentinel, returning the previous target
    pub fn unset(&mut self, source: usize) -> Option<usize> {
        let slot = self.0.get_mut(source)?;
        decode(std::mem::replace(slot, NO_RELATION))
    }

    /// Append an empty slot
    #[inline]
    pub(crate) fn push_empty(&mut self) {
        self.0.push(NO_RELATION);
    }

    /// Copy every assigned slot of `later` over this table
    ///
    /// Returns the number of slots assigned in both tables.
    pub fn overlay(&mut self, later: &Self) -> usize {
        debug_assert_eq!(self.len(), later.len(), "overlaying tables of different length");
        let mut conflicts = 0;
        for (slot, &incoming) in self.0.iter_mut().zip(&later.0) {
            if incoming == NO_RELATION {
                continue;
            }
            if *slot != NO_RELATION {
                conflicts += 1;
            }
            *slot = incoming;
        }
        conflicts
    }

    /// Assigned `(source, target)` pairs in source order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(source, &slot)| decode(slot).map(|target| (source, target)))
    }

    /// Sources pointing at `target`
    pub fn sources_of(&self, target: usize) -> impl Iterator<Item = usize> + '_ {
        self.pairs()
            .filter(move |&(_, t)| t == target)
            .map(|(source, _)| source)
    }

    /// Check length and slot values against an annotation count
    ///
    /// # Errors
    /// - [`GraphError::RelationCountMismatch`] if the length differs
    /// - [`GraphError::InvalidRelationTarget`] for a slot that is neither
    ///   the sentinel nor an id below `annotations`
    pub fn validate(&self, annotations: usize) -> GraphResult<()> {
        if self.len() != annotations {
            return Err(GraphError::RelationCountMismatch {
                relations: self.len(),
                annotations,
            });
        }
        for (source_id, &slot) in self.0.iter().enumerate() {
            let valid = slot == NO_RELATION || decode(slot).is_some_and(|target| target < annotations);
            if !valid {
                return Err(GraphError::InvalidRelationTarget {
                    source_id,
                    target_id: slot,
                });
            }
        }
        Ok(())
    }

    /// Raw slots
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[isize] {
        &self.0
    }

    /// Consume into raw slots
    #[inline]
    #[must_use]
    pub fn into_vec(self) -> Vec<isize> {
        self.0
    }
}

#[inline]
fn decode(slot: isize) -> Option<usize> {
    usize::try_from(slot).ok()
}

// Ids address a Vec, so they never exceed isize::MAX.
#[allow(clippy::cast_possible_wrap)]
#[inline]
fn encode(id: usize) -> isize {
    id as isize
}

/// Table plus counters produced by resolving a batch of relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RelationTally {
    pub(crate) table: TransitionTable,
    pub(crate) resolved: usize,
    pub(crate) skipped: usize,
    pub(crate) overwritten: usize,
}

impl RelationTally {
    fn empty(len: usize) -> Self {
        Self {
            table: TransitionTable::new(len),
            resolved: 0,
            skipped: 0,
            overwritten: 0,
        }
    }

    fn record<F>(mut self, relation: &RawRelation, resolve: &F) -> Self
    where
        F: Fn(&SpanKey) -> GraphResult<usize>,
    {
        let outcome = resolve(&relation.source)
            .and_then(|source| Ok((source, resolve(&relation.target)?)))
            .and_then(|(source, target)| self.table.set(source, target));

        match outcome {
            Ok(previous) => {
                self.resolved += 1;
                if previous.is_some() {
                    self.overwritten += 1;
                }
            }
            Err(err) => {
                tracing::error!(
                    source = %relation.source,
                    target = %relation.target,
                    error = %err,
                    "skipping unresolvable relation"
                );
                self.skipped += 1;
            }
        }
        self
    }

    fn merge(mut self, later: Self) -> Self {
        let conflicts = self.table.overlay(&later.table);
        self.resolved += later.resolved;
        self.skipped += later.skipped;
        self.overwritten += later.overwritten + conflicts;
        self
    }
}

/// Resolve relations one by one into a table of `len` slots
pub(crate) fn collect_sequential<F>(relations: &[RawRelation], len: usize, resolve: F) -> RelationTally
where
    F: Fn(&SpanKey) -> GraphResult<usize>,
{
    relations
        .iter()
        .fold(RelationTally::empty(len), |tally, relation| tally.record(relation, &resolve))
}

/// Resolve relations on the rayon pool into a table of `len` slots
///
/// Produces the same table as [`collect_sequential`].
pub(crate) fn collect_parallel<F>(relations: &[RawRelation], len: usize, resolve: F) -> RelationTally
where
    F: Fn(&SpanKey) -> GraphResult<usize> + Sync,
{
    relations
        .par_iter()
        .fold(
            || RelationTally::empty(len),
            |tally, relation| tally.record(relation, &resolve),
        )
        .reduce(|| RelationTally::empty(len), RelationTally::merge)
}
