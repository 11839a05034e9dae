//! Annotation graph
//!
//! Combines three views of one document's annotations:
//!
//! - **vector**: a [`UniqueIndexedOrderedSet`] whose positions are the
//!   annotation ids
//! - **matrix**: a [`SparseSpanMatrix`] for `(begin, end, label)` lookup
//! - **relations**: a [`TransitionTable`] with one outgoing slot per id
//!
//! Vector and matrix share each annotation through an [`Arc`], so the matrix
//! cell for an annotation is the very instance stored at its id. The relation
//! table always has one slot per id.

use crate::config::GraphConfig;
use crate::error::{GraphError, GraphResult};
use crate::matrix::{LabelMap, SparseSpanMatrix};
use crate::raw::{RawRelation, RawSpan};
use crate::relations::{self, TransitionTable};
use crate::span::{LabelledSpan, Span, SpanKey, SpanLabel};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use spangraph_index::UniqueIndexedOrderedSet;
use std::hash::Hash;
use std::sync::Arc;

/// Matrix view of a graph: `begin → end → label → annotation`
pub type AnnotationMatrix<T> = SparseSpanMatrix<String, Arc<T>>;

/// Counters reported by [`AnnotationGraph::build_with_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    /// Annotations in the finished graph
    pub annotations: usize,
    /// Records dropped because an equal annotation was already present
    pub duplicates_dropped: usize,
    /// Matrix cells overwritten by a later record with the same coordinates
    pub cells_overwritten: usize,
    /// Relations written into the table
    pub relations_resolved: usize,
    /// Relations skipped because an endpoint was not found
    pub relations_skipped: usize,
    /// Relations that replaced an earlier target for the same source
    pub relation_slots_overwritten: usize,
}

enum Pushed {
    Added { replaced: bool },
    Duplicate { existing: usize },
}

/// Span annotations with spatial lookup and single-successor relations
#[derive(Debug, Clone)]
pub struct AnnotationGraph<T: LabelledSpan + Eq + Hash = SpanLabel> {
    vector: UniqueIndexedOrderedSet<Arc<T>>,
    matrix: AnnotationMatrix<T>,
    relations: TransitionTable,
}

impl<T: LabelledSpan + Eq + Hash> AnnotationGraph<T> {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&GraphConfig::default())
    }

    /// Create empty graph sized by `config`
    #[inline]
    #[must_use]
    pub fn with_config(config: &GraphConfig) -> Self {
        Self {
            vector: UniqueIndexedOrderedSet::new(),
            matrix: SparseSpanMatrix::with_label_capacity(config.labels_per_span),
            relations: TransitionTable::default(),
        }
    }

    /// Rebuild a graph from its persisted annotation list and relation table
    ///
    /// The matrix is derived from the annotations; a later annotation with
    /// the same `(begin, end, label)` takes the cell.
    ///
    /// # Errors
    /// - [`GraphError::DuplicateAnnotation`] if an annotation repeats
    /// - [`GraphError::RelationCountMismatch`] /
    ///   [`GraphError::InvalidRelationTarget`] for a malformed table
    pub fn from_parts(annotations: Vec<T>, relations: TransitionTable) -> GraphResult<Self> {
        let mut graph = Self::with_config(&GraphConfig::default());
        for (attempted, annotation) in annotations.into_iter().enumerate() {
            if let Pushed::Duplicate { existing } = graph.push_annotation(annotation) {
                return Err(GraphError::DuplicateAnnotation { existing, attempted });
            }
        }
        relations.validate(graph.len())?;
        graph.relations = relations;
        graph.check_coherence();
        Ok(graph)
    }

    /// Add an annotation, returning its id
    ///
    /// Returns `None` and leaves the graph unchanged if an equal annotation
    /// is already present. The new id starts without an outgoing relation.
    pub fn push(&mut self, annotation: T) -> Option<usize> {
        match self.push_annotation(annotation) {
            Pushed::Added { .. } => Some(self.len() - 1),
            Pushed::Duplicate { .. } => None,
        }
    }

    fn push_annotation(&mut self, annotation: T) -> Pushed {
        let annotation = Arc::new(annotation);
        let span = annotation.span();

        if let Some(existing) = self.vector.index_of(annotation.as_ref()) {
            tracing::warn!(
                id = existing,
                %span,
                label = annotation.label(),
                "duplicate annotation dropped"
            );
            return Pushed::Duplicate { existing };
        }

        let added = self.vector.add(Arc::clone(&annotation));
        debug_assert!(added, "annotation vector accepted a duplicate");
        let label = annotation.label().to_owned();
        let replaced = self
            .matrix
            .insert(span.begin(), span.end(), label, annotation)
            .is_some();
        self.relations.push_empty();
        debug_assert_eq!(self.relations.len(), self.vector.len());

        self.check_coherence();
        Pushed::Added { replaced }
    }

    /// Point the annotation at `source` to the annotation at `target`
    ///
    /// Returns the id previously targeted by `source`, if any.
    ///
    /// # Errors
    /// Returns [`GraphError::RelationEndpointNotFound`] if either key has no
    /// matrix cell
    pub fn relate(&mut self, source: &SpanKey, target: &SpanKey) -> GraphResult<Option<usize>> {
        let source = self.resolve(source)?;
        let target = self.resolve(target)?;
        self.relations.set(source, target)
    }

    /// Id of the annotation in the `(span, label)` cell
    ///
    /// # Errors
    /// Returns [`GraphError::RelationEndpointNotFound`] if the cell is empty
    pub fn resolve(&self, key: &SpanKey) -> GraphResult<usize> {
        let not_found = || GraphError::endpoint_not_found(key.span.begin(), key.span.end(), key.label.clone());
        let cell = self
            .matrix
            .get_value(key.span.begin(), key.span.end(), key.label.as_str())
            .ok_or_else(not_found)?;
        self.vector.index_of(cell.as_ref()).ok_or_else(not_found)
    }

    /// Annotation with `id`
    ///
    /// # Errors
    /// Returns [`GraphError::OutOfBounds`] if `id >= len`
    #[inline]
    pub fn get(&self, id: usize) -> GraphResult<&T> {
        self.vector
            .get(id)
            .map(AsRef::as_ref)
            .ok_or_else(|| GraphError::out_of_bounds(id, self.len()))
    }

    /// Shared handle to the annotation with `id`
    #[inline]
    #[must_use]
    pub fn annotation(&self, id: usize) -> Option<&Arc<T>> {
        self.vector.get(id)
    }

    /// Id of `annotation`, if it is part of the graph
    #[inline]
    #[must_use]
    pub fn id_of(&self, annotation: &T) -> Option<usize> {
        self.vector.index_of(annotation)
    }

    /// Check if `annotation` is part of the graph
    #[inline]
    #[must_use]
    pub fn contains(&self, annotation: &T) -> bool {
        self.vector.contains(annotation)
    }

    /// Annotations covering exactly `span`, keyed by label
    ///
    /// # Errors
    /// - [`GraphError::SpanNotIndexed`] if no annotation begins at
    ///   `span.begin()`
    /// - [`GraphError::LabelNotIndexed`] if annotations begin there but none
    ///   ends at `span.end()`
    pub fn labels_at(&self, span: Span) -> GraphResult<&LabelMap<String, Arc<T>>> {
        let row = self
            .matrix
            .row(span.begin())
            .ok_or(GraphError::SpanNotIndexed { begin: span.begin() })?;
        row.get(&span.end()).ok_or(GraphError::LabelNotIndexed {
            begin: span.begin(),
            end: span.end(),
        })
    }

    /// Target of the outgoing relation of `source`
    ///
    /// # Errors
    /// Returns [`GraphError::MemberNotFound`] if `source` is not part of the
    /// graph
    pub fn relation_target_of(&self, source: &T) -> GraphResult<Option<&T>> {
        let id = self.id_of(source).ok_or_else(|| missing_member(source))?;
        Ok(self.relation_target_by_id(id).and_then(|target| self.vector.get(target)).map(AsRef::as_ref))
    }

    /// Target id of the outgoing relation of `source`
    #[inline]
    #[must_use]
    pub fn relation_target_by_id(&self, source: usize) -> Option<usize> {
        self.relations.target(source)
    }

    /// Annotations whose outgoing relation points at `target`
    ///
    /// # Errors
    /// Returns [`GraphError::MemberNotFound`] if `target` is not part of the
    /// graph
    pub fn sources_of(&self, target: &T) -> GraphResult<Vec<&T>> {
        let id = self.id_of(target).ok_or_else(|| missing_member(target))?;
        Ok(self
            .relations
            .sources_of(id)
            .filter_map(|source| self.vector.get(source))
            .map(AsRef::as_ref)
            .collect())
    }

    /// All `(source, target)` relations in source id order
    pub fn relation_pairs(&self) -> impl Iterator<Item = (&T, &T)> + '_ {
        self.relations.pairs().filter_map(|(source, target)| {
            Some((self.vector.get(source)?.as_ref(), self.vector.get(target)?.as_ref()))
        })
    }

    /// Annotations in id order
    pub fn annotations(&self) -> impl Iterator<Item = &T> + '_ {
        self.vector.iter().map(AsRef::as_ref)
    }

    /// Relation table
    #[inline]
    #[must_use]
    pub fn relations(&self) -> &TransitionTable {
        &self.relations
    }

    /// Matrix view
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> &AnnotationMatrix<T> {
        &self.matrix
    }

    /// Number of annotations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.vector.len()
    }

    /// Check if the graph has no annotations
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vector.is_empty()
    }

    /// Check that every matrix cell is the instance stored at its id and
    /// that the relation table has one slot per id
    #[must_use]
    pub fn is_coherent(&self) -> bool {
        self.relations.len() == self.vector.len()
            && self.matrix.values_in_order().all(|cell| {
                self.vector
                    .index_of(cell.as_ref())
                    .and_then(|id| self.vector.get(id))
                    .is_some_and(|stored| Arc::ptr_eq(stored, cell))
            })
    }

    #[inline]
    fn check_coherence(&self) {
        if cfg!(any(debug_assertions, feature = "strict-debug")) {
            assert!(self.is_coherent(), "span matrix and annotation vector diverged");
        }
    }
}

impl<T: LabelledSpan + Eq + Hash + Send + Sync> AnnotationGraph<T> {
    /// Build a graph from annotation records and relation pairs
    ///
    /// See [`build_with_stats`](Self::build_with_stats).
    pub fn build<I>(annotations: I, relations: &[RawRelation], config: &GraphConfig) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self::build_with_stats(annotations, relations, config).0
    }

    /// Build a graph and report what happened along the way
    ///
    /// Records are added in order; a record equal to an earlier one is
    /// dropped with a warning. Relations whose endpoints cannot be resolved
    /// are logged as errors and skipped. When several relations share a
    /// source, the last one wins.
    pub fn build_with_stats<I>(annotations: I, relations: &[RawRelation], config: &GraphConfig) -> (Self, BuildStats)
    where
        I: IntoIterator<Item = T>,
    {
        let mut graph = Self::with_config(config);
        let mut stats = BuildStats::default();

        for annotation in annotations {
            match graph.push_annotation(annotation) {
                Pushed::Added { replaced: true } => stats.cells_overwritten += 1,
                Pushed::Added { replaced: false } => {}
                Pushed::Duplicate { .. } => stats.duplicates_dropped += 1,
            }
        }
        stats.annotations = graph.len();

        let parallel = config.resolves_in_parallel(relations.len());
        tracing::debug!(relations = relations.len(), parallel, "resolving relations");

        let tally = {
            let resolve = |key: &SpanKey| graph.resolve(key);
            if parallel {
                relations::collect_parallel(relations, graph.len(), resolve)
            } else {
                relations::collect_sequential(relations, graph.len(), resolve)
            }
        };
        graph.relations = tally.table;
        stats.relations_resolved = tally.resolved;
        stats.relations_skipped = tally.skipped;
        stats.relation_slots_overwritten = tally.overwritten;

        tracing::info!(
            annotations = stats.annotations,
            duplicates = stats.duplicates_dropped,
            overwritten = stats.cells_overwritten,
            resolved = stats.relations_resolved,
            skipped = stats.relations_skipped,
            "annotation graph built"
        );

        graph.check_coherence();
        (graph, stats)
    }
}

impl AnnotationGraph<SpanLabel> {
    /// Validate raw span records and build a graph from them
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidSpan`] for the first record with
    /// `begin > end`; nothing is built in that case
    pub fn from_raw<I>(spans: I, relations: &[RawRelation], config: &GraphConfig) -> GraphResult<(Self, BuildStats)>
    where
        I: IntoIterator<Item = RawSpan>,
    {
        let labels = spans
            .into_iter()
            .map(SpanLabel::try_from)
            .collect::<GraphResult<Vec<_>>>()?;
        Ok(Self::build_with_stats(labels, relations, config))
    }
}

fn missing_member<T: LabelledSpan>(annotation: &T) -> GraphError {
    let span = annotation.span();
    GraphError::member_not_found(span.begin(), span.end(), annotation.label())
}

impl<T: LabelledSpan + Eq + Hash> Default for AnnotationGraph<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: LabelledSpan + Eq + Hash> PartialEq for AnnotationGraph<T> {
    fn eq(&self, other: &Self) -> bool {
        self.vector == other.vector && self.relations == other.relations
    }
}

impl<T: LabelledSpan + Eq + Hash> Eq for AnnotationGraph<T> {}

struct AnnotationList<'a, T>(&'a [Arc<T>]);

impl<T: Serialize> Serialize for AnnotationList<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter().map(AsRef::<T>::as_ref))
    }
}

impl<T> Serialize for AnnotationGraph<T>
where
    T: LabelledSpan + Eq + Hash + Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("AnnotationGraph", 2)?;
        state.serialize_field("spanAnnotations", &AnnotationList(self.vector.as_slice()))?;
        state.serialize_field("relations", &self.relations)?;
        state.end()
    }
}

#[derive(Deserialize)]
struct GraphParts<T> {
    #[serde(rename = "spanAnnotations")]
    span_annotations: Vec<T>,
    relations: TransitionTable,
}

impl<'de, T> Deserialize<'de> for AnnotationGraph<T>
where
    T: LabelledSpan + Eq + Hash + Deserialize<'de>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let parts = GraphParts::<T>::deserialize(deserializer)?;
        Self::from_parts(parts.span_annotations, parts.relations).map_err(serde::de::Error::custom)
    }
}
