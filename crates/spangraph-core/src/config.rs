//! Graph construction settings

use serde::{Deserialize, Serialize};

/// Settings for building an [`AnnotationGraph`](crate::AnnotationGraph)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Capacity reserved for each new label map in the span matrix
    pub labels_per_span: usize,
    /// Whether relation resolution may run on the rayon pool
    pub parallel_relations: bool,
    /// Relation count at or above which resolution runs in parallel
    pub parallel_relation_threshold: usize,
}

impl GraphConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With label map capacity hint
    #[inline]
    #[must_use]
    pub fn with_labels_per_span(mut self, labels: usize) -> Self {
        self.labels_per_span = labels;
        self
    }

    /// With parallel relation resolution toggled
    #[inline]
    #[must_use]
    pub fn with_parallel_relations(mut self, enabled: bool) -> Self {
        self.parallel_relations = enabled;
        self
    }

    /// With parallel threshold
    #[inline]
    #[must_use]
    pub fn with_parallel_threshold(mut self, threshold: usize) -> Self {
        self.parallel_relation_threshold = threshold;
        self
    }

    /// Check if `relation_count` relations should be resolved in parallel
    #[inline]
    #[must_use]
    pub fn resolves_in_parallel(&self, relation_count: usize) -> bool {
        self.parallel_relations && relation_count >= self.parallel_relation_threshold
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            labels_per_span: 2,
            parallel_relations: true,
            parallel_relation_threshold: 1024,
        }
    }
}
