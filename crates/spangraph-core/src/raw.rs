//! Upstream records
//!
//! Flat span and relation records as produced by an annotation source,
//! before they are validated and indexed.

use crate::error::{GraphError, GraphResult};
use crate::span::{AttributeValue, Attributes, Span, SpanKey, SpanLabel, SpanText};
use serde::{Deserialize, Serialize};

/// Unvalidated `(begin, end, label, coveredText, attributes)` record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawSpan {
    /// Begin offset
    pub begin: usize,
    /// End offset
    pub end: usize,
    /// Role label
    pub label: String,
    /// Covered text
    #[serde(rename = "coveredText")]
    pub covered_text: String,
    /// Attributes
    #[serde(default)]
    pub attributes: Attributes,
}

impl RawSpan {
    /// Create record without attributes
    pub fn new(begin: usize, end: usize, label: impl Into<String>, covered_text: impl Into<String>) -> Self {
        Self {
            begin,
            end,
            label: label.into(),
            covered_text: covered_text.into(),
            attributes: Attributes::new(),
        }
    }

    /// Builder: add an attribute
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

impl TryFrom<RawSpan> for SpanLabel {
    type Error = GraphError;

    fn try_from(raw: RawSpan) -> GraphResult<Self> {
        let span = Span::new(raw.begin, raw.end)?;
        Ok(SpanLabel::from_parts(
            SpanText::new(span, raw.covered_text),
            raw.label,
            raw.attributes,
        ))
    }
}

/// Directed relation between two `(span, label)` endpoints
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRelation {
    /// Source endpoint
    pub source: SpanKey,
    /// Target endpoint
    pub target: SpanKey,
}

impl RawRelation {
    /// Create relation between two keys
    #[inline]
    #[must_use]
    pub fn new(source: SpanKey, target: SpanKey) -> Self {
        Self { source, target }
    }

    /// Create relation from `(begin, end, label)` triples
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidSpan`] if either triple has `begin > end`
    pub fn between(
        (source_begin, source_end, source_label): (usize, usize, &str),
        (target_begin, target_end, target_label): (usize, usize, &str),
    ) -> GraphResult<Self> {
        Ok(Self::new(
            SpanKey::at(source_begin, source_end, source_label)?,
            SpanKey::at(target_begin, target_end, target_label)?,
        ))
    }
}
