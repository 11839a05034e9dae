//! Error types for span matrices and annotation graphs
//!
//! Lookup failures carry the offending span, label, or id so callers can
//! report them without re-deriving context.

use spangraph_index::IndexError;

/// Errors raised by span types and the annotation graph
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Span whose begin lies after its end
    #[error("invalid span [{begin}, {end}]: begin exceeds end")]
    InvalidSpan {
        /// Requested begin offset
        begin: usize,
        /// Requested end offset
        end: usize,
    },

    /// Annotation id outside `0..len`
    #[error("annotation id {id} out of bounds for {len} annotations")]
    OutOfBounds {
        /// Requested id
        id: usize,
        /// Number of annotations
        len: usize,
    },

    /// Annotation already present at another id
    #[error("annotation already present at id {existing} (offered at {attempted})")]
    DuplicateAnnotation {
        /// Id holding the equal annotation
        existing: usize,
        /// Id at which the annotation was offered
        attempted: usize,
    },

    /// No annotation begins at the offset
    #[error("no annotation begins at offset {begin}")]
    SpanNotIndexed {
        /// Begin offset looked up
        begin: usize,
    },

    /// Annotations begin at the offset, but none ends at the requested end
    #[error("no annotation covers span [{begin}, {end}]")]
    LabelNotIndexed {
        /// Begin offset looked up
        begin: usize,
        /// End offset looked up
        end: usize,
    },

    /// Relation endpoint has no matching (begin, end, label) cell
    #[error("relation endpoint '{label}' [{begin}, {end}] not found in span matrix")]
    RelationEndpointNotFound {
        /// Endpoint begin offset
        begin: usize,
        /// Endpoint end offset
        end: usize,
        /// Endpoint label
        label: String,
    },

    /// Annotation is not a member of the graph
    #[error("annotation '{label}' [{begin}, {end}] is not part of the graph")]
    MemberNotFound {
        /// Annotation begin offset
        begin: usize,
        /// Annotation end offset
        end: usize,
        /// Annotation label
        label: String,
    },

    /// Relation table length differs from the annotation count
    #[error("relation table has {relations} slots for {annotations} annotations")]
    RelationCountMismatch {
        /// Slots in the relation table
        relations: usize,
        /// Annotations in the vector
        annotations: usize,
    },

    /// Relation slot holds neither the sentinel nor a valid id
    #[error("relation slot {source_id} points at unknown id {target_id}")]
    InvalidRelationTarget {
        /// Slot (source id) holding the bad value
        source_id: usize,
        /// Stored target value
        target_id: isize,
    },

    /// Span reaches past the end of the document text
    #[error("span [{begin}, {end}] exceeds document text of {text_len} characters")]
    SpanOutOfText {
        /// Span begin offset
        begin: usize,
        /// Span end offset
        end: usize,
        /// Document length in characters
        text_len: usize,
    },

    /// Stored covered text disagrees with the document substring
    #[error("covered text of '{label}' [{begin}, {end}] is {actual:?}, document has {expected:?}")]
    InconsistentCoveredText {
        /// Span begin offset
        begin: usize,
        /// Span end offset
        end: usize,
        /// Annotation label
        label: String,
        /// Text found in the document
        expected: String,
        /// Text stored on the annotation
        actual: String,
    },
}

impl GraphError {
    /// Create invalid span error
    #[inline]
    #[must_use]
    pub fn invalid_span(begin: usize, end: usize) -> Self {
        Self::InvalidSpan { begin, end }
    }

    /// Create out-of-bounds error
    #[inline]
    #[must_use]
    pub fn out_of_bounds(id: usize, len: usize) -> Self {
        Self::OutOfBounds { id, len }
    }

    /// Create endpoint-not-found error
    #[inline]
    pub fn endpoint_not_found(begin: usize, end: usize, label: impl Into<String>) -> Self {
        Self::RelationEndpointNotFound {
            begin,
            end,
            label: label.into(),
        }
    }

    /// Create member-not-found error
    #[inline]
    pub fn member_not_found(begin: usize, end: usize, label: impl Into<String>) -> Self {
        Self::MemberNotFound {
            begin,
            end,
            label: label.into(),
        }
    }

    /// Check if error is a missing lookup (span, label, endpoint, or member)
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::SpanNotIndexed { .. }
                | Self::LabelNotIndexed { .. }
                | Self::RelationEndpointNotFound { .. }
                | Self::MemberNotFound { .. }
        )
    }
}

impl From<IndexError> for GraphError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::OutOfBounds { index, len } => Self::OutOfBounds { id: index, len },
            IndexError::DuplicateValue {
                existing,
                attempted,
            } => Self::DuplicateAnnotation {
                existing,
                attempted,
            },
        }
    }
}

/// Result type alias for graph operations
pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_not_indexed_display() {
        let err = GraphError::SpanNotIndexed { begin: 7 };
        assert_eq!(err.to_string(), "no annotation begins at offset 7");
    }

    #[test]
    fn endpoint_not_found_display() {
        let err = GraphError::endpoint_not_found(10, 20, "Premise");
        assert_eq!(
            err.to_string(),
            "relation endpoint 'Premise' [10, 20] not found in span matrix"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn index_errors_convert_by_kind() {
        let bounds: GraphError = IndexError::out_of_bounds(4, 2).into();
        assert_eq!(bounds, GraphError::out_of_bounds(4, 2));

        let duplicate: GraphError = IndexError::duplicate(0, 3).into();
        assert!(matches!(
            duplicate,
            GraphError::DuplicateAnnotation {
                existing: 0,
                attempted: 3
            }
        ));
        assert!(!duplicate.is_not_found());
    }
}
