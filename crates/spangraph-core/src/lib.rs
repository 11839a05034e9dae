//! spangraph Core
//!
//! Span annotations over a document, indexed three ways.
//!
//! # Core Concepts
//!
//! - [`SpanLabel`]: immutable `(span, covered text, label, attributes)` record
//! - [`SparseSpanMatrix`]: sparse `begin → end → label → value` lookup
//! - [`TransitionTable`]: one outgoing relation slot per annotation id
//! - [`AnnotationGraph`]: annotations with dense ids, matrix lookup and
//!   single-successor relations
//! - [`AnnotatedDocument`]: document text paired with its graph
//!
//! # Example
//!
//! ```rust
//! use spangraph_core::{AnnotationGraph, GraphConfig, RawRelation, RawSpan};
//!
//! let spans = vec![
//!     RawSpan::new(0, 9, "Claim", "Cats rule"),
//!     RawSpan::new(10, 19, "Premise", "they purr"),
//! ];
//! let relations = vec![RawRelation::between((10, 19, "Premise"), (0, 9, "Claim"))?];
//!
//! let (graph, stats) = AnnotationGraph::from_raw(spans, &relations, &GraphConfig::default())?;
//! assert_eq!(stats.relations_resolved, 1);
//!
//! let premise = graph.get(1)?;
//! let claim = graph.relation_target_of(premise)?.expect("premise supports the claim");
//! assert_eq!(claim.covered_text(), "Cats rule");
//! # Ok::<(), spangraph_core::GraphError>(())
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod matrix;
pub mod raw;
pub mod relations;
pub mod span;

// Re-exports
pub use config::GraphConfig;
pub use document::AnnotatedDocument;
pub use error::{GraphError, GraphResult};
pub use graph::{AnnotationGraph, AnnotationMatrix, BuildStats};
pub use matrix::{LabelMap, SparseSpanMatrix, SpanRow};
pub use raw::{RawRelation, RawSpan};
pub use relations::{TransitionTable, NO_RELATION};
pub use span::{AttributeValue, Attributes, LabelledSpan, Span, SpanKey, SpanLabel, SpanText, CATEGORY};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for building and querying annotation graphs
    pub use crate::{
        AnnotatedDocument, AnnotationGraph, GraphConfig, GraphError, LabelledSpan, RawRelation, RawSpan, Span,
        SpanKey, SpanLabel,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn raw_records_to_document_and_back() {
        let text = "Cats rule. They purr.";
        let spans = vec![
            RawSpan::new(0, 10, "Claim", "Cats rule.").with_attribute(CATEGORY, "for"),
            RawSpan::new(11, 21, "Premise", "They purr."),
        ];
        let relations = vec![RawRelation::between((11, 21, "Premise"), (0, 10, "Claim")).unwrap()];

        let (graph, stats) = AnnotationGraph::from_raw(spans, &relations, &GraphConfig::default()).unwrap();
        assert_eq!(stats.annotations, 2);
        assert_eq!(graph.relations().as_slice(), &[NO_RELATION, 0]);

        let document = AnnotatedDocument::new(text, graph);
        assert!(document.verify_covered_text().is_ok());

        let json = serde_json::to_string(&document).unwrap();
        let restored: AnnotatedDocument = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, document);
        assert!(restored.annotations().is_coherent());
    }

    #[test]
    fn invalid_raw_span_aborts_build() {
        let spans = vec![RawSpan::new(4, 2, "Claim", "")];
        let result = AnnotationGraph::from_raw(spans, &[], &GraphConfig::default());
        assert_eq!(result.unwrap_err(), GraphError::invalid_span(4, 2));
    }
}
