//! Annotated document
//!
//! Pairs a document text with its annotation graph. Persisted as
//! `{text, annotations}`.

use crate::error::{GraphError, GraphResult};
use crate::graph::AnnotationGraph;
use crate::span::{LabelledSpan, Span, SpanLabel};
use serde::{Deserialize, Serialize};
use std::hash::Hash;

/// Document text with its annotation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotatedDocument<T: LabelledSpan + Eq + Hash = SpanLabel> {
    text: String,
    annotations: AnnotationGraph<T>,
}

impl<T: LabelledSpan + Eq + Hash> AnnotatedDocument<T> {
    /// Create document
    #[inline]
    pub fn new(text: impl Into<String>, annotations: AnnotationGraph<T>) -> Self {
        Self {
            text: text.into(),
            annotations,
        }
    }

    /// Document text
    #[inline]
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Annotation graph
    #[inline]
    #[must_use]
    pub fn annotations(&self) -> &AnnotationGraph<T> {
        &self.annotations
    }

    /// Consume into text and graph
    #[inline]
    #[must_use]
    pub fn into_parts(self) -> (String, AnnotationGraph<T>) {
        (self.text, self.annotations)
    }

    /// Substring of the text addressed by `span`
    ///
    /// Offsets count Unicode scalar values, not bytes.
    ///
    /// # Errors
    /// Returns [`GraphError::SpanOutOfText`] if the span ends past the text
    pub fn covered_text(&self, span: Span) -> GraphResult<&str> {
        let out_of_text = || GraphError::SpanOutOfText {
            begin: span.begin(),
            end: span.end(),
            text_len: self.text.chars().count(),
        };
        let start = byte_offset(&self.text, span.begin()).ok_or_else(out_of_text)?;
        let end = byte_offset(&self.text, span.end()).ok_or_else(out_of_text)?;
        Ok(&self.text[start..end])
    }
}

impl AnnotatedDocument<SpanLabel> {
    /// Check every annotation's stored covered text against the document
    ///
    /// # Errors
    /// - [`GraphError::SpanOutOfText`] for an annotation reaching past the
    ///   text
    /// - [`GraphError::InconsistentCoveredText`] for the first annotation
    ///   whose stored text differs
    pub fn verify_covered_text(&self) -> GraphResult<()> {
        for annotation in self.annotations.annotations() {
            let span = annotation.span();
            let expected = self.covered_text(span)?;
            if expected != annotation.covered_text() {
                return Err(GraphError::InconsistentCoveredText {
                    begin: span.begin(),
                    end: span.end(),
                    label: annotation.label().to_owned(),
                    expected: expected.to_owned(),
                    actual: annotation.covered_text().to_owned(),
                });
            }
        }
        Ok(())
    }
}

fn byte_offset(text: &str, chars: usize) -> Option<usize> {
    text.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .nth(chars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::TransitionTable;
    use crate::span::SpanText;

    const TEXT: &str = "Über cats. They purr.";

    fn label(begin: usize, end: usize, role: &str, text: &str) -> SpanLabel {
        SpanLabel::new(SpanText::new(Span::new(begin, end).unwrap(), text), role)
    }

    fn document(labels: Vec<SpanLabel>) -> AnnotatedDocument {
        let relations = TransitionTable::new(labels.len());
        AnnotatedDocument::new(TEXT, AnnotationGraph::from_parts(labels, relations).unwrap())
    }

    #[test]
    fn covered_text_counts_characters() {
        let doc = document(vec![]);
        assert_eq!(doc.covered_text(Span::new(0, 4).unwrap()), Ok("Über"));
        assert_eq!(doc.covered_text(Span::new(11, 21).unwrap()), Ok("They purr."));
        assert_eq!(doc.covered_text(Span::new(21, 21).unwrap()), Ok(""));
    }

    #[test]
    fn covered_text_rejects_spans_past_the_end() {
        let doc = document(vec![]);
        assert_eq!(
            doc.covered_text(Span::new(11, 22).unwrap()),
            Err(GraphError::SpanOutOfText {
                begin: 11,
                end: 22,
                text_len: 21
            })
        );
    }

    #[test]
    fn verify_accepts_consistent_annotations() {
        let doc = document(vec![label(0, 10, "Claim", "Über cats."), label(11, 21, "Premise", "They purr.")]);
        assert!(doc.verify_covered_text().is_ok());
    }

    #[test]
    fn verify_reports_first_mismatch() {
        let doc = document(vec![label(0, 10, "Claim", "Uber cats."), label(11, 15, "Premise", "Nope")]);
        assert_eq!(
            doc.verify_covered_text(),
            Err(GraphError::InconsistentCoveredText {
                begin: 0,
                end: 10,
                label: "Claim".to_string(),
                expected: "Über cats.".to_string(),
                actual: "Uber cats.".to_string(),
            })
        );
    }

    #[test]
    fn serializes_text_then_annotations() {
        let doc = document(vec![]);
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["text"], TEXT);
        assert_eq!(json["annotations"]["relations"], serde_json::json!([]));

        let back: AnnotatedDocument = serde_json::from_value(json).unwrap();
        assert_eq!(back, doc);
    }
}
