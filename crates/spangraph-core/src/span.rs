//! Span value types
//!
//! A [`Span`] addresses a half-open character range of a document. A
//! [`SpanText`] adds the text it covers, and a [`SpanLabel`] names its
//! argumentative role (for example `Claim` or `Premise`) plus free-form
//! attributes. All three are immutable values with structural equality.

use crate::error::{GraphError, GraphResult};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};

/// Attribute key conventionally holding a stance or category
pub const CATEGORY: &str = "category";

/// Half-open character range `[begin, end)`
///
/// Ordered lexicographically on `(begin, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SpanBounds")]
pub struct Span {
    begin: usize,
    end: usize,
}

impl Span {
    /// Create a span
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidSpan`] if `begin > end`
    #[inline]
    pub fn new(begin: usize, end: usize) -> GraphResult<Self> {
        if begin > end {
            return Err(GraphError::invalid_span(begin, end));
        }
        Ok(Self { begin, end })
    }

    /// Begin offset (inclusive)
    #[inline]
    #[must_use]
    pub const fn begin(&self) -> usize {
        self.begin
    }

    /// End offset (exclusive)
    #[inline]
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of characters covered
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Check if the span covers no characters
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// Check if `other` lies entirely within this span
    #[inline]
    #[must_use]
    pub const fn encloses(&self, other: &Self) -> bool {
        self.begin <= other.begin && other.end <= self.end
    }
}

impl Display for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.begin, self.end)
    }
}

#[derive(Deserialize)]
struct SpanBounds {
    begin: usize,
    end: usize,
}

impl TryFrom<SpanBounds> for Span {
    type Error = GraphError;

    fn try_from(bounds: SpanBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.begin, bounds.end)
    }
}

/// Span together with the text it covers
///
/// The covered text is trusted as given; see
/// [`AnnotatedDocument::verify_covered_text`](crate::AnnotatedDocument::verify_covered_text).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanText {
    span: Span,
    #[serde(rename = "coveredText")]
    covered_text: String,
}

impl SpanText {
    /// Create span text
    #[inline]
    pub fn new(span: Span, covered_text: impl Into<String>) -> Self {
        Self {
            span,
            covered_text: covered_text.into(),
        }
    }

    /// Covered span
    #[inline]
    #[must_use]
    pub const fn span(&self) -> Span {
        self.span
    }

    /// Covered text
    #[inline]
    #[must_use]
    pub fn covered_text(&self) -> &str {
        &self.covered_text
    }
}

/// Attribute value attached to a [`SpanLabel`]
///
/// Serialized untagged, so attributes read as plain JSON values. Integers
/// prefer [`Int`](Self::Int) and fall back to [`UInt`](Self::UInt) above
/// `i64::MAX`; floats are wrapped for total ordering and hashing.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Explicitly absent value
    Null,
    /// Boolean flag
    Bool(bool),
    /// Signed integer value
    Int(i64),
    /// Unsigned integer too large for [`Int`](Self::Int)
    UInt(u64),
    /// Floating point value
    Float(OrderedFloat<f64>),
    /// Text value
    Str(String),
    /// Sequence of values
    List(Vec<AttributeValue>),
    /// Nested attribute map
    Map(BTreeMap<String, AttributeValue>),
}

impl AttributeValue {
    /// Text content, if this is a string value
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content widened to `f64`, if this is a number
    #[inline]
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::UInt(u) => Some(*u as f64),
            Self::Float(f) => Some(f.into_inner()),
            _ => None,
        }
    }
}

impl Display for AttributeValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::UInt(u) => write!(f, "{u}"),
            Self::Float(x) => write!(f, "{}", x.into_inner()),
            Self::Str(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Map(entries) => {
                f.write_str("{")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        i64::try_from(value).map_or(Self::UInt(value), Self::Int)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        Self::Float(OrderedFloat(value))
    }
}

impl From<Vec<AttributeValue>> for AttributeValue {
    fn from(value: Vec<AttributeValue>) -> Self {
        Self::List(value)
    }
}

impl From<BTreeMap<String, AttributeValue>> for AttributeValue {
    fn from(value: BTreeMap<String, AttributeValue>) -> Self {
        Self::Map(value)
    }
}

impl<T: Into<AttributeValue>> From<Option<T>> for AttributeValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Attribute map; sorted so equal maps hash equally
pub type Attributes = BTreeMap<String, AttributeValue>;

/// Anything addressable by `(begin, end, label)`
///
/// The annotation graph is generic over this trait; [`SpanLabel`] is the
/// standard implementation.
pub trait LabelledSpan {
    /// Covered span
    fn span(&self) -> Span;

    /// Role label
    fn label(&self) -> &str;

    /// Owned `(span, label)` key
    fn key(&self) -> SpanKey {
        SpanKey::new(self.span(), self.label())
    }
}

/// Labelled annotation over a span of text
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanLabel {
    #[serde(rename = "textSpan")]
    text_span: SpanText,
    label: String,
    #[serde(rename = "attrs", default)]
    attributes: Attributes,
}

impl SpanLabel {
    /// Create label without attributes
    #[inline]
    pub fn new(text_span: SpanText, label: impl Into<String>) -> Self {
        Self {
            text_span,
            label: label.into(),
            attributes: Attributes::new(),
        }
    }

    /// Create label with a full attribute map
    #[inline]
    pub fn from_parts(text_span: SpanText, label: impl Into<String>, attributes: Attributes) -> Self {
        Self {
            text_span,
            label: label.into(),
            attributes,
        }
    }

    /// Builder: add an attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Builder: set the [`CATEGORY`] attribute
    #[inline]
    #[must_use]
    pub fn with_category(self, category: impl Into<AttributeValue>) -> Self {
        self.with_attribute(CATEGORY, category)
    }

    /// Span and covered text
    #[inline]
    #[must_use]
    pub fn text_span(&self) -> &SpanText {
        &self.text_span
    }

    /// Covered text
    #[inline]
    #[must_use]
    pub fn covered_text(&self) -> &str {
        self.text_span.covered_text()
    }

    /// All attributes
    #[inline]
    #[must_use]
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Single attribute
    #[inline]
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// The [`CATEGORY`] attribute, if set
    #[inline]
    #[must_use]
    pub fn category(&self) -> Option<&AttributeValue> {
        self.attribute(CATEGORY)
    }
}

impl LabelledSpan for SpanLabel {
    #[inline]
    fn span(&self) -> Span {
        self.text_span.span()
    }

    #[inline]
    fn label(&self) -> &str {
        &self.label
    }
}

impl Display for SpanLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.label, self.span(), self.covered_text())
    }
}

/// `(span, label)` coordinates of a matrix cell
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpanKey {
    /// Covered span
    pub span: Span,
    /// Role label
    pub label: String,
}

impl SpanKey {
    /// Create key
    #[inline]
    pub fn new(span: Span, label: impl Into<String>) -> Self {
        Self {
            span,
            label: label.into(),
        }
    }

    /// Create key from raw offsets
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidSpan`] if `begin > end`
    #[inline]
    pub fn at(begin: usize, end: usize, label: impl Into<String>) -> GraphResult<Self> {
        Ok(Self::new(Span::new(begin, end)?, label))
    }
}

impl Display for SpanKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.label, self.span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim() -> SpanLabel {
        SpanLabel::new(SpanText::new(Span::new(0, 5).unwrap(), "Cats!"), "Claim")
    }

    #[test]
    fn span_rejects_inverted_bounds() {
        assert_eq!(Span::new(5, 3), Err(GraphError::invalid_span(5, 3)));
        assert!(Span::new(3, 3).unwrap().is_empty());
    }

    #[test]
    fn span_orders_by_begin_then_end() {
        let mut spans = vec![
            Span::new(4, 9).unwrap(),
            Span::new(0, 7).unwrap(),
            Span::new(0, 2).unwrap(),
        ];
        spans.sort();
        let bounds: Vec<_> = spans.iter().map(|s| (s.begin(), s.end())).collect();
        assert_eq!(bounds, vec![(0, 2), (0, 7), (4, 9)]);
    }

    #[test]
    fn span_encloses() {
        let outer = Span::new(0, 10).unwrap();
        assert!(outer.encloses(&Span::new(2, 10).unwrap()));
        assert!(!outer.encloses(&Span::new(2, 11).unwrap()));
    }

    #[test]
    fn span_deserialize_validates() {
        let ok: Span = serde_json::from_str(r#"{"begin":1,"end":4}"#).unwrap();
        assert_eq!(ok.len(), 3);

        let bad: Result<Span, _> = serde_json::from_str(r#"{"begin":4,"end":1}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn label_equality_covers_attributes() {
        let plain = claim();
        let tagged = claim().with_category("for");
        assert_ne!(plain, tagged);
        assert_eq!(tagged, claim().with_category("for"));
        assert_eq!(tagged.category().and_then(AttributeValue::as_str), Some("for"));
    }

    #[test]
    fn label_serializes_with_persisted_field_names() {
        let label = claim().with_category(None::<String>);
        let json = serde_json::to_string(&label).unwrap();
        assert_eq!(
            json,
            r#"{"textSpan":{"span":{"begin":0,"end":5},"coveredText":"Cats!"},"label":"Claim","attrs":{"category":null}}"#
        );

        let back: SpanLabel = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);
    }

    #[test]
    fn label_reads_back_any_json_attribute() {
        let json = r#"{"textSpan":{"span":{"begin":0,"end":5},"coveredText":"Cats!"},"label":"Claim","attrs":{"confidence":0.75,"offsets":[1,2],"source":{"corpus":"essays","id":18446744073709551615}}}"#;
        let label: SpanLabel = serde_json::from_str(json).unwrap();

        assert_eq!(label.attribute("confidence"), Some(&AttributeValue::from(0.75)));
        assert_eq!(
            label.attribute("offsets"),
            Some(&AttributeValue::List(vec![1i64.into(), 2i64.into()]))
        );
        let Some(AttributeValue::Map(source)) = label.attribute("source") else {
            panic!("nested attribute map expected");
        };
        assert_eq!(source["corpus"], AttributeValue::from("essays"));
        assert_eq!(source["id"], AttributeValue::UInt(u64::MAX));

        assert_eq!(serde_json::to_string(&label).unwrap(), json);
    }

    #[test]
    fn attribute_numbers_and_containers_display() {
        assert_eq!(AttributeValue::from(0.75).to_string(), "0.75");
        assert_eq!(AttributeValue::from(7u64), AttributeValue::Int(7));
        assert!(AttributeValue::from("x").as_f64().is_none());
        let nested = AttributeValue::List(vec!["a".into(), AttributeValue::Null, true.into()]);
        assert_eq!(nested.to_string(), "[a, null, true]");
    }

    #[test]
    fn label_without_attrs_field_deserializes() {
        let json = r#"{"textSpan":{"span":{"begin":0,"end":5},"coveredText":"Cats!"},"label":"Claim"}"#;
        let label: SpanLabel = serde_json::from_str(json).unwrap();
        assert!(label.attributes().is_empty());
    }

    #[test]
    fn key_matches_label_coordinates() {
        let key = claim().key();
        assert_eq!(key, SpanKey::at(0, 5, "Claim").unwrap());
        assert_eq!(key.to_string(), "Claim [0, 5]");
    }
}
