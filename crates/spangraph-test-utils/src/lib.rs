//! Testing utilities for spangraph workspace
//!
//! Shared fixtures, tracing setup, and log capture.

#![allow(missing_docs)]

use spangraph_core::{
    AnnotatedDocument, AnnotationGraph, BuildStats, GraphConfig, RawRelation, RawSpan, CATEGORY,
};
use std::io;
use std::sync::{Arc, Mutex, PoisonError};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Short persuasive essay; ASCII, so byte and character offsets agree
pub const ESSAY_TEXT: &str =
    "School uniforms should be mandatory. They reduce bullying. Nobody can show off brands.";

pub const MAJOR_CLAIM: &str = "School uniforms should be mandatory.";
pub const CLAIM: &str = "They reduce bullying.";
pub const PREMISE: &str = "Nobody can show off brands.";

/// Install a test-writer subscriber once per process
///
/// Honours `RUST_LOG`; defaults to `warn`.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// In-memory sink for formatted log lines
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    /// Everything written so far
    pub fn contents(&self) -> String {
        let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run `f` with a thread-local subscriber and return its result plus the
/// formatted log output
///
/// Only events emitted on the calling thread are captured.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_max_level(tracing::Level::TRACE)
        .with_ansi(false)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, buffer.contents())
}

/// `(begin, end)` of `needle` within [`ESSAY_TEXT`]
pub fn locate(needle: &str) -> (usize, usize) {
    let begin = ESSAY_TEXT
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} is not part of the essay"));
    (begin, begin + needle.len())
}

pub fn raw_span(needle: &str, label: &str) -> RawSpan {
    let (begin, end) = locate(needle);
    RawSpan::new(begin, end, label, needle)
}

pub fn raw_relation(source: (&str, &str), target: (&str, &str)) -> RawRelation {
    let (source_begin, source_end) = locate(source.0);
    let (target_begin, target_end) = locate(target.0);
    RawRelation::between(
        (source_begin, source_end, source.1),
        (target_begin, target_end, target.1),
    )
    .unwrap()
}

pub fn essay_spans() -> Vec<RawSpan> {
    vec![
        raw_span(MAJOR_CLAIM, "MajorClaim"),
        raw_span(CLAIM, "Claim").with_attribute(CATEGORY, "for"),
        raw_span(PREMISE, "Premise"),
    ]
}

pub fn essay_relations() -> Vec<RawRelation> {
    vec![
        raw_relation((CLAIM, "Claim"), (MAJOR_CLAIM, "MajorClaim")),
        raw_relation((PREMISE, "Premise"), (CLAIM, "Claim")),
    ]
}

/// Relation whose source `(10, 20, "Premise")` matches no annotation
pub fn unresolved_relation() -> RawRelation {
    let (begin, end) = locate(CLAIM);
    RawRelation::between((10, 20, "Premise"), (begin, end, "Claim")).unwrap()
}

pub fn essay_graph() -> (AnnotationGraph, BuildStats) {
    AnnotationGraph::from_raw(essay_spans(), &essay_relations(), &GraphConfig::default()).unwrap()
}

pub fn essay_document() -> AnnotatedDocument {
    AnnotatedDocument::new(ESSAY_TEXT, essay_graph().0)
}
