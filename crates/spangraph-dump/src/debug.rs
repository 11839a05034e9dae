//! Human-readable document listing
//!
//! ```text
//! ======== #essay01 begin ==========================
//! ----------------- Annotations -----------------
//! # of annotations: 2
//! Claim [0, 21] "They reduce bullying."
//! ...
//! ======== #essay01 end ==========================
//! ```

use crate::error::{DumpError, DumpResult};
use serde::{Deserialize, Serialize};
use spangraph_core::{AnnotatedDocument, AttributeValue, LabelledSpan, SpanLabel};
use std::fmt::{self, Display, Formatter};
use std::path::Path;

/// What [`render_debug`] includes besides the annotation lines
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebugOptions {
    /// List non-null attributes under each annotation and relation
    pub include_attributes: bool,
    /// List relations after the annotations
    pub include_relations: bool,
}

impl DebugOptions {
    /// Everything on
    #[inline]
    #[must_use]
    pub fn verbose() -> Self {
        Self {
            include_attributes: true,
            include_relations: true,
        }
    }
}

/// Render one document as a debug listing
#[must_use]
pub fn render_debug(doc_id: &str, document: &AnnotatedDocument, options: &DebugOptions) -> String {
    DebugListing {
        doc_id,
        document,
        options,
    }
    .to_string()
}

/// Append the debug listing of one document to `path`
///
/// # Errors
/// Returns [`DumpError::Io`] if the file cannot be opened or written
pub async fn append_debug(
    path: impl AsRef<Path>,
    doc_id: &str,
    document: &AnnotatedDocument,
    options: &DebugOptions,
) -> DumpResult<()> {
    use tokio::io::AsyncWriteExt;

    let path = path.as_ref();
    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(|e| DumpError::io_error(path, e))?;
    file.write_all(render_debug(doc_id, document, options).as_bytes())
        .await
        .map_err(|e| DumpError::io_error(path, e))?;
    file.flush().await.map_err(|e| DumpError::io_error(path, e))
}

struct DebugListing<'a> {
    doc_id: &'a str,
    document: &'a AnnotatedDocument,
    options: &'a DebugOptions,
}

impl Display for DebugListing<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let graph = self.document.annotations();
        writeln!(f, "======== #{} begin ==========================", self.doc_id)?;

        writeln!(f, "----------------- Annotations -----------------")?;
        writeln!(f, "# of annotations: {}", graph.len())?;
        for annotation in graph.annotations() {
            writeln!(f, "{}", Unit(annotation))?;
            if self.options.include_attributes {
                write_attributes(f, annotation)?;
            }
        }

        if self.options.include_relations {
            let pairs: Vec<_> = graph.relation_pairs().collect();
            writeln!(f, "----------------- Relations -----------------")?;
            writeln!(f, "# of relations: {}", pairs.len())?;
            for (source, target) in pairs {
                writeln!(f, "   source: {}", Unit(source))?;
                writeln!(f, "   target: {}", Unit(target))?;
            }
        }

        writeln!(f, "======== #{} end ==========================", self.doc_id)
    }
}

/// `label [begin, end] "text"`
struct Unit<'a>(&'a SpanLabel);

impl Display for Unit<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let span = self.0.span();
        write!(
            f,
            "{} [{}, {}] \"{}\"",
            self.0.label(),
            span.begin(),
            span.end(),
            self.0.covered_text()
        )
    }
}

fn write_attributes(f: &mut Formatter<'_>, annotation: &SpanLabel) -> fmt::Result {
    writeln!(f, "Attributes:")?;
    for (key, value) in annotation.attributes() {
        if *value != AttributeValue::Null {
            writeln!(f, "   {key}: {value}")?;
        }
    }
    Ok(())
}
