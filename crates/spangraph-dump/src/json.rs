//! JSON document dump
//!
//! Collects annotated documents keyed by document id and writes them in one
//! go, either as a single `{id: document}` object (stdout or one file) or as
//! one `<id>.json` file per document.

use crate::config::{DumpConfig, DumpTarget};
use crate::error::{DumpError, DumpResult};
use serde::Serialize;
use spangraph_core::{AnnotatedDocument, AnnotationGraph, BuildStats, GraphConfig, RawRelation, RawSpan};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Collected documents awaiting a write
#[derive(Debug, Clone, Default)]
pub struct DocumentDump {
    config: DumpConfig,
    documents: BTreeMap<String, AnnotatedDocument>,
}

impl DocumentDump {
    /// Create empty dump
    #[inline]
    #[must_use]
    pub fn new(config: DumpConfig) -> Self {
        Self {
            config,
            documents: BTreeMap::new(),
        }
    }

    /// Add a document, replacing any earlier document with the same id
    pub fn add(&mut self, id: impl Into<String>, document: AnnotatedDocument) -> Option<AnnotatedDocument> {
        let id = id.into();
        tracing::info!(doc_id = %id, annotations = document.annotations().len(), "processing document");
        let previous = self.documents.insert(id, document);
        if previous.is_some() {
            tracing::warn!("document id already collected; replacing");
        }
        previous
    }

    /// Build a graph from raw records and add the resulting document
    ///
    /// # Errors
    /// Returns [`DumpError::Graph`] if a span record is invalid
    pub fn add_raw(
        &mut self,
        id: impl Into<String>,
        text: impl Into<String>,
        spans: Vec<RawSpan>,
        relations: &[RawRelation],
        graph_config: &GraphConfig,
    ) -> DumpResult<BuildStats> {
        let (graph, stats) = AnnotationGraph::from_raw(spans, relations, graph_config)?;
        self.add(id, AnnotatedDocument::new(text, graph));
        Ok(stats)
    }

    /// Collected document by id
    #[inline]
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&AnnotatedDocument> {
        self.documents.get(id)
    }

    /// Collected documents in id order
    #[inline]
    #[must_use]
    pub fn documents(&self) -> &BTreeMap<String, AnnotatedDocument> {
        &self.documents
    }

    /// Number of collected documents
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Check if nothing was collected
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &DumpConfig {
        &self.config
    }

    /// All documents as one `{id: document}` JSON object
    ///
    /// # Errors
    /// Returns [`DumpError::Serialize`] if serialization fails
    pub fn render(&self) -> DumpResult<String> {
        to_json(&self.documents, self.config.pretty)
    }

    /// Write collected documents to the configured target
    ///
    /// Returns the files written; empty for [`DumpTarget::Stdout`].
    ///
    /// # Errors
    /// - [`DumpError::Io`] / [`DumpError::Stdout`] if writing fails
    /// - [`DumpError::InvalidDocumentId`] if a directory target meets an id
    ///   that is not a plain file name
    pub async fn write(&self) -> DumpResult<Vec<PathBuf>> {
        match &self.config.target {
            DumpTarget::Stdout => {
                let mut rendered = self.render()?;
                rendered.push('\n');
                let mut stdout = tokio::io::stdout();
                stdout.write_all(rendered.as_bytes()).await.map_err(DumpError::Stdout)?;
                stdout.flush().await.map_err(DumpError::Stdout)?;
                Ok(Vec::new())
            }
            DumpTarget::File(path) => {
                write_file(path, self.render()?).await?;
                tracing::info!(path = %path.display(), documents = self.len(), "dump written");
                Ok(vec![path.clone()])
            }
            DumpTarget::Directory(dir) => self.write_directory(dir).await,
        }
    }

    async fn write_directory(&self, dir: &Path) -> DumpResult<Vec<PathBuf>> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| DumpError::io_error(dir, e))?;

        let mut written = Vec::with_capacity(self.documents.len());
        for (id, document) in &self.documents {
            let path = dir.join(document_file_name(id)?);
            write_file(&path, to_json(document, self.config.pretty)?).await?;
            written.push(path);
        }
        tracing::info!(dir = %dir.display(), documents = written.len(), "dump written");
        Ok(written)
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> DumpResult<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

async fn write_file(path: &Path, contents: String) -> DumpResult<()> {
    tokio::fs::write(path, contents)
        .await
        .map_err(|e| DumpError::io_error(path, e))
}

/// `<id>.json`, provided `id` is a plain file name
fn document_file_name(id: &str) -> DumpResult<String> {
    let plain = !id.is_empty() && id != "." && id != ".." && !id.contains(['/', '\\']);
    if plain {
        Ok(format!("{id}.json"))
    } else {
        Err(DumpError::InvalidDocumentId(id.to_owned()))
    }
}
