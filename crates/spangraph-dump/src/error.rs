//! Error types for dump writers

use spangraph_core::GraphError;
use std::path::PathBuf;

/// Errors while collecting or writing documents
#[derive(Debug, thiserror::Error)]
pub enum DumpError {
    /// IO error while writing a file
    #[error("io error writing {}: {source}", path.display())]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// IO error while writing to standard output
    #[error("io error writing to stdout: {0}")]
    Stdout(#[source] std::io::Error),

    /// Serialization failed
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Document id is not usable as a file name
    #[error("document id {0:?} cannot be used as a file name")]
    InvalidDocumentId(String),

    /// Annotation records could not be turned into a graph
    #[error("graph error: {0}")]
    Graph(#[from] GraphError),
}

impl DumpError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for dump operations
pub type DumpResult<T> = Result<T, DumpError>;
