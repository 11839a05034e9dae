//! Dump writer settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where collected documents are written
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum DumpTarget {
    /// Single JSON object `{id: document}` on standard output
    #[default]
    Stdout,
    /// Single JSON object `{id: document}` in one file
    File(PathBuf),
    /// One `<id>.json` file per document
    Directory(PathBuf),
}

impl DumpTarget {
    /// Directory target if `path` is an existing directory, file target
    /// otherwise
    pub fn for_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if path.is_dir() {
            Self::Directory(path.to_path_buf())
        } else {
            Self::File(path.to_path_buf())
        }
    }
}

/// Settings for [`DocumentDump`](crate::DocumentDump)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Indent JSON output
    pub pretty: bool,
    /// Output destination
    pub target: DumpTarget,
}

impl DumpConfig {
    /// Create default configuration (pretty, stdout)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With pretty printing toggled
    #[inline]
    #[must_use]
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// With output destination
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: DumpTarget) -> Self {
        self.target = target;
        self
    }
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            pretty: true,
            target: DumpTarget::Stdout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_path_detects_directories() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            DumpTarget::for_path(dir.path()),
            DumpTarget::Directory(dir.path().to_path_buf())
        );

        let file = dir.path().join("essays.json");
        assert_eq!(DumpTarget::for_path(&file), DumpTarget::File(file.clone()));
    }

    #[test]
    fn target_serializes_tagged() {
        let config = DumpConfig::new().with_target(DumpTarget::File("out.json".into()));
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"pretty":true,"target":{"kind":"file","path":"out.json"}}"#);

        let back: DumpConfig = serde_json::from_str(r#"{"pretty":false}"#).unwrap();
        assert_eq!(back.target, DumpTarget::Stdout);
    }
}
