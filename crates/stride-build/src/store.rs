//! Library tree storage.
//!
//! Framework libraries are pre-parsed trees loaded from an external
//! store, keyed by framework name and version, and treated as read-only
//! input. The JSON implementation expects one directory per framework
//! version:
//!
//! ```text
//! <root>/<framework>/<version>/library.json   built-in declarations
//! <root>/<framework>/<version>/testing.json   testing substitutions
//! ```

use crate::error::{BuildError, Result};
use std::path::{Path, PathBuf};
use stride_ast::Node;
use tracing::debug;

/// Read-only source of pre-parsed framework library trees.
pub trait PlatformStore: Send + Sync {
    /// The framework's built-in declaration tree.
    fn load_library(&self, framework: &str, version: &str) -> Result<Vec<Node>>;

    /// The framework's testing tree, if it ships one.
    fn load_testing_library(&self, framework: &str, version: &str) -> Result<Option<Vec<Node>>>;

    /// Filesystem root of one framework version (templates, toolchain
    /// scaffolding); handed to builder construction.
    fn platform_path(&self, framework: &str, version: &str) -> PathBuf;
}

/// Directory-backed JSON store.
pub struct JsonPlatformStore {
    root: PathBuf,
}

impl JsonPlatformStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn read_tree(&self, path: &Path) -> Result<Vec<Node>> {
        let text = std::fs::read_to_string(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| BuildError::MalformedTree {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl PlatformStore for JsonPlatformStore {
    fn load_library(&self, framework: &str, version: &str) -> Result<Vec<Node>> {
        let path = self.platform_path(framework, version).join("library.json");
        if !path.exists() {
            return Err(BuildError::MissingLibrary {
                framework: framework.to_string(),
                version: version.to_string(),
            });
        }
        debug!(framework, version, "loading library tree");
        self.read_tree(&path)
    }

    fn load_testing_library(&self, framework: &str, version: &str) -> Result<Option<Vec<Node>>> {
        let path = self.platform_path(framework, version).join("testing.json");
        if !path.exists() {
            return Ok(None);
        }
        debug!(framework, version, "loading testing tree");
        self.read_tree(&path).map(Some)
    }

    fn platform_path(&self, framework: &str, version: &str) -> PathBuf {
        self.root.join(framework).join(version)
    }
}
