//! Build-layer errors.
//!
//! These are internal failures of the build machinery (I/O, malformed
//! library trees, process handling), distinct from the user-facing
//! diagnostics the validator collects. The orchestrator converts them to
//! `SystemError` diagnostics where they need to surface to the user.

use std::path::PathBuf;
use thiserror::Error;

/// Build-layer result type.
pub type Result<T> = std::result::Result<T, BuildError>;

/// Build machinery errors.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("framework not registered: {0}")]
    UnknownFramework(String),

    #[error("library tree not found for {framework} {version}")]
    MissingLibrary { framework: String, version: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed tree in {path}: {source}")]
    MalformedTree {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("builder for {0} failed post-construction validation")]
    InvalidBuilder(String),

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("process wait failed: {0}")]
    ProcessWait(std::io::Error),

    #[error("process did not exit within {0}ms after stop request")]
    StopTimeout(u64),
}
