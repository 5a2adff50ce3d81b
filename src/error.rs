//! Error taxonomy for CastNet
//!
//! Only `Configuration` errors are fatal to a run. Everything raised while
//! loading or annotating a single document is caught by the pipeline and
//! reported per document instead.

use std::path::PathBuf;

pub type CastResult<T> = Result<T, CastError>;

#[derive(Debug, thiserror::Error)]
pub enum CastError {
    /// Missing/empty character list or an invalid configuration knob
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to read {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The text-annotation collaborator rejected a document
    #[error("annotation failed: {0}")]
    Annotation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("worker pool error: {0}")]
    Pool(String),
}

impl CastError {
    pub fn config(msg: impl Into<String>) -> Self {
        CastError::Configuration(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CastError::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors that must abort a run before any document is touched
    pub fn is_fatal(&self) -> bool {
        matches!(self, CastError::Configuration(_))
    }
}
