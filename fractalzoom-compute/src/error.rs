use fractalzoom_core::{BackendKind, BoundsError};
use thiserror::Error;

/// Errors from rendering a frame on any backend.
#[derive(Debug, Error)]
pub enum ComputeError {
    #[error("invalid view: {0}")]
    Bounds(#[from] BoundsError),

    #[error("request needs {requested} bytes but the backend allows {limit}")]
    TooLarge { requested: u64, limit: u64 },

    #[error("tiling failed: {0}")]
    Tiling(String),

    #[error("{0} backend is not available")]
    Unavailable(BackendKind),

    #[error("accelerator error: {source}")]
    Accelerator {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
        fatal: bool,
    },
}

impl ComputeError {
    /// Whether the backend that raised this can no longer be used.
    ///
    /// View and sizing errors only reject one request. The accelerator layer
    /// decides for its own errors.
    pub fn is_fatal(&self) -> bool {
        match self {
            ComputeError::Unavailable(_) => true,
            ComputeError::Accelerator { fatal, .. } => *fatal,
            _ => false,
        }
    }
}
