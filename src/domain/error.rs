use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the clustering engine and its loaders.
#[derive(Error, Debug)]
pub enum KMeansError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Empty input: {0}")]
    EmptyInput(String),

    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Worker pool construction failed: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid coordinate '{token}' on line {line}")]
    Parse { line: usize, token: String },

    #[error("Row on line {line} has {found} coordinates, expected {expected}")]
    RaggedRow {
        line: usize,
        expected: usize,
        found: usize,
    },
}

impl KMeansError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
