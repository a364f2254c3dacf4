use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// File-level failures. Every variant is fatal for the run.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("input not found: {}", .0.display())]
    InputNotFound(PathBuf),
    #[error("unsupported format for {}: {reason}", path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },
    #[error("failed to read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write {}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ToolError {
    pub(crate) fn unsupported(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ToolError::UnsupportedFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        ToolError::Read {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, source: impl Into<io::Error>) -> Self {
        ToolError::WriteFailure {
            path: path.into(),
            source: source.into(),
        }
    }
}
