//! Error types for presentation conversion.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting presentations.
#[derive(Error, Debug)]
pub enum Error {
    /// The source file is missing, unreadable, empty or of an unknown kind.
    #[error("Invalid input file {}: {reason}", .path.display())]
    InvalidInput { path: PathBuf, reason: String },

    /// The rendering engine binary could not be started.
    #[error("Rendering engine not found: {0}")]
    EngineNotFound(String),

    /// The rendering engine ran but exited unsuccessfully.
    #[error("Rendering engine failed (exit code {}): {stderr}", describe_exit(.exit_code))]
    EngineInvocationFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The rendering engine succeeded but no output file could be found.
    #[error("No {format} output found in {}; directory contains [{}]", .dir.display(), .listing.join(", "))]
    OutputMissing {
        format: String,
        dir: PathBuf,
        listing: Vec<String>,
    },

    /// A temporary workspace could not be created, populated or removed.
    #[error("Workspace error: {0}")]
    Workspace(String),

    /// The flat XML document has no document root at all.
    #[error("Invalid flat XML structure: {0}")]
    XmlStructureInvalid(String),

    /// The output archive could not be built.
    #[error("Packaging error: {0}")]
    Packaging(String),

    /// The produced output could not be moved to its final location.
    #[error("Failed to generate output: {0}")]
    OutputGeneration(String),

    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to read or write the JSON document model.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    code.map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Coarse error category, for callers that branch on the kind of failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    EngineNotFound,
    EngineInvocationFailed,
    OutputMissing,
    Workspace,
    XmlStructureInvalid,
    Packaging,
    OutputGeneration,
    Io,
    Json,
}

impl Error {
    /// Shorthand for an [`Error::InvalidInput`].
    pub fn invalid_input(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::EngineNotFound(_) => ErrorKind::EngineNotFound,
            Self::EngineInvocationFailed { .. } => ErrorKind::EngineInvocationFailed,
            Self::OutputMissing { .. } => ErrorKind::OutputMissing,
            Self::Workspace(_) => ErrorKind::Workspace,
            Self::XmlStructureInvalid(_) => ErrorKind::XmlStructureInvalid,
            Self::Packaging(_) => ErrorKind::Packaging,
            Self::OutputGeneration(_) => ErrorKind::OutputGeneration,
            Self::Io(_) => ErrorKind::Io,
            Self::Json(_) => ErrorKind::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_failure_message_includes_exit_code() {
        let err = Error::EngineInvocationFailed {
            exit_code: Some(81),
            stderr: "boom".to_string(),
        };
        assert_eq!(err.to_string(), "Rendering engine failed (exit code 81): boom");

        let err = Error::EngineInvocationFailed {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(err.to_string().contains("exit code none"));
    }

    #[test]
    fn test_output_missing_lists_directory() {
        let err = Error::OutputMissing {
            format: "html".to_string(),
            dir: PathBuf::from("/tmp/ws"),
            listing: vec!["input.pptx".to_string(), "notes.txt".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("html"));
        assert!(message.contains("input.pptx, notes.txt"));
        assert_eq!(err.kind(), ErrorKind::OutputMissing);
    }

    #[test]
    fn test_io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: Error = io.into();
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
