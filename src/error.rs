//! Error handling for Tracksmith
//!
//! Every failure in the core is a recoverable value returned to the caller.
//! Errors carry a stable kind string for the tool boundary plus enough
//! context (paths, exit codes, captured stderr) to retry or adjust input.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for Tracksmith operations
pub type Result<T> = std::result::Result<T, StudioError>;

/// Main error type for Tracksmith operations
#[derive(Error, Debug)]
pub enum StudioError {
    // Caller errors
    #[error("Invalid parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    // Project file errors
    #[error("Corrupt project file {path}: {reason}")]
    CorruptFile { path: PathBuf, reason: String },

    #[error("Unsupported project format version {version} (newest supported: {supported})")]
    UnsupportedVersion { version: String, supported: String },

    // Renderer errors
    #[error("Render timed out after {timeout_ms} ms")]
    RenderTimeout { timeout_ms: u64 },

    #[error("Render failed: {reason}")]
    RenderFailed {
        reason: String,
        exit_code: Option<i32>,
        stderr: String,
    },

    // I/O Errors
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Serialization Errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StudioError {
    /// Shorthand for an `InvalidParameter` error.
    pub fn invalid(param: impl Into<String>, reason: impl Into<String>) -> Self {
        StudioError::InvalidParameter {
            param: param.into(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        StudioError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StudioError::Io {
            path: path.into(),
            source,
        }
    }

    /// The error kind name reported at the tool boundary.
    pub fn kind(&self) -> &'static str {
        match self {
            StudioError::InvalidParameter { .. } => "InvalidParameter",
            StudioError::NotFound { .. } => "NotFound",
            StudioError::CorruptFile { .. } => "CorruptFile",
            StudioError::UnsupportedVersion { .. } => "UnsupportedVersion",
            StudioError::RenderTimeout { .. } => "RenderTimeout",
            StudioError::RenderFailed { .. } => "RenderFailed",
            StudioError::Io { .. } => "Io",
            StudioError::Serialization(_) => "Serialization",
        }
    }

    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            StudioError::InvalidParameter { .. } => "INVALID_PARAMETER",
            StudioError::NotFound { .. } => "NOT_FOUND",
            StudioError::CorruptFile { .. } => "CORRUPT_FILE",
            StudioError::UnsupportedVersion { .. } => "UNSUPPORTED_VERSION",
            StudioError::RenderTimeout { .. } => "RENDER_TIMEOUT",
            StudioError::RenderFailed { .. } => "RENDER_FAILED",
            StudioError::Io { .. } => "IO_ERROR",
            StudioError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }

    /// Returns true if repeating the same call may succeed without changing input.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StudioError::RenderTimeout { .. }
                | StudioError::RenderFailed { .. }
                | StudioError::Io { .. }
        )
    }

    /// Returns a short hint on how the caller can recover.
    pub fn recovery_suggestion(&self) -> Option<&'static str> {
        match self {
            StudioError::InvalidParameter { .. } => {
                Some("Check the value against the allowed range and call again.")
            }
            StudioError::NotFound { .. } => {
                Some("List tracks or describe the project to get current ids.")
            }
            StudioError::CorruptFile { .. } => {
                Some("Restore the file from a backup or recreate the project.")
            }
            StudioError::UnsupportedVersion { .. } => {
                Some("Open the file with a newer release of the tool.")
            }
            StudioError::RenderTimeout { .. } => {
                Some("Shorten the project or raise TRACKSMITH_RENDER_TIMEOUT_MS.")
            }
            StudioError::RenderFailed { .. } => {
                Some("Inspect the renderer stderr; check TRACKSMITH_RENDERER points to a working binary.")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = StudioError::not_found("track", 3);
        assert_eq!(err.error_code(), "NOT_FOUND");
        assert_eq!(err.kind(), "NotFound");
        assert_eq!(err.to_string(), "track not found: 3");
    }

    #[test]
    fn test_render_errors_are_retryable() {
        let err = StudioError::RenderTimeout { timeout_ms: 10 };
        assert!(err.is_retryable());
        assert!(err.recovery_suggestion().is_some());

        let err = StudioError::invalid("tempo", "must be positive");
        assert!(!err.is_retryable());
        assert_eq!(err.kind(), "InvalidParameter");
    }
}
