//! Structured error types for stepscope
//!
//! Using thiserror for automatic Display implementation and error chaining.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    #[error("Failed to read baseline profile {path}: {source}")]
    BaselineParseFailed { path: PathBuf, source: serde_json::Error },

    #[error("Failed to write profile to {path}: {source}")]
    ProfileWriteFailed { path: PathBuf, source: std::io::Error },

    #[error("Failed to load profiler config {path}: {reason}")]
    ConfigLoadFailed { path: PathBuf, reason: String },

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write trace file {path}: {source}")]
    WriteFailed { path: PathBuf, source: std::io::Error },

    /// Serialization or writer failure from [`export_to`](crate::export::export_to).
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures while resolving a location through a source map.
///
/// These never leave the locator; they are logged and the unresolved
/// position is kept.
#[derive(Error, Debug)]
pub enum SourceMapError {
    #[error("Unsupported source map version {0}")]
    UnsupportedVersion(u32),

    #[error("Invalid base64 VLQ character {0:?}")]
    InvalidVlqChar(char),

    #[error("Truncated VLQ segment {0:?}")]
    TruncatedVlq(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_write_error_display() {
        let err = ProfileError::ProfileWriteFailed {
            path: PathBuf::from("/readonly/profile.json"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(err.to_string().contains("/readonly/profile.json"));
    }

    #[test]
    fn test_export_error_converts_into_profile_error() {
        let export = ExportError::WriteFailed {
            path: PathBuf::from("trace.json"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let err: ProfileError = export.into();
        assert!(err.to_string().starts_with("Failed to write trace file trace.json"));
    }

    #[test]
    fn test_vlq_error_display() {
        assert_eq!(
            SourceMapError::InvalidVlqChar('!').to_string(),
            "Invalid base64 VLQ character '!'"
        );
    }
}
