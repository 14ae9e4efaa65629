// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Error types for Argus

use thiserror::Error;

/// Result type alias for Argus operations
pub type Result<T> = std::result::Result<T, ArgusError>;

/// Argus error types
#[derive(Error, Debug)]
pub enum ArgusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("File system error: {0}")]
    FileSystem(#[from] std::io::Error),

    #[error("API error: {0}")]
    Api(#[from] reqwest::Error),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Analysis error: {0}")]
    Analysis(String),

    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Timed out: {0}")]
    Timeout(String),
}

impl ArgusError {
    /// Whether this error came from an external collaborator (network, HTTP status,
    /// or transcription service) rather than local I/O or configuration.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            ArgusError::Api(_) | ArgusError::ServiceUnavailable(_) | ArgusError::Transcription(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_errors() {
        assert!(ArgusError::ServiceUnavailable("down".into()).is_external());
        assert!(ArgusError::Transcription("bad audio".into()).is_external());
        assert!(!ArgusError::Cache("disk full".into()).is_external());
        assert!(!ArgusError::UnsupportedFileType("pdf".into()).is_external());
    }
}
