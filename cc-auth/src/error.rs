//! Error types.

use thiserror::Error;

/// Failure reported by a [`CertificateSource`](crate::source::CertificateSource).
///
/// The component never surfaces these to its host. A failed fetch leaves the
/// certificate list absent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("certificate source unavailable: {0}")]
    Unavailable(String),
    #[error("certificate storage error: {0}")]
    Storage(String),
    #[error("certificate source closed")]
    Closed,
}

impl From<String> for SourceError {
    fn from(message: String) -> Self {
        Self::Unavailable(message)
    }
}

impl From<&str> for SourceError {
    fn from(message: &str) -> Self {
        Self::Unavailable(message.to_string())
    }
}

/// Settings or configuration (de)serialization failure.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid settings json: {0}")]
    Json(#[from] serde_json::Error),
}
