//! # Symptom Assist
//!
//! Terminal client for an AI symptom-analysis backend.
//!
//! This crate provides:
//! - A symptom form with local validation
//! - A single JSON round trip to `POST /api/analyze-symptom`
//! - A tolerant normalizer for the backend's loosely typed payload
//! - Terminal UI presenting the analysis in tabs, with red flags and the
//!   medical disclaimer always visible
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Request/response contract and the session state machine
//! - `ports`: Trait definitions for the analysis backend
//! - `adapters`: Concrete implementations (reqwest, log redaction)
//! - `application`: Use cases orchestrating domain and ports
//! - `config`: Environment-driven settings
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use domain::{AnalysisRequest, AnalysisResponse, Session, SymptomForm};

/// Result type for Symptom Assist operations
pub type Result<T> = std::result::Result<T, AssistError>;

/// Main error type for Symptom Assist
#[derive(Debug, thiserror::Error)]
pub enum AssistError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Backend error: {0}")]
    Backend(#[from] ports::BackendError),

    #[error("Invalid input: {0}")]
    Validation(#[from] domain::ValidationError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<application::AnalysisError> for AssistError {
    fn from(err: application::AnalysisError) -> Self {
        match err {
            application::AnalysisError::Invalid(e) => Self::Validation(e),
            application::AnalysisError::Backend(e) => Self::Backend(e),
        }
    }
}

impl AssistError {
    /// Process exit code for command-line front ends.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Validation(_) => 2,
            Self::Backend(_) | Self::Serialization(_) => 1,
        }
    }

    /// Text safe to show the user. Backend detail only goes to the log.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(_) => domain::GENERIC_FAILURE_MESSAGE.to_string(),
            Self::Validation(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_errors_keep_their_kind() {
        let err: AssistError =
            application::AnalysisError::Invalid(domain::ValidationError::MissingSymptom).into();
        assert_eq!(err.exit_code(), 2);
        assert_eq!(err.user_message(), "Please enter a symptom to analyze");

        let err: AssistError =
            application::AnalysisError::Backend(ports::BackendError::Status { status: 502 }).into();
        assert_eq!(err.exit_code(), 1);
        assert_eq!(err.user_message(), domain::GENERIC_FAILURE_MESSAGE);
    }
}
