//! Analysis backend port: the one remote service this client talks to.
//!
//! This trait abstracts the HTTP transport from the application logic so the
//! service and the UI can be exercised against an in-process fake.

use serde::Deserialize;

use crate::domain::{AnalysisRequest, AnalysisResponse, MalformedResponse};

use super::CancelToken;

/// Transport-level failures. Never shown verbatim to the user.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("Backend unreachable: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Backend returned HTTP {status}")]
    Status { status: u16 },

    #[error("Malformed response: {0}")]
    Malformed(#[from] MalformedResponse),

    #[error("Request cancelled")]
    Cancelled,
}

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BackendHealth {
    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub service: String,

    #[serde(default)]
    pub ai_enhanced: bool,
}

impl BackendHealth {
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

/// Trait for the symptom-analysis backend.
pub trait AnalysisBackend: Send + Sync {
    /// Submit one analysis request and wait for its single response.
    ///
    /// Implementations must check `cancel` before sending and must not run
    /// past its deadline.
    ///
    /// # Errors
    /// Any non-success status, network failure, timeout, cancellation or
    /// unparseable body.
    fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancelToken,
    ) -> Result<AnalysisResponse, BackendError>;

    /// Liveness probe.
    ///
    /// # Errors
    /// Returns error if the backend cannot be reached or answers non-2xx.
    fn health(&self) -> Result<BackendHealth, BackendError>;

    /// Human-readable location of the backend, for logs and the UI header.
    fn endpoint(&self) -> &str;
}
