//! Analysis service: one symptom in, one normalized analysis out.
//!
//! This service coordinates:
//! - Form validation (nothing reaches the backend unless it passes)
//! - The single backend call
//! - Logging of what was sent, without any of the user's text

use std::sync::Arc;
use std::time::Instant;

use crate::domain::{
    AnalysisRequest, AnalysisResponse, SymptomForm, ValidationError, GENERIC_FAILURE_MESSAGE,
};
use crate::ports::{AnalysisBackend, BackendError, BackendHealth, CancelToken};

#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl AnalysisError {
    /// Text safe to show the user.
    ///
    /// Validation problems are actionable and shown as-is; every backend
    /// failure collapses to the same generic sentence.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Invalid(e) => e.to_string(),
            Self::Backend(_) => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Backend(BackendError::Cancelled))
    }
}

/// Service for running symptom analyses against a backend.
pub struct AnalysisService<B>
where
    B: AnalysisBackend,
{
    backend: Arc<B>,
}

impl<B> Clone for AnalysisService<B>
where
    B: AnalysisBackend,
{
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B> AnalysisService<B>
where
    B: AnalysisBackend,
{
    /// Create a new analysis service.
    pub fn new(backend: Arc<B>) -> Self {
        Self { backend }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        self.backend.endpoint()
    }

    /// Validate `form` and run the analysis.
    ///
    /// # Errors
    /// `Invalid` without any network activity when the form fails
    /// validation, otherwise see [`AnalysisService::analyze`].
    pub fn analyze_form(
        &self,
        form: &SymptomForm,
        cancel: &CancelToken,
    ) -> Result<AnalysisResponse, AnalysisError> {
        let request = form.build_request()?;
        self.analyze(&request, cancel)
    }

    /// Send one already-validated request.
    ///
    /// # Errors
    /// Returns `Backend` for any transport, status or parsing failure.
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        cancel: &CancelToken,
    ) -> Result<AnalysisResponse, AnalysisError> {
        tracing::info!(
            "Submitting symptom analysis to {} (optional fields: {:?})",
            self.backend.endpoint(),
            request.supplied_fields()
        );

        let started = Instant::now();
        let outcome = self.backend.analyze(request, cancel);
        let elapsed_ms = started.elapsed().as_millis();

        match outcome {
            Ok(response) => {
                tracing::info!(
                    "Analysis complete in {}ms: causes={}, insights={}, red_flags={}, diet={}",
                    elapsed_ms,
                    response.possible_causes.len(),
                    response.ai_insights.len(),
                    response.red_flags.len(),
                    !response.diet_plan.is_empty()
                );
                Ok(response)
            }
            Err(BackendError::Cancelled) => {
                tracing::debug!("Analysis cancelled after {}ms", elapsed_ms);
                Err(BackendError::Cancelled.into())
            }
            Err(e) => {
                tracing::error!("Analysis failed after {}ms: {}", elapsed_ms, e);
                Err(e.into())
            }
        }
    }

    /// Probe the backend's health endpoint.
    ///
    /// # Errors
    /// Returns `Backend` if the probe fails.
    pub fn check_backend(&self) -> Result<BackendHealth, AnalysisError> {
        match self.backend.health() {
            Ok(health) => {
                if health.is_healthy() {
                    tracing::info!(
                        "Backend {} healthy (ai_enhanced={})",
                        self.backend.endpoint(),
                        health.ai_enhanced
                    );
                } else {
                    tracing::warn!(
                        "Backend {} reports status {:?}",
                        self.backend.endpoint(),
                        health.status
                    );
                }
                Ok(health)
            }
            Err(e) => {
                tracing::warn!("Health check against {} failed: {}", self.backend.endpoint(), e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    pub(crate) enum Reply {
        Body(&'static str),
        Status(u16),
        Timeout,
        Cancelled,
    }

    /// In-process backend that records every request it receives.
    pub(crate) struct FakeBackend {
        reply: Reply,
        calls: AtomicUsize,
        pub(crate) last_request: Mutex<Option<AnalysisRequest>>,
    }

    impl FakeBackend {
        pub(crate) fn new(reply: Reply) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
                last_request: Mutex::new(None),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl AnalysisBackend for FakeBackend {
        fn analyze(
            &self,
            request: &AnalysisRequest,
            cancel: &CancelToken,
        ) -> Result<AnalysisResponse, BackendError> {
            cancel.check()?;
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_request.lock().expect("lock") = Some(request.clone());
            match &self.reply {
                Reply::Body(body) => Ok(AnalysisResponse::from_json(body)?),
                Reply::Status(status) => Err(BackendError::Status { status: *status }),
                Reply::Timeout => Err(BackendError::Timeout),
                Reply::Cancelled => Err(BackendError::Cancelled),
            }
        }

        fn health(&self) -> Result<BackendHealth, BackendError> {
            match self.reply {
                Reply::Body(_) => Ok(BackendHealth {
                    status: "healthy".to_string(),
                    service: "fake".to_string(),
                    ai_enhanced: false,
                }),
                Reply::Status(status) => Err(BackendError::Status { status }),
                Reply::Timeout => Err(BackendError::Timeout),
                Reply::Cancelled => Err(BackendError::Cancelled),
            }
        }

        fn endpoint(&self) -> &str {
            "fake://backend"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::{FakeBackend, Reply};
    use super::*;
    use crate::domain::response::fixtures::FULL_RESPONSE;
    use crate::domain::Severity;

    fn service_with(reply: Reply) -> (AnalysisService<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(FakeBackend::new(reply));
        (AnalysisService::new(Arc::clone(&backend)), backend)
    }

    #[test]
    fn test_invalid_form_never_reaches_backend() {
        let (service, backend) = service_with(Reply::Body(FULL_RESPONSE));

        let err = service
            .analyze_form(&SymptomForm::default(), &CancelToken::new())
            .expect_err("empty symptom");
        assert!(matches!(err, AnalysisError::Invalid(ValidationError::MissingSymptom)));
        assert_eq!(err.user_message(), "Please enter a symptom to analyze");

        let form = SymptomForm {
            symptom: "cough".to_string(),
            age: "130".to_string(),
            ..Default::default()
        };
        assert!(service.analyze_form(&form, &CancelToken::new()).is_err());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_valid_form_is_sent_trimmed() {
        let (service, backend) = service_with(Reply::Body(FULL_RESPONSE));
        let form = SymptomForm {
            symptom: "  sore throat ".to_string(),
            severity: Some(Severity::Mild),
            ..Default::default()
        };

        let response = service
            .analyze_form(&form, &CancelToken::new())
            .expect("success");
        assert!(!response.symptom_analysis.is_empty());
        assert_eq!(backend.calls(), 1);

        let sent = backend.last_request.lock().expect("lock").clone().expect("sent");
        assert_eq!(sent.symptom, "sore throat");
        assert_eq!(sent.severity, Some(Severity::Mild));
    }

    #[test]
    fn test_backend_failures_use_generic_message() {
        for reply in [Reply::Status(500), Reply::Status(404), Reply::Timeout] {
            let (service, _) = service_with(reply);
            let err = service
                .analyze_form(&SymptomForm::sample(), &CancelToken::new())
                .expect_err("failure");
            assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
            assert!(!err.is_cancelled());
        }
    }

    #[test]
    fn test_malformed_body_is_a_failure() {
        let (service, _) = service_with(Reply::Body("[1, 2, 3]"));
        let err = service
            .analyze_form(&SymptomForm::sample(), &CancelToken::new())
            .expect_err("not an object");
        assert!(matches!(err, AnalysisError::Backend(BackendError::Malformed(_))));
    }

    #[test]
    fn test_cancelled_before_send() {
        let (service, backend) = service_with(Reply::Body(FULL_RESPONSE));
        let token = CancelToken::new();
        token.cancel();

        let err = service
            .analyze_form(&SymptomForm::sample(), &token)
            .expect_err("cancelled");
        assert!(err.is_cancelled());
        assert_eq!(backend.calls(), 0);
    }

    #[test]
    fn test_health_check() {
        let (healthy, _) = service_with(Reply::Body(FULL_RESPONSE));
        assert!(healthy.check_backend().expect("healthy").is_healthy());

        let (down, _) = service_with(Reply::Status(503));
        assert!(down.check_backend().is_err());
    }
}
