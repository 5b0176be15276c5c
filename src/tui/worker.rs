//! Background workers for non-blocking backend calls.
//!
//! The analysis request can take tens of seconds while the backend runs its
//! model and web research, so it runs on its own thread and reports back over
//! a channel the TUI main loop drains without blocking.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::application::AnalysisService;
use crate::domain::{AnalysisResponse, Submission, Ticket};
use crate::ports::{AnalysisBackend, CancelToken};

/// Progress updates from the analysis worker.
#[derive(Debug, Clone)]
pub enum AnalysisProgress {
    /// Request handed to the transport
    Sending,
    /// Backend answered with a usable analysis
    Complete(Box<AnalysisResponse>),
    /// Any failure; carries the user-facing message
    Failed(String),
    /// Token was cancelled before the outcome could be applied
    Cancelled,
}

/// Handle to a running analysis worker.
pub struct AnalysisWorkerHandle {
    /// Submission this worker is serving
    pub ticket: Ticket,
    /// Receiver for progress updates
    pub progress_rx: Receiver<AnalysisProgress>,
    cancel: CancelToken,
    handle: JoinHandle<()>,
}

impl AnalysisWorkerHandle {
    /// Try to receive the next progress update (non-blocking).
    #[must_use]
    pub fn try_recv(&self) -> Option<AnalysisProgress> {
        self.progress_rx.try_recv().ok()
    }

    /// Whether the worker thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Ask the worker to abandon its request.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

/// Analysis worker that runs the backend call in background.
pub struct AnalysisWorker;

impl AnalysisWorker {
    /// Spawn a background analysis for `submission`.
    ///
    /// The worker never runs past `timeout`, whatever the client is
    /// configured with. Returns a handle to receive progress updates.
    pub fn spawn<B>(
        service: AnalysisService<B>,
        submission: Submission,
        timeout: Duration,
    ) -> AnalysisWorkerHandle
    where
        B: AnalysisBackend + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let cancel = CancelToken::with_timeout(timeout);
        let ticket = submission.ticket;

        let worker_cancel = cancel.clone();
        let handle = thread::spawn(move || {
            Self::run_with_progress(&service, submission, &worker_cancel, &tx);
        });

        AnalysisWorkerHandle {
            ticket,
            progress_rx: rx,
            cancel,
            handle,
        }
    }

    fn run_with_progress<B>(
        service: &AnalysisService<B>,
        submission: Submission,
        cancel: &CancelToken,
        tx: &Sender<AnalysisProgress>,
    ) where
        B: AnalysisBackend + 'static,
    {
        let _ = tx.send(AnalysisProgress::Sending);

        let update = match service.analyze(&submission.request, cancel) {
            Ok(_) if cancel.is_cancelled() => AnalysisProgress::Cancelled,
            Ok(response) => AnalysisProgress::Complete(Box::new(response)),
            Err(e) if e.is_cancelled() => AnalysisProgress::Cancelled,
            Err(e) => AnalysisProgress::Failed(e.user_message()),
        };

        // The receiver is gone once the UI has reset or quit.
        let _ = tx.send(update);
    }
}

/// What the header shows about the backend.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendStatus {
    #[default]
    Checking,
    Online {
        ai_enhanced: bool,
    },
    Degraded(String),
    Offline,
}

/// One-shot health probe running off the UI thread.
pub struct HealthProbe {
    rx: Receiver<BackendStatus>,
    _handle: JoinHandle<()>,
}

impl HealthProbe {
    pub fn spawn<B>(service: AnalysisService<B>) -> Self
    where
        B: AnalysisBackend + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let handle = thread::spawn(move || {
            let status = match service.check_backend() {
                Ok(health) if health.is_healthy() => BackendStatus::Online {
                    ai_enhanced: health.ai_enhanced,
                },
                Ok(health) => BackendStatus::Degraded(health.status),
                Err(_) => BackendStatus::Offline,
            };
            let _ = tx.send(status);
        });

        Self {
            rx,
            _handle: handle,
        }
    }

    #[must_use]
    pub fn try_recv(&self) -> Option<BackendStatus> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::fakes::{FakeBackend, Reply};
    use crate::domain::response::fixtures::FULL_RESPONSE;
    use crate::domain::Session;
    use std::sync::Arc;

    fn submission() -> Submission {
        let mut session = Session::new();
        session.form.symptom = "fatigue".to_string();
        session.submit().expect("valid")
    }

    fn drain(handle: &AnalysisWorkerHandle) -> AnalysisProgress {
        loop {
            match handle.progress_rx.recv_timeout(Duration::from_secs(5)) {
                Ok(AnalysisProgress::Sending) => continue,
                Ok(update) => return update,
                Err(e) => panic!("worker went silent: {e}"),
            }
        }
    }

    #[test]
    fn test_worker_reports_completion() {
        let service = AnalysisService::new(Arc::new(FakeBackend::new(Reply::Body(FULL_RESPONSE))));
        let handle = AnalysisWorker::spawn(service, submission(), Duration::from_secs(5));
        assert_eq!(handle.ticket, 1);
        assert!(matches!(drain(&handle), AnalysisProgress::Complete(_)));
    }

    #[test]
    fn test_worker_reports_generic_failure() {
        let service = AnalysisService::new(Arc::new(FakeBackend::new(Reply::Status(502))));
        let handle = AnalysisWorker::spawn(service, submission(), Duration::from_secs(5));
        match drain(&handle) {
            AnalysisProgress::Failed(message) => {
                assert_eq!(message, crate::domain::GENERIC_FAILURE_MESSAGE);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_health_probe_statuses() {
        let probe = HealthProbe::spawn(AnalysisService::new(Arc::new(FakeBackend::new(
            Reply::Body(FULL_RESPONSE),
        ))));
        let status = probe.rx.recv_timeout(Duration::from_secs(5)).expect("status");
        assert_eq!(status, BackendStatus::Online { ai_enhanced: false });

        let probe = HealthProbe::spawn(AnalysisService::new(Arc::new(FakeBackend::new(
            Reply::Timeout,
        ))));
        let status = probe.rx.recv_timeout(Duration::from_secs(5)).expect("status");
        assert_eq!(status, BackendStatus::Offline);
    }
}
