//! Session state machine.
//!
//! Owns the form, the submission lifecycle (`idle → submitting → success |
//! error`) and the active result tab. Every transition is a plain method on
//! `Session`; nothing here touches the network or the terminal.
//!
//! Each accepted submission gets a fresh ticket. Outcomes are applied only
//! if they carry the ticket currently in flight, so a response that arrives
//! after a reset (or after a newer submission) is dropped.

use super::request::{AnalysisRequest, SymptomForm, ValidationError};
use super::response::AnalysisResponse;

/// Message shown for every network, status or parse failure.
pub const GENERIC_FAILURE_MESSAGE: &str = "Unable to analyze symptom. Please try again later.";

/// Result section currently displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultTab {
    #[default]
    Analysis,
    Diet,
    Causes,
    Insights,
}

impl ResultTab {
    pub const ALL: [Self; 4] = [Self::Analysis, Self::Diet, Self::Causes, Self::Insights];

    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Analysis => "AI Analysis",
            Self::Diet => "Diet Plan",
            Self::Causes => "Possible Causes",
            Self::Insights => "AI Insights",
        }
    }

    #[must_use]
    pub fn index(&self) -> usize {
        match self {
            Self::Analysis => 0,
            Self::Diet => 1,
            Self::Causes => 2,
            Self::Insights => 3,
        }
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    #[must_use]
    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    #[must_use]
    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Identifies one submission.
pub type Ticket = u64;

/// Coarse view state, for callers that do not need the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Idle,
    Submitting,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Phase {
    #[default]
    Idle,
    Submitting {
        ticket: Ticket,
    },
    Success {
        response: Box<AnalysisResponse>,
        tab: ResultTab,
    },
    Error {
        message: String,
    },
}

/// An accepted submission, ready to hand to the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub ticket: Ticket,
    pub request: AnalysisRequest,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitRejected {
    #[error("An analysis is already in progress")]
    Busy,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

#[derive(Debug, Default)]
pub struct Session {
    /// Raw form input, edited directly by the UI.
    pub form: SymptomForm,
    phase: Phase,
    validation_error: Option<ValidationError>,
    last_ticket: Ticket,
}

impl Session {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        match self.phase {
            Phase::Idle => ViewState::Idle,
            Phase::Submitting { .. } => ViewState::Submitting,
            Phase::Success { .. } => ViewState::Success,
            Phase::Error { .. } => ViewState::Error,
        }
    }

    /// Whether a request is in flight. Submissions are refused while true.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        matches!(self.phase, Phase::Submitting { .. })
    }

    #[must_use]
    pub fn in_flight(&self) -> Option<Ticket> {
        match self.phase {
            Phase::Submitting { ticket } => Some(ticket),
            _ => None,
        }
    }

    #[must_use]
    pub fn validation_error(&self) -> Option<&ValidationError> {
        self.validation_error.as_ref()
    }

    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match &self.phase {
            Phase::Error { message } => Some(message),
            _ => None,
        }
    }

    #[must_use]
    pub fn response(&self) -> Option<&AnalysisResponse> {
        match &self.phase {
            Phase::Success { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Active tab; `Analysis` whenever no result is shown.
    #[must_use]
    pub fn active_tab(&self) -> ResultTab {
        match self.phase {
            Phase::Success { tab, .. } => tab,
            _ => ResultTab::default(),
        }
    }

    /// Validate the form and, if valid, move to `submitting`.
    ///
    /// Any stored response or error is dropped when the submission is
    /// accepted.
    ///
    /// # Errors
    /// `Busy` while another submission is in flight; `Invalid` when the form
    /// fails validation (the error is also kept for inline display).
    pub fn submit(&mut self) -> Result<Submission, SubmitRejected> {
        if self.is_busy() {
            return Err(SubmitRejected::Busy);
        }

        let request = match self.form.build_request() {
            Ok(request) => request,
            Err(e) => {
                self.validation_error = Some(e.clone());
                return Err(e.into());
            }
        };

        self.validation_error = None;
        self.last_ticket += 1;
        self.phase = Phase::Submitting {
            ticket: self.last_ticket,
        };

        Ok(Submission {
            ticket: self.last_ticket,
            request,
        })
    }

    /// Apply a successful response. Returns `false` for stale tickets.
    pub fn succeed(&mut self, ticket: Ticket, response: AnalysisResponse) -> bool {
        if self.in_flight() != Some(ticket) {
            return false;
        }
        self.phase = Phase::Success {
            response: Box::new(response),
            tab: ResultTab::Analysis,
        };
        true
    }

    /// Apply a failure. Returns `false` for stale tickets.
    ///
    /// The stored message is always [`GENERIC_FAILURE_MESSAGE`]; failure
    /// details belong in the logs, not on screen.
    pub fn fail(&mut self, ticket: Ticket) -> bool {
        if self.in_flight() != Some(ticket) {
            return false;
        }
        self.phase = Phase::Error {
            message: GENERIC_FAILURE_MESSAGE.to_string(),
        };
        true
    }

    /// Apply whichever outcome the transport produced.
    pub fn complete<E>(&mut self, ticket: Ticket, outcome: Result<AnalysisResponse, E>) -> bool {
        match outcome {
            Ok(response) => self.succeed(ticket, response),
            Err(_) => self.fail(ticket),
        }
    }

    /// Switch result tab. No-op (returns `false`) unless a result is shown.
    pub fn select_tab(&mut self, target: ResultTab) -> bool {
        match &mut self.phase {
            Phase::Success { tab, .. } => {
                *tab = target;
                true
            }
            _ => false,
        }
    }

    pub fn next_tab(&mut self) -> bool {
        let next = self.active_tab().next();
        self.select_tab(next)
    }

    pub fn prev_tab(&mut self) -> bool {
        let prev = self.active_tab().prev();
        self.select_tab(prev)
    }

    pub fn clear_validation_error(&mut self) {
        self.validation_error = None;
    }

    /// Return to `idle` from any state, wiping inputs, result and errors.
    ///
    /// Returns the ticket that was in flight, if any; its outcome will be
    /// ignored from now on.
    pub fn reset(&mut self) -> Option<Ticket> {
        let abandoned = self.in_flight();
        self.form.clear();
        self.phase = Phase::Idle;
        self.validation_error = None;
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::response::fixtures::{FULL_RESPONSE, MINIMAL_RESPONSE};

    fn response(body: &str) -> AnalysisResponse {
        AnalysisResponse::from_json(body).expect("fixture parses")
    }

    fn session_with(symptom: &str) -> Session {
        let mut s = Session::new();
        s.form.symptom = symptom.to_string();
        s
    }

    #[test]
    fn test_blank_symptom_never_submits() {
        let mut s = session_with("   ");
        assert_eq!(
            s.submit(),
            Err(SubmitRejected::Invalid(ValidationError::MissingSymptom))
        );
        assert_eq!(s.view_state(), ViewState::Idle);
        assert_eq!(s.validation_error(), Some(&ValidationError::MissingSymptom));
        assert!(s.in_flight().is_none());
    }

    #[test]
    fn test_success_resets_tab_and_allows_all_tabs() {
        let mut s = session_with("headache");
        let sub = s.submit().expect("valid");
        assert!(s.is_busy());

        assert!(s.succeed(sub.ticket, response(FULL_RESPONSE)));
        assert_eq!(s.view_state(), ViewState::Success);
        assert_eq!(s.active_tab(), ResultTab::Analysis);

        let before = s.response().cloned();
        for tab in ResultTab::ALL {
            assert!(s.select_tab(tab));
            assert_eq!(s.active_tab(), tab);
        }
        assert_eq!(s.response().cloned(), before);
    }

    #[test]
    fn test_failure_uses_generic_message() {
        let mut s = session_with("headache");
        let sub = s.submit().expect("valid");
        assert!(s.complete::<&str>(sub.ticket, Err("HTTP 503: upstream exploded")));
        assert_eq!(s.view_state(), ViewState::Error);
        assert_eq!(s.error_message(), Some(GENERIC_FAILURE_MESSAGE));
    }

    #[test]
    fn test_resubmit_from_success_and_error() {
        let mut s = session_with("cough");
        let first = s.submit().expect("valid");
        s.fail(first.ticket);

        let second = s.submit().expect("can resubmit after error");
        assert_ne!(first.ticket, second.ticket);
        assert!(s.error_message().is_none());

        s.succeed(second.ticket, response(MINIMAL_RESPONSE));
        s.select_tab(ResultTab::Diet);

        let third = s.submit().expect("can resubmit after success");
        assert!(s.response().is_none());
        assert!(s.succeed(third.ticket, response(MINIMAL_RESPONSE)));
        assert_eq!(s.active_tab(), ResultTab::Analysis);
    }

    #[test]
    fn test_second_submit_while_busy_is_rejected() {
        let mut s = session_with("fever");
        let sub = s.submit().expect("valid");
        assert_eq!(s.submit(), Err(SubmitRejected::Busy));
        assert_eq!(s.in_flight(), Some(sub.ticket));
    }

    #[test]
    fn test_stale_outcomes_are_ignored() {
        let mut s = session_with("fever");
        let sub = s.submit().expect("valid");
        assert_eq!(s.reset(), Some(sub.ticket));

        assert!(!s.succeed(sub.ticket, response(FULL_RESPONSE)));
        assert!(!s.fail(sub.ticket));
        assert_eq!(s.view_state(), ViewState::Idle);
    }

    #[test]
    fn test_reset_from_every_state() {
        let states: [fn(&mut Session); 4] = [
            |_| {},
            |s| {
                s.submit().expect("valid");
            },
            |s| {
                let t = s.submit().expect("valid").ticket;
                s.succeed(t, response(FULL_RESPONSE));
                s.select_tab(ResultTab::Insights);
            },
            |s| {
                let t = s.submit().expect("valid").ticket;
                s.fail(t);
            },
        ];

        for drive in states {
            let mut s = Session::new();
            s.form = crate::domain::SymptomForm::sample();
            drive(&mut s);
            s.reset();

            assert_eq!(s.view_state(), ViewState::Idle);
            assert_eq!(s.form, crate::domain::SymptomForm::default());
            assert!(s.response().is_none());
            assert!(s.error_message().is_none());
            assert!(s.validation_error().is_none());
            assert_eq!(s.active_tab(), ResultTab::Analysis);
        }
    }

    #[test]
    fn test_tabs_inert_without_result() {
        let mut s = Session::new();
        assert!(!s.select_tab(ResultTab::Causes));
        assert!(!s.next_tab());
        assert_eq!(s.active_tab(), ResultTab::Analysis);
    }

    #[test]
    fn test_tab_cycling() {
        assert_eq!(ResultTab::Analysis.next(), ResultTab::Diet);
        assert_eq!(ResultTab::Insights.next(), ResultTab::Analysis);
        assert_eq!(ResultTab::Analysis.prev(), ResultTab::Insights);
        assert_eq!(ResultTab::from_index(2), Some(ResultTab::Causes));
        assert_eq!(ResultTab::from_index(4), None);
    }
}
