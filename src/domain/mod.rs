//! Domain layer: request/response contract and the session state machine.
//!
//! This module contains plain Rust types with no I/O. The transport and the
//! terminal UI only ever talk to the backend through these types.

pub mod request;
pub mod response;
pub mod session;

pub use request::{
    AnalysisRequest, Choice, DurationBucket, Gender, Severity, SymptomForm, ValidatedInput,
    ValidationError,
};
pub use response::{
    AiInsight, AnalysisResponse, DietPlan, MalformedResponse, PossibleCause, RiskAssessment,
    SearchTimestamp, Urgency,
};
pub use session::{
    Phase, ResultTab, Session, Submission, SubmitRejected, Ticket, ViewState,
    GENERIC_FAILURE_MESSAGE,
};
