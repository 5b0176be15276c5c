//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundary
//! between the application and the remote analysis service.

mod analysis_backend;
mod cancel;

pub use analysis_backend::{AnalysisBackend, BackendError, BackendHealth};
pub use cancel::CancelToken;
