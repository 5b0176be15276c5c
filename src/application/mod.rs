//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the application.

mod analysis;

pub use analysis::{AnalysisError, AnalysisService};

#[cfg(test)]
pub(crate) use analysis::fakes;
