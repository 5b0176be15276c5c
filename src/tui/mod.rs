//! TUI module: Terminal User Interface using Ratatui.
//!
//! Two screens:
//! - Symptom form (basic or enhanced)
//! - Analysis results in tabs, with red flags and the disclaimer always shown

mod app;
mod styles;
mod ui;
mod worker;

pub use app::App;
pub use styles::MedicalTheme;
pub use worker::{AnalysisProgress, AnalysisWorker, AnalysisWorkerHandle, BackendStatus};
