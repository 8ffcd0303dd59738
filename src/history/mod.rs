//! Assessment history feature for wymowa.
//!
//! Persists every successful assessment and provides an interactive
//! browser for past results.

pub mod storage;
pub mod ui;

pub use storage::{AssessmentEntry, HistoryManager};
pub use ui::HistoryViewer;
