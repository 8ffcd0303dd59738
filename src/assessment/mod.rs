//! Pronunciation assessment workflow.
//!
//! Holds the session state machine driven by the practice form, the HTTP
//! client for the scoring backend, the response model, and the score
//! display rules.

pub mod api;
pub mod response;
pub mod score;
pub mod session;

pub use api::assess;
pub use response::AssessmentResponse;
pub use score::ScoreDisplay;
pub use session::{AudioSelection, SessionAction, SessionState};
