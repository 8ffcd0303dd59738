//! Practice session state.
//!
//! The form's complete mutable snapshot lives in [`SessionState`] and is
//! mutated only by [`SessionState::apply`] consuming discrete actions, so
//! every transition is an explicit, testable function. The UI layer owns
//! the event loop and dispatches actions; it never pokes fields directly.

use super::response::AssessmentResponse;
use std::path::PathBuf;

/// Sentence the form shows when the practice screen opens.
pub const INITIAL_SENTENCE: &str = "This is a sample English sentence.";

/// Sentence installed by the reset action. Intentionally different from
/// [`INITIAL_SENTENCE`]; do not unify without confirming product intent.
pub const RESET_SENTENCE: &str = "A filing case is now hard to buy.";

/// Validation message when no audio payload is selected.
pub const MSG_NO_AUDIO: &str = "Nagraj lub wybierz plik audio.";
/// Validation message when the sentence is blank.
pub const MSG_EMPTY_SENTENCE: &str = "Wpisz zdanie.";
/// Validation message when the typed file path does not point at a file.
pub const MSG_FILE_NOT_FOUND: &str = "Nie znaleziono pliku audio.";
/// Shown when microphone acquisition fails.
pub const MSG_MIC_FAILED: &str = "Nie udało się uzyskać mikrofonu.";
/// Info line while a recording session is live.
pub const MSG_RECORDING: &str = "Nagrywam... Ctrl+R kończy nagranie.";
/// Info line after a successful submission.
pub const MSG_DONE: &str = "Gotowe! Wyniki poniżej 👇";
/// Fallback when a failure produces no message of its own.
pub const MSG_GENERIC_FAILURE: &str = "Coś poszło nie tak.";

/// The currently selected audio payload: a finished recording or a file
/// the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSelection {
    /// Location of the audio on disk
    pub path: PathBuf,
    /// Display name (file name)
    pub name: String,
    /// Size in bytes
    pub size_bytes: u64,
}

impl AudioSelection {
    pub fn new(path: PathBuf, size_bytes: u64) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());
        Self {
            path,
            name,
            size_bytes,
        }
    }

    /// Size formatted the way the result info line shows it.
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// Discrete state transitions of the practice form.
#[derive(Debug, Clone)]
pub enum SessionAction {
    /// Microphone acquired, chunks are accumulating
    RecordingStarted,
    /// Microphone acquisition or finalization failed
    RecordingFailed(String),
    /// Recording finalized into a playable file
    RecordingFinished(AudioSelection),
    /// User picked (or cleared) an audio file, replacing any recording
    FileSelected(Option<AudioSelection>),
    /// Target sentence edited
    SentenceChanged(String),
    /// Submit requested; clears previous outcome before validation
    SubmitRequested,
    /// Local validation rejected the submission
    SubmitRejected(&'static str),
    /// Request is on the wire
    SubmitStarted,
    /// Backend returned a parsed result
    SubmitSucceeded(AssessmentResponse),
    /// Transport, status, or parse failure
    SubmitFailed(String),
    /// Restore the form to its reset state
    Reset,
}

/// The form's complete mutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Currently selected audio payload
    pub audio: Option<AudioSelection>,
    /// Target sentence the user is expected to pronounce
    pub sentence: String,
    /// A recording session is live
    pub is_recording: bool,
    /// A submission is in flight
    pub is_submitting: bool,
    /// User-visible error, if any
    pub error: Option<String>,
    /// User-visible informational status, if any
    pub info: Option<String>,
    /// Last assessment result, if any
    pub result: Option<AssessmentResponse>,
}

impl SessionState {
    /// Fresh state as shown when the practice screen opens.
    pub fn new() -> Self {
        Self {
            sentence: INITIAL_SENTENCE.to_string(),
            ..Self::default()
        }
    }

    /// Checks submission preconditions without touching state.
    ///
    /// An audio payload must be present and the sentence must be non-empty
    /// after trimming. Violations map to the user-visible messages.
    pub fn validate_submission(&self) -> Result<(), &'static str> {
        if self.audio.is_none() {
            return Err(MSG_NO_AUDIO);
        }
        if self.sentence.trim().is_empty() {
            return Err(MSG_EMPTY_SENTENCE);
        }
        Ok(())
    }

    /// Applies one action to the state.
    pub fn apply(&mut self, action: SessionAction) {
        match action {
            SessionAction::RecordingStarted => {
                self.error = None;
                self.result = None;
                self.is_recording = true;
                self.info = Some(MSG_RECORDING.to_string());
            }
            SessionAction::RecordingFailed(message) => {
                self.error = Some(message);
                self.info = None;
                self.is_recording = false;
            }
            SessionAction::RecordingFinished(selection) => {
                // Stop without a live session is a no-op
                if !self.is_recording {
                    return;
                }
                self.is_recording = false;
                self.info = Some(format!("Nagrano audio ({:.1} kB)", selection.size_kb()));
                self.audio = Some(selection);
            }
            SessionAction::FileSelected(selection) => {
                self.info = selection
                    .as_ref()
                    .map(|s| format!("Wybrano plik: {}", s.name));
                self.audio = selection;
            }
            SessionAction::SentenceChanged(sentence) => {
                self.sentence = sentence;
            }
            SessionAction::SubmitRequested => {
                // Guarded by the in-flight flags, not an error
                if self.is_submitting || self.is_recording {
                    return;
                }
                self.error = None;
                self.result = None;
            }
            SessionAction::SubmitRejected(message) => {
                self.error = Some(message.to_string());
            }
            SessionAction::SubmitStarted => {
                self.is_submitting = true;
            }
            SessionAction::SubmitSucceeded(response) => {
                self.result = Some(response);
                self.error = None;
                self.info = Some(MSG_DONE.to_string());
                self.is_submitting = false;
            }
            SessionAction::SubmitFailed(message) => {
                self.result = None;
                self.info = None;
                self.error = Some(if message.is_empty() {
                    MSG_GENERIC_FAILURE.to_string()
                } else {
                    message
                });
                self.is_submitting = false;
            }
            SessionAction::Reset => {
                // An in-flight submission keeps its flag; its outcome still
                // applies when the task completes.
                self.audio = None;
                self.sentence = RESET_SENTENCE.to_string();
                self.is_recording = false;
                self.error = None;
                self.info = None;
                self.result = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn selection() -> AudioSelection {
        AudioSelection::new(PathBuf::from("/tmp/nagranie.wav"), 2048)
    }

    fn response() -> AssessmentResponse {
        AssessmentResponse {
            target_text: "abc".to_string(),
            recognized_text: "abc".to_string(),
            score_percent: Some(91.0),
            ..AssessmentResponse::default()
        }
    }

    #[test]
    fn test_initial_state_uses_load_default() {
        let state = SessionState::new();
        assert_eq!(state.sentence, INITIAL_SENTENCE);
        assert!(state.audio.is_none());
        assert!(!state.is_recording);
        assert!(!state.is_submitting);
        assert!(state.error.is_none());
        assert!(state.result.is_none());
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut state = SessionState::new();
        let before = state.clone();
        state.apply(SessionAction::RecordingFinished(selection()));
        assert_eq!(state.audio, before.audio);
        assert_eq!(state.info, before.info);
        assert!(!state.is_recording);
    }

    #[test]
    fn test_recording_roundtrip() {
        let mut state = SessionState::new();
        state.apply(SessionAction::RecordingStarted);
        assert!(state.is_recording);
        assert_eq!(state.info.as_deref(), Some(MSG_RECORDING));

        state.apply(SessionAction::RecordingFinished(selection()));
        assert!(!state.is_recording);
        assert_eq!(state.audio, Some(selection()));
        assert_eq!(state.info.as_deref(), Some("Nagrano audio (2.0 kB)"));
    }

    #[test]
    fn test_recording_start_clears_previous_outcome() {
        let mut state = SessionState::new();
        state.apply(SessionAction::SubmitSucceeded(response()));
        state.apply(SessionAction::SubmitFailed("Błąd API: 500".to_string()));
        state.apply(SessionAction::RecordingStarted);
        assert!(state.error.is_none());
        assert!(state.result.is_none());
    }

    #[test]
    fn test_recording_failure_leaves_flag_down() {
        let mut state = SessionState::new();
        state.apply(SessionAction::RecordingFailed(MSG_MIC_FAILED.to_string()));
        assert!(!state.is_recording);
        assert_eq!(state.error.as_deref(), Some(MSG_MIC_FAILED));
        assert!(state.info.is_none());
    }

    #[test]
    fn test_validation_requires_audio() {
        let state = SessionState::new();
        assert_eq!(state.validate_submission(), Err(MSG_NO_AUDIO));
    }

    #[test]
    fn test_validation_requires_nonblank_sentence() {
        let mut state = SessionState::new();
        state.apply(SessionAction::FileSelected(Some(selection())));
        state.apply(SessionAction::SentenceChanged("   \t ".to_string()));
        assert_eq!(state.validate_submission(), Err(MSG_EMPTY_SENTENCE));

        state.apply(SessionAction::SentenceChanged("Hello.".to_string()));
        assert!(state.validate_submission().is_ok());
    }

    #[test]
    fn test_file_selection_replaces_recording() {
        let mut state = SessionState::new();
        state.apply(SessionAction::RecordingStarted);
        state.apply(SessionAction::RecordingFinished(selection()));

        let picked = AudioSelection::new(PathBuf::from("/tmp/inne.ogg"), 100);
        state.apply(SessionAction::FileSelected(Some(picked.clone())));
        assert_eq!(state.audio, Some(picked));
        assert_eq!(state.info.as_deref(), Some("Wybrano plik: inne.ogg"));

        state.apply(SessionAction::FileSelected(None));
        assert!(state.audio.is_none());
        assert!(state.info.is_none());
    }

    #[test]
    fn test_submit_success_stores_result() {
        let mut state = SessionState::new();
        state.apply(SessionAction::FileSelected(Some(selection())));
        state.apply(SessionAction::SubmitRequested);
        state.apply(SessionAction::SubmitStarted);
        assert!(state.is_submitting);

        state.apply(SessionAction::SubmitSucceeded(response()));
        assert!(!state.is_submitting);
        assert!(state.error.is_none());
        assert_eq!(state.info.as_deref(), Some(MSG_DONE));
        assert_eq!(state.result.as_ref().unwrap().score_percent, Some(91.0));
    }

    #[test]
    fn test_submit_failure_clears_result_keeps_inputs() {
        let mut state = SessionState::new();
        state.apply(SessionAction::FileSelected(Some(selection())));
        state.apply(SessionAction::SentenceChanged("Hello world.".to_string()));
        state.apply(SessionAction::SubmitSucceeded(response()));

        state.apply(SessionAction::SubmitRequested);
        state.apply(SessionAction::SubmitStarted);
        state.apply(SessionAction::SubmitFailed("Błąd API: 502".to_string()));

        assert!(!state.is_submitting);
        assert!(state.result.is_none());
        assert!(state.info.is_none());
        assert_eq!(state.error.as_deref(), Some("Błąd API: 502"));
        // The entered sentence and selection stay untouched
        assert_eq!(state.sentence, "Hello world.");
        assert_eq!(state.audio, Some(selection()));
    }

    #[test]
    fn test_submit_failure_empty_message_falls_back() {
        let mut state = SessionState::new();
        state.apply(SessionAction::SubmitFailed(String::new()));
        assert_eq!(state.error.as_deref(), Some(MSG_GENERIC_FAILURE));
    }

    #[test]
    fn test_submit_requested_guarded_while_in_flight() {
        let mut state = SessionState::new();
        state.apply(SessionAction::SubmitSucceeded(response()));
        state.apply(SessionAction::SubmitStarted);
        state.apply(SessionAction::SubmitSucceeded(response()));
        state.apply(SessionAction::SubmitStarted);

        // While submitting, a new request must not clear the shown result
        state.apply(SessionAction::SubmitRequested);
        assert!(state.result.is_some());
    }

    #[test]
    fn test_reset_installs_reset_default() {
        let mut state = SessionState::new();
        state.apply(SessionAction::FileSelected(Some(selection())));
        state.apply(SessionAction::SentenceChanged("Custom sentence".to_string()));
        state.apply(SessionAction::SubmitSucceeded(response()));
        state.apply(SessionAction::RecordingStarted);

        state.apply(SessionAction::Reset);
        assert_eq!(state.sentence, RESET_SENTENCE);
        assert_ne!(state.sentence, INITIAL_SENTENCE);
        assert!(state.audio.is_none());
        assert!(!state.is_recording);
        assert!(state.error.is_none());
        assert!(state.info.is_none());
        assert!(state.result.is_none());
    }
}
