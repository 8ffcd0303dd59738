//! Interactive pronunciation practice.
//!
//! Runs the form-driven workflow: edit the target sentence, record from the
//! microphone or point at an audio file, submit to the scoring backend, and
//! show the returned scores. Supports external submit triggers via SIGUSR1.

use crate::assessment::session::{
    AudioSelection, SessionAction, SessionState, INITIAL_SENTENCE, MSG_FILE_NOT_FOUND,
    MSG_GENERIC_FAILURE, MSG_MIC_FAILED, RESET_SENTENCE,
};
use crate::assessment::{self, AssessmentResponse};
use crate::config;
use crate::history::HistoryManager;
use crate::recording::AudioRecorder;
use crate::ui::{ErrorScreen, FormCommand, PracticeTui};
use std::path::{Path, PathBuf};

/// Handles the interactive practice form.
///
/// Owns the session state, the recorder, and the in-flight submission task;
/// the TUI dispatches commands and every state change goes through the
/// session reducer.
pub async fn handle_practice(preselected: Option<PathBuf>) -> Result<(), anyhow::Error> {
    tracing::info!("=== wymowa Practice Form Started ===");

    let config_data = match config::WymowaConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            let error_message = format!(
                "Configuration Error:\n\n{err}\n\nPlease check your ~/.config/wymowa/wymowa.toml file and try again."
            );
            let mut error_screen = ErrorScreen::new()?;
            error_screen.show_error(&error_message)?;
            error_screen.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, endpoint={}",
        config_data.audio.device,
        config_data.audio.sample_rate,
        config_data.api.endpoint
    );

    // A pre-selected file behaves like the file picker; reject a bad path
    // before entering the alternate screen.
    let preselection = match preselected {
        Some(path) => Some(resolve_selection(&path).map_err(|_| {
            anyhow::anyhow!("Audio file not found: {}", path.display())
        })?),
        None => None,
    };

    let mut state = SessionState::new();
    let mut tui = PracticeTui::new(INITIAL_SENTENCE, config_data.audio.sample_rate)
        .map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;

    // Whether the current selection came from the file field (as opposed to
    // a finished recording); clearing the field only clears such selections.
    let mut file_sourced = false;
    // Last file field contents acted upon; the field only replaces the
    // selection when its text changed, so a finished recording is not
    // overridden by stale text at the next submit.
    let mut last_file_text = String::new();

    if let Some(selection) = preselection {
        tui.set_file_path(&selection.path.to_string_lossy());
        last_file_text = tui.file_path().trim().to_string();
        state.apply(SessionAction::FileSelected(Some(selection)));
        file_sourced = true;
    }

    let submit_signal = std::sync::Arc::new(std::sync::atomic::AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, submit_signal.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut recorder: Option<AudioRecorder> = None;
    let mut submission: Option<tokio::task::JoinHandle<anyhow::Result<AssessmentResponse>>> = None;

    tracing::debug!(
        "Entering practice loop. Ctrl+R records, Enter submits, Ctrl+L resets, Escape quits."
    );

    loop {
        // Keep the reducer's sentence in sync with the input field
        if state.sentence != tui.sentence() {
            state.apply(SessionAction::SentenceChanged(tui.sentence().to_string()));
        }

        // Feed the level meter while a recording session is live
        if let Some(rec) = &recorder {
            if rec.is_active() {
                tui.push_level(&rec.samples());
            }
        }

        // Collect the submission outcome once the task settles
        if submission.as_ref().is_some_and(|h| h.is_finished()) {
            let handle = submission.take().unwrap();
            match handle.await {
                Ok(Ok(response)) => {
                    save_to_history(&response);
                    state.apply(SessionAction::SubmitSucceeded(response));
                }
                Ok(Err(e)) => {
                    tracing::warn!("Submission failed: {e}");
                    state.apply(SessionAction::SubmitFailed(e.to_string()));
                }
                Err(e) => {
                    tracing::error!("Submission task failed: {e}");
                    state.apply(SessionAction::SubmitFailed(MSG_GENERIC_FAILURE.to_string()));
                }
            }
        }

        let mut command = tui
            .handle_input()
            .map_err(|e| anyhow::anyhow!("Input handling error: {e}"))?;

        if submit_signal.swap(false, std::sync::atomic::Ordering::Relaxed) {
            tracing::info!("Received SIGUSR1: submitting via external trigger");
            command = FormCommand::Submit;
        }

        match command {
            FormCommand::Continue => {}
            FormCommand::ToggleRecording => {
                // Both buttons are disabled while a submission is in flight
                if state.is_submitting {
                    continue;
                }

                if state.is_recording {
                    if let Some(mut rec) = recorder.take() {
                        let output = recording_output_path();
                        match rec.finalize(output) {
                            Ok(selection) => {
                                file_sourced = false;
                                state.apply(SessionAction::RecordingFinished(selection));
                            }
                            Err(e) => {
                                tracing::error!("Failed to save recording: {e}");
                                state.apply(SessionAction::RecordingFailed(format!(
                                    "Nie udało się zapisać nagrania: {e}"
                                )));
                            }
                        }
                    }
                    tui.clear_levels();
                } else {
                    let mut rec = AudioRecorder::new(
                        config_data.audio.sample_rate,
                        config_data.audio.device.clone(),
                    );
                    match rec.start() {
                        Ok(()) => {
                            tui.set_sample_rate(rec.sample_rate());
                            recorder = Some(rec);
                            state.apply(SessionAction::RecordingStarted);
                        }
                        Err(e) => {
                            tracing::error!("Failed to start recording: {e}");
                            state.apply(SessionAction::RecordingFailed(
                                MSG_MIC_FAILED.to_string(),
                            ));
                        }
                    }
                }
            }
            FormCommand::Submit => {
                // Guarded while recording or while a submission is in flight
                if state.is_submitting || state.is_recording {
                    continue;
                }

                state.apply(SessionAction::SubmitRequested);

                // Resolve the file field when its text changed: a typed path
                // replaces the current selection; an emptied field clears a
                // file-sourced one.
                let file_text = tui.file_path().trim().to_string();
                if file_text != last_file_text {
                    last_file_text = file_text.clone();
                    if !file_text.is_empty() {
                        match resolve_selection(Path::new(&file_text)) {
                            Ok(selection) => {
                                file_sourced = true;
                                state.apply(SessionAction::FileSelected(Some(selection)));
                            }
                            Err(_) => {
                                state.apply(SessionAction::SubmitRejected(MSG_FILE_NOT_FOUND));
                                continue;
                            }
                        }
                    } else if file_sourced {
                        file_sourced = false;
                        state.apply(SessionAction::FileSelected(None));
                    }
                }

                match state.validate_submission() {
                    Err(message) => {
                        state.apply(SessionAction::SubmitRejected(message));
                    }
                    Ok(()) => {
                        // Validation guarantees a selection is present
                        if let Some(selection) = state.audio.clone() {
                            state.apply(SessionAction::SubmitStarted);

                            let api = config_data.api.clone();
                            let audio_path = selection.path;
                            let sentence = state.sentence.clone();

                            tracing::debug!(
                                "Submitting {} against sentence {:?}",
                                audio_path.display(),
                                sentence
                            );

                            submission = Some(tokio::spawn(async move {
                                assessment::assess(&api, &audio_path, &sentence).await
                            }));
                        }
                    }
                }
            }
            FormCommand::Reset => {
                // Reset releases a live microphone session without keeping
                // the capture
                if let Some(mut rec) = recorder.take() {
                    rec.abort();
                }
                file_sourced = false;
                last_file_text.clear();
                state.apply(SessionAction::Reset);
                tui.set_sentence(RESET_SENTENCE);
                tui.clear_file();
                tui.clear_levels();
            }
            FormCommand::Quit => {
                if let Some(mut rec) = recorder.take() {
                    rec.abort();
                }
                if let Some(handle) = submission.take() {
                    handle.abort();
                }
                break;
            }
        }

        tui.render(&state)
            .map_err(|e| anyhow::anyhow!("Render failed: {e}"))?;
    }

    tui.cleanup()
        .map_err(|e| anyhow::anyhow!("Cleanup failed: {e}"))?;

    tracing::info!("=== wymowa Practice Form Exited Successfully ===");
    Ok(())
}

/// Where a finalized recording lands before submission.
fn recording_output_path() -> PathBuf {
    std::env::temp_dir().join("wymowa-recording.wav")
}

/// Turns a user-supplied path into an audio selection.
///
/// Only existence is checked; format and duration validation is the
/// scoring backend's job.
fn resolve_selection(path: &Path) -> anyhow::Result<AudioSelection> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_file() {
        return Err(anyhow::anyhow!("Not a file: {}", path.display()));
    }
    Ok(AudioSelection::new(path.to_path_buf(), metadata.len()))
}

/// Appends a successful assessment to history; failures only log.
fn save_to_history(response: &AssessmentResponse) {
    let data_dir = match dirs::home_dir() {
        Some(home) => home.join(".local").join("share").join("wymowa"),
        None => {
            tracing::warn!("Could not determine home directory; skipping history save");
            return;
        }
    };

    match HistoryManager::new(&data_dir) {
        Ok(mut manager) => {
            if let Err(e) = manager.save_assessment(response) {
                tracing::warn!("Failed to save assessment to history: {e}");
            }
        }
        Err(e) => {
            tracing::warn!("Failed to open history store: {e}");
        }
    }
}
