//! Score a pre-recorded audio file without the interactive form.
//!
//! Accepts an audio file path and a target sentence, submits both to the
//! scoring backend through the same client as the practice form, and
//! prints the assessed scores to stdout.

use crate::assessment::score::{ScoreDisplay, LABEL_ACCENT, LABEL_LEXICAL, LABEL_TOTAL};
use crate::assessment::session::{INITIAL_SENTENCE, MSG_EMPTY_SENTENCE};
use crate::assessment::{self, AssessmentResponse};
use crate::config;
use crate::history::HistoryManager;
use console::style;
use std::path::PathBuf;

/// Handles one-shot submission of an existing audio file.
///
/// # Arguments
/// * `file` - Path to the audio file to score
/// * `sentence` - Target sentence; defaults to the form's opening sentence
/// * `json` - If true, print the raw backend JSON response instead of a report
pub async fn handle_submit(
    file: PathBuf,
    sentence: Option<String>,
    json: bool,
) -> Result<(), anyhow::Error> {
    tracing::info!("=== wymowa Submit Command ===");

    // Validate the input file exists
    if !file.exists() {
        return Err(anyhow::anyhow!("Audio file not found: {}", file.display()));
    }

    let sentence = sentence.unwrap_or_else(|| INITIAL_SENTENCE.to_string());
    if sentence.trim().is_empty() {
        return Err(anyhow::anyhow!("{MSG_EMPTY_SENTENCE}"));
    }

    tracing::info!(
        "Submitting file: {} against sentence {:?}",
        file.display(),
        sentence
    );

    // Load configuration
    let config_data = match config::WymowaConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err}");
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    let response = assessment::assess(&config_data.api, &file, &sentence)
        .await
        .map_err(|e| {
            tracing::error!("Assessment failed: {e}");
            anyhow::anyhow!("{e}")
        })?;

    // Save to history
    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("wymowa");
    match HistoryManager::new(&data_dir) {
        Ok(mut history_manager) => {
            if let Err(e) = history_manager.save_assessment(&response) {
                tracing::warn!("Failed to save assessment to history: {e}");
            }
        }
        Err(e) => {
            tracing::warn!("Failed to open history store: {e}");
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
    } else {
        print_report(&response);
    }

    Ok(())
}

/// Prints the human-readable assessment report.
fn print_report(response: &AssessmentResponse) {
    let display = ScoreDisplay::from_response(response);

    println!();
    println!(
        "{} {}",
        style("Zdanie docelowe:").dim(),
        response.target_text
    );
    println!(
        "{} {}",
        style("Rozpoznany tekst:").dim(),
        response.recognized_text
    );
    println!(
        "{} {}",
        style("Język rozpoznany:").dim(),
        response.detected_language_or_unknown()
    );
    println!();
    println!("{}", score_line(LABEL_LEXICAL, display.lexical));
    println!("{}", score_line(LABEL_ACCENT, display.accent));
    println!("{}", score_line(LABEL_TOTAL, display.total));
    println!();
    println!("{} {}", style("Feedback:").dim(), response.feedback);
}

/// One labeled score line with a bar clamped to [0, 100].
fn score_line(label: &str, displayed: i64) -> String {
    const BAR_WIDTH: usize = 25;
    let filled = (displayed.clamp(0, 100) as usize * BAR_WIDTH) / 100;
    let bar: String = "█".repeat(filled) + &"░".repeat(BAR_WIDTH - filled);
    format!("{label:<8} {bar} {displayed:>3}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_line_clamps_bar() {
        let line = score_line(LABEL_TOTAL, 140);
        assert!(line.contains("140%"));
        assert!(!line.contains('░'));

        let line = score_line(LABEL_TOTAL, -10);
        assert!(!line.contains('█'));
    }
}
