//! HTTP client for the pronunciation scoring backend.
//!
//! Sends one multipart POST per submission and maps transport and status
//! failures to the single user-visible message the form shows. No retry,
//! timeout, or cancellation logic: one attempt per user action.

use std::path::Path;

use crate::config::ApiConfig;

use super::response::AssessmentResponse;

/// Route on the scoring backend that grades a recording against a sentence.
const ASSESS_PATH: &str = "/assess_pronunciation";

/// Submits an audio file and target sentence for assessment.
///
/// Builds a multipart form with the audio under `file` and the sentence
/// under `target_text`, POSTs it to the configured backend, and parses the
/// JSON result.
///
/// # Errors
/// - If the audio file cannot be read from disk
/// - If the request fails due to network issues (connection, timeout)
/// - If the backend returns a non-2xx status
/// - If the response body cannot be parsed
pub async fn assess(
    api: &ApiConfig,
    audio_path: &Path,
    target_text: &str,
) -> anyhow::Result<AssessmentResponse> {
    let audio_data = std::fs::read(audio_path)
        .map_err(|e| anyhow::anyhow!("Nie udało się odczytać pliku audio: {e}"))?;

    let client = reqwest::Client::new();

    let file_name = audio_path
        .file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let file_part = reqwest::multipart::Part::bytes(audio_data)
        .file_name(file_name.clone())
        .mime_str(mime_for_extension(audio_path))
        .map_err(|e| anyhow::anyhow!("Failed to create file part for upload: {e}"))?;

    let form = reqwest::multipart::Form::new()
        .part("file", file_part)
        .text("target_text", target_text.to_string());

    let url = format!("{}{}", api.endpoint.trim_end_matches('/'), ASSESS_PATH);

    tracing::debug!(
        "Assessment API call:\n  URL: {}\n  Method: POST\n  Content-Type: multipart/form-data\n  Body parameters: file={} ({} chars sentence)",
        url,
        file_name,
        target_text.len()
    );

    let response = match client.post(&url).multipart(form).send().await {
        Ok(resp) => resp,
        Err(e) => {
            let error_msg = if e.is_connect() {
                format!(
                    "Nie można połączyć się z serwerem oceny wymowy ({}). Czy backend działa?",
                    api.endpoint
                )
            } else if e.is_timeout() {
                "Serwer oceny wymowy nie odpowiada.".to_string()
            } else {
                format!("Błąd sieci: {e}")
            };
            return Err(anyhow::anyhow!(error_msg));
        }
    };

    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        tracing::error!(
            "Assessment request failed: status={}, body={}",
            status,
            error_body
        );

        return Err(anyhow::anyhow!("Błąd API: {}", status.as_u16()));
    }

    let assessment: AssessmentResponse = response
        .json()
        .await
        .map_err(|e| anyhow::anyhow!("Nie udało się odczytać odpowiedzi serwera: {e}"))?;

    tracing::debug!(
        "Assessment API response:\n  Status: Success\n  Recognized: {:?}\n  Scores: lexical={:?} accent={:?} total={:?}",
        assessment.recognized_text,
        assessment.lexical_score_percent,
        assessment.accent_score_percent,
        assessment.score_percent
    );

    Ok(assessment)
}

/// Picks a mime type from the audio file extension.
///
/// The backend sniffs the container itself; this only has to be plausible
/// for the multipart part header.
fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") | Some("oga") => "audio/ogg",
        Some("webm") => "audio/webm",
        Some("m4a") | Some("mp4") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension(&PathBuf::from("a.wav")), "audio/wav");
        assert_eq!(mime_for_extension(&PathBuf::from("a.WAV")), "audio/wav");
        assert_eq!(mime_for_extension(&PathBuf::from("a.webm")), "audio/webm");
        assert_eq!(
            mime_for_extension(&PathBuf::from("a")),
            "application/octet-stream"
        );
    }
}
