//! Response model for the pronunciation scoring backend.
//!
//! Fields map 1:1 from the response JSON with no transformation; display
//! rules live in [`super::score`]. Score fields are optional so an
//! incomplete response coerces to zero downstream instead of failing the
//! whole submission.

use serde::{Deserialize, Serialize};

/// Assessment result as returned by `POST /assess_pronunciation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentResponse {
    /// The sentence the user was asked to read
    #[serde(default)]
    pub target_text: String,
    /// What the speech model heard in the audio
    #[serde(default)]
    pub recognized_text: String,
    /// Language detected in the recording, if the backend reports one
    #[serde(default)]
    pub detected_language: Option<String>,
    /// Word-level match score in percent (WER-based)
    #[serde(default)]
    pub lexical_score_percent: Option<f64>,
    /// Accent/clarity score in percent
    #[serde(default)]
    pub accent_score_percent: Option<f64>,
    /// Combined score in percent
    #[serde(default)]
    pub score_percent: Option<f64>,
    /// Human-readable feedback sentence
    #[serde(default)]
    pub feedback: String,
    /// Normalized tokens of the target sentence used for the comparison
    #[serde(default)]
    pub ref_words: Vec<String>,
    /// Normalized tokens of the recognized text used for the comparison
    #[serde(default)]
    pub hyp_words: Vec<String>,
}

impl AssessmentResponse {
    /// Detected language with the product's placeholder for unknown.
    pub fn detected_language_or_unknown(&self) -> &str {
        self.detected_language.as_deref().unwrap_or("nieznany")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_response_maps_one_to_one() {
        let json = r#"{
            "target_text": "A filing case is now hard to buy.",
            "recognized_text": "a filing case is now hard to buy",
            "detected_language": "en",
            "lexical_score_percent": 72,
            "accent_score_percent": 85,
            "score_percent": 91,
            "feedback": "Good job",
            "ref_words": ["a", "filing"],
            "hyp_words": ["a", "filing"]
        }"#;

        let response: AssessmentResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.target_text, "A filing case is now hard to buy.");
        assert_eq!(response.recognized_text, "a filing case is now hard to buy");
        assert_eq!(response.detected_language.as_deref(), Some("en"));
        assert_eq!(response.lexical_score_percent, Some(72.0));
        assert_eq!(response.accent_score_percent, Some(85.0));
        assert_eq!(response.score_percent, Some(91.0));
        assert_eq!(response.feedback, "Good job");
        assert_eq!(response.ref_words.len(), 2);
    }

    #[test]
    fn test_minimal_response_deserializes() {
        // The backend short-circuits with a reduced payload when speech is
        // not recognized as English; absent fields must not fail parsing.
        let response: AssessmentResponse =
            serde_json::from_str(r#"{"recognized_text": "bonjour"}"#).unwrap();
        assert_eq!(response.recognized_text, "bonjour");
        assert!(response.detected_language.is_none());
        assert!(response.lexical_score_percent.is_none());
        assert_eq!(response.detected_language_or_unknown(), "nieznany");
    }

    #[test]
    fn test_null_scores_deserialize_as_none() {
        let response: AssessmentResponse =
            serde_json::from_str(r#"{"score_percent": null}"#).unwrap();
        assert!(response.score_percent.is_none());
    }
}
