//! Score display rules.
//!
//! Converts the backend's raw percentage scores into the values the UI
//! shows. One product rule applies: a raw percentage of 80 or above is
//! displayed as 100, values below are rounded to the nearest integer.
//! The rule applies to the accent and overall scores but NOT to the
//! lexical (word-level) score, which is shown rounded without the
//! threshold. Bars additionally clamp their rendered width to [0, 100].

use super::response::AssessmentResponse;

/// Label shown next to the lexical (word-level) score.
pub const LABEL_LEXICAL: &str = "Słowa";
/// Label shown next to the accent score.
pub const LABEL_ACCENT: &str = "Akcent";
/// Label shown next to the overall score.
pub const LABEL_TOTAL: &str = "Łącznie";

/// Coerces an optional raw score into a finite number, treating
/// missing and non-finite values as zero.
pub fn coerce_percent(value: Option<f64>) -> f64 {
    value.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Applies the >=80 -> 100 display rule to a raw percentage.
///
/// Values below the threshold round to the nearest integer; non-finite
/// input displays as zero.
pub fn humanize(raw: f64) -> i64 {
    if !raw.is_finite() {
        return 0;
    }
    if raw >= 80.0 {
        return 100;
    }
    raw.round() as i64
}

/// Clamps a displayed score to the [0, 100] range and converts it to the
/// ratio a gauge widget expects.
pub fn bar_ratio(displayed: i64) -> f64 {
    displayed.clamp(0, 100) as f64 / 100.0
}

/// The three scores as the UI displays them.
///
/// `lexical` deliberately bypasses [`humanize`]: the word-level score is
/// shown rounded but never promoted to 100. This asymmetry is product
/// behavior and tests pin it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreDisplay {
    pub lexical: i64,
    pub accent: i64,
    pub total: i64,
}

impl ScoreDisplay {
    /// Derives display scores from a backend response.
    pub fn from_response(response: &AssessmentResponse) -> Self {
        let lexical_raw = coerce_percent(response.lexical_score_percent);
        let accent_raw = coerce_percent(response.accent_score_percent);
        let total_raw = coerce_percent(response.score_percent);

        Self {
            lexical: lexical_raw.round() as i64,
            accent: humanize(accent_raw),
            total: humanize(total_raw),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_with_scores(
        lexical: Option<f64>,
        accent: Option<f64>,
        total: Option<f64>,
    ) -> AssessmentResponse {
        AssessmentResponse {
            lexical_score_percent: lexical,
            accent_score_percent: accent,
            score_percent: total,
            ..AssessmentResponse::default()
        }
    }

    #[test]
    fn test_humanize_threshold() {
        assert_eq!(humanize(80.0), 100);
        assert_eq!(humanize(99.9), 100);
        assert_eq!(humanize(79.9), 80);
        assert_eq!(humanize(79.4), 79);
        assert_eq!(humanize(0.0), 0);
        assert_eq!(humanize(f64::NAN), 0);
    }

    #[test]
    fn test_coerce_percent_treats_missing_as_zero() {
        assert_eq!(coerce_percent(None), 0.0);
        assert_eq!(coerce_percent(Some(f64::NAN)), 0.0);
        assert_eq!(coerce_percent(Some(f64::INFINITY)), 0.0);
        assert_eq!(coerce_percent(Some(42.5)), 42.5);
    }

    #[test]
    fn test_lexical_bypasses_humanize() {
        // 85 is above the threshold but the word-level score must stay raw.
        let display = ScoreDisplay::from_response(&response_with_scores(
            Some(85.0),
            Some(85.0),
            Some(85.0),
        ));
        assert_eq!(display.lexical, 85);
        assert_eq!(display.accent, 100);
        assert_eq!(display.total, 100);
    }

    #[test]
    fn test_spec_example_72_85_91() {
        let display = ScoreDisplay::from_response(&response_with_scores(
            Some(72.0),
            Some(85.0),
            Some(91.0),
        ));
        assert_eq!(display.lexical, 72);
        assert_eq!(display.accent, 100);
        assert_eq!(display.total, 100);
    }

    #[test]
    fn test_accent_just_below_threshold_rounds() {
        let display =
            ScoreDisplay::from_response(&response_with_scores(None, Some(79.6), None));
        assert_eq!(display.accent, 80);
        assert_eq!(display.total, 0);
    }

    #[test]
    fn test_missing_scores_display_as_zero() {
        let display = ScoreDisplay::from_response(&response_with_scores(None, None, None));
        assert_eq!(
            display,
            ScoreDisplay {
                lexical: 0,
                accent: 0,
                total: 0
            }
        );
    }

    #[test]
    fn test_bar_ratio_clamps() {
        assert_eq!(bar_ratio(-5), 0.0);
        assert_eq!(bar_ratio(0), 0.0);
        assert_eq!(bar_ratio(50), 0.5);
        assert_eq!(bar_ratio(100), 1.0);
        assert_eq!(bar_ratio(140), 1.0);
    }
}
