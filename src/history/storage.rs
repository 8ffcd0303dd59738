//! Assessment history storage and retrieval using SQLite.
//!
//! Manages persistent storage of all assessments with timestamps,
//! and provides querying capabilities for the history viewer.

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

use crate::assessment::score::coerce_percent;
use crate::assessment::AssessmentResponse;

/// A single assessment entry in the history.
#[derive(Debug, Clone)]
pub struct AssessmentEntry {
    /// Unique identifier for this assessment
    pub id: i64,
    /// The sentence the user was asked to read
    pub target_text: String,
    /// What the speech model heard
    pub recognized_text: String,
    /// Raw word-level score in percent
    pub lexical_pct: f64,
    /// Raw accent score in percent
    pub accent_pct: f64,
    /// Raw combined score in percent
    pub total_pct: f64,
    /// Feedback sentence from the backend
    pub feedback: String,
    /// When this assessment was created
    pub created_at: DateTime<Local>,
}

/// Manages the assessment history database.
pub struct HistoryManager {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl HistoryManager {
    /// Creates a new history manager for the given data directory.
    ///
    /// # Arguments
    /// * `data_dir` - Directory where the database file will be stored
    ///
    /// # Errors
    /// - If the data directory cannot be created
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let database_path = data_dir.join("assessment_history.db");

        Ok(Self {
            database_path,
            connection: None,
        })
    }

    /// Initializes database connection and creates tables if necessary.
    ///
    /// # Errors
    /// - If the database file cannot be opened
    /// - If table creation fails
    fn get_connection(&mut self) -> Result<&Connection> {
        if self.connection.is_none() {
            let connection = Connection::open(&self.database_path)?;

            connection.execute(
                "CREATE TABLE IF NOT EXISTS assessments (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    target_text TEXT NOT NULL,
                    recognized_text TEXT NOT NULL,
                    lexical_pct REAL NOT NULL,
                    accent_pct REAL NOT NULL,
                    total_pct REAL NOT NULL,
                    feedback TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )",
                [],
            )?;

            self.connection = Some(connection);
        }

        Ok(self.connection.as_ref().unwrap())
    }

    /// Saves a new assessment to the history database.
    ///
    /// Raw percentage scores are stored; display rules are applied by the
    /// viewer, so a change to the display transform never rewrites history.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If insertion fails
    pub fn save_assessment(&mut self, response: &AssessmentResponse) -> Result<()> {
        let connection = self.get_connection()?;
        let now = Local::now();
        let timestamp = now.to_rfc3339();

        connection.execute(
            "INSERT INTO assessments
                (target_text, recognized_text, lexical_pct, accent_pct, total_pct, feedback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                response.target_text,
                response.recognized_text,
                coerce_percent(response.lexical_score_percent),
                coerce_percent(response.accent_score_percent),
                coerce_percent(response.score_percent),
                response.feedback,
                timestamp
            ],
        )?;

        tracing::debug!("Assessment saved to history");
        Ok(())
    }

    /// Retrieves the most recent assessments, newest first.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If query execution fails
    pub fn recent(&mut self, limit: usize) -> Result<Vec<AssessmentEntry>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT id, target_text, recognized_text, lexical_pct, accent_pct, total_pct,
                    feedback, created_at
             FROM assessments
             ORDER BY id DESC
             LIMIT ?1",
        )?;

        let rows = statement.query_map(params![limit as i64], |row| {
            let created_at_str: String = row.get(7)?;
            let created_at = DateTime::parse_from_rfc3339(&created_at_str)
                .map(|dt| dt.with_timezone(&Local))
                .unwrap_or_else(|_| Local::now());

            Ok(AssessmentEntry {
                id: row.get(0)?,
                target_text: row.get(1)?,
                recognized_text: row.get(2)?,
                lexical_pct: row.get(3)?,
                accent_pct: row.get(4)?,
                total_pct: row.get(5)?,
                feedback: row.get(6)?,
                created_at,
            })
        })?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_response() -> AssessmentResponse {
        AssessmentResponse {
            target_text: "A filing case is now hard to buy.".to_string(),
            recognized_text: "a filing case is now hard to buy".to_string(),
            detected_language: Some("en".to_string()),
            lexical_score_percent: Some(72.0),
            accent_score_percent: Some(85.0),
            score_percent: Some(91.0),
            feedback: "Good job".to_string(),
            ..AssessmentResponse::default()
        }
    }

    #[test]
    fn test_save_and_recent_roundtrip() {
        let data_dir = std::env::temp_dir().join(format!(
            "wymowa-history-test-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&data_dir);

        let mut manager = HistoryManager::new(&data_dir).unwrap();
        manager.save_assessment(&test_response()).unwrap();

        let mut second = test_response();
        second.target_text = "This is a sample English sentence.".to_string();
        manager.save_assessment(&second).unwrap();

        let entries = manager.recent(10).unwrap();
        assert_eq!(entries.len(), 2);
        // Newest first
        assert_eq!(entries[0].target_text, "This is a sample English sentence.");
        assert_eq!(entries[1].target_text, "A filing case is now hard to buy.");
        assert_eq!(entries[1].lexical_pct, 72.0);
        assert_eq!(entries[1].accent_pct, 85.0);
        assert_eq!(entries[1].total_pct, 91.0);

        let _ = std::fs::remove_dir_all(&data_dir);
    }

    #[test]
    fn test_missing_scores_store_as_zero() {
        let data_dir = std::env::temp_dir().join(format!(
            "wymowa-history-zero-test-{}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&data_dir);

        let mut manager = HistoryManager::new(&data_dir).unwrap();
        let response = AssessmentResponse {
            recognized_text: "bonjour".to_string(),
            feedback: "Speech was not recognized as English.".to_string(),
            ..AssessmentResponse::default()
        };
        manager.save_assessment(&response).unwrap();

        let entries = manager.recent(1).unwrap();
        assert_eq!(entries[0].lexical_pct, 0.0);
        assert_eq!(entries[0].total_pct, 0.0);

        let _ = std::fs::remove_dir_all(&data_dir);
    }
}
