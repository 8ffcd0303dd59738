//! Assessment history viewing.
//!
//! Loads past assessments from the SQLite store and presents them in the
//! interactive history viewer.

use crate::history::{HistoryManager, HistoryViewer};

/// Maximum number of entries loaded into the viewer.
const HISTORY_LIMIT: usize = 200;

/// Handles assessment history viewing.
pub async fn handle_history() -> Result<(), anyhow::Error> {
    tracing::info!("=== wymowa History Viewer ===");

    let data_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("wymowa");

    let mut history_manager = HistoryManager::new(&data_dir)?;
    let entries = history_manager.recent(HISTORY_LIMIT)?;

    tracing::debug!("Loaded {} history entries", entries.len());

    let mut viewer = HistoryViewer::new(entries)?;
    viewer.run()?;

    Ok(())
}
