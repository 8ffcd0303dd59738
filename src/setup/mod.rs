//! Setup module for initial application configuration.
//!
//! Handles first-run setup by writing the default config file and asking
//! the user to confirm the scoring backend endpoint.

pub mod version;

pub use version::check_setup_needed;

use crate::config::DEFAULT_ENDPOINT;
use anyhow::anyhow;
use cliclack::{input, intro, outro};
use console::style;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/wymowa.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runs the setup process if the main config file is missing or outdated.
///
/// Creates the config directory, asks the user which scoring backend to
/// use, and writes the default config file stamped with the current
/// version as its first line.
///
/// # Errors
/// Returns an error if the prompt is cancelled or any file operation fails.
pub fn run_setup() -> anyhow::Result<()> {
    ctrlc::set_handler(move || {}).map_err(|e| anyhow!("setting Ctrl-C handler: {e}"))?;

    intro(style(" wymowa ").on_white().black())?;

    let endpoint: String = input("Adres backendu oceny wymowy:")
        .default_input(DEFAULT_ENDPOINT)
        .validate(|value: &String| {
            if value.starts_with("http://") || value.starts_with("https://") {
                Ok(())
            } else {
                Err("Podaj adres zaczynający się od http:// lub https://")
            }
        })
        .interact()
        .map_err(|e| anyhow!("Setup cancelled: {e}"))?;

    // Create config directory
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("wymowa");
    std::fs::create_dir_all(&config_dir)?;

    // Write main config file with version prefix. The template carries the
    // default endpoint; substitute the one the user chose.
    let config_body = DEFAULT_CONFIG.replace(DEFAULT_ENDPOINT, endpoint.trim_end_matches('/'));
    let config_path = config_dir.join("wymowa.toml");
    let version_line = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    std::fs::write(&config_path, format!("{}\n{}", version_line, config_body))?;

    outro("✅ Konfiguracja zapisana.")?;

    tracing::info!(
        "Setup completed: endpoint={}, config={}",
        endpoint,
        config_path.display()
    );

    Ok(())
}
