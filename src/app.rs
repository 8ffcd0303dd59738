//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use dirs;
use std::io;
use std::path::PathBuf;
use std::process;

/// Checks if setup is needed (version mismatch or missing config) and runs setup if required.
///
/// This is called early in the startup sequence, before command handling.
/// It checks:
/// 1. If config file doesn't exist, runs full setup
/// 2. If config version is older than app version, runs setup and logs migration
/// 3. If config version matches app version, does nothing
async fn check_and_run_setup() -> Result<(), anyhow::Error> {
    let config_path = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("wymowa")
        .join("wymowa.toml");

    match crate::setup::check_setup_needed(&config_path)? {
        Some(old_version) => {
            tracing::info!(
                "Setup needed - migrating from version {} to {}",
                old_version,
                env!("CARGO_PKG_VERSION")
            );
            crate::setup::run_setup().map_err(|e| {
                tracing::error!("Setup failed: {e}");
                anyhow!("Setup failed: {e}")
            })?;
            tracing::info!(
                "Setup completed successfully - migrated to version {}",
                env!("CARGO_PKG_VERSION")
            );
        }
        None => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// A terminal English pronunciation trainer: read a sentence aloud, get word and accent scores
#[derive(Parser)]
#[command(name = "wymowa")]
#[command(version)]
#[command(about = "Ocena wymowy po angielsku 🎙")]
#[command(
    long_about = "wymowa - terminal English pronunciation trainer.\n\nType a target sentence, record yourself reading it (or pick an audio\nfile), and submit it to the local scoring backend to see word, accent\nand overall scores.\n\nDEFAULT COMMAND:\n    If no command is specified, 'practice' is used by default.\n    The practice option (-f) can be used without explicitly saying 'practice'.\n\nEXAMPLES:\n    # Open the interactive practice form\n    $ wymowa\n\n    # Practice with a pre-selected audio file\n    $ wymowa -f nagranie.wav\n\n    # Score an existing recording against a sentence, no UI\n    $ wymowa submit nagranie.wav -s \"A filing case is now hard to buy.\"\n\n    # Same, but dump the raw backend response\n    $ wymowa submit nagranie.wav --json\n\n    # Browse previous assessments\n    $ wymowa history"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/wymowa/wymowa.toml\n    Logs:               ~/.local/state/wymowa/wymowa.log.*\n\nThe scoring backend must be running and reachable at the endpoint\nconfigured in wymowa.toml (default: http://127.0.0.1:8000)."
)]
struct Cli {
    /// Pre-select an audio file instead of recording (practice default command)
    #[arg(short, long, value_name = "FILE", global = true)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive pronunciation practice form (default)
    ///
    /// Type the target sentence, press Ctrl+R to start/stop recording,
    /// Enter to submit for scoring, Ctrl+L to reset, Escape to quit.
    #[command(visible_alias = "p")]
    Practice {
        /// Pre-select an audio file instead of recording
        #[arg(short, long, value_name = "FILE")]
        file: Option<PathBuf>,
    },

    /// Score a pre-recorded audio file without the interactive form
    ///
    /// Submits the audio file and the target sentence to the scoring
    /// backend and prints the assessed scores to stdout.
    ///
    /// Examples:
    ///   wymowa submit nagranie.wav
    ///   wymowa submit nagranie.wav -s "This is a sample English sentence."
    ///   wymowa submit nagranie.wav --json | jq .score_percent
    #[command(visible_alias = "s")]
    Submit {
        /// Path to the audio file to score
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Target sentence the recording is expected to contain
        #[arg(short, long, value_name = "TEXT")]
        sentence: Option<String>,

        /// Print the raw backend JSON response instead of a report
        #[arg(long)]
        json: bool,
    },

    /// View and browse assessment history
    ///
    /// Browse previous assessments with their scores. Use arrow keys to
    /// navigate, Enter to view details, Esc to exit.
    #[command(visible_alias = "h")]
    History,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio settings and the scoring endpoint. Uses $EDITOR
    /// environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in wymowa.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    ///
    /// Examples:
    ///   wymowa completions bash > wymowa.bash
    ///   wymowa completions zsh > _wymowa
    ///   wymowa completions fish > wymowa.fish
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Exit Codes
/// - 0: Success
/// - 1: General error
/// - 2: Usage error (invalid arguments)
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails (e.g., recording, submission, history viewing)
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging or config setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "wymowa", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    // Check if setup is needed (version check or missing config)
    check_and_run_setup().await?;

    // Route to appropriate command handler
    match cli.command {
        None | Some(Commands::Practice { .. }) => {
            // Default command is practice
            // Merge the top-level file option with the explicit practice command option
            // If both are specified, the explicit practice command option takes precedence
            let file = match cli.command {
                Some(Commands::Practice { file }) => file,
                None => cli.file,
                _ => unreachable!(),
            };
            commands::handle_practice(file).await?;
        }
        Some(Commands::Submit {
            file,
            sentence,
            json,
        }) => {
            commands::handle_submit(file, sentence, json).await?;
        }
        Some(Commands::History) => {
            commands::handle_history().await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Completions { .. }) | Some(Commands::ListDevices) | Some(Commands::Logs) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
