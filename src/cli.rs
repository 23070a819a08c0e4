use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use crate::commands;
use crate::config::AppConfig;
use crate::core_state::DeskState;
use crate::db::{DatabaseError, KeyValueSlot, SqliteSlot};
use crate::orders::OrderStore;
use crate::pipeline::structuring::{ExtractionError, GeminiClient, LlmOrderExtractor, OrderExtractor};
use crate::terminal::{self, Shell};

#[derive(Debug, Parser)]
#[command(
    name = "order-desk",
    version,
    about = "Turn customer chats into reviewed orders"
)]
pub struct Cli {
    /// Directory holding the order database
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,
    /// Extraction model name
    #[arg(long, global = true, value_name = "NAME")]
    model: Option<String>,
    /// Debug logging for this application
    #[arg(short, long, global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive order desk (default)
    Shell,
    /// List saved orders, most recent first
    List,
    /// Find orders by customer name or phone
    Search { query: String },
    /// Delete a saved order
    Delete { id: String },
    /// Order count and revenue
    Stats,
    /// Extract a draft from chat text and print it as JSON (nothing is saved)
    Extract(ExtractArgs),
}

#[derive(Debug, Args)]
#[group(required = true, multiple = false)]
struct ExtractArgs {
    /// Chat text
    #[arg(long)]
    text: Option<String>,
    /// File containing the chat text
    #[arg(long, value_name = "FILE")]
    file: Option<PathBuf>,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Command(String),
}

impl Cli {
    pub fn run(self) -> ExitCode {
        match self.execute() {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                tracing::error!(error = %e, "Command failed");
                eprintln!("error: {e}");
                ExitCode::FAILURE
            }
        }
    }

    fn execute(self) -> Result<(), CliError> {
        let mut config = AppConfig::from_env();
        if let Some(dir) = self.data_dir {
            config.data_dir = dir;
        }
        if let Some(model) = self.model {
            config.model = model;
        }
        tracing::debug!(?config, "Configuration resolved");

        let mut stdout = io::stdout().lock();
        match self.command.unwrap_or(Command::Shell) {
            Command::Extract(args) => {
                let text = match (args.text, args.file) {
                    (Some(text), _) => text,
                    (None, Some(path)) => std::fs::read_to_string(path)?,
                    (None, None) => String::new(),
                };
                extract_only(&config, &text, &mut stdout)
            }
            Command::Shell => {
                let mut state = build_desk(&config)?;
                let stdin = io::stdin().lock();
                Shell::new(stdin, stdout).run(&mut state)?;
                Ok(())
            }
            Command::List => {
                let state = build_desk(&config)?;
                let orders = commands::orders::list_orders(&state);
                write!(stdout, "{}", terminal::render_orders(&orders))?;
                Ok(())
            }
            Command::Search { query } => {
                let state = build_desk(&config)?;
                let orders = commands::orders::search_orders(&state, &query);
                write!(stdout, "{}", terminal::render_orders(&orders))?;
                Ok(())
            }
            Command::Delete { id } => {
                let mut state = build_desk(&config)?;
                if commands::orders::delete_order(&mut state, &id).map_err(CliError::Command)? {
                    writeln!(stdout, "Order deleted.")?;
                } else {
                    writeln!(stdout, "No order with id {id}.")?;
                }
                Ok(())
            }
            Command::Stats => {
                let state = build_desk(&config)?;
                let stats = commands::orders::order_stats(&state);
                writeln!(stdout, "{}", terminal::render_stats(&stats))?;
                Ok(())
            }
        }
    }
}

fn build_extractor(config: &AppConfig) -> Result<LlmOrderExtractor, CliError> {
    let client = GeminiClient::new(&config.endpoint, config.api_key.clone(), config.timeout_secs)?;
    Ok(LlmOrderExtractor::new(Box::new(client), &config.model))
}

/// Open the history slot. A database that cannot be opened degrades to an
/// in-memory slot so the desk still starts; nothing will be kept.
fn open_slot(config: &AppConfig) -> Result<Box<dyn KeyValueSlot>, DatabaseError> {
    let path = config.database_path();
    match SqliteSlot::open(&path) {
        Ok(slot) => Ok(Box::new(slot)),
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "Cannot open order database");
            eprintln!("warning: order history cannot be saved this session ({e})");
            Ok(Box::new(SqliteSlot::open_in_memory()?))
        }
    }
}

fn build_desk(config: &AppConfig) -> Result<DeskState, CliError> {
    let slot = open_slot(config).map_err(|e| CliError::Command(e.to_string()))?;
    let store = OrderStore::load(slot);
    let extractor = build_extractor(config)?;
    Ok(DeskState::new(store, Arc::new(extractor)))
}

/// Extract and print the draft as JSON. Never touches the order history.
fn extract_only(config: &AppConfig, text: &str, out: &mut impl Write) -> Result<(), CliError> {
    let extractor = build_extractor(config)?;
    let draft = extractor.extract(text).map_err(|e| {
        if e.is_input_error() {
            CliError::Command(crate::core_state::EMPTY_INPUT_MESSAGE.to_string())
        } else {
            tracing::warn!(error = %e, "Extraction failed");
            CliError::Command(crate::core_state::EXTRACTION_FAILED_MESSAGE.to_string())
        }
    })?;
    writeln!(out, "{}", serde_json::to_string_pretty(&draft)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn no_subcommand_means_shell() {
        let cli = Cli::try_parse_from(["order-desk"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["order-desk", "search", "017", "-v", "--data-dir", "/tmp/x"])
            .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/x")));
        assert!(matches!(cli.command, Some(Command::Search { ref query }) if query == "017"));
    }

    #[test]
    fn extract_requires_exactly_one_source() {
        assert!(Cli::try_parse_from(["order-desk", "extract"]).is_err());
        assert!(Cli::try_parse_from(["order-desk", "extract", "--text", "a", "--file", "b"]).is_err());
        assert!(Cli::try_parse_from(["order-desk", "extract", "--text", "Rahim"]).is_ok());
    }

    #[test]
    fn extract_only_rejects_empty_text_without_network() {
        let config = AppConfig::from_lookup(|_| None);
        let mut out = Vec::new();
        let err = extract_only(&config, "  ", &mut out).unwrap_err();
        assert_eq!(err.to_string(), "Please paste the chat text first.");
        assert!(out.is_empty());
    }

    #[test]
    fn extract_only_without_key_reports_failure() {
        let config = AppConfig::from_lookup(|_| None);
        let mut out = Vec::new();
        let err = extract_only(&config, "Rahim, Dhanmondi", &mut out).unwrap_err();
        assert_eq!(err.to_string(), "AI failed to extract details. Please try again.");
    }

    #[test]
    fn bad_timeout_still_builds_desk() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().to_string_lossy().into_owned();
        let config = AppConfig::from_lookup(|var| match var {
            "ORDER_DESK_TIMEOUT_SECS" => Some("soon".to_string()),
            "ORDER_DESK_DATA_DIR" => Some(data_dir.clone()),
            _ => None,
        });
        let state = build_desk(&config).unwrap();
        assert!(state.store().is_empty());
    }

    #[test]
    fn build_desk_uses_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::from_lookup(|_| None);
        config.data_dir = dir.path().to_path_buf();
        let state = build_desk(&config).unwrap();
        assert!(state.store().is_empty());
        assert!(config.database_path().exists());
    }
}
