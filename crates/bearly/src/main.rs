use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use bearly_core::{PlaceholderSensors, SessionController};
use bearly_logging::{init_tracing, LogEvent, LogFormat, Logger};
use bearly_store::{default_data_dir, JsonLogStore, JsonSessionStore, StorageError};

mod commands;
mod config;

use commands::{handle_command, Command, CommandContext};
use config::{Config, CONFIG_FILE_NAME};

#[derive(Parser, Debug)]
#[command(
    name = "bearly",
    about = "Bear-ly Awake: your comfort companion for better sleep",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the sleep log and session state
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to the config file (default: <data dir>/bearly.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log output format
    #[arg(long, value_enum, global = true)]
    log_format: Option<LogFormatChoice>,

    /// Show debug diagnostics
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormatChoice {
    Pretty,
    Json,
    Compact,
}

impl From<LogFormatChoice> for LogFormat {
    fn from(choice: LogFormatChoice) -> Self {
        match choice {
            LogFormatChoice::Pretty => LogFormat::Pretty,
            LogFormatChoice::Json => LogFormat::Json,
            LogFormatChoice::Compact => LogFormat::Compact,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config lives next to the data unless pointed elsewhere
    let config_path = match (&cli.config, &cli.data_dir) {
        (Some(path), _) => path.clone(),
        (None, Some(dir)) => dir.join(CONFIG_FILE_NAME),
        (None, None) => default_data_dir()?.join(CONFIG_FILE_NAME),
    };
    let config = Config::load(&config_path)?.unwrap_or_default();

    let data_dir = match cli.data_dir.clone().or_else(|| config.data_dir.clone()) {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    let log_format: LogFormat = cli
        .log_format
        .map(LogFormat::from)
        .or(config.log_format)
        .unwrap_or_default();
    init_tracing(if cli.verbose { "debug" } else { "warn" }, log_format);

    let logger = match config.activity_log {
        Some(ref path) => Logger::with_file(log_format, path)
            .with_context(|| format!("Failed to open activity log {}", path.display()))?,
        None => Logger::new(log_format),
    };
    let logger = Arc::new(logger);

    let sessions = JsonSessionStore::in_dir(&data_dir);
    let logs = JsonLogStore::in_dir(&data_dir);
    let sensors = PlaceholderSensors;

    let recovery_logger = logger.clone();
    let controller = SessionController::new(&sessions, &logs, &sensors).with_recovery_callback(
        Arc::new(move |store: &str, error: &StorageError| {
            recovery_logger.log(&LogEvent::StorageRecovered {
                store: store.to_string(),
                error: error.to_string(),
            });
        }),
    );

    let coach = config.build_coach()?;

    let ctx = CommandContext {
        controller: &controller,
        coach: coach.as_ref(),
        logger: &logger,
        seed: config.seed,
    };

    let exit_code = handle_command(cli.command, &ctx).await?;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
