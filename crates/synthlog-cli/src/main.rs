//! synthlog - inspect and edit chunked session logs
//!
//! Usage:
//! ```bash
//! # List sessions in the default store (~/.synthlog/store.json)
//! synthlog sessions
//!
//! # Newest ten records of a session
//! synthlog --store logs.json page 8f3c --page-size 10
//!
//! # Export a session as JSON lines
//! synthlog export 8f3c --format jsonl --output 8f3c.jsonl
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use synthlog_cli::{CliConfig, ExportFormat, commands};
use synthlog_session::ChunkedLog;
use synthlog_storage::FileStore;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "synthlog")]
#[command(about = "Inspect and edit chunked session logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Store file holding every session; overrides SYNTHLOG_STORE
    #[arg(short, long, value_name = "FILE", global = true)]
    store: Option<String>,

    /// Path to configuration file (JSON, YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "SYNTHLOG_CONFIG",
        global = true
    )]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// List every session in the store
    Sessions,
    /// Print the number of records in a session
    Count { session: String },
    /// Print one page of a session, newest record first
    Page {
        session: String,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u64,

        #[arg(long, default_value = "50")]
        page_size: u64,
    },
    /// Export a whole session, oldest record first
    Export {
        session: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    /// Append a JSON record to a session
    Append {
        session: String,
        record: String,

        /// Assign a UUID v4 id when the record has none
        #[arg(long)]
        generate_id: bool,
    },
    /// Replace the record with the same id; exits 1 if none matched
    Update { session: String, record: String },
    /// Delete a session and all of its chunks
    Clear { session: String },
    /// Show how a session is laid out in the store
    Stats { session: String },
}

/// Config file, then `SYNTHLOG_*` variables, then flags
fn load_config(cli: &Cli) -> Result<CliConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let path = shellexpand::tilde(path).to_string();
            CliConfig::from_file(&path)
                .with_context(|| format!("Failed to load config from {}", path))?
        }
        None => CliConfig::default(),
    };
    config.merge_env();

    if let Some(store) = &cli.store {
        config.store.path = store.clone();
    }
    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;

    Ok(config)
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = EnvFilter::new(format!("{}", config.log_level()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store_path = config.store_path();
    let store = FileStore::open_with_quota(&store_path, config.quota())
        .with_context(|| format!("Failed to open store {}", store_path.display()))?;
    tracing::debug!(path = %store_path.display(), chunk_capacity = config.log.chunk_capacity, "Store opened");
    let log = ChunkedLog::with_config(store, config.log.clone())?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Sessions => commands::list_sessions(&log, &mut out)?,
        Commands::Count { session } => commands::count(&log, &session, &mut out)?,
        Commands::Page {
            session,
            page,
            page_size,
        } => commands::page(&log, &session, page, page_size, &mut out)?,
        Commands::Export {
            session,
            format,
            output,
        } => {
            let report = match output {
                Some(path) => {
                    let file = File::create(&path)
                        .with_context(|| format!("Failed to create {}", path.display()))?;
                    let mut writer = BufWriter::new(file);
                    commands::export(&log, &session, format, &mut writer)?
                }
                None => commands::export(&log, &session, format, &mut out)?,
            };
            if !report.is_complete() {
                eprintln!(
                    "Warning: {} chunk(s) could not be read; export is partial",
                    report.skipped.len()
                );
            }
        }
        Commands::Append {
            session,
            record,
            generate_id,
        } => commands::append(&log, &session, &record, generate_id, &mut out)?,
        Commands::Update { session, record } => {
            if !commands::update(&log, &session, &record, &mut out)? {
                out.flush()?;
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Clear { session } => commands::clear(&log, &session, &mut out)?,
        Commands::Stats { session } => commands::stats(&log, &session, &mut out)?,
    }

    out.flush()?;
    Ok(ExitCode::SUCCESS)
}
