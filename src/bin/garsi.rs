//! GaRSI CLI - Command-line interface for GaRSI Flux
//!
//! Commands:
//! - process: Process one session log into timeline, preview and chunks
//! - batch: Process every session under `<root>/<user>/<file>`
//! - validate: Parse and normalize a session log and report event counts
//! - config: Print the effective engine configuration

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use garsi_flux::fixation::merge_fixations;
use garsi_flux::schema::read_session;
use garsi_flux::{
    discover_sessions, Annotation, ComputeError, EngineConfig, SessionProcessor, FLUX_VERSION,
    PRODUCER_NAME,
};

/// GaRSI - Reading-session timeline engine
#[derive(Parser)]
#[command(name = "garsi")]
#[command(version = FLUX_VERSION)]
#[command(about = "Turn reading-session gaze logs into feature-bearing chunks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process one session log
    Process {
        /// Input log path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// JSON array of additional ignored ranges in absolute ms
        #[arg(long)]
        annotations: Option<PathBuf>,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Process every session under a directory of user folders
    Batch {
        /// Root directory laid out as <root>/<user>/<file>
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory, written as <output>/<user>/<file>.json
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,
    },

    /// Parse and normalize a session log without processing it
    Validate {
        /// Input log path (use - for stdin)
        #[arg(short, long)]
        input: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the effective configuration
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct ConfigArgs {
    /// Configuration file (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Chunk size in seconds
    #[arg(long)]
    chunk_size: Option<u32>,

    /// Resumption lag (T_R) in ms
    #[arg(long)]
    resumption_lag: Option<i64>,

    /// Interruption lag (T_L) in ms
    #[arg(long)]
    interruption_lag: Option<i64>,
}

impl ConfigArgs {
    /// File values first, then command-line overrides
    fn resolve(&self) -> Result<EngineConfig, GarsiCliError> {
        let mut config = match &self.config {
            Some(path) => EngineConfig::load(path)?,
            None => EngineConfig::default(),
        };
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if let Some(lag) = self.resumption_lag {
            config.timing.resumption_lag_ms = lag;
        }
        if let Some(lag) = self.interruption_lag {
            config.timing.interruption_lag_ms = lag;
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), GarsiCliError> {
    match cli.command {
        Commands::Process {
            input,
            output,
            annotations,
            config,
        } => cmd_process(&input, &output, annotations.as_deref(), &config.resolve()?),

        Commands::Batch {
            input,
            output,
            config,
        } => cmd_batch(&input, &output, &config.resolve()?),

        Commands::Validate { input, json } => cmd_validate(&input, json),

        Commands::Config { config } => cmd_config(&config.resolve()?),
    }
}

fn cmd_process(
    input: &Path,
    output: &Path,
    annotations: Option<&Path>,
    config: &EngineConfig,
) -> Result<(), GarsiCliError> {
    let log = read_input(input)?;

    let annotations: Vec<Annotation> = match annotations {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => Vec::new(),
    };

    let processor = SessionProcessor::new(*config);
    let result = processor.process_with_annotations(&log, &annotations)?;
    tracing::info!(
        fixations = result.timeline.fixations.len(),
        interruptions = result.timeline.interruptions.len(),
        chunks = result.chunks.len(),
        "processed session"
    );

    let output_data = result.to_json()?;
    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_batch(input: &Path, output: &Path, config: &EngineConfig) -> Result<(), GarsiCliError> {
    let sessions = discover_sessions(input)?;
    if sessions.is_empty() {
        return Err(GarsiCliError::NoSessions);
    }

    let processor = SessionProcessor::new(*config);
    let mut report = BatchReport {
        producer: PRODUCER_NAME.to_string(),
        version: FLUX_VERSION.to_string(),
        processed: 0,
        failed: Vec::new(),
    };

    // One failing session must not stop the others
    for session in &sessions {
        let outcome = fs::read_to_string(&session.path)
            .map_err(ComputeError::from)
            .and_then(|log| processor.process(&log))
            .and_then(|result| result.to_json());

        match outcome {
            Ok(json) => {
                let user_dir = output.join(&session.user);
                fs::create_dir_all(&user_dir)?;
                fs::write(user_dir.join(format!("{}.json", session.file)), json)?;
                report.processed += 1;
            }
            Err(e) => {
                tracing::error!(user = %session.user, file = %session.file, error = %e, "session failed");
                report.failed.push(BatchFailure {
                    user: session.user.clone(),
                    file: session.file.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&report)?);

    if report.failed.is_empty() {
        Ok(())
    } else {
        Err(GarsiCliError::BatchFailed(report.failed.len()))
    }
}

fn cmd_validate(input: &Path, json: bool) -> Result<(), GarsiCliError> {
    let log = read_input(input)?;
    let events = read_session(&log)?;
    if events.is_empty() {
        return Err(GarsiCliError::NoEvents);
    }

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for event in &events {
        *by_type.entry(event.event_type.as_str().to_string()).or_default() += 1;
    }

    let report = ValidationReport {
        total_events: events.len(),
        fixations: merge_fixations(&events)?.len(),
        first_timestamp: events.first().map(|e| e.timestamp),
        last_timestamp: events.last().map(|e| e.timestamp),
        by_type,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total events: {}", report.total_events);
        println!("Fixations:    {}", report.fixations);
        println!("\nEvents by type:");
        for (event_type, count) in &report.by_type {
            println!("  {:<14} {}", event_type, count);
        }
    }

    Ok(())
}

fn cmd_config(config: &EngineConfig) -> Result<(), GarsiCliError> {
    println!("{}", config.to_json()?);
    Ok(())
}

// Helper functions

fn read_input(input: &Path) -> Result<String, GarsiCliError> {
    if input.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(input)?)
    }
}

// Error types

#[derive(Debug)]
enum GarsiCliError {
    Io(io::Error),
    Compute(ComputeError),
    Json(serde_json::Error),
    NoEvents,
    NoSessions,
    BatchFailed(usize),
}

impl From<io::Error> for GarsiCliError {
    fn from(e: io::Error) -> Self {
        GarsiCliError::Io(e)
    }
}

impl From<ComputeError> for GarsiCliError {
    fn from(e: ComputeError) -> Self {
        GarsiCliError::Compute(e)
    }
}

impl From<serde_json::Error> for GarsiCliError {
    fn from(e: serde_json::Error) -> Self {
        GarsiCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<GarsiCliError> for CliError {
    fn from(e: GarsiCliError) -> Self {
        match e {
            GarsiCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            GarsiCliError::Compute(e) => {
                let (code, hint) = match &e {
                    ComputeError::ParseError { .. } | ComputeError::TimestampError(_) => (
                        "PARSE_ERROR",
                        "Lines must look like 2023-03-01T10:00:00.000Z|TYPE|arg1;arg2",
                    ),
                    ComputeError::MissingField(_) => (
                        "MISSING_FIELD",
                        "Gaze and fixation events need '<x>,<y>' coordinates",
                    ),
                    ComputeError::InvalidAnnotation(_) => (
                        "INVALID_ANNOTATION",
                        "Annotations need start <= end in absolute milliseconds",
                    ),
                    ComputeError::InvalidConfig(_) => {
                        ("INVALID_CONFIG", "Run 'garsi config' to inspect the values")
                    }
                    _ => ("COMPUTE_ERROR", "Run 'garsi validate' on the input log"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            GarsiCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            GarsiCliError::NoEvents => CliError {
                code: "NO_EVENTS".to_string(),
                message: "No events found in input".to_string(),
                hint: Some("Ensure input file is not empty".to_string()),
            },
            GarsiCliError::NoSessions => CliError {
                code: "NO_SESSIONS".to_string(),
                message: "No session logs found".to_string(),
                hint: Some("Expected layout is <root>/<user>/<file>".to_string()),
            },
            GarsiCliError::BatchFailed(count) => CliError {
                code: "BATCH_FAILED".to_string(),
                message: format!("{} sessions failed", count),
                hint: Some("See the batch report and logs for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_events: usize,
    fixations: usize,
    first_timestamp: Option<i64>,
    last_timestamp: Option<i64>,
    by_type: BTreeMap<String, usize>,
}

#[derive(serde::Serialize)]
struct BatchReport {
    producer: String,
    version: String,
    processed: usize,
    failed: Vec<BatchFailure>,
}

#[derive(serde::Serialize)]
struct BatchFailure {
    user: String,
    file: String,
    error: String,
}
