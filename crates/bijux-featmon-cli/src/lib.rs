// SPDX-License-Identifier: Apache-2.0

#![forbid(unsafe_code)]
//! `featmon` command line: thin dispatch over the ingest, reconcile, and
//! store crates, with machine-readable output behind `--json`.

mod commands;
mod error;
mod logging;
mod pipeline;

use std::path::PathBuf;
use std::process::ExitCode as ProcessExitCode;

use bijux_featmon_core::{resolve_store_root, ExitCode, MachineError};
use bijux_featmon_model::SourceType;
use bijux_featmon_store::LocalFsStore;
use chrono::{DateTime, Utc};
use clap::{error::ErrorKind, ArgAction, Parser, Subcommand, ValueEnum};

pub use error::PipelineError;
pub use pipeline::{run_pipeline, RunInputs, RunSummary};

pub const CRATE_NAME: &str = "bijux-featmon-cli";

#[derive(Parser)]
#[command(name = "featmon")]
#[command(about = "Track GitHub feature announcements and score coverage per product area")]
#[command(
    after_help = "Environment:\n  FEATMON_CONFIG_PATH  Config file (default configs/featmon.yaml)\n  FEATMON_STORE_ROOT   Snapshot store root (default data/featmon)\n  FEATMON_LOG_JSON     Emit logs as JSON on stderr\n  RUST_LOG             Log filter override"
)]
struct Cli {
    #[arg(long, global = true, default_value_t = false)]
    json: bool,
    #[arg(long, global = true, default_value_t = false)]
    quiet: bool,
    #[arg(long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[arg(long, global = true)]
    store_root: Option<PathBuf>,
    /// Observation time (RFC 3339); defaults to the current time.
    #[arg(long, global = true)]
    now: Option<DateTime<Utc>>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize one raw source batch into canonical feature records.
    Normalize {
        #[arg(long, value_enum)]
        source: SourceArg,
        #[arg(long)]
        input: PathBuf,
    },
    /// List schema additions between two SDL documents.
    SchemaDiff {
        #[arg(long)]
        old: PathBuf,
        #[arg(long)]
        new: PathBuf,
    },
    /// Diff two snapshot files; omit the baseline for a first run.
    Diff {
        #[arg(long)]
        baseline: Option<PathBuf>,
        #[arg(long)]
        current: PathBuf,
    },
    /// Score a snapshot file against the coverage thresholds.
    Coverage {
        #[arg(long)]
        snapshot: PathBuf,
        #[arg(long)]
        previous: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    /// Full pass over the given inputs, persisted to the snapshot store.
    Run {
        #[arg(long)]
        changelog: Option<PathBuf>,
        #[arg(long)]
        roadmap: Option<PathBuf>,
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long, default_value_t = false)]
        explicit_empty: bool,
        #[arg(long, default_value_t = false)]
        dry_run: bool,
        #[arg(long, default_value_t = false)]
        strict: bool,
    },
    Store {
        #[command(subcommand)]
        command: StoreCommand,
    },
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum StoreCommand {
    Latest,
    List,
    /// Remove a publish lock left behind by a writer that is no longer running.
    Unlock,
}

#[derive(Subcommand)]
enum ConfigCommand {
    Validate,
    Print,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Changelog,
    Roadmap,
    GraphqlSchemaDiff,
}

impl From<SourceArg> for SourceType {
    fn from(value: SourceArg) -> Self {
        match value {
            SourceArg::Changelog => Self::Changelog,
            SourceArg::Roadmap => Self::Roadmap,
            SourceArg::GraphqlSchemaDiff => Self::GraphqlSchemaDiff,
        }
    }
}

#[derive(Clone, Copy)]
struct LogFlags {
    quiet: bool,
    verbose: u8,
}

#[derive(Clone, Copy)]
struct OutputMode {
    json: bool,
}

#[derive(Debug)]
struct CliError {
    exit_code: ExitCode,
    machine: MachineError,
}

impl CliError {
    fn usage(message: &str) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            machine: MachineError::new("usage_error", message),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        Self {
            exit_code: err.exit_code(),
            machine: err.machine_error(),
        }
    }
}

pub fn main_entry() -> ProcessExitCode {
    let wants_json = std::env::args().any(|arg| arg == "--json");
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success.as_u8()),
        Err(err) => {
            emit_error(&err, wants_json);
            ProcessExitCode::from(err.exit_code.as_u8())
        }
    }
}

fn emit_error(error: &CliError, machine_json: bool) {
    if machine_json {
        match serde_json::to_string(&error.machine) {
            Ok(payload) => eprintln!("{payload}"),
            Err(_) => eprintln!(
                "{{\"code\":\"internal_error\",\"message\":\"failed to encode structured error\",\"details\":{{}}}}"
            ),
        }
    } else {
        eprintln!("error: {}", error.machine.message);
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => {
                return Err(CliError {
                    exit_code: ExitCode::Usage,
                    machine: MachineError::new("usage_error", "invalid command line arguments")
                        .with_detail("error", &err.to_string()),
                });
            }
        },
    };
    logging::init_tracing(LogFlags {
        quiet: cli.quiet,
        verbose: cli.verbose,
    });
    let output_mode = OutputMode { json: cli.json };
    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    let observed_at = cli.now.unwrap_or_else(Utc::now);
    let store = LocalFsStore::new(resolve_store_root(cli.store_root.as_deref()));
    let (config_path, config) = commands::load_monitor_config(cli.config.as_deref())?;

    let result = match command {
        Commands::Normalize { source, input } => commands::run_normalize(
            &config,
            source.into(),
            &input,
            observed_at,
            output_mode,
        ),
        Commands::SchemaDiff { old, new } => {
            commands::run_schema_diff(&config, &old, &new, output_mode)
        }
        Commands::Diff { baseline, current } => {
            commands::run_diff(&config, baseline.as_deref(), &current, output_mode)
        }
        Commands::Coverage {
            snapshot,
            previous,
            strict,
        } => commands::run_coverage(
            &config,
            &snapshot,
            previous.as_deref(),
            strict,
            output_mode,
        ),
        Commands::Run {
            changelog,
            roadmap,
            schema,
            explicit_empty,
            dry_run,
            strict,
        } => commands::run_monitor(
            &config,
            &store,
            &RunInputs {
                changelog,
                roadmap,
                schema,
                observed_at,
                explicit_empty,
                dry_run,
            },
            strict,
            output_mode,
        ),
        Commands::Store { command } => match command {
            StoreCommand::Latest => commands::run_store_latest(&store, output_mode),
            StoreCommand::List => commands::run_store_list(&store, output_mode),
            StoreCommand::Unlock => commands::run_store_unlock(&store, output_mode),
        },
        Commands::Config { command } => match command {
            ConfigCommand::Validate => {
                commands::run_config_validate(&config_path, &config, output_mode)
            }
            ConfigCommand::Print => commands::run_config_print(&config),
        },
    };
    result.map_err(CliError::from)
}
