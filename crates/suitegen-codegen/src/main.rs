// crates/suitegen-codegen/src/main.rs
// ============================================================================
// Module: Suitegen CLI
// Description: CLI entrypoint for contract validation and suite generation.
// Purpose: Produce deterministic Rust test suites from API contracts.
// Dependencies: clap, suitegen-codegen, tracing-subscriber
// ============================================================================

//! ## Overview
//! `suitegen generate` renders one test file per operation group into the
//! output directory, or with `--check` verifies that the files on disk match.
//! `suitegen validate` prints the contract's validation result as JSON.
//! Logs go to stderr and honor `RUST_LOG`.

use std::fs;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use suitegen_codegen::SuiteGenerator;
use suitegen_config::GenerationOptions;
use suitegen_contract::FormatHint;
use suitegen_contract::load_contract;
use suitegen_contract::validate;
use suitegen_core::GenerationError;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// CLI arguments for suite generation.
#[derive(Debug, Parser)]
#[command(name = "suitegen", about = "Generate Rust API test suites from OpenAPI and Swagger contracts.")]
struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Supported CLI subcommands.
#[derive(Debug, Subcommand)]
enum Command {
    /// Generate test files.
    Generate {
        /// Contract file (JSON or YAML).
        #[arg(long, value_name = "FILE")]
        contract: PathBuf,
        /// Generation options file (TOML).
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
        /// Output root; overrides `output_dir` from the config.
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,
        /// Contract encoding.
        #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
        format: FormatArg,
        /// Verify files on disk instead of writing them.
        #[arg(long)]
        check: bool,
    },
    /// Validate a contract and print the result as JSON.
    Validate {
        /// Contract file (JSON or YAML).
        #[arg(long, value_name = "FILE")]
        contract: PathBuf,
    },
}

/// Contract encoding flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// Sniff the content.
    Auto,
    /// JSON.
    Json,
    /// YAML.
    Yaml,
}

impl From<FormatArg> for FormatHint {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Auto => Self::Auto,
            FormatArg::Json => Self::Json,
            FormatArg::Yaml => Self::Yaml,
        }
    }
}

/// CLI failures.
#[derive(Debug, Error)]
enum CliError {
    /// Pipeline or filesystem failure.
    #[error(transparent)]
    Generation(#[from] GenerationError),
    /// Generation finished without usable output.
    #[error("generation failed: {0}")]
    Failed(String),
    /// Contract failed validation.
    #[error("contract is invalid")]
    Invalid,
    /// Output could not be encoded or printed.
    #[error("output error: {0}")]
    Output(String),
}

// ============================================================================
// SECTION: Command Dispatch
// ============================================================================

/// CLI entrypoint.
fn main() -> ExitCode {
    init_logging();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report_error(&err),
    }
}

/// Installs the stderr log subscriber.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).try_init();
}

/// Dispatches the CLI command.
fn run() -> Result<(), CliError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Generate {
            contract,
            config,
            out,
            format,
            check,
        } => generate(&contract, config.as_deref(), out, format.into(), check),
        Command::Validate {
            contract,
        } => validate_contract(&contract),
    }
}

/// Generates the suite and writes or checks it.
fn generate(
    contract: &Path,
    config: Option<&Path>,
    out: Option<PathBuf>,
    hint: FormatHint,
    check: bool,
) -> Result<(), CliError> {
    let mut options = GenerationOptions::load(config).map_err(GenerationError::from)?;
    if let Some(out) = out {
        options.output_dir = out;
    }
    let root = options.output_dir.clone();
    let bytes = fs::read(contract).map_err(|err| GenerationError::Io(format!("{}: {err}", contract.display())))?;
    let mut generator = SuiteGenerator::new(options)?;
    let output = generator.generate(&bytes, hint);
    if !output.result.success {
        let mut messages: Vec<&str> = output.errors.records.iter().map(|record| record.user_message.as_str()).collect();
        messages.dedup();
        let detail = if messages.is_empty() { "no test files were produced".to_string() } else { messages.join(" ") };
        return Err(CliError::Failed(detail));
    }
    if check {
        output.check(&root)?;
        info!(files = output.files.len(), root = %root.display(), "generated files are up to date");
    } else {
        output.write(&root)?;
    }
    print_json(&output.result)
}

/// Validates a contract and prints the result.
fn validate_contract(contract: &Path) -> Result<(), CliError> {
    let document = load_contract(contract).map_err(GenerationError::from)?;
    let result = validate(&document);
    print_json(&result)?;
    if result.is_valid { Ok(()) } else { Err(CliError::Invalid) }
}

/// Prints a value as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(value).map_err(|err| CliError::Output(err.to_string()))?;
    let mut stdout = std::io::stdout();
    writeln!(stdout, "{json}").map_err(|err| CliError::Output(err.to_string()))
}

/// Reports a CLI error to stderr.
fn report_error(err: &CliError) -> ExitCode {
    let mut stderr = std::io::stderr();
    let _ = writeln!(stderr, "{err}");
    ExitCode::FAILURE
}
