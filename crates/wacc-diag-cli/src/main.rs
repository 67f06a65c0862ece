//! wacc-diag: check WACC source files from the command line.
//!
//! ```bash
//! wacc-diag check prog.wacc
//! wacc-diag check --format json --local-only prog.wacc
//! RUST_LOG=wacc_diag_kernel=debug wacc-diag check prog.wacc
//! ```
//!
//! Exits with status 1 when any file has an error-severity diagnostic.

mod render;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wacc_diag_kernel::{BlockReportMode, Engine, EngineConfig, SourceText, ValidationOutcome};

#[derive(Debug, Parser)]
#[command(name = "wacc-diag", version, about = "Diagnostics for WACC source files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate one or more files and print their diagnostics.
    Check(CheckArgs),
    /// Print the config file location and the resolved configuration.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Debug, clap::Args)]
struct CheckArgs {
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Config file to use instead of the default location.
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Human)]
    format: Format,

    /// Cap on diagnostics per file.
    #[arg(long)]
    max_problems: Option<usize>,

    /// Attach related information to identifier diagnostics.
    #[arg(long)]
    related_info: bool,

    /// Report only the first block-structure problem.
    #[arg(long)]
    first_block_error: bool,

    /// Skip the external analyzer even if one is configured.
    #[arg(long)]
    local_only: bool,

    /// Disable colours in human output.
    #[arg(long)]
    no_color: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Human,
    Short,
    Json,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match Cli::parse().command {
        Command::Check(args) => check(args).await,
        Command::Config { config } => {
            let path = config
                .clone()
                .unwrap_or_else(wacc_diag_kernel::paths::config_file);
            println!("# {}", path.display());
            println!("{:#?}", load_config(config.as_deref())?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) if path.exists() => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        Some(path) => anyhow::bail!("Config file {} does not exist", path.display()),
        None => EngineConfig::load().context("Failed to load configuration"),
    }
}

async fn check(args: CheckArgs) -> Result<ExitCode> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(max) = args.max_problems {
        config = config.with_max_problems(max);
    }
    if args.related_info {
        config = config.with_related_information(true);
    }
    if args.first_block_error {
        config = config.with_block_errors(BlockReportMode::First);
    }
    if args.local_only {
        config = config.with_analyzer(None);
    }

    let engine = Engine::from_config(config);
    let colour = !args.no_color && std::env::var_os("NO_COLOR").is_none();
    let mut failed = false;

    for file in &args.files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let uri = file_uri(file);
        let name = file.display().to_string();

        let report = match engine.validate(&uri, &text).await {
            ValidationOutcome::Published(report) => report,
            other => anyhow::bail!("Validation of {name} was superseded: {other:?}"),
        };
        tracing::debug!(file = %name, count = report.diagnostics.len(), "checked");
        failed |= report.has_errors();

        let source = SourceText::new(text.as_str());
        let output = match args.format {
            Format::Human => render::human(&name, &text, &report.diagnostics, colour)?,
            Format::Short => render::short(&name, &source, &report.diagnostics),
            Format::Json => format!("{}\n", render::json(&name, &source, &report.diagnostics)?),
        };
        print!("{output}");
        engine.close(&uri);
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn file_uri(path: &Path) -> String {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", absolute.display())
}
