use crate::config::{ConfigOverrides, ReporterKind, RunConfig, TracePolicy, Workers};
use crate::error::{ConfigError, RunError};
use crate::report::Reporters;
use crate::runner::{select, Runner};
use crate::suite::{pet_cases, CaseMode};
use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::error;

pub const EXIT_OK: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_CONFIG: i32 = 2;

/// End-to-end API suite for the Swagger pet-store service
#[derive(Debug, Parser)]
#[command(name = "petstore-e2e")]
#[command(version, about = "Pet-store end-to-end API suite", long_about = None)]
pub struct Cli {
    /// TOML configuration file (falls back to PETSTORE_CONFIG)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the selected cases and report
    Run(RunArgs),
    /// List the cases a run would select
    List(SelectArgs),
}

/// Title filters shared by `run` and `list`.
#[derive(Debug, Default, Args)]
pub struct SelectArgs {
    /// Only cases whose "TestId: <id>. <title>" matches
    #[arg(long, value_name = "REGEX")]
    pub grep: Option<String>,

    /// Skip cases whose "TestId: <id>. <title>" matches
    #[arg(long, value_name = "REGEX")]
    pub grep_invert: Option<String>,
}

#[derive(Debug, Default, Args)]
pub struct RunArgs {
    /// Service base origin
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Value of the api_key header
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Extra attempts for a failing case
    #[arg(long, value_name = "N")]
    pub retries: Option<u32>,

    /// Concurrent lanes: N, N% of available parallelism, or auto
    #[arg(long, value_name = "N|N%|auto")]
    pub workers: Option<Workers>,

    /// When to record request traces
    #[arg(long, value_enum)]
    pub trace: Option<TracePolicy>,

    /// Reporter to enable; repeat for several
    #[arg(long = "reporter", value_enum, value_name = "KIND")]
    pub reporters: Vec<ReporterKind>,

    /// Directory for traces and file reports
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Per-attempt timeout in milliseconds
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout_ms: Option<u64>,

    /// Run every case independently (false: groups run serially)
    #[arg(long, value_name = "BOOL")]
    pub fully_parallel: Option<bool>,

    /// Fail the run if any case is focused
    #[arg(long)]
    pub forbid_only: bool,

    /// Image uploaded by the upload case
    #[arg(long, value_name = "FILE")]
    pub asset: Option<PathBuf>,

    #[command(flatten)]
    pub select: SelectArgs,
}

impl RunArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            fully_parallel: self.fully_parallel,
            forbid_only: self.forbid_only.then_some(true),
            retries: self.retries,
            workers: self.workers,
            trace: self.trace,
            reporters: self.reporters.clone(),
            output_dir: self.output_dir.clone(),
            timeout: self.timeout_ms.map(Duration::from_millis),
            asset_path: self.asset.clone(),
            ..self.select.overrides()
        }
    }
}

impl SelectArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            grep: self.grep.clone(),
            grep_invert: self.grep_invert.clone(),
            ..ConfigOverrides::default()
        }
    }
}

pub(crate) fn exit_code_for(err: &anyhow::Error) -> i32 {
    let is_config = err.chain().any(|cause| {
        cause.is::<ConfigError>()
            || matches!(
                cause.downcast_ref::<RunError>(),
                Some(RunError::Config(_) | RunError::FocusedCases(_) | RunError::NothingSelected)
            )
    });
    if is_config {
        EXIT_CONFIG
    } else {
        EXIT_FAILED
    }
}

/// Execute a parsed command line and return the process exit code.
pub async fn run_cli(cli: Cli) -> i32 {
    let result = match &cli.command {
        Commands::Run(args) => run(cli.config.as_deref(), args).await,
        Commands::List(args) => list(cli.config.as_deref(), args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            error!(error = %err, "petstore-e2e failed");
            eprintln!("error: {err:#}");
            exit_code_for(&err)
        }
    }
}

async fn run(config_path: Option<&std::path::Path>, args: &RunArgs) -> anyhow::Result<i32> {
    let config = RunConfig::load(config_path, &args.overrides()).context("invalid configuration")?;
    let mut reporters = Reporters::from_config(&config);
    let runner = Runner::new(config)?;
    let report = runner
        .run(pet_cases(), &mut reporters)
        .await
        .context("run aborted")?;
    Ok(if report.is_success() { EXIT_OK } else { EXIT_FAILED })
}

fn list(config_path: Option<&std::path::Path>, args: &SelectArgs) -> anyhow::Result<i32> {
    let config = RunConfig::load(config_path, &args.overrides()).context("invalid configuration")?;
    let selected = select(pet_cases(), &config)?;
    for case in &selected {
        let marker = match case.mode {
            CaseMode::Normal => "",
            CaseMode::Only => " (only)",
            CaseMode::Skip => " (skip)",
        };
        println!("[{}] {}{marker}", case.kind.as_str(), case.full_title());
    }
    println!("{} cases", selected.len());
    Ok(EXIT_OK)
}
