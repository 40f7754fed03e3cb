//! Unit tests for CLI parsing

use crate::cli::{Cli, Commands};
use crate::config::{ReporterKind, TracePolicy, Workers};
use crate::error::{ConfigError, RunError};
use clap::Parser;
use std::time::Duration;

use super::commands::EXIT_CONFIG;

#[test]
fn test_run_command_with_flags() {
    let cli = Cli::try_parse_from([
        "petstore-e2e",
        "--config",
        "petstore.toml",
        "run",
        "--base-url",
        "http://localhost:8080/v2",
        "--retries",
        "2",
        "--workers",
        "50%",
        "--trace",
        "retain-on-failure",
        "--reporter",
        "list",
        "--reporter",
        "json",
        "--timeout-ms",
        "1500",
        "--fully-parallel",
        "false",
        "--forbid-only",
        "--grep",
        "TestId: 10",
    ])
    .unwrap();

    assert_eq!(cli.config.unwrap().to_string_lossy(), "petstore.toml");
    let Commands::Run(args) = cli.command else {
        panic!("Expected Run command");
    };
    let overrides = args.overrides();
    assert_eq!(overrides.base_url.as_deref(), Some("http://localhost:8080/v2"));
    assert_eq!(overrides.retries, Some(2));
    assert_eq!(overrides.workers, Some(Workers::Percent(50)));
    assert_eq!(overrides.trace, Some(TracePolicy::RetainOnFailure));
    assert_eq!(overrides.reporters, vec![ReporterKind::List, ReporterKind::Json]);
    assert_eq!(overrides.timeout, Some(Duration::from_millis(1500)));
    assert_eq!(overrides.fully_parallel, Some(false));
    assert_eq!(overrides.forbid_only, Some(true));
    assert_eq!(overrides.grep.as_deref(), Some("TestId: 10"));
}

#[test]
fn test_run_without_flags_overrides_nothing() {
    let cli = Cli::try_parse_from(["petstore-e2e", "run"]).unwrap();
    let Commands::Run(args) = cli.command else {
        panic!("Expected Run command");
    };
    assert_eq!(args.overrides(), crate::config::ConfigOverrides::default());
}

#[test]
fn test_list_accepts_filters() {
    let cli = Cli::try_parse_from(["petstore-e2e", "list", "--grep-invert", "20"]).unwrap();
    match cli.command {
        Commands::List(args) => assert_eq!(args.grep_invert.as_deref(), Some("20")),
        Commands::Run(_) => panic!("Expected List command"),
    }
}

#[test]
fn test_invalid_values_are_rejected() {
    assert!(Cli::try_parse_from(["petstore-e2e", "run", "--timeout-ms", "0"]).is_err());
    assert!(Cli::try_parse_from(["petstore-e2e", "run", "--workers", "0"]).is_err());
    assert!(Cli::try_parse_from(["petstore-e2e", "run", "--reporter", "dot"]).is_err());
}

#[test]
fn test_selection_errors_map_to_config_exit_code() {
    let err = anyhow::Error::new(RunError::FocusedCases(vec!["TestId: 1001".into()]));
    assert_eq!(super::commands::exit_code_for(&err), EXIT_CONFIG);

    let err = anyhow::Error::new(ConfigError::Env {
        name: "PETSTORE_RETRIES".into(),
        message: "bad".into(),
    })
    .context("invalid configuration");
    assert_eq!(super::commands::exit_code_for(&err), EXIT_CONFIG);
}
