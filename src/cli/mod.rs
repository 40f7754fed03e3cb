//! # CLI Module
//!
//! Command-line front end for the pet-store suite.
//!
//! ## Commands
//!
//! ### `run`
//!
//! Resolve the configuration, run the selected cases and report:
//!
//! ```bash
//! petstore-e2e run
//! petstore-e2e run --base-url http://localhost:8080/v2 --workers 4 --retries 1
//! petstore-e2e run --grep "TestId: 10" --reporter list --reporter json
//! ```
//!
//! Options:
//! - `--base-url <URL>` - service origin (default `https://petstore.swagger.io/v2/`)
//! - `--api-key <KEY>` - `api_key` header value
//! - `--retries <N>` - extra attempts for failing cases
//! - `--workers <N|N%|auto>` - concurrent lanes
//! - `--trace <POLICY>` - off, on, on-first-retry, on-all-retries, retain-on-failure
//! - `--reporter <KIND>` - list, github, json, html (repeatable)
//! - `--output-dir <DIR>` - traces and file reports
//! - `--timeout-ms <MS>` - per-attempt timeout
//! - `--grep <RE>` / `--grep-invert <RE>` - filter on `TestId: <id>. <title>`
//! - `--fully-parallel <BOOL>` - `false` runs each group serially
//! - `--forbid-only` - reject focused cases
//! - `--asset <FILE>` - image uploaded by the upload case
//!
//! ### `list`
//!
//! Print the cases a `run` with the same filters would execute.
//!
//! ## Global Options
//!
//! - `--config <FILE>` - TOML configuration file (also `PETSTORE_CONFIG`)
//!
//! ## Exit Codes
//!
//! | code | meaning                                            |
//! |------|----------------------------------------------------|
//! | 0    | every selected case passed (flaky counts as pass)  |
//! | 1    | at least one case failed, or reporting failed      |
//! | 2    | configuration or selection error                   |

mod commands;

#[cfg(test)]
mod tests;

pub use commands::{run_cli, Cli, Commands, RunArgs, SelectArgs, EXIT_CONFIG, EXIT_FAILED, EXIT_OK};
