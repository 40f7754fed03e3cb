//! # Run Configuration Module
//!
//! Declarative policy for a suite run: where requests go, how many cases run
//! at once, how failures are retried and when diagnostic traces are kept.
//!
//! ## Sources
//!
//! A [`RunConfig`] is resolved in layers, later layers winning:
//!
//! 1. CI-aware defaults ([`RunConfig::defaults`])
//! 2. A TOML file (`--config <FILE>` or `PETSTORE_CONFIG`)
//! 3. Environment variables (`PETSTORE_*`, see [`ConfigEnv`])
//! 4. Command-line overrides ([`ConfigOverrides`])
//!
//! ## CI Defaults
//!
//! When the `CI` environment variable is set (to anything but `0`/`false`):
//!
//! | setting       | local            | CI       |
//! |---------------|------------------|----------|
//! | `forbid_only` | `false`          | `true`   |
//! | `retries`     | `0`              | `2`      |
//! | `workers`     | `auto`           | `1`      |
//! | `reporters`   | `list`, `html`   | `github` |
//!
//! ## Example File
//!
//! ```toml
//! base_url = "https://petstore.swagger.io/v2/"
//! fully_parallel = true
//! retries = 1
//! workers = "50%"
//! trace = "on-first-retry"
//! reporters = ["list", "json"]
//! timeout_ms = 15000
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use petstore_e2e::config::{ConfigOverrides, RunConfig};
//!
//! let config = RunConfig::load(None, &ConfigOverrides::default())?;
//! println!("running against {}", config.base_url);
//! # Ok::<(), petstore_e2e::error::ConfigError>(())
//! ```

mod load;
mod run;


pub use load::{is_ci, ConfigEnv, ConfigFile, ConfigOverrides};
pub use run::{
    normalize_base_url, ReporterKind, RunConfig, TracePolicy, Workers, DEFAULT_API_KEY,
    DEFAULT_BASE_URL,
};
