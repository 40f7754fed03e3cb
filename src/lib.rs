//! # petstore-e2e
//!
//! **petstore-e2e** is an end-to-end API suite for the
//! [Swagger pet-store](https://petstore.swagger.io/) HTTP service. It creates,
//! reads, updates, uploads to and deletes pets against a fixed base origin and
//! asserts on status codes and payload fields.
//!
//! ## Overview
//!
//! Every case is an independent linear script: build a pet with a fresh
//! random 7-digit id, issue its calls in sequence, assert, and delete what it
//! created. The runner around the cases supplies what a test runner would:
//! filtering, parallel lanes, retries, per-attempt timeouts, request traces
//! and reports.
//!
//! ## Architecture
//!
//! - **[`config`]** - Run configuration from CI-aware defaults, TOML, environment and CLI
//! - **[`client`]** - Typed async client for the pet-store endpoints, with request traces
//! - **[`model`]** - Wire payloads (`Pet`, `Category`, `Tag`, `ApiMessage`)
//! - **[`expect`]** - `Result`-returning assertions for case bodies
//! - **[`lease`]** - Scoped pet creation that always deletes
//! - **[`suite`]** - The case set (TestIds 1001-1006, 2001-2003)
//! - **[`runner`]** - Selection, lanes, retries, timeouts and aggregation
//! - **[`report`]** - list, github, json and html reporters
//! - **[`cli`]** - `run` and `list` commands
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Run Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant CLI as petstore-e2e run
//!     participant Config as config::RunConfig
//!     participant Runner as runner::Runner
//!     participant Case as suite::Case
//!     participant Lease as lease::with_created_pet
//!     participant Store as pet-store
//!     participant Report as report::Reporters
//!
//!     CLI->>Config: load(defaults, file, env, flags)
//!     CLI->>Runner: run(pet_cases())
//!     Runner->>Runner: select + lanes
//!     loop each attempt
//!         Runner->>Case: run(CaseContext)
//!         Case->>Lease: create pet
//!         Lease->>Store: POST pet
//!         Case->>Store: GET / PUT / POST form / uploadImage
//!         Lease->>Store: DELETE pet/{id}
//!         Case-->>Runner: Result<(), CaseError>
//!     end
//!     Runner->>Report: on_case_end / on_end
//!     Runner-->>CLI: RunReport
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! # against the public service
//! cargo run -- run
//!
//! # against a local copy, serial, with traces on every attempt
//! cargo run -- run --base-url http://localhost:8080/v2 --workers 1 --trace on
//! ```
//!
//! ## Library Use
//!
//! ```rust,no_run
//! use petstore_e2e::config::RunConfig;
//! use petstore_e2e::report::ListReporter;
//! use petstore_e2e::runner::Runner;
//! use petstore_e2e::suite::pet_cases;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::for_base_url("http://localhost:8080/v2")?;
//! let runner = Runner::new(config)?;
//! let report = runner.run(pet_cases(), &mut ListReporter::stdout()).await?;
//! assert!(report.is_success());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod expect;
pub mod ids;
pub mod lease;
pub mod logging;
pub mod model;
pub mod report;
pub mod runner;
pub mod suite;

pub use client::{PetStoreClient, Reply};
pub use config::RunConfig;
pub use error::{CaseError, ClientError, ConfigError, RunError};
pub use ids::{PetId, RequestId};
pub use model::{Pet, PetStatus};
pub use runner::{Outcome, RunReport, Runner};
