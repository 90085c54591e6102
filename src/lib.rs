//! sigma-query - Run SQL against the Stripe Sigma API and decode the results.
//!
//! This library exposes the core modules for use by the binary and in
//! integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod query;

pub use config::{ClientConfig, Config};
pub use error::{Result, SigmaError};
pub use query::{QueryExecutor, Record, RecordSet};
