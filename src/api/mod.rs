//! Remote API access for sigma-query.
//!
//! Provides the [`SigmaApi`] trait for the four remote operations the query
//! workflow needs, an HTTP implementation and a scripted mock.

pub mod http;
pub mod mock;
pub mod types;

pub use http::HttpSigmaApi;
pub use mock::MockSigmaApi;
pub use types::{ArtifactReference, FileMetadata, QueryRun, RunStatus};

use async_trait::async_trait;
use url::Url;

use crate::error::Result;

/// Trait for clients of the query-run and file endpoints.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait SigmaApi: Send + Sync {
    /// Creates a query run for `sql` and returns its id.
    async fn create_query_run(&self, sql: &str) -> Result<String>;

    /// Fetches the current snapshot of a query run.
    async fn retrieve_query_run(&self, run_id: &str) -> Result<QueryRun>;

    /// Fetches metadata for a result file.
    async fn retrieve_file(&self, file: &ArtifactReference) -> Result<FileMetadata>;

    /// Downloads the bytes at a resolved file location.
    async fn download(&self, location: &Url) -> Result<Vec<u8>>;
}
