//! End-to-end query execution.
//!
//! Runs submission, polling, download and decoding in sequence for one query.
//! Each call is independent; nothing is cached between calls.

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::{HttpSigmaApi, SigmaApi};
use crate::config::ClientConfig;
use crate::error::{Result, SigmaError};
use crate::query::{decode_records, fetch_artifact, poll_until_complete, submit_query};
use crate::query::{PollPolicy, RecordSet};

/// Executes SQL queries against the remote API.
#[derive(Clone)]
pub struct QueryExecutor {
    api: Arc<dyn SigmaApi>,
    poll: PollPolicy,
}

impl QueryExecutor {
    /// Creates an executor backed by the HTTP API client.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        let api = HttpSigmaApi::new(config)?;
        Ok(Self::new(Arc::new(api), config.poll_policy().clone()))
    }

    /// Creates an executor over any API implementation.
    pub fn new(api: Arc<dyn SigmaApi>, poll: PollPolicy) -> Self {
        Self { api, poll }
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Runs `sql` to completion and returns the decoded rows.
    pub async fn execute_query(&self, sql: &str) -> Result<RecordSet> {
        self.execute_query_with_cancel(sql, &CancellationToken::new())
            .await
    }

    /// Runs `sql` to completion unless `cancel` fires first.
    ///
    /// Cancellation drops whichever request or poll wait is in flight and
    /// returns [`SigmaError::Cancelled`]. The server-side run is not cancelled.
    pub async fn execute_query_with_cancel(
        &self,
        sql: &str,
        cancel: &CancellationToken,
    ) -> Result<RecordSet> {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                warn!("Query execution cancelled");
                Err(SigmaError::Cancelled)
            }
            result = self.run(sql) => result,
        }
    }

    async fn run(&self, sql: &str) -> Result<RecordSet> {
        let start = Instant::now();
        let api = self.api.as_ref();

        let run_id = submit_query(api, sql).await?;
        let artifact = poll_until_complete(api, &run_id, &self.poll).await?;
        info!("Query completed, file ID: {}", artifact);

        let payload = fetch_artifact(api, &artifact).await?;
        let records = decode_records(&payload)?;

        info!(
            "Decoded {} records in {:?}",
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }
}
