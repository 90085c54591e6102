//! Query submission.

use tracing::info;

use crate::api::SigmaApi;
use crate::error::Result;

/// Submits `sql` as a new query run and returns the run id.
///
/// The SQL is sent as-is; malformed queries surface later as a remote error
/// or a failed run.
pub async fn submit_query(api: &dyn SigmaApi, sql: &str) -> Result<String> {
    let run_id = api.create_query_run(sql).await?;
    info!("Created query run: {}", run_id);
    Ok(run_id)
}
