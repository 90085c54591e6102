//! Result file resolution and download.

use tracing::{debug, info};

use crate::api::{ArtifactReference, SigmaApi};
use crate::error::Result;

/// Resolves `artifact` to its download location and fetches the bytes.
///
/// The location is looked up once and downloaded once; nothing is retried.
pub async fn fetch_artifact(api: &dyn SigmaApi, artifact: &ArtifactReference) -> Result<Vec<u8>> {
    let metadata = api.retrieve_file(artifact).await?;
    let location = metadata.download_location()?;

    info!(
        "Downloading {} from {}",
        artifact,
        location.host_str().unwrap_or("unknown host")
    );

    let payload = api.download(&location).await?;
    debug!("Downloaded {} bytes for {}", payload.len(), artifact);
    Ok(payload)
}
