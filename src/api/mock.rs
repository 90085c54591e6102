//! Mock API client for testing.
//!
//! Replays a scripted sequence of run snapshots and counts calls per endpoint.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use url::Url;

use crate::api::types::{ArtifactReference, FileMetadata, QueryRun};
use crate::api::SigmaApi;
use crate::error::{Result, SigmaError};

/// Mock API client that returns scripted responses.
///
/// Run snapshots are handed out in order; once only one is left it is
/// repeated for every later status check.
#[derive(Debug)]
pub struct MockSigmaApi {
    run_id: String,
    runs: Mutex<VecDeque<QueryRun>>,
    file_url: Option<String>,
    payload: Vec<u8>,
    download_error: Option<(u16, String)>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
    file_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl MockSigmaApi {
    /// Creates a mock whose run succeeds immediately with an empty payload.
    pub fn new(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self {
            runs: Mutex::new(VecDeque::from([QueryRun::succeeded(
                run_id.clone(),
                "file_mock",
            )])),
            run_id,
            file_url: Some("https://files.example/mock".to_string()),
            payload: Vec::new(),
            download_error: None,
            create_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            file_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
        }
    }

    /// Sets the run snapshots returned by successive status checks.
    pub fn with_runs(mut self, runs: impl IntoIterator<Item = QueryRun>) -> Self {
        self.runs = Mutex::new(runs.into_iter().collect());
        self
    }

    /// Sets the download url returned by the file metadata lookup.
    pub fn with_file_url(mut self, url: Option<&str>) -> Self {
        self.file_url = url.map(String::from);
        self
    }

    /// Sets the downloaded payload.
    pub fn with_payload(mut self, payload: impl Into<Vec<u8>>) -> Self {
        self.payload = payload.into();
        self
    }

    /// Makes the download fail with the given HTTP status.
    pub fn with_download_error(mut self, status: u16, body: impl Into<String>) -> Self {
        self.download_error = Some((status, body.into()));
        self
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn file_calls(&self) -> usize {
        self.file_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SigmaApi for MockSigmaApi {
    async fn create_query_run(&self, _sql: &str) -> Result<String> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.run_id.clone())
    }

    async fn retrieve_query_run(&self, run_id: &str) -> Result<QueryRun> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        if run_id != self.run_id {
            return Err(SigmaError::remote(404, format!("No such query run: {}", run_id)));
        }

        let mut runs = self
            .runs
            .lock()
            .map_err(|_| SigmaError::transport("mock state poisoned"))?;
        let run = if runs.len() > 1 {
            runs.pop_front()
        } else {
            runs.front().cloned()
        };
        run.ok_or_else(|| SigmaError::protocol("no scripted run snapshots"))
    }

    async fn retrieve_file(&self, file: &ArtifactReference) -> Result<FileMetadata> {
        self.file_calls.fetch_add(1, Ordering::SeqCst);
        Ok(FileMetadata {
            id: Some(file.id().to_string()),
            url: self.file_url.clone(),
        })
    }

    async fn download(&self, _location: &Url) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        match &self.download_error {
            Some((status, body)) => Err(SigmaError::remote(*status, body.clone())),
            None => Ok(self.payload.clone()),
        }
    }
}
