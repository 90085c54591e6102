//! Wire types for the query-run and file endpoints.

use serde::Deserialize;
use std::fmt;
use url::Url;

use crate::error::{Result, SigmaError};

/// Status of a query run as last reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum RunStatus {
    /// Still queued or running.
    Pending,
    /// Finished; the result file is available.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// A status this client does not recognize. Treated as non-terminal.
    Other(String),
}

impl RunStatus {
    /// Returns the status as the server spells it.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
            Self::Other(s) => s,
        }
    }

    /// Returns true for statuses after which polling must stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl From<String> for RunStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "pending" | "running" => Self::Pending,
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            _ => Self::Other(s),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Opaque identifier of a result file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactReference(String);

impl ArtifactReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn id(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Response body of the create-run endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedRun {
    pub id: String,
}

/// Snapshot of a query run.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRun {
    /// Not every status response echoes the run id.
    #[serde(default)]
    pub id: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub result: Option<QueryRunResult>,
    /// Either a plain message or an error object with a `message` field.
    #[serde(default)]
    pub error: Option<serde_json::Value>,
}

/// Result section of a succeeded run.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRunResult {
    #[serde(default)]
    pub file: Option<FileField>,
}

/// The result file, either as a bare id or as an expanded file object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FileField {
    Id(String),
    Expanded { id: String },
}

impl QueryRun {
    /// Creates a pending run snapshot.
    pub fn pending(id: impl Into<String>) -> Self {
        Self::with_status(id, RunStatus::Pending)
    }

    /// Creates a succeeded run snapshot pointing at `file`.
    pub fn succeeded(id: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            result: Some(QueryRunResult {
                file: Some(FileField::Id(file.into())),
            }),
            ..Self::with_status(id, RunStatus::Succeeded)
        }
    }

    /// Creates a failed run snapshot with the given error message.
    pub fn failed(id: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            error: Some(serde_json::Value::String(detail.into())),
            ..Self::with_status(id, RunStatus::Failed)
        }
    }

    /// Creates a run snapshot with an arbitrary status.
    pub fn with_status(id: impl Into<String>, status: RunStatus) -> Self {
        Self {
            id: Some(id.into()),
            status,
            result: None,
            error: None,
        }
    }

    /// Returns the result file reference, if the run has one.
    pub fn artifact(&self) -> Option<ArtifactReference> {
        let file = self.result.as_ref()?.file.as_ref()?;
        let id = match file {
            FileField::Id(id) => id,
            FileField::Expanded { id } => id,
        };
        Some(ArtifactReference::new(id.clone()))
    }

    /// Returns the server's error detail as text.
    pub fn error_detail(&self) -> String {
        match &self.error {
            None | Some(serde_json::Value::Null) => "unknown error".to_string(),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(value) => value
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from)
                .unwrap_or_else(|| value.to_string()),
        }
    }
}

/// Metadata of a result file.
#[derive(Debug, Clone, Deserialize)]
pub struct FileMetadata {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl FileMetadata {
    /// Returns the signed download location.
    pub fn download_location(&self) -> Result<Url> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| SigmaError::protocol("File metadata has no download url"))?;

        Url::parse(url)
            .map_err(|e| SigmaError::protocol(format!("Invalid download url '{}': {}", url, e)))
    }
}
