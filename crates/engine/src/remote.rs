//! Remote progress service.
//!
//! A single JSON-over-HTTP endpoint dispatching on an `action` field:
//!
//! ```text
//! { "action": "get_progress",    "userId": ... }                -> { "success", "data"? }
//! { "action": "update_progress", "userId": ..., "progress": ... } -> { "success" }
//! ```

use std::time::Duration;
use async_trait::async_trait;
use pathtrack_core::{ProgressDocument, UserId};
use reqwest::{Client, ClientBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

/// Error type for remote operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors talking to the remote progress service.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Network failure, timeout, or unreadable HTTP response
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status
    #[error("remote service returned status {0}")]
    Status(u16),

    /// The service answered but reported failure
    #[error("remote service rejected the request: {0}")]
    Rejected(String),

    /// The returned document failed shape validation
    #[error("malformed remote document: {0}")]
    MalformedRemoteDocument(String),
}

impl SyncError {
    /// Whether this is a "remote unavailable" failure rather than bad data.
    pub fn is_unavailable(&self) -> bool {
        !matches!(self, SyncError::MalformedRemoteDocument(_))
    }
}

/// Remote copy of a user's progress.
#[async_trait]
pub trait RemoteProgressService: Send + Sync {
    /// Fetch the remote document, `None` if the service has none.
    async fn fetch(&self, user: &UserId) -> Result<Option<ProgressDocument>>;

    /// Overwrite the remote document.
    async fn store(&self, user: &UserId, doc: &ProgressDocument) -> Result<()>;
}

/// HTTP client for the remote progress service.
#[derive(Clone)]
pub struct HttpRemote {
    /// HTTP client
    client: Client,

    /// Service URL
    endpoint: String,
}

impl HttpRemote {
    /// Create a client for `endpoint`.
    ///
    /// Falls back to a default client, without the timeout, if the
    /// configured one cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = match ClientBuilder::new().timeout(timeout).build() {
            Ok(client) => client,
            Err(e) => {
                warn!("Failed to build HTTP client with {:?} timeout, using defaults: {}", timeout, e);
                Client::default()
            }
        };
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Service URL.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn call(&self, payload: serde_json::Value) -> Result<String> {
        let response = self.client.post(&self.endpoint).json(&payload).send().await?;

        if !response.status().is_success() {
            return Err(SyncError::Status(response.status().as_u16()));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl RemoteProgressService for HttpRemote {
    async fn fetch(&self, user: &UserId) -> Result<Option<ProgressDocument>> {
        debug!("Pulling progress for {}", user);
        let body = self
            .call(json!({ "action": "get_progress", "userId": user }))
            .await?;
        parse_pull_response(&body)
    }

    async fn store(&self, user: &UserId, doc: &ProgressDocument) -> Result<()> {
        debug!("Pushing progress for {}", user);
        let body = self
            .call(json!({ "action": "update_progress", "userId": user, "progress": doc }))
            .await?;
        parse_push_response(&body)
    }
}

#[derive(Deserialize)]
struct PullResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Deserialize)]
struct PushResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Interpret a `get_progress` response body.
///
/// `success: false` or absent `data` means the service holds nothing for
/// this user. Data that does not form a valid document is an error.
pub fn parse_pull_response(body: &str) -> Result<Option<ProgressDocument>> {
    let response: PullResponse = serde_json::from_str(body)
        .map_err(|e| SyncError::MalformedRemoteDocument(e.to_string()))?;

    match response.data {
        Some(data) if response.success && !data.is_null() => parse_document(data).map(Some),
        _ => Ok(None),
    }
}

/// Interpret an `update_progress` response body.
pub fn parse_push_response(body: &str) -> Result<()> {
    let response: PushResponse = serde_json::from_str(body)
        .map_err(|e| SyncError::Rejected(format!("unreadable response: {}", e)))?;

    if response.success {
        Ok(())
    } else {
        Err(SyncError::Rejected(
            response
                .error
                .or(response.message)
                .unwrap_or_else(|| "success: false".to_string()),
        ))
    }
}

/// Shape-check a document received from the service.
pub fn parse_document(data: serde_json::Value) -> Result<ProgressDocument> {
    let doc: ProgressDocument = serde_json::from_value(data)
        .map_err(|e| SyncError::MalformedRemoteDocument(e.to_string()))?;
    doc.validate()
        .map_err(|e| SyncError::MalformedRemoteDocument(e.to_string()))?;
    Ok(doc)
}
