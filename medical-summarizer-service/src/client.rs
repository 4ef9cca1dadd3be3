use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::info;

use crate::models::{AnalysisResult, UploadRequest};

pub const DEFAULT_ERROR_MESSAGE: &str = "Failed to analyze document";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The relay answered with a non-2xx status; `message` is its `error` field.
    #[error("{message}")]
    Relay { status: u16, message: String },

    #[error("Relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// HTTP client for the summarize endpoint.
#[derive(Debug, Clone)]
pub struct RelayClient {
    http: Client,
    url: String,
    bearer_token: Option<String>,
}

impl RelayClient {
    pub fn new(url: impl Into<String>, bearer_token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            url: url.into(),
            bearer_token,
        }
    }

    pub async fn analyze(&self, upload: &UploadRequest) -> Result<AnalysisResult, ClientError> {
        info!(file_name = %upload.file_name, url = %self.url, "Sending document to relay");

        let mut request = self.http.post(&self.url).json(upload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .json::<ErrorBody>()
                .await
                .ok()
                .and_then(|body| body.error)
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string());
            return Err(ClientError::Relay {
                status: status.as_u16(),
                message,
            });
        }

        let document: Value = response.json().await?;
        Ok(AnalysisResult::from_document(document))
    }
}
