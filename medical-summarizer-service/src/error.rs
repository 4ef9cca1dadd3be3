use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub const RATE_LIMIT_MESSAGE: &str = "Rate limit exceeded. Please try again in a moment.";
pub const USAGE_LIMIT_MESSAGE: &str = "AI usage limit reached. Please add credits in Settings.";
pub const ANALYSIS_FAILED_MESSAGE: &str = "AI analysis failed";

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("{}", RATE_LIMIT_MESSAGE)]
    RateLimited,

    #[error("{}", USAGE_LIMIT_MESSAGE)]
    UsageLimitReached,

    #[error("AI gateway returned {status}: {body}")]
    UpstreamFailed { status: u16, body: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    InvalidRequest(String),
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            RelayError::UsageLimitReached => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the caller. Upstream failure detail stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            RelayError::UpstreamFailed { .. } => ANALYSIS_FAILED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        if !matches!(self, RelayError::RateLimited | RelayError::UsageLimitReached) {
            error!(error = %self, "Summarize request failed");
        }
        let body = Json(json!({ "error": self.public_message() }));
        (self.status_code(), body).into_response()
    }
}
