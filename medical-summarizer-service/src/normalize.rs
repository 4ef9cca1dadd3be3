use axum::{
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde_json::value::RawValue;

use crate::models::AnalysisResult;

/// Outcome of normalizing a model reply.
#[derive(Debug)]
pub enum Analysis {
    /// Valid JSON, kept byte-for-byte as the model produced it.
    Structured(Box<RawValue>),
    /// Anything that did not parse; holds the untouched model text.
    RawFallback(String),
}

impl Analysis {
    pub fn from_model_output(raw: &str) -> Self {
        match serde_json::from_str::<Box<RawValue>>(strip_code_fence(raw)) {
            Ok(document) => Analysis::Structured(document),
            Err(_) => Analysis::RawFallback(raw.to_string()),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Analysis::RawFallback(_))
    }
}

impl IntoResponse for Analysis {
    fn into_response(self) -> Response {
        match self {
            Analysis::Structured(document) => (
                [(header::CONTENT_TYPE, "application/json")],
                document.get().to_owned(),
            )
                .into_response(),
            Analysis::RawFallback(text) => Json(AnalysisResult::raw_fallback(text)).into_response(),
        }
    }
}

/// Removes a surrounding markdown code fence (```` ```json ```` or bare ```` ``` ````).
///
/// Input without a leading fence is only trimmed.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.strip_suffix('\n').unwrap_or(rest)
}
