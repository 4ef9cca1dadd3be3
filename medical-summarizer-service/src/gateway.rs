use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::{error::RelayError, prompt::ChatRequest};

/// Chat-completion backend the relay forwards documents to.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    /// Sends one completion request and returns the first choice's message text.
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, RelayError>;
}

#[derive(Debug, Default, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn first_content(self) -> String {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default()
    }
}

/// OpenAI-compatible gateway reached over HTTPS.
pub struct HttpGateway {
    client: Client,
    url: String,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RelayError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    async fn complete(&self, api_key: &str, request: &ChatRequest) -> Result<String, RelayError> {
        info!(model = %request.model, "Calling AI gateway");

        let response = self
            .client
            .post(&self.url)
            .header("Authorization", format!("Bearer {}", api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_upstream_status(status, response).await);
        }

        let body: ChatResponse = response.json().await?;
        let content = body.first_content();
        info!("AI gateway returned {} characters", content.len());
        Ok(content)
    }
}

async fn map_upstream_status(status: StatusCode, response: reqwest::Response) -> RelayError {
    match status {
        StatusCode::TOO_MANY_REQUESTS => {
            warn!("AI gateway rate limit hit");
            RelayError::RateLimited
        }
        StatusCode::PAYMENT_REQUIRED => {
            warn!("AI gateway usage limit reached");
            RelayError::UsageLimitReached
        }
        _ => {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "AI gateway error");
            RelayError::UpstreamFailed {
                status: status.as_u16(),
                body,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::UploadRequest;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn text_request() -> ChatRequest {
        ChatRequest::for_upload(
            "google/gemini-2.5-flash",
            &UploadRequest {
                content: "Hemoglobin: 10 g/dL".to_string(),
                file_name: "cbc.txt".to_string(),
                is_image: false,
            },
        )
    }

    async fn gateway_for(server: &MockServer) -> HttpGateway {
        HttpGateway::new(
            format!("{}/v1/chat/completions", server.uri()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn returns_first_choice_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [
                    { "message": { "content": "first" } },
                    { "message": { "content": "second" } }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = gateway_for(&server)
            .await
            .complete("test-key", &text_request())
            .await
            .unwrap();

        assert_eq!(content, "first");
    }

    #[tokio::test]
    async fn missing_choices_yield_empty_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
            .mount(&server)
            .await;

        let content = gateway_for(&server)
            .await
            .complete("test-key", &text_request())
            .await
            .unwrap();

        assert_eq!(content, "");
    }

    #[tokio::test]
    async fn upstream_statuses_are_translated() {
        for (upstream, expected) in [(429u16, 429u16), (402, 402), (500, 500), (503, 500), (401, 500)] {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(upstream).set_body_string("upstream detail"))
                .mount(&server)
                .await;

            let err = gateway_for(&server)
                .await
                .complete("test-key", &text_request())
                .await
                .unwrap_err();

            assert_eq!(err.status_code().as_u16(), expected, "upstream {upstream}");
        }
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "choices": [] }))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let gateway = HttpGateway::new(
            format!("{}/v1/chat/completions", server.uri()),
            Duration::from_millis(200),
        )
        .unwrap();
        let err = gateway
            .complete("test-key", &text_request())
            .await
            .unwrap_err();

        assert!(matches!(&err, RelayError::Transport(e) if e.is_timeout()));
    }
}
