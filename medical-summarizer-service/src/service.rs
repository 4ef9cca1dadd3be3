use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, State, rejection::BytesRejection},
    http::{
        HeaderName, HeaderValue, Method, Request,
        header::ACCESS_CONTROL_ALLOW_HEADERS,
    },
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post},
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{
    cors::{AllowHeaders, Any, CorsLayer},
    set_header::SetResponseHeaderLayer,
    trace::TraceLayer,
};
use tracing::{Instrument, info, warn};
use uuid::Uuid;

use crate::{
    config::RelayConfig,
    error::RelayError,
    gateway::{CompletionGateway, HttpGateway},
    models::UploadRequest,
    normalize::Analysis,
    prompt::ChatRequest,
};

/// Request headers browsers may send cross-origin, including client platform metadata.
pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type, x-supabase-client-platform, x-supabase-client-platform-version, x-supabase-client-runtime, x-supabase-client-runtime-version";

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub gateway: Arc<dyn CompletionGateway>,
}

impl AppState {
    pub fn new(config: RelayConfig, gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            config: Arc::new(config),
            gateway,
        }
    }
}

pub fn create_app(config: RelayConfig) -> Result<Router, RelayError> {
    let gateway = HttpGateway::new(config.gateway_url.clone(), config.request_timeout)?;
    Ok(build_router(AppState::new(config, Arc::new(gateway))))
}

pub fn build_router(app_state: AppState) -> Router {
    let max_body_bytes = app_state.config.max_body_bytes;

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/summarize-medical", post(summarize))
        .route("/summarize", post(summarize))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(from_fn(correlation_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(SetResponseHeaderLayer::if_not_present(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .with_state(app_state)
}

/// Any origin may call the relay. Pre-flight `OPTIONS` requests are answered here
/// and never reach a handler.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list(
            ALLOWED_HEADERS.split(", ").map(HeaderName::from_static),
        ))
}

async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

async fn root() -> Json<Value> {
    Json(json!({
        "service": "Medical Document Summarizer",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Relays medical documents to an AI gateway and returns structured clinical parameters",
        "endpoints": {
            "POST /summarize-medical": "Analyze a text or image document",
            "POST /summarize": "Alias of /summarize-medical",
            "GET /health": "Health check"
        }
    }))
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn summarize(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Analysis, RelayError> {
    let api_key = state.config.api_key()?;
    // Decoded regardless of Content-Type; browser clients may send text/plain.
    let body = body.map_err(|e| RelayError::InvalidRequest(e.body_text()))?;
    let upload: UploadRequest = serde_json::from_slice(&body)
        .map_err(|e| RelayError::InvalidRequest(e.to_string()))?;

    info!(
        file_name = %upload.file_name,
        is_image = upload.is_image,
        content_length = upload.content.len(),
        "Analyzing medical document"
    );

    let request = ChatRequest::for_upload(&state.config.model, &upload);
    let content = state.gateway.complete(api_key, &request).await?;

    let analysis = Analysis::from_model_output(&content);
    if analysis.is_fallback() {
        warn!(
            file_name = %upload.file_name,
            "Model reply was not JSON, returning raw text"
        );
    }
    Ok(analysis)
}
