use medical_summarizer_service::{RelayConfig, create_app};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// `LOG_FORMAT=pretty` for development, structured JSON otherwise.
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "medical_summarizer_service=info,tower_http=info".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RelayConfig::from_env()?;
    if let Err(e) = config.validate() {
        error!("Refusing to start: {}", e);
        std::process::exit(1);
    }

    let port = config.port;
    info!(
        model = %config.model,
        gateway = %config.gateway_url,
        timeout_secs = config.request_timeout.as_secs(),
        "Loaded relay configuration"
    );

    let app = create_app(config)?;
    let listener = TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    let addr = listener.local_addr()?;

    info!("Medical Document Summarizer starting on {}", addr);
    info!("Health check endpoint: http://{}/health", addr);
    info!("Analysis endpoint: POST http://{}/summarize-medical", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
