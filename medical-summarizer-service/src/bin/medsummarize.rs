use anyhow::Result;
use clap::Parser;
use medical_summarizer_service::{
    UploadRequest,
    client::RelayClient,
    report::{Report, ReportHistory},
    upload::collect_file,
};
use std::path::{Path, PathBuf};

/// Summarize medical documents through a running relay.
#[derive(Debug, Parser)]
#[command(name = "medsummarize", version)]
struct Args {
    /// Documents to analyze, one request per file
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Summarize endpoint of the relay
    #[arg(
        long,
        env = "MEDSUMMARIZE_RELAY_URL",
        default_value = "http://localhost:3000/summarize-medical"
    )]
    relay_url: String,

    /// Bearer token forwarded to the relay
    #[arg(long, env = "MEDSUMMARIZE_TOKEN")]
    token: Option<String>,

    /// MIME type to use instead of guessing from the extension
    #[arg(long)]
    mime: Option<String>,

    /// Print one line per parameter instead of the full report
    #[arg(long)]
    plain: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .init();

    let args = Args::parse();
    let client = RelayClient::new(args.relay_url.clone(), args.token.clone());
    let mut history = ReportHistory::new();
    let mut failures = 0;

    for path in &args.files {
        eprint!("Analyzing document {}...", path.display());
        let outcome = analyze(&client, path, args.mime.as_deref()).await;
        eprint!("\r\x1b[2K");

        match outcome {
            Ok(report) => history.record(report),
            Err(e) => {
                failures += 1;
                eprintln!("Error ({}): {}", path.display(), e);
            }
        }
    }

    for report in history.iter() {
        if args.plain {
            println!("{}", report.copy_text());
        } else {
            println!("{}", report.render());
        }
    }

    if history.is_empty() && failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn analyze(client: &RelayClient, path: &Path, mime: Option<&str>) -> Result<Report> {
    let upload = collect_file(path, mime).await?;
    let file_name = upload.file_name.clone();
    let data = client.analyze(&UploadRequest::from(upload)).await?;
    Ok(Report::new(data, file_name))
}
