//! score-upload: HTTP service storing sheet music submissions.
use anyhow::{Context, Result};
use clap::Parser;
use score_upload::UploadOrchestrator;
use score_upload::aws_sdk;
use score_upload::client::{SdkClient, SqliteDocumentStore};
use score_upload::config::Config;
use score_upload::http::{self, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "score_upload=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::parse();
    config.validate()?;

    let objects = object_store(&config).await;
    info!(bucket = %config.bucket, prefix = %config.key_prefix(), "object store ready");

    let documents = SqliteDocumentStore::open(&config.database)
        .await
        .with_context(|| format!("failed to open {}", config.database.display()))?;
    info!(database = %config.database.display(), "document store ready");

    let orchestrator = UploadOrchestrator::builder(objects, documents)
        .collection(config.collection.clone())
        .timeouts(config.timeouts())
        .build();

    let state = AppState::new(orchestrator)
        .with_allow_origin(&config.allow_origin)?
        .with_body_limit(config.body_limit());
    let app = http::router(state);

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server shutdown complete");
    Ok(())
}

async fn object_store(config: &Config) -> SdkClient {
    let mut loader = score_upload::aws_config::from_env();
    if let Some(url) = &config.endpoint_url {
        loader = loader.endpoint_url(url);
    }
    let sdk_config = loader.load().await;

    // S3-compatible stores behind a custom endpoint rarely support virtual
    // hosted buckets.
    let s3_config = aws_sdk::config::Builder::from(&sdk_config)
        .force_path_style(config.endpoint_url.is_some())
        .build();
    let client = aws_sdk::Client::from_conf(s3_config);

    SdkClient::new(client, config.bucket.clone()).with_prefix(config.key_prefix())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received terminate signal, shutting down"),
    }
}
