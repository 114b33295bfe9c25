//! cardiorisk: Cardiovascular risk prediction service
//!
//! Main entry point for the HTTP server.

use std::sync::Arc;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cardiorisk::adapters::sanitize::SanitizingMakeWriter;
use cardiorisk::application::ArtifactPredictionService;
use cardiorisk::config::{Config, LogMode};
use cardiorisk::http;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    let (writer, _guard) = match &config.log_mode {
        LogMode::File(path) => {
            if let Some(parent) = path.parent() {
                // Best-effort: a missing directory surfaces as the open error below.
                let _ = std::fs::create_dir_all(parent);
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
        LogMode::Stdout => tracing_appender::non_blocking(std::io::stdout()),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(SanitizingMakeWriter::new(writer)))
        .init();

    tracing::info!("Starting cardiorisk...");

    let service = ArtifactPredictionService::load(&config.artifact_dir, &config.verify_options())
        .with_strict_columns(config.strict_columns);
    if !service.is_ready() {
        tracing::warn!("No model loaded: /predict will answer 503 until restart");
    }
    if config.strict_columns {
        tracing::info!("Strict column mode: scaler column mismatches fail without reindexing");
    }

    let cors = http::cors_layer(config.cors_origins.as_deref())?;
    let app = http::router(Arc::new(service), cors);
    http::serve(config.bind, app).await?;

    tracing::info!("cardiorisk shutdown complete.");
    Ok(())
}
