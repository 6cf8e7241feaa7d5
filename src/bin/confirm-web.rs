//! Web review form for booking-confirm.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use booking_confirm::web::{self, AppState};
use booking_confirm::{TransformConfig, Transformer, WebConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = WebConfig::from_env(|| {
        tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
        format!("{}{}", uuid::Uuid::new_v4().simple(), uuid::Uuid::new_v4().simple())
    });

    let output_dir = std::env::var("OUTPUT_DIR").unwrap_or_else(|_| "output".to_string());
    let transform_config = TransformConfig::builder()
        .output_dir(output_dir)
        .build()
        .context("Invalid configuration")?;
    let transformer = Transformer::from_config(transform_config).context("LLM provider setup failed")?;

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("Cannot create upload directory {}", config.upload_dir.display()))?;

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(?config, "starting server on {addr}");

    let app = web::router(Arc::new(AppState::new(transformer, config)));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
