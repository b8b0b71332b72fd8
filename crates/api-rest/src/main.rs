//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the push trigger on its own.
//!
//! ## Intended use
//! Useful for development and debugging when only the REST server (with OpenAPI/Swagger
//! UI) is wanted. The workspace's main `slide-filler-run` binary also runs the scheduled
//! pull alongside it.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use filler_core::{FillerConfig, GoogleSlidesStore, TemplateFiller};

/// Main entry point for the slide filler REST API server
///
/// # Environment Variables
/// - `FILLER_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `SLIDES_TEMPLATE_ID`, `GOOGLE_ACCESS_TOKEN`: see `FillerConfig`
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the configuration is invalid or the Google store cannot be built,
/// - the server address cannot be bound, or
/// - the HTTP server fails while running.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("filler_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("FILLER_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let cfg = Arc::new(FillerConfig::from_env()?);
    cfg.template_id()?;

    // The blocking HTTP client must not be built on a runtime worker.
    let store_cfg = cfg.clone();
    let store = tokio::task::spawn_blocking(move || GoogleSlidesStore::from_config(&store_cfg))
        .await??;

    let state = AppState::new(cfg, TemplateFiller::new(Arc::new(store)));

    tracing::info!("-- Starting slide filler REST API on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router(state)).await?;

    Ok(())
}
