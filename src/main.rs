use std::sync::Arc;
use std::time::Duration;
use tokio::time::{Interval, MissedTickBehavior};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{AppState, router};
use filler_core::{
    FillResult, FilledDocument, FillerConfig, GoogleSlidesStore, HttpRecordSource, RecordSource,
    TemplateFiller,
};

/// Main entry point for the slide filler
///
/// Runs the push trigger (REST) and, when `PULL_INTERVAL_SECS` is set, the scheduled
/// pull trigger concurrently. Both share one `TemplateFiller`.
///
/// # Environment Variables
/// - `FILLER_REST_ADDR`: REST server address (default: "0.0.0.0:3000")
/// - `PULL_INTERVAL_SECS`: period of the scheduled pull (disabled when unset)
/// - everything `FillerConfig` reads (`SLIDES_TEMPLATE_ID`, `GOOGLE_ACCESS_TOKEN`, ...)
///
/// # Returns
/// * `Ok(())` - If the servers start and run successfully
/// * `Err(anyhow::Error)` - If startup or the REST server fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slide_filler_run=info".parse()?)
                .add_directive("api_rest=info".parse()?)
                .add_directive("filler_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let rest_addr = std::env::var("FILLER_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let pull_interval = pull_interval(std::env::var("PULL_INTERVAL_SECS").ok())?;

    let cfg = Arc::new(FillerConfig::from_env()?);
    cfg.template_id()?;

    // Blocking HTTP clients are built off the runtime workers.
    let build_cfg = cfg.clone();
    let (store, source) = tokio::task::spawn_blocking(move || -> FillResult<_> {
        let store = GoogleSlidesStore::from_config(&build_cfg)?;
        let source = match pull_interval {
            Some(_) => Some(HttpRecordSource::from_config(&build_cfg)?),
            None => None,
        };
        Ok((store, source))
    })
    .await??;

    let filler = TemplateFiller::new(Arc::new(store));

    tracing::info!("++ Starting slide filler REST on {}", rest_addr);
    let rest_app = router(AppState::new(cfg.clone(), filler.clone()));
    let listener = tokio::net::TcpListener::bind(&rest_addr).await?;
    let rest_server = async move { axum::serve(listener, rest_app).await };

    let pull_job = async move {
        let (Some(period), Some(source)) = (pull_interval, source) else {
            return;
        };
        tracing::info!("++ Scheduled pull every {}s", period.as_secs());

        let source = Arc::new(source);
        let mut ticker = pull_ticker(period);
        loop {
            ticker.tick().await;
            match pull_once(cfg.clone(), filler.clone(), source.clone()).await {
                Ok(filled) => tracing::info!("Scheduled pull filled {}", filled.id),
                Err(e) => tracing::warn!("Scheduled pull failed: {:#}", e),
            }
        }
    };

    let (rest_result, ()) = tokio::join!(rest_server, pull_job);
    rest_result?;

    Ok(())
}

/// One full pull invocation: fetch the configured record and fill the template.
async fn pull_once(
    cfg: Arc<FillerConfig>,
    filler: TemplateFiller,
    source: Arc<HttpRecordSource>,
) -> anyhow::Result<FilledDocument> {
    let filled = tokio::task::spawn_blocking(move || {
        let record = source.fetch()?;
        filler.fill(&record, cfg.template_id()?, filler_core::local_today())
    })
    .await??;
    Ok(filled)
}

/// Ticks every `period`. A fill that overruns pushes the next tick back instead of
/// bursting, so one slow pull never produces back-to-back copies.
fn pull_ticker(period: Duration) -> Interval {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn pull_interval(raw: Option<String>) -> anyhow::Result<Option<Duration>> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    let secs: u64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("PULL_INTERVAL_SECS must be a positive integer, got {raw}"))?;
    if secs == 0 {
        anyhow::bail!("PULL_INTERVAL_SECS must be a positive integer, got {raw}");
    }
    Ok(Some(Duration::from_secs(secs)))
}
