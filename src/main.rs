//! Currency Pulse: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, upstream clients, and metrics.

use anyhow::Context;
use shuttle_axum::ShuttleAxum;

use currency_pulse::metrics::Metrics;
use currency_pulse::{create_router, init_tracing, AppConfig, AppState};

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let cfg = AppConfig::from_env().context("loading app config")?;
    tracing::info!(
        stream_pair = %format!("{}→{}", cfg.stream.base, cfg.stream.quote),
        interval_secs = cfg.stream.interval_secs,
        "configuration loaded"
    );

    let state = AppState::from_config(cfg).context("building app state")?;
    let mut router = create_router(state);

    match Metrics::init() {
        Ok(m) => router = router.merge(m.router()),
        Err(e) => tracing::warn!(error = %format!("{e:#}"), "metrics disabled"),
    }

    Ok(router.into())
}
