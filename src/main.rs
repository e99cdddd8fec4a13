//! Theatre News Feed — Binary Entrypoint
//! Boots the Axum HTTP server, wiring configuration, collaborators, and routes.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stagefeed::api::{self, AppState};
use stagefeed::config::AppConfig;
use stagefeed::metrics::Metrics;

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - STAGEFEED_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("STAGEFEED_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("stagefeed=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    // Initialize dev tracing early (no-op in production).
    enable_dev_tracing();

    // Missing credentials or unreadable config must stop the boot here,
    // not surface later as per-request failures.
    let config = AppConfig::from_env().expect("Failed to load configuration");
    let metrics = Metrics::init(config.sources.len());
    let state = AppState::from_config(&config).expect("Failed to build app state");

    let router = api::create_router(state).merge(metrics.router());

    Ok(router.into())
}
