use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ai_client::Gemini;
use sentinel_common::{Config, MonitoringConfig, ALL_PLATFORMS};
use sentinel_monitor::{
    acquisition::GEMINI_MODEL, AcquisitionPipeline, MonitorController, MonitorState,
};

mod routes;

use routes::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Sentinel keyword monitor starting...");

    let config = Config::from_env()?;
    config.log_redacted();

    let gemini = config
        .gemini_api_key
        .as_deref()
        .map(|key| Gemini::new(key, GEMINI_MODEL));
    let pipeline = AcquisitionPipeline::new(gemini);

    let state = MonitorState::shared(MonitoringConfig {
        keywords: config.keywords.clone(),
        target_email: config.target_email.clone(),
        platforms: ALL_PLATFORMS.to_vec(),
        is_monitoring: false,
    });

    let controller = MonitorController::new(
        state.clone(),
        pipeline,
        Duration::from_secs(config.scan_interval_secs),
    );

    let app = Arc::new(AppState { state, controller });
    let router = routes::router(app);

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("Sentinel API listening on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
