//! Fraud Detection API - Main Entry Point
//!
//! Loads the ONNX classifier once and serves predictions over HTTP.
//! A missing or broken model does not stop the server; health reports it
//! and prediction requests fail with 503.

use anyhow::{Context, Result};
use fraud_detection_api::{
    api::{create_router, AppState},
    config::{AppConfig, LoggingConfig},
    metrics::{MetricsReporter, ServiceMetrics},
    models::{inference::InferenceEngine, loader::load_model},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = AppConfig::load()?;

    init_logging(&config.logging)?;

    info!("Starting Fraud Detection API");
    info!(
        model_path = %config.model.path,
        onnx_threads = config.model.onnx_threads,
        "Configuration loaded successfully"
    );

    // Load the model once; an absent handle keeps the service up
    let model = load_model(&config.model.path, config.model.onnx_threads);
    if model.is_loaded() {
        info!(model = ?model, "Model ready");
    } else {
        warn!("Serving without a model, predictions will return 503");
    }

    let metrics = Arc::new(ServiceMetrics::new());

    if config.metrics.report_interval_secs > 0 {
        let reporter = MetricsReporter::new(metrics.clone(), config.metrics.report_interval_secs);
        tokio::spawn(reporter.start());
    }

    let state = AppState::new(InferenceEngine::new(model), metrics.clone());
    let app = create_router(state);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // Print final summary
    info!("Fraud Detection API shutting down...");
    metrics.print_summary();

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(format!(
            "fraud_detection_api={level},tower_http={level}",
            level = logging.level
        ))
    })?;

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match logging.format.as_str() {
        "json" => builder.json().init(),
        _ => builder.init(),
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
