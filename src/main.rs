mod automl_engine;
mod config;
mod engine;
mod error;
mod google;
mod image_source;
mod render;
mod server;
mod speech_engine;
mod types;
mod verdict;
mod vision_engine;

#[cfg(test)]
mod test_support;

use axum::routing::get;
use axum_prometheus::PrometheusMetricLayer;
use clap::Parser;
use std::sync::Arc;
use tokio::net::TcpListener;

use automl_engine::AutoMlClassifier;
use config::Config;
use google::GoogleAuth;
use image_source::ImageFetcher;
use server::AppState;
use speech_engine::TextToSpeechSynthesizer;
use vision_engine::VisionLabelDetector;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,hotdog=debug".into());
    if config.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    config.validate()?;
    tracing::info!(
        mode = ?config.response_mode,
        model = ?config.model_name().map(|m| m.to_string()),
        max_body_bytes = config.max_body_bytes,
        upstream_timeout_ms = config.upstream_timeout_ms,
        "Starting hotdog server"
    );

    // One connection pool shared by every outbound client
    let client = reqwest::Client::builder().build()?;
    let auth = GoogleAuth::new(config.access_token.clone(), config.api_key.clone());

    // Labels mode never classifies, so no model is required there
    let classifier = config.model_name().map(|model| {
        Arc::new(AutoMlClassifier::new(
            client.clone(),
            auth.clone(),
            &config.automl_endpoint,
            &model,
        )) as Arc<dyn engine::Classifier + Send + Sync>
    });

    let state = AppState {
        mode: config.response_mode,
        classifier,
        detector: Arc::new(VisionLabelDetector::new(
            client.clone(),
            auth.clone(),
            &config.vision_endpoint,
        )),
        speech: Arc::new(TextToSpeechSynthesizer::new(
            client.clone(),
            auth,
            &config.tts_endpoint,
            config.voice(),
        )),
        fetcher: Arc::new(ImageFetcher::new(client, config.max_body_bytes)),
        upstream_timeout: config.upstream_timeout(),
    };

    let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

    let app = server::router(state, config.max_body_bytes)
        .route("/metrics", get(|| async move { metric_handle.render() }))
        .layer(prometheus_layer);

    let listener = TcpListener::bind(&config.server_address()).await?;
    tracing::info!("Server running on http://{}", config.server_address());

    axum::serve(listener, app).await?;
    Ok(())
}
