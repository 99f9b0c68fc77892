use axum::{
    Router,
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{Method, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::config::ResponseMode;
use crate::engine::{Classifier, LabelDetector, SpeechSynthesizer};
use crate::error::{AppError, Stage, within};
use crate::image_source::{self, ImageFetcher};
use crate::render;
use crate::types::{InboundImage, Prediction};
use crate::verdict;

#[derive(Clone)]
pub struct AppState {
    pub mode: ResponseMode,
    /// Unset in labels mode, which never classifies
    pub classifier: Option<Arc<dyn Classifier + Send + Sync>>,
    pub detector: Arc<dyn LabelDetector + Send + Sync>,
    pub speech: Arc<dyn SpeechSynthesizer + Send + Sync>,
    pub fetcher: Arc<ImageFetcher>,
    pub upstream_timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    image: Option<String>,
}

pub fn router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(hotdog_handler).post(hotdog_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[tracing::instrument(
    skip(state, query, multipart),
    fields(request_id = %uuid::Uuid::new_v4().simple(), mode = ?state.mode)
)]
async fn hotdog_handler(
    State(state): State<AppState>,
    method: Method,
    Query(query): Query<ImageQuery>,
    multipart: Option<Multipart>,
) -> Result<Response, AppError> {
    // Label detection reads URL images itself; only the classifier needs bytes
    let image = image_source::extract_image(
        multipart,
        query.image.as_deref(),
        state.mode.needs_classifier(),
        &state.fetcher,
        state.upstream_timeout,
    )
    .await?;

    let Some(image) = image else {
        counter!("hotdog_requests_total", "outcome" => "missing_image").increment(1);
        return missing_image(state.mode, &method);
    };

    match state.mode {
        ResponseMode::Labels => {
            let labels = detect_labels(&state, &image).await?;
            counter!("hotdog_requests_total", "outcome" => "labels").increment(1);
            Ok(Html(render::label_list(&labels)).into_response())
        }
        ResponseMode::Audio => {
            let audio = spoken_verdict(&state, &image).await?;
            Ok(render::audio_response(audio))
        }
        ResponseMode::Html => {
            let audio = spoken_verdict(&state, &image).await?;
            Ok(Html(render::page(Some(&image), Some(&audio))).into_response())
        }
    }
}

/// A `GET` with no image is the initial page view; anything else without an
/// image is a bad request.
fn missing_image(mode: ResponseMode, method: &Method) -> Result<Response, AppError> {
    match mode {
        ResponseMode::Html if *method == Method::GET => {
            Ok(Html(render::page(None, None)).into_response())
        }
        ResponseMode::Html => {
            tracing::warn!(%method, "No image supplied");
            Ok((StatusCode::BAD_REQUEST, Html(render::page(None, None))).into_response())
        }
        ResponseMode::Audio | ResponseMode::Labels => Err(AppError::MissingImage),
    }
}

async fn spoken_verdict(
    state: &AppState,
    image: &InboundImage,
) -> Result<axum::body::Bytes, AppError> {
    let message = verdict_message(state, image).await?;

    let audio = within(Stage::SpeechSynthesis, state.upstream_timeout, async {
        state
            .speech
            .synthesize(&message)
            .await
            .map_err(AppError::upstream(Stage::SpeechSynthesis))
    })
    .await?;

    tracing::info!(response_length = audio.len(), "Synthesized verdict");
    Ok(audio)
}

async fn verdict_message(state: &AppState, image: &InboundImage) -> Result<String, AppError> {
    let classifier = state.classifier.as_ref().ok_or_else(|| {
        AppError::upstream(Stage::Classification)(anyhow::anyhow!(
            "no classification model configured"
        ))
    })?;

    let predictions = within(Stage::Classification, state.upstream_timeout, async {
        classifier
            .predict(image)
            .await
            .map_err(AppError::upstream(Stage::Classification))
    })
    .await?;

    if verdict::is_hotdog(&predictions) {
        counter!("hotdog_requests_total", "outcome" => "hotdog").increment(1);
        return Ok(verdict::HOTDOG_MESSAGE.to_string());
    }

    tracing::debug!(top = ?predictions.first(), "Not a hotdog, asking label detection");
    counter!("hotdog_requests_total", "outcome" => "not_hotdog").increment(1);
    let labels = detect_labels(state, image).await?;
    Ok(verdict::best_guess_message(&labels))
}

async fn detect_labels(
    state: &AppState,
    image: &InboundImage,
) -> Result<Vec<Prediction>, AppError> {
    within(Stage::LabelDetection, state.upstream_timeout, async {
        state
            .detector
            .detect_labels(image)
            .await
            .map_err(AppError::upstream(Stage::LabelDetection))
    })
    .await
}
