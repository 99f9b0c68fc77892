use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Outbound step of the pipeline, used to label failures and timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ImageFetch,
    Classification,
    LabelDetection,
    SpeechSynthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::ImageFetch => "image fetch",
            Stage::Classification => "classification",
            Stage::LabelDetection => "label detection",
            Stage::SpeechSynthesis => "speech synthesis",
        })
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("\"image\" is required for this request")]
    MissingImage,

    #[error("invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("image exceeds {limit} bytes")]
    TooLarge { limit: usize },

    #[error("failed to fetch image: {0}")]
    Fetch(String),

    #[error("{stage} request failed: {error:#}")]
    Upstream { stage: Stage, error: anyhow::Error },

    #[error("{stage} timed out after {}ms", .after.as_millis())]
    Timeout { stage: Stage, after: Duration },
}

impl AppError {
    pub fn upstream(stage: Stage) -> impl FnOnce(anyhow::Error) -> Self {
        move |error| AppError::Upstream { stage, error }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingImage => StatusCode::BAD_REQUEST,
            AppError::Multipart(err) => err.status(),
            AppError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Fetch(_) | AppError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn body(&self) -> String {
        match self {
            // Upstream details can carry request URLs; keep them in the logs only.
            AppError::Upstream { stage, .. } => format!("{stage} request failed"),
            AppError::Multipart(err) => err.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, %status, "Request failed");
        } else {
            tracing::warn!(error = %self, %status, "Request rejected");
        }
        (status, self.body()).into_response()
    }
}

/// Run `fut` under `deadline`, mapping an elapsed deadline to [`AppError::Timeout`].
pub async fn within<T, F>(stage: Stage, deadline: Duration, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout {
            stage,
            after: deadline,
        }),
    }
}
