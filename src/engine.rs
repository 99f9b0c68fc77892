use crate::types::{InboundImage, Prediction};
use anyhow::Result;
use async_trait::async_trait;
use axum::body::Bytes;

/// Custom-trained classifier; predictions come back ranked by the service.
#[async_trait]
pub trait Classifier {
    async fn predict(&self, image: &InboundImage) -> Result<Vec<Prediction>>;
}

/// Generic label detector used as the fallback guess and for label listings.
#[async_trait]
pub trait LabelDetector {
    async fn detect_labels(&self, image: &InboundImage) -> Result<Vec<Prediction>>;
}

#[async_trait]
pub trait SpeechSynthesizer {
    /// Returns MP3-encoded audio of `text`.
    async fn synthesize(&self, text: &str) -> Result<Bytes>;
}
