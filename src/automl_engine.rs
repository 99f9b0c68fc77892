use anyhow::Result;
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::Classifier;
use crate::google::{GoogleAuth, endpoint_url, post_json};
use crate::types::{InboundImage, Prediction};

/// Fully qualified AutoML model: project, location and model id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelName {
    pub project: String,
    pub location: String,
    pub model: String,
}

impl fmt::Display for ModelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/models/{}",
            self.project, self.location, self.model
        )
    }
}

#[derive(Serialize)]
struct PredictRequest {
    payload: ExamplePayload,
}

#[derive(Serialize)]
struct ExamplePayload {
    image: ImagePayload,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagePayload {
    image_bytes: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    payload: Vec<AnnotationPayload>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationPayload {
    display_name: String,
    #[serde(default)]
    classification: Option<ClassificationAnnotation>,
}

#[derive(Debug, Deserialize)]
struct ClassificationAnnotation {
    #[serde(default)]
    score: Option<f32>,
}

impl From<AnnotationPayload> for Prediction {
    fn from(annotation: AnnotationPayload) -> Self {
        Prediction {
            label: annotation.display_name,
            score: annotation.classification.and_then(|c| c.score),
        }
    }
}

pub struct AutoMlClassifier {
    client: Client,
    auth: GoogleAuth,
    predict_url: String,
}

impl AutoMlClassifier {
    pub fn new(client: Client, auth: GoogleAuth, endpoint: &str, model: &ModelName) -> Self {
        let predict_url = endpoint_url(endpoint, &format!("v1/{model}:predict"));
        tracing::info!(%predict_url, "AutoML classifier configured");
        Self {
            client,
            auth,
            predict_url,
        }
    }
}

#[async_trait]
impl Classifier for AutoMlClassifier {
    #[tracing::instrument(skip(self, image), fields(image_bytes = image.bytes.len()))]
    async fn predict(&self, image: &InboundImage) -> Result<Vec<Prediction>> {
        let request = PredictRequest {
            payload: ExamplePayload {
                image: ImagePayload {
                    image_bytes: STANDARD.encode(&image.bytes),
                },
            },
        };

        let response: PredictResponse =
            post_json(&self.client, &self.auth, &self.predict_url, &request).await?;

        tracing::debug!(predictions = response.payload.len(), "Prediction received");
        Ok(response.payload.into_iter().map(Prediction::from).collect())
    }
}
