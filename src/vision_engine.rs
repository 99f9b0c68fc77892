use anyhow::{Result, anyhow, bail};
use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::engine::LabelDetector;
use crate::google::{GoogleAuth, endpoint_url, post_json};
use crate::types::{InboundImage, Prediction};

const LABEL_DETECTION: &str = "LABEL_DETECTION";

#[derive(Serialize)]
struct BatchAnnotateImagesRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Serialize)]
struct AnnotateImageRequest<'a> {
    image: VisionImage<'a>,
    features: [Feature; 1],
}

/// Either inline content or a URI the service fetches itself.
#[derive(Serialize)]
#[serde(untagged)]
enum VisionImage<'a> {
    Content { content: String },
    Source { source: ImageSource<'a> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageSource<'a> {
    image_uri: &'a str,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct BatchAnnotateImagesResponse {
    #[serde(default)]
    responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateImageResponse {
    #[serde(default)]
    label_annotations: Vec<EntityAnnotation>,
    #[serde(default)]
    error: Option<Status>,
}

#[derive(Debug, Deserialize)]
struct EntityAnnotation {
    description: String,
    #[serde(default)]
    score: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct Status {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

pub struct VisionLabelDetector {
    client: Client,
    auth: GoogleAuth,
    annotate_url: String,
}

impl VisionLabelDetector {
    pub fn new(client: Client, auth: GoogleAuth, endpoint: &str) -> Self {
        let annotate_url = endpoint_url(endpoint, "v1/images:annotate");
        tracing::info!(%annotate_url, "Vision label detector configured");
        Self {
            client,
            auth,
            annotate_url,
        }
    }
}

#[async_trait]
impl LabelDetector for VisionLabelDetector {
    #[tracing::instrument(skip(self, image), fields(uri = image.uri()))]
    async fn detect_labels(&self, image: &InboundImage) -> Result<Vec<Prediction>> {
        let image = match image.uri() {
            Some(image_uri) => VisionImage::Source {
                source: ImageSource { image_uri },
            },
            None => VisionImage::Content {
                content: STANDARD.encode(&image.bytes),
            },
        };
        let request = BatchAnnotateImagesRequest {
            requests: [AnnotateImageRequest {
                image,
                features: [Feature {
                    kind: LABEL_DETECTION,
                }],
            }],
        };

        let response: BatchAnnotateImagesResponse =
            post_json(&self.client, &self.auth, &self.annotate_url, &request).await?;

        let annotated = response
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("label detection returned no response"))?;
        if let Some(status) = annotated.error {
            bail!("label detection failed ({}): {}", status.code, status.message);
        }

        tracing::debug!(labels = annotated.label_annotations.len(), "Labels detected");
        Ok(annotated
            .label_annotations
            .into_iter()
            .map(|label| Prediction {
                label: label.description,
                score: label.score,
            })
            .collect())
    }
}
