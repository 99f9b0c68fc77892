//! Fakes and helpers shared by the unit tests.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, Bytes};
use axum::http::{Request, header};
use axum::response::Response;
use std::sync::Mutex;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::engine::{Classifier, LabelDetector, SpeechSynthesizer};
use crate::types::{InboundImage, Prediction};

const BOUNDARY: &str = "hotdog-test-boundary";

/// Serves `app` on an ephemeral local port and returns its base URL.
pub async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// POST with a single multipart part. `file_name: None` makes it a plain form value.
pub fn multipart_request(
    uri: &str,
    field: &str,
    file_name: Option<&str>,
    bytes: &[u8],
) -> Request<Body> {
    let disposition = match file_name {
        Some(file_name) => format!("form-data; name=\"{field}\"; filename=\"{file_name}\""),
        None => format!("form-data; name=\"{field}\""),
    };
    let mut body = format!(
        "--{BOUNDARY}\r\nContent-Disposition: {disposition}\r\nContent-Type: application/octet-stream\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn read_body(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub struct MockClassifier {
    predictions: std::result::Result<Vec<Prediction>, String>,
    delay: Option<Duration>,
    seen: Mutex<Vec<Vec<u8>>>,
}

impl MockClassifier {
    pub fn returning(predictions: Vec<Prediction>) -> Self {
        Self {
            predictions: Ok(predictions),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            predictions: Err(message.to_string()),
            ..Self::returning(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen_bytes(&self) -> Vec<Vec<u8>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    async fn predict(&self, image: &InboundImage) -> Result<Vec<Prediction>> {
        self.seen.lock().unwrap().push(image.bytes.to_vec());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.predictions.clone().map_err(|e| anyhow!(e))
    }
}

pub struct MockDetector {
    labels: std::result::Result<Vec<Prediction>, String>,
    delay: Option<Duration>,
    seen: Mutex<Vec<Option<String>>>,
}

impl MockDetector {
    pub fn returning(labels: Vec<Prediction>) -> Self {
        Self {
            labels: Ok(labels),
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            labels: Err(message.to_string()),
            ..Self::returning(Vec::new())
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn seen_uris(&self) -> Vec<Option<String>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl LabelDetector for MockDetector {
    async fn detect_labels(&self, image: &InboundImage) -> Result<Vec<Prediction>> {
        self.seen
            .lock()
            .unwrap()
            .push(image.uri().map(str::to_owned));
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.labels.clone().map_err(|e| anyhow!(e))
    }
}

pub struct MockSpeech {
    audio: std::result::Result<Bytes, String>,
    delay: Option<Duration>,
    texts: Mutex<Vec<String>>,
}

impl MockSpeech {
    pub fn new(audio: &'static [u8]) -> Self {
        Self {
            audio: Ok(Bytes::from_static(audio)),
            delay: None,
            texts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            audio: Err(message.to_string()),
            ..Self::new(b"")
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        self.texts.lock().unwrap().push(text.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.audio.clone().map_err(|e| anyhow!(e))
    }
}
