use axum::body::Bytes;

/// Where the request's image came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    /// Multipart file part
    Upload,
    /// `image` query parameter; bytes are only fetched when something needs them
    Url(String),
}

#[derive(Debug, Clone)]
pub struct InboundImage {
    pub bytes: Bytes,
    pub source: ImageSource,
}

impl InboundImage {
    pub fn uploaded(bytes: Bytes) -> Self {
        Self {
            bytes,
            source: ImageSource::Upload,
        }
    }

    pub fn fetched(uri: impl Into<String>, bytes: Bytes) -> Self {
        Self {
            bytes,
            source: ImageSource::Url(uri.into()),
        }
    }

    /// A URL image whose bytes were never downloaded.
    pub fn linked(uri: impl Into<String>) -> Self {
        Self::fetched(uri, Bytes::new())
    }

    pub fn uri(&self) -> Option<&str> {
        match &self.source {
            ImageSource::Url(uri) => Some(uri),
            ImageSource::Upload => None,
        }
    }
}

/// One ranked label returned by a classification or label-detection call.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: Option<f32>,
}

impl Prediction {
    #[cfg(test)]
    pub fn new(label: impl Into<String>, score: f32) -> Self {
        Self {
            label: label.into(),
            score: Some(score),
        }
    }
}
