use axum::body::Bytes;
use axum::extract::Multipart;
use futures::StreamExt;
use reqwest::{Client, Url};
use std::time::Duration;

use crate::error::{AppError, Stage, within};
use crate::types::InboundImage;

/// Form field and query parameter the image is read from.
pub const IMAGE_FIELD: &str = "image";

pub struct ImageFetcher {
    client: Client,
    max_bytes: usize,
}

impl ImageFetcher {
    pub fn new(client: Client, max_bytes: usize) -> Self {
        Self { client, max_bytes }
    }

    /// Download `uri`, refusing bodies larger than the configured limit.
    #[tracing::instrument(skip(self))]
    pub async fn fetch(&self, uri: &str) -> Result<Bytes, AppError> {
        let url = Url::parse(uri).map_err(|e| AppError::Fetch(format!("invalid URI: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(AppError::Fetch(format!(
                "unsupported scheme `{}`",
                url.scheme()
            )));
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| AppError::Fetch(e.without_url().to_string()))?;

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(AppError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::Fetch(e.without_url().to_string()))?;
            if body.len() + chunk.len() > self.max_bytes {
                return Err(AppError::TooLarge {
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        tracing::debug!(bytes = body.len(), "Fetched remote image");
        Ok(Bytes::from(body))
    }
}

/// Reads the first file part named `field_name`.
///
/// Parts without a filename are form values, not files, and are skipped. A
/// part with an empty filename and no content is what browsers submit for an
/// untouched file input, so it counts as absent too.
pub async fn read_upload(
    multipart: &mut Multipart,
    field_name: &str,
) -> Result<Option<Bytes>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(field_name) {
            continue;
        }
        let Some(file_name) = field.file_name().map(str::to_owned) else {
            continue;
        };

        let bytes = field.bytes().await?;
        if file_name.is_empty() && bytes.is_empty() {
            continue;
        }
        return Ok(Some(bytes));
    }
    Ok(None)
}

/// Resolves the request's image: multipart upload first, then the `image`
/// query parameter. `Ok(None)` means neither was supplied.
///
/// With `fetch_remote` unset a query URI is returned as a link with no bytes.
pub async fn extract_image(
    multipart: Option<Multipart>,
    query_uri: Option<&str>,
    fetch_remote: bool,
    fetcher: &ImageFetcher,
    deadline: Duration,
) -> Result<Option<InboundImage>, AppError> {
    if let Some(mut multipart) = multipart {
        if let Some(bytes) = read_upload(&mut multipart, IMAGE_FIELD).await? {
            tracing::debug!(bytes = bytes.len(), "Read uploaded image");
            return Ok(Some(InboundImage::uploaded(bytes)));
        }
    }

    match query_uri {
        Some(uri) if !fetch_remote => Ok(Some(InboundImage::linked(uri))),
        Some(uri) => {
            let bytes = within(Stage::ImageFetch, deadline, fetcher.fetch(uri)).await?;
            Ok(Some(InboundImage::fetched(uri, bytes)))
        }
        None => Ok(None),
    }
}
