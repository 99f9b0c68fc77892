//! Shared plumbing for the Google REST endpoints: credentials and the JSON
//! request/response round trip every client uses.

use anyhow::{Context, Result, bail};
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

#[derive(Debug, Clone, Default)]
pub struct GoogleAuth {
    access_token: Option<String>,
    api_key: Option<String>,
}

impl GoogleAuth {
    pub fn new(access_token: Option<String>, api_key: Option<String>) -> Self {
        Self {
            access_token,
            api_key,
        }
    }

    fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        request
    }
}

pub fn endpoint_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[tracing::instrument(skip(client, auth, body))]
pub async fn post_json<B, R>(client: &Client, auth: &GoogleAuth, url: &str, body: &B) -> Result<R>
where
    B: Serialize + ?Sized,
    R: DeserializeOwned,
{
    let response = auth
        .apply(client.post(url))
        .json(body)
        .send()
        .await
        .with_context(|| format!("POST {url}"))?;

    let status = response.status();
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        bail!("POST {url} returned {status}: {text}");
    }

    tracing::debug!(%status, "Upstream call succeeded");
    response
        .json()
        .await
        .with_context(|| format!("decoding response from {url}"))
}
