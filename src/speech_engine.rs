use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::body::Bytes;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use clap::ValueEnum;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::engine::SpeechSynthesizer;
use crate::google::{GoogleAuth, endpoint_url, post_json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoiceGender {
    Female,
    Male,
    Neutral,
}

#[derive(Debug, Clone)]
pub struct VoiceConfig {
    pub language_code: String,
    pub gender: VoiceGender,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeSpeechRequest<'a> {
    input: SynthesisInput<'a>,
    voice: VoiceSelectionParams<'a>,
    audio_config: AudioConfig,
}

#[derive(Serialize)]
struct SynthesisInput<'a> {
    text: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VoiceSelectionParams<'a> {
    language_code: &'a str,
    ssml_gender: VoiceGender,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AudioConfig {
    audio_encoding: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesizeSpeechResponse {
    audio_content: String,
}

pub struct TextToSpeechSynthesizer {
    client: Client,
    auth: GoogleAuth,
    synthesize_url: String,
    voice: VoiceConfig,
}

impl TextToSpeechSynthesizer {
    pub fn new(client: Client, auth: GoogleAuth, endpoint: &str, voice: VoiceConfig) -> Self {
        let synthesize_url = endpoint_url(endpoint, "v1/text:synthesize");
        tracing::info!(%synthesize_url, ?voice, "Speech synthesizer configured");
        Self {
            client,
            auth,
            synthesize_url,
            voice,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for TextToSpeechSynthesizer {
    #[tracing::instrument(skip(self))]
    async fn synthesize(&self, text: &str) -> Result<Bytes> {
        let request = SynthesizeSpeechRequest {
            input: SynthesisInput { text },
            voice: VoiceSelectionParams {
                language_code: &self.voice.language_code,
                ssml_gender: self.voice.gender,
            },
            audio_config: AudioConfig {
                audio_encoding: "MP3",
            },
        };

        let response: SynthesizeSpeechResponse =
            post_json(&self.client, &self.auth, &self.synthesize_url, &request).await?;

        let audio = STANDARD
            .decode(response.audio_content)
            .context("audioContent is not valid base64")?;
        Ok(Bytes::from(audio))
    }
}
