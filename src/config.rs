use clap::{Parser, ValueEnum};
use std::time::Duration;

use crate::automl_engine::ModelName;
use crate::speech_engine::{VoiceConfig, VoiceGender};

/// What the handler writes back once an image has been processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ResponseMode {
    /// Upload form with the image and an auto-playing audio verdict
    Html,
    /// Raw MP3 of the spoken verdict
    Audio,
    /// Every detected label with its confidence, no verdict
    Labels,
}

impl ResponseMode {
    pub fn needs_classifier(self) -> bool {
        !matches!(self, ResponseMode::Labels)
    }
}

#[derive(Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Server host to bind to
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port to bind to
    #[arg(long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Response format served for every request
    #[arg(long, env = "RESPONSE_MODE", value_enum, default_value = "html")]
    pub response_mode: ResponseMode,

    /// Cloud project that owns the classification model
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: Option<String>,

    /// Region the classification model is deployed in
    #[arg(long, env = "LOCATION_ID", default_value = "us-central1")]
    pub location_id: String,

    /// AutoML classification model id
    #[arg(long, env = "MODEL_ID")]
    pub model_id: Option<String>,

    /// OAuth bearer token sent to every Google endpoint
    #[arg(long, env = "GOOGLE_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// API key sent as the `key` query parameter
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, env = "AUTOML_ENDPOINT", default_value = "https://automl.googleapis.com")]
    pub automl_endpoint: String,

    #[arg(long, env = "VISION_ENDPOINT", default_value = "https://vision.googleapis.com")]
    pub vision_endpoint: String,

    #[arg(long, env = "TTS_ENDPOINT", default_value = "https://texttospeech.googleapis.com")]
    pub tts_endpoint: String,

    /// BCP-47 language code of the synthesized voice
    #[arg(long, env = "VOICE_LANGUAGE", default_value = "en-US")]
    pub voice_language: String,

    #[arg(long, env = "VOICE_GENDER", value_enum, default_value = "female")]
    pub voice_gender: VoiceGender,

    /// Largest accepted upload or fetched image, in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "10485760")]
    pub max_body_bytes: usize,

    /// Deadline for each outbound call in milliseconds
    #[arg(long, env = "UPSTREAM_TIMEOUT_MS", default_value = "15000")]
    pub upstream_timeout_ms: u64,

    /// Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.response_mode.needs_classifier() && self.model_name().is_none() {
            anyhow::bail!(
                "--project-id and --model-id are required for {:?} responses",
                self.response_mode
            );
        }
        if self.access_token.is_none() && self.api_key.is_none() {
            anyhow::bail!("Either --access-token or --api-key must be provided");
        }
        if self.max_body_bytes == 0 {
            anyhow::bail!("--max-body-bytes must be greater than zero");
        }
        if self.upstream_timeout_ms == 0 {
            anyhow::bail!("--upstream-timeout-ms must be greater than zero");
        }
        Ok(())
    }

    pub fn model_name(&self) -> Option<ModelName> {
        Some(ModelName {
            project: self.project_id.clone()?,
            location: self.location_id.clone(),
            model: self.model_id.clone()?,
        })
    }

    pub fn voice(&self) -> VoiceConfig {
        VoiceConfig {
            language_code: self.voice_language.clone(),
            gender: self.voice_gender,
        }
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream_timeout_ms)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
