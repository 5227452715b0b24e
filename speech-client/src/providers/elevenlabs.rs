//! ElevenLabs API provider
//!
//! Direct HTTP implementation of the text-to-speech endpoint. The service
//! answers with MP3 audio.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, RETRY_AFTER};
use serde::Serialize;
use std::time::Duration;

use crate::config::{ProviderConfig, VoiceSettings};
use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, SpeechRequest};
use super::API_KEY_ENV_VAR;

/// Provider for the ElevenLabs text-to-speech API
pub struct ElevenLabsProvider {
    base_url: String,
    api_key: Option<String>,
    require_api_key: bool,
    voice_settings: VoiceSettings,
    client: Client,
}

impl ElevenLabsProvider {
    /// Create a new ElevenLabs provider
    pub fn new(config: &ProviderConfig, api_key: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| SpeechError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            require_api_key: config.require_api_key,
            voice_settings: config.voice_settings.clamped(),
            client,
        })
    }

    fn endpoint(&self, voice_id: &str) -> String {
        let url = format!("{}/v1/text-to-speech/{}", self.base_url, voice_id);
        if self.api_key.is_some() {
            url
        } else {
            format!("{}?allow_unauthenticated=1", url)
        }
    }
}

// ElevenLabs API request types

#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

/// Pull a readable message out of an error body.
///
/// The API reports `{"detail": {"status": ..., "message": ...}}`, sometimes
/// `{"detail": "..."}`; anything else is returned verbatim.
fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("detail") {
        Some(serde_json::Value::String(detail)) => detail.clone(),
        Some(detail) => {
            let status = detail.get("status").and_then(|s| s.as_str());
            let message = detail.get("message").and_then(|m| m.as_str());
            match (status, message) {
                (Some(status), Some(message)) => format!("{}: {}", status, message),
                (None, Some(message)) => message.to_string(),
                _ => detail.to_string(),
            }
        }
        None => body.trim().to_string(),
    }
}

#[async_trait]
impl SpeechProvider for ElevenLabsProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        if self.require_api_key && self.api_key.is_none() {
            return Err(SpeechError::MissingApiKey {
                provider: self.name().to_string(),
                env_var: API_KEY_ENV_VAR.to_string(),
            });
        }

        let body = SpeechBody {
            text: request.text.trim(),
            model_id: &request.model_id,
            voice_settings: self.voice_settings,
        };

        log::debug!(
            "POST text-to-speech voice={} model={} chars={}",
            request.voice_id,
            request.model_id,
            body.text.chars().count()
        );

        let mut builder = self
            .client
            .post(self.endpoint(&request.voice_id))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "audio/mpeg");
        if let Some(key) = &self.api_key {
            builder = builder.header("xi-api-key", key);
        }

        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| SpeechError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse().ok());
                return Err(SpeechError::RateLimited { retry_after });
            }

            let error_text = response.text().await.unwrap_or_default();
            log::warn!("Server response ({}): {}", status, error_text);
            return Err(SpeechError::ApiError {
                message: error_message(&error_text),
                status_code: Some(status.as_u16()),
            });
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| SpeechError::Request(format!("Failed to read audio body: {}", e)))?;

        if audio.is_empty() {
            return Err(SpeechError::EmptyAudio);
        }

        log::debug!("Received audio data of size: {}", audio.len());
        Ok(audio.to_vec())
    }

    fn name(&self) -> &'static str {
        "ElevenLabs"
    }
}
