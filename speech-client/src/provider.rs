use async_trait::async_trait;

use crate::error::Result;

/// Request to send to a speech provider
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
}

impl SpeechRequest {
    pub fn new(
        text: impl Into<String>,
        voice_id: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            voice_id: voice_id.into(),
            model_id: model_id.into(),
        }
    }
}

/// Trait for speech synthesis providers
#[async_trait]
pub trait SpeechProvider: Send + Sync {
    /// Synthesize the request and return the raw encoded audio bytes
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>>;

    /// Get the provider name for display
    fn name(&self) -> &'static str;
}
