//! Synthesis adapter: text in, raw audio out.

use crate::config::VoiceMap;
use crate::text::LanguageClassifier;
use async_trait::async_trait;
use speech_client::{SpeechError, SpeechProvider, SpeechRequest};

/// What the dispatcher needs from the synthesis side.
#[async_trait]
pub trait Synthesize: Send + Sync {
    /// Synthesize one chunk of text to encoded audio bytes.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

#[async_trait]
impl<T: Synthesize + ?Sized> Synthesize for Box<T> {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        (**self).synthesize(text).await
    }
}

/// Picks a voice per chunk and forwards to a speech provider.
pub struct VoicedSynthesizer {
    provider: Box<dyn SpeechProvider>,
    classifier: Box<dyn LanguageClassifier>,
    voices: VoiceMap,
    model_id: String,
}

impl VoicedSynthesizer {
    pub fn new(
        provider: Box<dyn SpeechProvider>,
        classifier: Box<dyn LanguageClassifier>,
        voices: VoiceMap,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            classifier,
            voices,
            model_id: model_id.into(),
        }
    }

    /// Build the request that would be sent for this text.
    pub fn request_for(&self, text: &str) -> SpeechRequest {
        let language = self.classifier.classify(text);
        SpeechRequest::new(text, self.voices.voice_for(language), self.model_id.as_str())
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }
}

#[async_trait]
impl Synthesize for VoicedSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        let request = self.request_for(text);
        log::debug!(
            "Using voice {} with model {} via {}",
            request.voice_id,
            request.model_id,
            self.provider.name()
        );
        self.provider.synthesize(&request).await
    }
}

/// Adapter over a shared mock so tests can inspect calls after dispatch.
#[cfg(test)]
pub(crate) struct MockSynth(pub std::sync::Arc<speech_client::MockProvider>);

#[cfg(test)]
#[async_trait]
impl Synthesize for MockSynth {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        self.0
            .synthesize(&SpeechRequest::new(text, "voice", "model"))
            .await
    }
}
