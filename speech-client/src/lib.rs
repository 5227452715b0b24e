//! Text-to-speech client library for the narrate workspace
//!
//! Provides a narrow interface over remote speech synthesis services:
//! - ElevenLabs (HTTP, returns MP3)
//! - Mock (scripted responses for tests)

pub mod config;
pub mod error;
pub mod provider;
pub mod providers;

pub use config::{ProviderConfig, VoiceSettings};
pub use error::{Result, SpeechError};
pub use provider::{SpeechProvider, SpeechRequest};
pub use providers::{ElevenLabsProvider, MockCall, MockProvider, get_provider};
