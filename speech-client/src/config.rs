use serde::{Deserialize, Serialize};

/// Default ElevenLabs endpoint (US region)
pub const DEFAULT_BASE_URL: &str = "https://api.us.elevenlabs.io";

/// Provider-specific configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (optional, can use env var instead)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Refuse to send unauthenticated requests when no key is available
    #[serde(default)]
    pub require_api_key: bool,

    /// Base URL of the synthesis API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// HTTP timeout for a single synthesis request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Voice tuning sent with every request
    #[serde(default)]
    pub voice_settings: VoiceSettings,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            require_api_key: false,
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            voice_settings: VoiceSettings::default(),
        }
    }
}

/// Voice tuning parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// Stability (0.0-1.0)
    #[serde(default = "default_stability")]
    pub stability: f32,

    /// Similarity boost (0.0-1.0)
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
        }
    }
}

impl VoiceSettings {
    /// Clamp both parameters into the range the API accepts
    pub fn clamped(self) -> Self {
        Self {
            stability: self.stability.clamp(0.0, 1.0),
            similarity_boost: self.similarity_boost.clamp(0.0, 1.0),
        }
    }
}
