//! narrate configuration management.

use crate::error::RemediationLink;
use crate::text::LanguageTag;
use crate::text::chunker::DEFAULT_MAX_LENGTH;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use speech_client::ProviderConfig;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// Defaults matching the ElevenLabs flash model and its free-tier pacing
const DEFAULT_DELAY_MS: u64 = 10_000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_MODEL_ID: &str = "eleven_flash_v2_5";
const DEFAULT_ENGLISH_VOICE: &str = "nPczCjzI2devNBz1zQrb";
const DEFAULT_FRENCH_VOICE: &str = "bIHbv24MWmeRgasZH58o";
const DEFAULT_CREDENTIAL_MARKER: &str = "signing-up";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrateConfig {
    /// Maximum characters per synthesis request
    #[serde(default = "default_max_chunk_length")]
    pub max_chunk_length: usize,

    /// Pause between two synthesis calls, in milliseconds
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Upper bound on a single synthesis call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Model identifier sent with every request
    #[serde(default = "default_model_id")]
    pub model_id: String,

    /// Voice identifier per language
    #[serde(default)]
    pub voices: VoiceMap,

    /// Substring of a synthesis error that signals a credential problem
    #[serde(default = "default_credential_marker")]
    pub credential_marker: String,

    /// Link shown with credential errors
    #[serde(default)]
    pub remediation: RemediationLink,

    /// Synthesis service settings
    #[serde(default)]
    pub provider: ProviderConfig,
}

fn default_max_chunk_length() -> usize {
    DEFAULT_MAX_LENGTH
}

fn default_delay_ms() -> u64 {
    DEFAULT_DELAY_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_model_id() -> String {
    DEFAULT_MODEL_ID.to_string()
}

fn default_credential_marker() -> String {
    DEFAULT_CREDENTIAL_MARKER.to_string()
}

/// Voice identifiers, one per supported language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMap {
    #[serde(default = "default_english_voice")]
    pub english: String,
    #[serde(default = "default_french_voice")]
    pub french: String,
}

fn default_english_voice() -> String {
    DEFAULT_ENGLISH_VOICE.to_string()
}

fn default_french_voice() -> String {
    DEFAULT_FRENCH_VOICE.to_string()
}

impl Default for VoiceMap {
    fn default() -> Self {
        Self {
            english: default_english_voice(),
            french: default_french_voice(),
        }
    }
}

impl VoiceMap {
    pub fn voice_for(&self, language: LanguageTag) -> &str {
        match language {
            LanguageTag::English => &self.english,
            LanguageTag::French => &self.french,
        }
    }

    pub fn set_voice(&mut self, language: LanguageTag, voice_id: String) {
        match language {
            LanguageTag::English => self.english = voice_id,
            LanguageTag::French => self.french = voice_id,
        }
    }
}

impl Default for NarrateConfig {
    fn default() -> Self {
        Self {
            max_chunk_length: default_max_chunk_length(),
            delay_ms: default_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            model_id: default_model_id(),
            voices: VoiceMap::default(),
            credential_marker: default_credential_marker(),
            remediation: RemediationLink::default(),
            provider: ProviderConfig::default(),
        }
    }
}

impl NarrateConfig {
    /// Get the config file path: ~/.config/narrate/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .context("Neither HOME nor USERPROFILE is set")?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("narrate")
            .join("config.toml"))
    }

    /// Load config from the default location, returning default if the file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load config from a specific file, returning default if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: NarrateConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save config to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_length == 0 {
            anyhow::bail!("max_chunk_length must be at least 1");
        }
        if self.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be at least 1");
        }
        if self.model_id.trim().is_empty() {
            anyhow::bail!("model_id must not be empty");
        }
        if self.voices.english.trim().is_empty() || self.voices.french.trim().is_empty() {
            anyhow::bail!("voice identifiers must not be empty");
        }
        Ok(())
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
