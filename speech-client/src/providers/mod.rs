//! Speech provider implementations

mod elevenlabs;
pub mod mock;

pub use elevenlabs::ElevenLabsProvider;
pub use mock::{MockCall, MockProvider};

use crate::config::ProviderConfig;
use crate::error::Result;
use crate::provider::SpeechProvider;

/// Environment variable consulted when the config carries no API key
pub const API_KEY_ENV_VAR: &str = "ELEVENLABS_API_KEY";

/// Create the configured provider instance
pub fn get_provider(config: &ProviderConfig) -> Result<Box<dyn SpeechProvider>> {
    let api_key = get_api_key(config, API_KEY_ENV_VAR);
    Ok(Box::new(ElevenLabsProvider::new(config, api_key)?))
}

/// Get API key from config or environment variable
///
/// A missing key is not an error: the service accepts a limited number of
/// unauthenticated requests.
fn get_api_key(config: &ProviderConfig, env_var: &str) -> Option<String> {
    if let Some(key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) {
        return Some(key);
    }

    std::env::var(env_var).ok().filter(|k| !k.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_key_prefers_config() {
        let config = ProviderConfig {
            api_key: Some("from-config".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(
            get_api_key(&config, "NARRATE_TEST_UNSET_VARIABLE"),
            Some("from-config".to_string())
        );
    }

    #[test]
    fn test_blank_config_key_is_ignored() {
        let config = ProviderConfig {
            api_key: Some("   ".to_string()),
            ..ProviderConfig::default()
        };
        assert_eq!(get_api_key(&config, "NARRATE_TEST_UNSET_VARIABLE"), None);
    }

    #[test]
    fn test_get_provider_builds_elevenlabs() {
        let provider = get_provider(&ProviderConfig::default()).unwrap();
        assert_eq!(provider.name(), "ElevenLabs");
    }
}
