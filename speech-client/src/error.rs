use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("API key not found for {provider}. Set {env_var} environment variable or add to config.")]
    MissingApiKey { provider: String, env_var: String },

    #[error("Rate limit exceeded{}", .retry_after.map(|s| format!(". Retry after {} seconds", s)).unwrap_or_default())]
    RateLimited { retry_after: Option<u64> },

    #[error("Server error{}: {message}", status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default())]
    ApiError {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Received empty response from server")]
    EmptyAudio,

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SpeechError {
    /// Whether the error points at a missing or rejected credential
    pub fn is_missing_credential(&self) -> bool {
        matches!(self, Self::MissingApiKey { .. })
    }
}

pub type Result<T> = std::result::Result<T, SpeechError>;
