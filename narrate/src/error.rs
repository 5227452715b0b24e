//! Pipeline error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A link the user can follow to fix a problem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationLink {
    pub text: String,
    pub url: String,
}

impl Default for RemediationLink {
    fn default() -> Self {
        Self {
            text: "Sign up for an API key".to_string(),
            url: "https://elevenlabs.io".to_string(),
        }
    }
}

impl fmt::Display for RemediationLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.text, self.url)
    }
}

/// Coarse classification used by the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Chunking,
    Synthesis,
    Credential,
    Decode,
    Aborted,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Chunking => "chunking error",
            ErrorKind::Synthesis => "synthesis error",
            ErrorKind::Credential => "credential error",
            ErrorKind::Decode => "decode error",
            ErrorKind::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// The single aggregate error surfaced by a failed run.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("{0}")]
    Chunking(String),

    #[error("Chunk {index}: {message}")]
    Synthesis { index: usize, message: String },

    #[error("Chunk {index}: {message}")]
    Credential {
        index: usize,
        message: String,
        link: RemediationLink,
    },

    #[error("Failed to decode audio for chunk {index}: {message}")]
    Decode { index: usize, message: String },

    #[error("Chunk {index} is {actual} Hz but the output is {expected} Hz")]
    SampleRateMismatch {
        index: usize,
        expected: u32,
        actual: u32,
    },

    #[error("Failed to encode output audio: {0}")]
    Encode(String),

    #[error("No audio to assemble")]
    NoAudio,

    #[error("Stopped after {completed} of {total} chunks")]
    Aborted { completed: usize, total: usize },
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Chunking(_) => ErrorKind::Chunking,
            Self::Synthesis { .. } => ErrorKind::Synthesis,
            Self::Credential { .. } => ErrorKind::Credential,
            Self::Decode { .. }
            | Self::SampleRateMismatch { .. }
            | Self::Encode(_)
            | Self::NoAudio => ErrorKind::Decode,
            Self::Aborted { .. } => ErrorKind::Aborted,
        }
    }

    /// Link to show alongside the message, if the error has one.
    pub fn remediation(&self) -> Option<&RemediationLink> {
        match self {
            Self::Credential { link, .. } => Some(link),
            _ => None,
        }
    }

    /// Chunk the error is attributed to, if any.
    pub fn chunk_index(&self) -> Option<usize> {
        match self {
            Self::Synthesis { index, .. }
            | Self::Credential { index, .. }
            | Self::Decode { index, .. }
            | Self::SampleRateMismatch { index, .. } => Some(*index),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
