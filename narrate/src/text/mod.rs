//! Text processing for TTS: chunking and language classification.

pub mod chunker;
pub mod language;

pub use chunker::Chunker;
pub use language::{FixedClassifier, LanguageClassifier, LanguageTag, PatternClassifier};

/// A chunk of text ready for TTS processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChunk {
    /// Position of this chunk in playback order
    pub index: usize,
    /// The text content
    pub content: String,
}

impl TextChunk {
    /// Create a new text chunk.
    pub fn new(index: usize, content: String) -> Self {
        Self { index, content }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}
