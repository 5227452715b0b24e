//! Text chunking for TTS processing.

use super::TextChunk;

/// Default maximum chunk size in characters (per-request limit of the service).
pub const DEFAULT_MAX_LENGTH: usize = 500;

/// Splits text into bounded chunks on word boundaries.
///
/// Lengths are counted in characters, not bytes. A word longer than the
/// limit is hard-split into limit-sized pieces; its remainder starts the
/// next chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_length: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LENGTH)
    }
}

impl Chunker {
    /// Create a chunker with the given limit (clamped to at least 1).
    pub fn new(max_length: usize) -> Self {
        Self {
            max_length: max_length.max(1),
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// Split text into TTS-ready chunks, indexed from 0 in playback order.
    ///
    /// Whitespace-only input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<TextChunk> {
        split_on_words(text, self.max_length)
            .into_iter()
            .enumerate()
            .map(|(index, content)| TextChunk::new(index, content))
            .collect()
    }
}

/// Split text on word boundaries, collapsing runs of whitespace.
fn split_on_words(text: &str, max_length: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_len + word_len + 1 > max_length {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }

            if word_len > max_length {
                let (pieces, remainder) = hard_split(word, max_length);
                chunks.extend(pieces);
                current = remainder;
            } else {
                current = word.to_string();
            }
            current_len = current.chars().count();
        } else {
            if !current.is_empty() {
                current.push(' ');
                current_len += 1;
            }
            current.push_str(word);
            current_len += word_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Hard split an oversized word into full pieces plus a non-empty remainder.
fn hard_split(word: &str, max_length: usize) -> (Vec<String>, String) {
    let chars: Vec<char> = word.chars().collect();
    let mut pieces: Vec<String> = chars
        .chunks(max_length)
        .map(|piece| piece.iter().collect())
        .collect();
    let remainder = pieces.pop().unwrap_or_default();
    (pieces, remainder)
}
