//! Audio reassembly: decode chunk payloads, join them, encode one WAV.

pub mod assembler;
pub mod decode;
pub mod wav;

pub use assembler::merge;

use std::ops::Range;
use std::path::Path;
use std::time::Duration;

/// Mono PCM samples in [-1, 1] at a fixed rate.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    pub fn new(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate as f64)
    }
}

/// All chunk samples joined in order, with the range each chunk occupies.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedAudio {
    pub buffer: SampleBuffer,
    pub segments: Vec<Range<usize>>,
}

/// A complete WAV file in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFile {
    bytes: Vec<u8>,
}

impl EncodedFile {
    pub(crate) fn from_bytes(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}
