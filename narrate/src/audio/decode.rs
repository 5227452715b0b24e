//! Decode one synthesized payload into mono samples.

use super::SampleBuffer;
use crate::error::{PipelineError, Result};
use std::io::Cursor;
use symphonia::core::audio::SampleBuffer as InterleavedBuffer;
use symphonia::core::codecs::{CODEC_TYPE_NULL, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decode `bytes` (any container symphonia recognizes) and keep channel 0.
///
/// `index` only labels errors.
pub fn decode(index: usize, bytes: &[u8]) -> Result<SampleBuffer> {
    let fail = |message: String| PipelineError::Decode { index, message };

    if bytes.is_empty() {
        return Err(fail("Audio payload is empty".to_string()));
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| fail(format!("Unrecognized audio format: {}", e)))?;
    let mut format = probed.format;

    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .ok_or_else(|| fail("No audio track found".to_string()))?;
    let track_id = track.id;
    let mut sample_rate = track.codec_params.sample_rate;

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| fail(format!("Unsupported codec: {}", e)))?;

    let mut samples = Vec::new();
    let mut skipped = 0usize;

    loop {
        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(fail(e.to_string())),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(decoded) => decoded,
            Err(SymphoniaError::DecodeError(msg)) => {
                // A corrupt frame is dropped, the rest of the stream is kept
                log::debug!("Chunk {}: skipping undecodable packet: {}", index, msg);
                skipped += 1;
                continue;
            }
            Err(e) => return Err(fail(e.to_string())),
        };

        let spec = *decoded.spec();
        if sample_rate.is_none() {
            sample_rate = Some(spec.rate);
        }
        let channels = spec.channels.count().max(1);

        let mut interleaved = InterleavedBuffer::<f32>::new(decoded.capacity() as u64, spec);
        interleaved.copy_interleaved_ref(decoded);
        samples.extend(interleaved.samples().iter().step_by(channels).copied());
    }

    if skipped > 0 {
        log::warn!("Chunk {}: dropped {} corrupt audio frame(s)", index, skipped);
    }

    let sample_rate = sample_rate
        .filter(|rate| *rate > 0)
        .ok_or_else(|| fail("Audio stream has no sample rate".to_string()))?;

    log::debug!(
        "Chunk {}: decoded {} samples at {} Hz",
        index,
        samples.len(),
        sample_rate
    );
    Ok(SampleBuffer::new(sample_rate, samples))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::wav::pcm_fixture;
    use crate::error::ErrorKind;

    #[test]
    fn test_decodes_mono_pcm() {
        let bytes = pcm_fixture(24_000, 1, &[0, 16_384, -16_384, -32_768]);
        let buffer = decode(0, &bytes).unwrap();

        assert_eq!(buffer.sample_rate, 24_000);
        assert_eq!(buffer.samples, vec![0.0, 0.5, -0.5, -1.0]);
    }

    #[test]
    fn test_keeps_only_first_channel() {
        let bytes = pcm_fixture(16_000, 2, &[16_384, 0, -16_384, 0, 8_192, 0]);
        let buffer = decode(0, &bytes).unwrap();

        assert_eq!(buffer.samples, vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn test_empty_payload_names_chunk() {
        let err = decode(4, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.chunk_index(), Some(4));
    }

    #[test]
    fn test_garbage_is_decode_error() {
        let err = decode(2, b"this is definitely not audio data at all").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
        assert_eq!(err.chunk_index(), Some(2));
    }
}
