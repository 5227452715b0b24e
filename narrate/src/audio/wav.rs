//! 16-bit mono PCM WAV encoder.

use super::{EncodedFile, SampleBuffer};
use crate::error::{PipelineError, Result};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::io::Cursor;

pub const HEADER_LEN: usize = 44;

const BYTES_PER_SAMPLE: u32 = 2;

/// Quantize one sample to signed 16-bit.
///
/// Values below -0.5/32768 scale by 32768, everything from there up scales
/// by 32767, so -1.0 and 1.0 land on the ends of the i16 range. The cast
/// truncates toward zero.
pub fn quantize(sample: f32) -> i16 {
    let s = sample.clamp(-1.0, 1.0);
    if s >= -0.5 / 32768.0 {
        (s * 32767.0) as i16
    } else {
        (s * 32768.0) as i16
    }
}

/// Size of the data chunk, if the RIFF size fields can hold it.
fn data_len(sample_count: usize) -> Option<u32> {
    let data_len = u32::try_from(sample_count)
        .ok()?
        .checked_mul(BYTES_PER_SAMPLE)?;
    // RIFF size = 36 + data length
    data_len.checked_add(HEADER_LEN as u32 - 8)?;
    Some(data_len)
}

/// Encode a buffer as a canonical 44-byte-header WAV file.
pub fn encode(buffer: &SampleBuffer) -> Result<EncodedFile> {
    let sample_count = buffer.samples.len();
    let data_len = data_len(sample_count).ok_or_else(|| {
        PipelineError::Encode(format!("{} samples do not fit in a WAV file", sample_count))
    })?;
    if buffer.sample_rate.checked_mul(BYTES_PER_SAMPLE).is_none() {
        return Err(PipelineError::Encode(format!(
            "Unsupported sample rate {}",
            buffer.sample_rate
        )));
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut bytes = Vec::with_capacity(HEADER_LEN + data_len as usize);
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec)
            .map_err(|e| PipelineError::Encode(e.to_string()))?;
        for &sample in &buffer.samples {
            writer
                .write_sample(quantize(sample))
                .map_err(|e| PipelineError::Encode(e.to_string()))?;
        }
        writer.finalize().map_err(|e| PipelineError::Encode(e.to_string()))?;
    }

    Ok(EncodedFile::from_bytes(bytes))
}

/// Build a WAV payload from raw i16 samples, standing in for service audio.
#[cfg(test)]
pub(crate) fn pcm_fixture(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut bytes = Vec::new();
    {
        let mut writer = WavWriter::new(Cursor::new(&mut bytes), spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn read_back(file: &EncodedFile) -> (hound::WavSpec, Vec<i16>) {
        let reader = hound::WavReader::new(Cursor::new(file.as_bytes().to_vec())).unwrap();
        let spec = reader.spec();
        let samples = reader.into_samples::<i16>().map(|s| s.unwrap()).collect();
        (spec, samples)
    }

    #[test]
    fn test_header_layout() {
        let file = encode(&SampleBuffer::new(22_050, vec![0.0; 10])).unwrap();
        let b = file.as_bytes();

        assert_eq!(file.byte_len(), HEADER_LEN + 20);
        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(b[4..8].try_into().unwrap()), 36 + 20);
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(b[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes([b[20], b[21]]), 1);
        assert_eq!(u16::from_le_bytes([b[22], b[23]]), 1);
        assert_eq!(u32::from_le_bytes(b[24..28].try_into().unwrap()), 22_050);
        assert_eq!(u32::from_le_bytes(b[28..32].try_into().unwrap()), 44_100);
        assert_eq!(u16::from_le_bytes([b[32], b[33]]), 2);
        assert_eq!(u16::from_le_bytes([b[34], b[35]]), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(u32::from_le_bytes(b[40..44].try_into().unwrap()), 20);
    }

    #[test]
    fn test_quantize_edges() {
        assert_eq!(quantize(1.0), 32767);
        assert_eq!(quantize(-1.0), -32768);
        assert_eq!(quantize(0.0), 0);
        assert_eq!(quantize(2.5), 32767);
        assert_eq!(quantize(-7.0), -32768);
        assert_eq!(quantize(0.5), 16383);
        assert_eq!(quantize(-0.5), -16384);
        assert_eq!(quantize(f32::NAN), 0);
        assert_eq!(quantize(-1.0e-6), 0);
        assert_eq!(quantize(-1.0 / 32768.0), -1);
    }

    #[test]
    fn test_data_len_limits() {
        assert_eq!(data_len(10), Some(20));
        assert_eq!(data_len(2_147_483_629), Some(4_294_967_258));
        assert_eq!(data_len(2_147_483_630), None);
        assert_eq!(data_len(1 << 31), None);
    }

    #[test]
    fn test_unrepresentable_sample_rate_is_error() {
        let err = encode(&SampleBuffer::new(u32::MAX, vec![0.0])).unwrap_err();
        assert!(matches!(err, PipelineError::Encode(_)));
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_hound_reads_encoded_file() {
        let samples = vec![0.0, 0.25, -0.25, 1.0, -1.0, 0.999];
        let file = encode(&SampleBuffer::new(44_100, samples.clone())).unwrap();

        let (spec, decoded) = read_back(&file);
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);

        let expected: Vec<i16> = samples.into_iter().map(quantize).collect();
        assert_eq!(decoded, expected);
    }

    #[test]
    fn test_empty_buffer_is_header_only() {
        let file = encode(&SampleBuffer::new(8_000, Vec::new())).unwrap();
        assert_eq!(file.byte_len(), HEADER_LEN);
        let (_, decoded) = read_back(&file);
        assert!(decoded.is_empty());
    }

    #[test]
    fn test_fixture_is_readable() {
        let bytes = pcm_fixture(16_000, 2, &[1, -1, 2, -2]);
        let reader = hound::WavReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(reader.spec().channels, 2);
        assert_eq!(reader.len(), 4);
    }
}
