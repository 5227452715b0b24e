//! Joins decoded chunks into one buffer and one file.

use super::decode::decode;
use super::{EncodedFile, MergedAudio, SampleBuffer, wav};
use crate::dispatch::AudioRef;
use crate::error::{PipelineError, Result};
use futures_util::future::join_all;

/// Decode every payload, concurrently, returning buffers in input order.
///
/// The first failure (by chunk index) wins.
pub async fn decode_all(raw: &[AudioRef]) -> Result<Vec<SampleBuffer>> {
    let tasks = raw.iter().cloned().enumerate().map(|(index, bytes)| async move {
        match tokio::task::spawn_blocking(move || decode(index, &bytes)).await {
            Ok(result) => result,
            Err(e) => Err(PipelineError::Decode {
                index,
                message: format!("Decode task failed: {}", e),
            }),
        }
    });

    join_all(tasks).await.into_iter().collect()
}

/// Concatenate buffers in order at the first buffer's sample rate.
pub fn concatenate(buffers: Vec<SampleBuffer>) -> Result<MergedAudio> {
    let sample_rate = buffers
        .first()
        .map(|b| b.sample_rate)
        .ok_or(PipelineError::NoAudio)?;

    if let Some((index, other)) = buffers
        .iter()
        .enumerate()
        .find(|(_, b)| b.sample_rate != sample_rate)
    {
        return Err(PipelineError::SampleRateMismatch {
            index,
            expected: sample_rate,
            actual: other.sample_rate,
        });
    }

    let total: usize = buffers.iter().map(|b| b.samples.len()).sum();
    let mut samples = Vec::with_capacity(total);
    let mut segments = Vec::with_capacity(buffers.len());

    for buffer in buffers {
        let start = samples.len();
        samples.extend_from_slice(&buffer.samples);
        segments.push(start..samples.len());
    }

    Ok(MergedAudio {
        buffer: SampleBuffer::new(sample_rate, samples),
        segments,
    })
}

/// Decode, concatenate and encode. No partial file is produced on error.
pub async fn merge(raw: &[AudioRef]) -> Result<(MergedAudio, EncodedFile)> {
    if raw.is_empty() {
        return Err(PipelineError::NoAudio);
    }

    let buffers = decode_all(raw).await?;
    let merged = concatenate(buffers)?;
    log::info!(
        "Merged {} chunks into {} samples ({:.1}s at {} Hz)",
        merged.segments.len(),
        merged.buffer.samples.len(),
        merged.buffer.duration().as_secs_f64(),
        merged.buffer.sample_rate
    );

    let file = wav::encode(&merged.buffer)?;
    Ok((merged, file))
}
