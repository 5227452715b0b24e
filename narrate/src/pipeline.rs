//! End-to-end composition: text in, one WAV file out.

use crate::audio::{self, EncodedFile, MergedAudio};
use crate::dispatch::{AbortHandle, ChunkJob, Dispatcher, JobEvent, Synthesize};
use crate::error::{PipelineError, Result};
use crate::text::Chunker;

/// A successful run.
#[derive(Debug)]
pub struct Narration {
    pub file: EncodedFile,
    pub audio: MergedAudio,
    pub jobs: Vec<ChunkJob>,
}

impl Narration {
    pub fn sample_rate(&self) -> u32 {
        self.audio.buffer.sample_rate
    }

    pub fn sample_count(&self) -> usize {
        self.audio.buffer.samples.len()
    }
}

/// Chunk, synthesize and reassemble `text`.
///
/// Progress is reported through `on_event`; completed chunk audio is
/// delivered there even when a later chunk fails.
pub async fn narrate<S, F>(
    text: &str,
    chunker: &Chunker,
    dispatcher: &Dispatcher<S>,
    abort: &AbortHandle,
    on_event: F,
) -> Result<Narration>
where
    S: Synthesize,
    F: FnMut(&JobEvent),
{
    let chunks = chunker.split(text);
    if chunks.is_empty() {
        return Err(PipelineError::Chunking(
            "Input contains no text to synthesize".to_string(),
        ));
    }
    log::info!(
        "Split {} characters into {} chunks (max {})",
        text.chars().count(),
        chunks.len(),
        chunker.max_length()
    );

    let report = dispatcher.run(chunks, abort, on_event).await;
    let jobs = report.jobs.clone();
    let raw = report.into_audio()?;

    let (merged, file) = audio::merge(&raw).await?;
    Ok(Narration {
        file,
        audio: merged,
        jobs,
    })
}
