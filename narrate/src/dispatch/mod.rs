//! Sequential dispatch of text chunks to the synthesis service.

mod abort;
pub mod dispatcher;
mod synth;

pub use abort::AbortHandle;
pub use dispatcher::{DispatchSettings, Dispatcher};
pub use synth::{Synthesize, VoicedSynthesizer};

#[cfg(test)]
pub(crate) use synth::MockSynth;

use crate::text::TextChunk;
use std::sync::Arc;
use std::time::Duration;

/// Shared, read-only handle to the raw audio returned for one chunk.
pub type AudioRef = Arc<[u8]>;

/// Lifecycle of a single chunk job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Completed and Failed are final.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// One chunk bound to its synthesis outcome.
#[derive(Debug, Clone)]
pub struct ChunkJob {
    pub chunk: TextChunk,
    status: JobStatus,
    audio: Option<AudioRef>,
}

impl ChunkJob {
    /// Create a new pending job.
    pub fn new(chunk: TextChunk) -> Self {
        Self {
            chunk,
            status: JobStatus::Pending,
            audio: None,
        }
    }

    pub fn index(&self) -> usize {
        self.chunk.index
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn audio(&self) -> Option<&AudioRef> {
        self.audio.as_ref()
    }

    /// Move to `Processing`. Returns false if the job is already final.
    pub fn mark_processing(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Processing;
        true
    }

    /// Move to `Completed` with the given audio. Returns false if already final.
    pub fn mark_completed(&mut self, audio: AudioRef) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.audio = Some(audio);
        true
    }

    /// Move to `Failed`. Returns false if already final.
    pub fn mark_failed(&mut self) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        true
    }
}

/// Progress notifications, delivered in the order they happen.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// A job changed status. `audio` is set when it completed.
    Status {
        index: usize,
        status: JobStatus,
        text: String,
        audio: Option<AudioRef>,
    },
    /// The dispatcher is pausing before starting job `index`.
    Waiting { index: usize, delay: Duration },
}

impl JobEvent {
    fn status(job: &ChunkJob) -> Self {
        JobEvent::Status {
            index: job.index(),
            status: job.status(),
            text: job.chunk.content.clone(),
            audio: job.audio().cloned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> ChunkJob {
        ChunkJob::new(TextChunk::new(0, "hello".to_string()))
    }

    #[test]
    fn test_job_starts_pending() {
        let job = job();
        assert_eq!(job.status(), JobStatus::Pending);
        assert!(job.audio().is_none());
    }

    #[test]
    fn test_job_completes_with_audio() {
        let mut job = job();
        assert!(job.mark_processing());
        assert!(job.mark_completed(Arc::from(vec![1u8, 2, 3])));
        assert_eq!(job.status(), JobStatus::Completed);
        assert_eq!(job.audio().map(|a| a.len()), Some(3));
    }

    #[test]
    fn test_completed_job_never_regresses() {
        let mut job = job();
        job.mark_processing();
        job.mark_completed(Arc::from(vec![9u8]));

        assert!(!job.mark_failed());
        assert!(!job.mark_processing());
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.audio().is_some());
    }

    #[test]
    fn test_failed_job_never_regresses() {
        let mut job = job();
        job.mark_processing();
        assert!(job.mark_failed());
        assert!(!job.mark_completed(Arc::from(vec![1u8])));
        assert_eq!(job.status(), JobStatus::Failed);
        assert!(job.audio().is_none());
    }

    #[test]
    fn test_status_event_carries_text_and_audio() {
        let mut job = job();
        job.mark_completed(Arc::from(vec![7u8]));
        match JobEvent::status(&job) {
            JobEvent::Status {
                index,
                status,
                text,
                audio,
            } => {
                assert_eq!(index, 0);
                assert_eq!(status, JobStatus::Completed);
                assert_eq!(text, "hello");
                assert_eq!(audio.as_deref(), Some(&[7u8][..]));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }
}
