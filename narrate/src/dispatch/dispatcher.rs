//! Drives chunks through synthesis one at a time.

use super::{AbortHandle, AudioRef, ChunkJob, JobEvent, Synthesize};
use crate::config::NarrateConfig;
use crate::error::{PipelineError, RemediationLink};
use crate::text::TextChunk;
use speech_client::SpeechError;
use std::sync::Arc;
use std::time::Duration;

/// Pacing and error-classification settings for a dispatch run.
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    /// Pause between the end of one call and the start of the next.
    pub delay: Duration,
    /// Upper bound on a single synthesis call.
    pub request_timeout: Duration,
    /// Error text containing this marker is reported as a credential problem.
    pub credential_marker: String,
    /// Link attached to credential errors.
    pub remediation: RemediationLink,
}

impl DispatchSettings {
    pub fn from_config(config: &NarrateConfig) -> Self {
        Self {
            delay: config.delay(),
            request_timeout: config.request_timeout(),
            credential_marker: config.credential_marker.clone(),
            remediation: config.remediation.clone(),
        }
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self::from_config(&NarrateConfig::default())
    }
}

/// Final state of every job plus the run's single error, if any.
#[derive(Debug)]
pub struct DispatchReport {
    pub jobs: Vec<ChunkJob>,
    pub error: Option<PipelineError>,
}

impl DispatchReport {
    /// Audio of every job in chunk order.
    ///
    /// A failed run yields its error; partial audio is never handed on.
    pub fn into_audio(self) -> Result<Vec<AudioRef>, PipelineError> {
        if let Some(error) = self.error {
            return Err(error);
        }

        self.jobs
            .into_iter()
            .map(|job| {
                let index = job.index();
                job.audio().cloned().ok_or(PipelineError::Synthesis {
                    index,
                    message: "No audio recorded for chunk".to_string(),
                })
            })
            .collect()
    }
}

/// Sequential dispatcher over a synthesis backend.
pub struct Dispatcher<S> {
    synth: S,
    settings: DispatchSettings,
}

impl<S: Synthesize> Dispatcher<S> {
    pub fn new(synth: S, settings: DispatchSettings) -> Self {
        Self { synth, settings }
    }

    /// Run every chunk through synthesis, strictly in order.
    ///
    /// Call N+1 is never started before call N has resolved. The first
    /// failure stops the run: the failing job and every job not yet attempted
    /// end `Failed`, completed jobs keep their audio. `on_event` sees every
    /// status change in order.
    pub async fn run<F>(
        &self,
        chunks: Vec<TextChunk>,
        abort: &AbortHandle,
        mut on_event: F,
    ) -> DispatchReport
    where
        F: FnMut(&JobEvent),
    {
        let mut jobs: Vec<ChunkJob> = chunks.into_iter().map(ChunkJob::new).collect();
        for job in &jobs {
            on_event(&JobEvent::status(job));
        }

        let total = jobs.len();
        let mut error = None;

        for i in 0..total {
            if i > 0 && !abort.is_aborted() {
                on_event(&JobEvent::Waiting {
                    index: i,
                    delay: self.settings.delay,
                });
                tokio::select! {
                    _ = tokio::time::sleep(self.settings.delay) => {}
                    _ = abort.aborted() => {}
                }
            }

            if abort.is_aborted() {
                log::info!("Abort requested, stopping before chunk {}", i + 1);
                error = Some(PipelineError::Aborted {
                    completed: i,
                    total,
                });
                break;
            }

            jobs[i].mark_processing();
            on_event(&JobEvent::status(&jobs[i]));
            log::info!(
                "Synthesizing chunk {}/{} ({} chars)",
                i + 1,
                total,
                jobs[i].chunk.char_len()
            );

            match self.call(&jobs[i].chunk).await {
                Ok(audio) => {
                    log::debug!("Chunk {} returned {} bytes", i, audio.len());
                    jobs[i].mark_completed(audio);
                    on_event(&JobEvent::status(&jobs[i]));
                }
                Err(err) => {
                    log::warn!("Chunk {} failed: {}", i, err);
                    for job in jobs[i..].iter_mut() {
                        if job.mark_failed() {
                            on_event(&JobEvent::status(job));
                        }
                    }
                    error = Some(err);
                    break;
                }
            }
        }

        DispatchReport { jobs, error }
    }

    /// One bounded synthesis call.
    async fn call(&self, chunk: &TextChunk) -> Result<AudioRef, PipelineError> {
        let outcome = tokio::time::timeout(
            self.settings.request_timeout,
            self.synth.synthesize(&chunk.content),
        )
        .await;

        match outcome {
            Err(_) => Err(PipelineError::Synthesis {
                index: chunk.index,
                message: format!(
                    "Request timed out after {:?}",
                    self.settings.request_timeout
                ),
            }),
            Ok(Err(err)) => Err(self.classify(chunk.index, &err)),
            Ok(Ok(audio)) if audio.is_empty() => {
                Err(self.classify(chunk.index, &SpeechError::EmptyAudio))
            }
            Ok(Ok(audio)) => Ok(Arc::from(audio)),
        }
    }

    /// Separate credential problems from ordinary synthesis failures.
    fn classify(&self, index: usize, err: &SpeechError) -> PipelineError {
        let message = err.to_string();
        let marker = self.settings.credential_marker.as_str();

        if err.is_missing_credential() || (!marker.is_empty() && message.contains(marker)) {
            PipelineError::Credential {
                index,
                message,
                link: self.settings.remediation.clone(),
            }
        } else {
            PipelineError::Synthesis { index, message }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{JobStatus, MockSynth as Mock};
    use crate::error::ErrorKind;
    use speech_client::MockProvider;
    use tokio::time::Instant;

    fn statuses(report: &DispatchReport) -> Vec<JobStatus> {
        report.jobs.iter().map(ChunkJob::status).collect()
    }

    fn chunks(texts: &[&str]) -> Vec<TextChunk> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TextChunk::new(i, t.to_string()))
            .collect()
    }

    fn echo_provider() -> MockProvider {
        MockProvider::with_responder(|req| req.text.as_bytes().to_vec())
    }

    fn settings(delay_ms: u64) -> DispatchSettings {
        DispatchSettings {
            delay: Duration::from_millis(delay_ms),
            ..DispatchSettings::default()
        }
    }

    fn dispatcher(
        provider: MockProvider,
        delay_ms: u64,
    ) -> (Dispatcher<Mock>, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        (
            Dispatcher::new(Mock(provider.clone()), settings(delay_ms)),
            provider,
        )
    }

    fn api_error(message: &str) -> SpeechError {
        SpeechError::ApiError {
            message: message.to_string(),
            status_code: Some(401),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_chunks_complete_in_order() {
        let (dispatcher, provider) = dispatcher(echo_provider(), 10_000);

        let report = dispatcher
            .run(chunks(&["one", "two", "three"]), &AbortHandle::new(), |_| {})
            .await;

        assert!(report.error.is_none());
        assert_eq!(statuses(&report), vec![JobStatus::Completed; 3]);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.max_concurrency(), 1);

        let texts: Vec<String> = provider.calls().into_iter().map(|c| c.request.text).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);

        let audio = report.into_audio().unwrap();
        assert_eq!(audio.len(), 3);
        assert_eq!(&audio[1][..], b"two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_between_call_starts() {
        let provider = echo_provider().with_latency(Duration::from_millis(700));
        let (dispatcher, provider) = dispatcher(provider, 10_000);

        dispatcher
            .run(chunks(&["a", "b", "c"]), &AbortHandle::new(), |_| {})
            .await;

        let calls = provider.calls();
        for pair in calls.windows(2) {
            assert!(pair[1].started_at >= pair[0].finished_at, "calls overlapped");
            assert!(pair[1].started_at - pair[0].started_at >= Duration::from_millis(10_000));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_delay_after_last_chunk() {
        let (dispatcher, _provider) = dispatcher(echo_provider(), 10_000);

        let start = Instant::now();
        dispatcher
            .run(chunks(&["a", "b"]), &AbortHandle::new(), |_| {})
            .await;
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(10_000));
        assert!(elapsed < Duration::from_millis(20_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_stops_remaining_calls() {
        let provider = echo_provider().failing_on(1, api_error("upstream exploded"));
        let (dispatcher, provider) = dispatcher(provider, 10_000);

        let report = dispatcher
            .run(chunks(&["first", "second", "third"]), &AbortHandle::new(), |_| {})
            .await;

        assert_eq!(
            statuses(&report),
            vec![JobStatus::Completed, JobStatus::Failed, JobStatus::Failed]
        );
        assert_eq!(provider.call_count(), 2);
        assert_eq!(report.jobs[0].audio().map(|a| a.to_vec()), Some(b"first".to_vec()));
        assert!(report.jobs[1].audio().is_none());

        let error = report.error.clone().unwrap();
        assert_eq!(error.kind(), ErrorKind::Synthesis);
        assert_eq!(error.chunk_index(), Some(1));
        assert!(error.to_string().contains("upstream exploded"));
        assert_eq!(report.into_audio().unwrap_err(), error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_credential_marker_is_classified() {
        let provider = echo_provider().failing_on(
            0,
            api_error("detected_unusual_activity: please consider signing-up"),
        );
        let (dispatcher, _provider) = dispatcher(provider, 0);

        let report = dispatcher
            .run(chunks(&["hello"]), &AbortHandle::new(), |_| {})
            .await;

        let error = report.error.unwrap();
        assert_eq!(error.kind(), ErrorKind::Credential);
        assert_eq!(error.remediation(), Some(&RemediationLink::default()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_api_key_is_credential_error() {
        let provider = echo_provider().failing_on(
            0,
            SpeechError::MissingApiKey {
                provider: "ElevenLabs".to_string(),
                env_var: "ELEVENLABS_API_KEY".to_string(),
            },
        );
        let (dispatcher, _provider) = dispatcher(provider, 0);

        let report = dispatcher
            .run(chunks(&["hello"]), &AbortHandle::new(), |_| {})
            .await;
        assert_eq!(report.error.unwrap().kind(), ErrorKind::Credential);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_synthesis_error() {
        let provider = echo_provider().with_latency(Duration::from_secs(120));
        let provider = Arc::new(provider);
        let dispatcher = Dispatcher::new(
            Mock(provider.clone()),
            DispatchSettings {
                request_timeout: Duration::from_secs(60),
                ..settings(0)
            },
        );

        let report = dispatcher
            .run(chunks(&["slow", "never"]), &AbortHandle::new(), |_| {})
            .await;

        let error = report.error.clone().unwrap();
        assert_eq!(error.kind(), ErrorKind::Synthesis);
        assert!(error.to_string().contains("timed out"));
        assert_eq!(statuses(&report), vec![JobStatus::Failed, JobStatus::Failed]);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_payload_is_synthesis_error() {
        let (dispatcher, _provider) = dispatcher(MockProvider::always_succeeds(Vec::new()), 0);

        let report = dispatcher
            .run(chunks(&["hello"]), &AbortHandle::new(), |_| {})
            .await;

        let error = report.error.unwrap();
        assert_eq!(error.kind(), ErrorKind::Synthesis);
        assert!(error.to_string().contains("empty response"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_event_sequence() {
        let (dispatcher, _provider) = dispatcher(echo_provider(), 500);
        let mut events = Vec::new();

        dispatcher
            .run(chunks(&["a", "b"]), &AbortHandle::new(), |event| {
                events.push(match event {
                    JobEvent::Status { index, status, .. } => {
                        format!("{}:{}", index, status.as_str())
                    }
                    JobEvent::Waiting { index, delay } => {
                        format!("{}:waiting {}ms", index, delay.as_millis())
                    }
                })
            })
            .await;

        assert_eq!(
            events,
            vec![
                "0:pending",
                "1:pending",
                "0:processing",
                "0:completed",
                "1:waiting 500ms",
                "1:processing",
                "1:completed",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_abort_during_delay_stops_next_call() {
        let (dispatcher, provider) = dispatcher(echo_provider(), 10_000);
        let abort = AbortHandle::new();
        let trigger = abort.clone();

        let start = Instant::now();
        let report = dispatcher
            .run(chunks(&["a", "b", "c"]), &abort, |event| {
                if let JobEvent::Status {
                    status: JobStatus::Completed,
                    ..
                } = event
                {
                    trigger.abort();
                }
            })
            .await;

        assert!(start.elapsed() < Duration::from_millis(10_000));
        assert_eq!(provider.call_count(), 1);
        assert_eq!(
            statuses(&report),
            vec![JobStatus::Completed, JobStatus::Pending, JobStatus::Pending]
        );
        assert_eq!(
            report.error,
            Some(PipelineError::Aborted {
                completed: 1,
                total: 3
            })
        );
    }

    #[tokio::test]
    async fn test_no_chunks_is_a_successful_empty_run() {
        let (dispatcher, provider) = dispatcher(echo_provider(), 10_000);
        let report = dispatcher.run(Vec::new(), &AbortHandle::new(), |_| {}).await;
        assert!(report.error.is_none());
        assert!(report.jobs.is_empty());
        assert_eq!(provider.call_count(), 0);
    }
}
