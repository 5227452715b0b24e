//! Mock speech provider for testing
//!
//! Scripts successful audio, failures on chosen calls and artificial latency,
//! and records every call so tests can assert ordering and pacing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

use crate::error::{Result, SpeechError};
use crate::provider::{SpeechProvider, SpeechRequest};

type Responder = Box<dyn Fn(&SpeechRequest) -> Vec<u8> + Send + Sync>;

/// A recorded call to the mock provider
#[derive(Debug, Clone)]
pub struct MockCall {
    pub request: SpeechRequest,
    pub started_at: Instant,
    pub finished_at: Instant,
}

/// A mock provider for exercising dispatch behavior
pub struct MockProvider {
    /// Produces the audio for a successful call
    responder: Responder,
    /// Errors to return, keyed by zero-based call number
    failures: Mutex<HashMap<usize, SpeechError>>,
    /// Simulated time spent in each call
    latency: Duration,
    /// Calls observed so far
    calls: Mutex<Vec<MockCall>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    /// Provider name for display
    name: &'static str,
}

impl MockProvider {
    /// Create a provider whose successful calls return `responder(request)`
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: Fn(&SpeechRequest) -> Vec<u8> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            failures: Mutex::new(HashMap::new()),
            latency: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            name: "mock",
        }
    }

    /// Create a provider that always returns the same audio bytes
    pub fn always_succeeds(audio: Vec<u8>) -> Self {
        Self::with_responder(move |_| audio.clone())
    }

    /// Fail the `call`-th call (zero-based) with the given error
    pub fn failing_on(self, call: usize, error: SpeechError) -> Self {
        self.failures
            .lock()
            .expect("mock failures lock poisoned")
            .insert(call, error);
        self
    }

    /// Spend `latency` inside every call before answering
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Set a custom provider name
    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    /// Number of times synthesize() was called
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("mock calls lock poisoned").len()
    }

    /// Snapshot of all recorded calls, in call order
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().expect("mock calls lock poisoned").clone()
    }

    /// Highest number of calls that were in flight at the same time
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechProvider for MockProvider {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Vec<u8>> {
        let started_at = Instant::now();
        let now_in_flight = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now_in_flight, Ordering::SeqCst);

        let call_num = {
            let mut calls = self.calls.lock().expect("mock calls lock poisoned");
            calls.push(MockCall {
                request: request.clone(),
                started_at,
                finished_at: started_at,
            });
            calls.len() - 1
        };

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let finished_at = Instant::now();
        if let Some(call) = self
            .calls
            .lock()
            .expect("mock calls lock poisoned")
            .get_mut(call_num)
        {
            call.finished_at = finished_at;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let failure = self
            .failures
            .lock()
            .expect("mock failures lock poisoned")
            .remove(&call_num);
        match failure {
            Some(error) => Err(error),
            None => Ok((self.responder)(request)),
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}
