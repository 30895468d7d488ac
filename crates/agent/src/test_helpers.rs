//! Shared test helpers for stage and pipeline tests.

use async_trait::async_trait;
use contentforge_core::error::RewriteError;
use contentforge_core::rewriter::{RewriteRequest, RewriteResponse, TextRewriter, Usage};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A mock rewriter that returns a sequence of scripted texts.
///
/// Each call returns the next text in the queue and records the request.
/// Once the script is exhausted it echoes the last scripted text.
pub struct ScriptedRewriter {
    responses: Vec<String>,
    requests: Mutex<Vec<RewriteRequest>>,
}

impl ScriptedRewriter {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: responses.into_iter().map(String::from).collect(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A rewriter that answers every call with `text`.
    pub fn always(text: &str) -> Self {
        Self::new(vec![text])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<RewriteRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextRewriter for ScriptedRewriter {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse, RewriteError> {
        let mut requests = self.requests.lock().unwrap();
        let index = requests.len().min(self.responses.len().saturating_sub(1));
        let text = self
            .responses
            .get(index)
            .cloned()
            .unwrap_or_else(|| panic!("ScriptedRewriter: no responses configured"));
        let model = request.model.clone();
        requests.push(request);

        Ok(RewriteResponse {
            text,
            model,
            usage: Some(Usage {
                prompt_tokens: 10,
                completion_tokens: 5,
                total_tokens: 15,
            }),
        })
    }
}

/// A rewriter that always fails with the given error.
pub struct FailingRewriter {
    error: RewriteError,
    calls: Mutex<usize>,
}

impl FailingRewriter {
    pub fn new(error: RewriteError) -> Self {
        Self {
            error,
            calls: Mutex::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TextRewriter for FailingRewriter {
    fn name(&self) -> &str {
        "failing_mock"
    }

    async fn rewrite(&self, _request: RewriteRequest) -> Result<RewriteResponse, RewriteError> {
        *self.calls.lock().unwrap() += 1;
        Err(self.error.clone())
    }
}

/// A slow rewriter that records how many calls overlap.
///
/// Answers `rewritten <text>` where `<text>` is the part of the user
/// message after the instruction.
pub struct InFlightRewriter {
    delay: Duration,
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl InFlightRewriter {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Highest number of calls observed in flight at once.
    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRewriter for InFlightRewriter {
    fn name(&self) -> &str {
        "in_flight_mock"
    }

    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse, RewriteError> {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        let text = request
            .user_text
            .rsplit("\n\n")
            .next()
            .unwrap_or_default();
        Ok(RewriteResponse {
            text: format!("rewritten {text}"),
            model: request.model,
            usage: None,
        })
    }
}
