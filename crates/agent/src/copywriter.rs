//! Copywriter: the stages' view of the optional rewrite capability.
//!
//! Wraps an optional [`TextRewriter`] together with the selected model and
//! sampling parameters. An absent rewriter, or any rewrite failure, yields
//! `None` so the calling stage keeps the original text.

use contentforge_config::DEFAULT_MAX_CONCURRENT_REWRITES;
use contentforge_core::rewriter::{RewriteRequest, TextRewriter, Usage};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Counters for one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RewriteStats {
    pub attempted: u32,
    pub succeeded: u32,
    pub failed: u32,
    pub usage: Usage,
}

pub struct Copywriter {
    rewriter: Option<Arc<dyn TextRewriter>>,
    model: String,
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    max_concurrent: usize,
    stats: Mutex<RewriteStats>,
}

impl Copywriter {
    pub fn new(rewriter: Option<Arc<dyn TextRewriter>>, model: impl Into<String>) -> Self {
        let defaults = RewriteRequest::new("", "", "");
        Self {
            rewriter,
            model: model.into(),
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
            top_p: defaults.top_p,
            max_concurrent: DEFAULT_MAX_CONCURRENT_REWRITES,
            stats: Mutex::new(RewriteStats::default()),
        }
    }

    pub fn online(rewriter: Arc<dyn TextRewriter>, model: impl Into<String>) -> Self {
        Self::new(Some(rewriter), model)
    }

    /// A copywriter with no backend: every rewrite is a passthrough.
    pub fn offline() -> Self {
        Self::new(None, String::new())
    }

    /// Override the sampling parameters sent with every request.
    pub fn with_sampling(mut self, temperature: f32, max_tokens: u32, top_p: f32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self.top_p = top_p;
        self
    }

    /// Cap the requests [`rewrite_all`](Self::rewrite_all) keeps in flight.
    /// Zero is treated as one.
    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn is_available(&self) -> bool {
        self.rewriter.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Rewrite `text` following `instruction`. Returns `None` when no
    /// rewriter is configured or the call fails.
    pub async fn rewrite(&self, system: &str, instruction: &str, text: &str) -> Option<String> {
        let rewriter = self.rewriter.as_ref()?;

        let mut request = RewriteRequest::new(system, format!("{instruction}\n\n{text}"), &self.model);
        request.temperature = self.temperature;
        request.max_tokens = self.max_tokens;
        request.top_p = self.top_p;

        debug!(rewriter = rewriter.name(), model = %self.model, "Requesting rewrite");

        let outcome = rewriter.rewrite(request).await;
        let mut stats = self.stats.lock().unwrap_or_else(|e| e.into_inner());
        stats.attempted += 1;

        match outcome {
            Ok(response) => {
                stats.succeeded += 1;
                if let Some(usage) = &response.usage {
                    stats.usage.add(usage);
                }
                Some(response.text.trim().to_string()).filter(|t| !t.is_empty())
            }
            Err(e) => {
                stats.failed += 1;
                warn!(rewriter = rewriter.name(), error = %e, "Rewrite failed, keeping original text");
                None
            }
        }
    }

    /// Rewrite each of `texts` with the same prompt, keeping at most
    /// `max_concurrent` requests in flight. Results follow input order.
    pub async fn rewrite_all(
        &self,
        system: &str,
        instruction: &str,
        texts: &[&str],
    ) -> Vec<Option<String>> {
        if self.rewriter.is_none() {
            return vec![None; texts.len()];
        }
        let requests: Vec<_> = texts
            .iter()
            .map(|text| self.rewrite(system, instruction, text))
            .collect();
        stream::iter(requests)
            .buffered(self.max_concurrent)
            .collect()
            .await
    }

    pub fn stats(&self) -> RewriteStats {
        *self.stats.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for Copywriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Copywriter")
            .field("rewriter", &self.rewriter.as_ref().map(|r| r.name().to_string()))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("max_concurrent", &self.max_concurrent)
            .finish()
    }
}
