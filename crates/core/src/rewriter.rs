//! The abstraction over language-model rewrite backends.
//!
//! A rewriter takes a system instruction plus the text to rewrite and returns
//! new text, or fails with a [`RewriteError`]. Stages never depend on which
//! backend is in use.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::RewriteError;

fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_top_p() -> f32 {
    0.95
}

/// A single rewrite request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteRequest {
    /// Role/system prompt for the model
    pub system_instruction: String,

    /// The instruction plus the text to rewrite
    pub user_text: String,

    /// Model identifier (must be on the deployment allow-list)
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

impl RewriteRequest {
    pub fn new(
        system_instruction: impl Into<String>,
        user_text: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            user_text: user_text.into(),
            model: model.into(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
        }
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl Usage {
    pub fn add(&mut self, other: &Usage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.completion_tokens = self.completion_tokens.saturating_add(other.completion_tokens);
        self.total_tokens = self.total_tokens.saturating_add(other.total_tokens);
    }
}

/// A successful rewrite.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewriteResponse {
    pub text: String,

    /// Which model actually responded
    pub model: String,

    pub usage: Option<Usage>,
}

/// The rewrite capability consumed by stage copy passes.
#[async_trait]
pub trait TextRewriter: Send + Sync {
    /// A human-readable name for this backend (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Rewrite `request.user_text` following `request.system_instruction`.
    async fn rewrite(&self, request: RewriteRequest) -> Result<RewriteResponse, RewriteError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_defaults() {
        let req = RewriteRequest::new("system", "text", "qwen/qwen-turbo");
        assert!((req.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(req.max_tokens, 2048);
        assert!((req.top_p - 0.95).abs() < f32::EPSILON);
    }

    #[test]
    fn request_deserializes_with_defaults() {
        let req: RewriteRequest = serde_json::from_str(
            r#"{"system_instruction":"s","user_text":"u","model":"m"}"#,
        )
        .unwrap();
        assert_eq!(req.max_tokens, 2048);
    }

    #[test]
    fn usage_accumulates() {
        let mut total = Usage::default();
        total.add(&Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        });
        total.add(&Usage {
            prompt_tokens: 1,
            completion_tokens: 1,
            total_tokens: 2,
        });
        assert_eq!(total.total_tokens, 17);
        assert_eq!(total.prompt_tokens, 11);
    }
}
