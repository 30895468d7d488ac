//! The catalog of OpenRouter models this deployment can rewrite with.

use serde::Serialize;

/// Rough cost/speed class of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelTier {
    Premium,
    Balanced,
    Fast,
    Vision,
}

impl std::fmt::Display for ModelTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Premium => write!(f, "premium"),
            Self::Balanced => write!(f, "balanced"),
            Self::Fast => write!(f, "fast"),
            Self::Vision => write!(f, "vision"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub tier: ModelTier,
}

pub const DEFAULT_MODEL: &str = "google/gemini-3-pro-preview";

pub const MODEL_CATALOG: &[ModelInfo] = &[
    ModelInfo {
        id: "openai/gpt-5.1",
        label: "OpenAI GPT-5.1",
        tier: ModelTier::Premium,
    },
    ModelInfo {
        id: "openai/gpt-4.1-mini",
        label: "OpenAI GPT-4.1 Mini",
        tier: ModelTier::Balanced,
    },
    ModelInfo {
        id: "anthropic/claude-sonnet-4.5",
        label: "Anthropic Claude Sonnet 4.5",
        tier: ModelTier::Premium,
    },
    ModelInfo {
        id: "google/gemini-3-pro-preview",
        label: "Google Gemini 3 Pro Preview",
        tier: ModelTier::Balanced,
    },
    ModelInfo {
        id: "google/gemini-2.5-flash-preview-09-2025",
        label: "Google Gemini 2.5 Flash Preview (09/2025)",
        tier: ModelTier::Fast,
    },
    ModelInfo {
        id: "x-ai/grok-4.1-fast",
        label: "xAI Grok 4.1 Fast",
        tier: ModelTier::Fast,
    },
    ModelInfo {
        id: "qwen/qwen-turbo",
        label: "Qwen Turbo",
        tier: ModelTier::Fast,
    },
    ModelInfo {
        id: "meta-llama/llama-4-maverick",
        label: "Meta Llama 4 Maverick",
        tier: ModelTier::Balanced,
    },
    ModelInfo {
        id: "qwen/qwen3-vl-8b-thinking",
        label: "Qwen3 VL 8B Thinking",
        tier: ModelTier::Vision,
    },
];

/// Look up a catalog entry by model id.
pub fn find_model(id: &str) -> Option<&'static ModelInfo> {
    MODEL_CATALOG.iter().find(|m| m.id == id)
}

/// Every catalog id, used as the default allow-list.
pub fn catalog_ids() -> Vec<String> {
    MODEL_CATALOG.iter().map(|m| m.id.to_string()).collect()
}
