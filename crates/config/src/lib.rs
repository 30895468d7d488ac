//! Configuration loading, validation, and management for ContentForge.
//!
//! Loads configuration from `~/.contentforge/config.toml` with environment
//! variable overrides. Validates all settings at startup.

pub mod models;
pub mod rules;

use contentforge_core::{ContentProfile, OptimizationMode};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub use models::{DEFAULT_MODEL, MODEL_CATALOG, ModelInfo, ModelTier, find_model};
pub use rules::{RuleSet, SvoPreference};

/// Chunk rewrite attempts allowed per run unless configured otherwise.
pub const DEFAULT_CHUNK_REWRITE_BUDGET: usize = 5;

/// Rewrite requests a stage keeps in flight at once unless configured otherwise.
pub const DEFAULT_MAX_CONCURRENT_REWRITES: usize = 4;

/// The root configuration structure.
///
/// Maps directly to `~/.contentforge/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Pipeline behavior (profile, mode, keyword, budgets)
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Language-model rewriter settings
    #[serde(default)]
    pub rewriter: RewriterConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub profile: ContentProfile,

    #[serde(default)]
    pub mode: OptimizationMode,

    /// Keyword used by the intro and metadata templates
    #[serde(default = "default_primary_keyword")]
    pub primary_keyword: String,

    /// Maximum chunk rewrite attempts per run
    #[serde(default = "default_chunk_rewrite_budget")]
    pub chunk_rewrite_budget: usize,
}

fn default_primary_keyword() -> String {
    "ai content optimization".into()
}
fn default_chunk_rewrite_budget() -> usize {
    DEFAULT_CHUNK_REWRITE_BUDGET
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            profile: ContentProfile::default(),
            mode: OptimizationMode::default(),
            primary_keyword: default_primary_keyword(),
            chunk_rewrite_budget: default_chunk_rewrite_budget(),
        }
    }
}

impl PipelineConfig {
    pub fn rules(&self) -> RuleSet {
        RuleSet::for_profile(self.profile)
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RewriterConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// API key (prefer the environment over writing it here)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable consulted for the key when `api_key` is unset
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_model")]
    pub default_model: String,

    /// Models enabled for this deployment
    #[serde(default = "models::catalog_ids")]
    pub allowed_models: Vec<String>,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Upper bound on concurrent requests from a single stage
    #[serde(default = "default_max_concurrent_rewrites")]
    pub max_concurrent_rewrites: usize,

    /// Sent as `HTTP-Referer`
    #[serde(default)]
    pub referer: String,

    /// Sent as `X-Title`
    #[serde(default = "default_app_title")]
    pub app_title: String,
}

fn default_api_base() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    DEFAULT_MODEL.into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    2048
}
fn default_top_p() -> f32 {
    0.95
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_max_concurrent_rewrites() -> usize {
    DEFAULT_MAX_CONCURRENT_REWRITES
}
fn default_app_title() -> String {
    "AI Content Optimizer".into()
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            allowed_models: models::catalog_ids(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            timeout_secs: default_timeout_secs(),
            max_concurrent_rewrites: default_max_concurrent_rewrites(),
            referer: String::new(),
            app_title: default_app_title(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for RewriterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RewriterConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &redact(&self.api_key))
            .field("api_key_env", &self.api_key_env)
            .field("default_model", &self.default_model)
            .field("allowed_models", &self.allowed_models)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("top_p", &self.top_p)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_concurrent_rewrites", &self.max_concurrent_rewrites)
            .field("referer", &self.referer)
            .field("app_title", &self.app_title)
            .finish()
    }
}

impl RewriterConfig {
    pub fn is_model_allowed(&self, model_id: &str) -> bool {
        self.allowed_models.iter().any(|m| m == model_id)
    }

    /// Check a model id against the deployment allow-list.
    pub fn validate_model<'a>(&self, model_id: &'a str) -> Result<&'a str, ConfigError> {
        if self.is_model_allowed(model_id) {
            Ok(model_id)
        } else {
            Err(ConfigError::ValidationError(format!(
                "Model '{model_id}' is not enabled for this deployment"
            )))
        }
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.contentforge/config.toml).
    ///
    /// Also checks environment variables:
    /// - `CONTENTFORGE_API_KEY` (highest priority)
    /// - the variable named by `rewriter.api_key_env` (`OPENROUTER_API_KEY`)
    /// - `CONTENTFORGE_MODEL` overrides the default model
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides using `lookup` to read variables.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if !self.rewriter.has_api_key() {
            self.rewriter.api_key =
                non_empty("CONTENTFORGE_API_KEY").or_else(|| non_empty(&self.rewriter.api_key_env));
        }

        if let Some(model) = non_empty("CONTENTFORGE_MODEL") {
            self.rewriter.default_model = model;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".contentforge")
    }

    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rewriter = &self.rewriter;

        if !(0.0..=2.0).contains(&rewriter.temperature) {
            return Err(ConfigError::ValidationError(
                "rewriter.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if rewriter.top_p <= 0.0 || rewriter.top_p > 1.0 {
            return Err(ConfigError::ValidationError(
                "rewriter.top_p must be in (0.0, 1.0]".into(),
            ));
        }

        if rewriter.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "rewriter.max_tokens must be > 0".into(),
            ));
        }

        if rewriter.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "rewriter.timeout_secs must be > 0".into(),
            ));
        }

        if rewriter.max_concurrent_rewrites == 0 {
            return Err(ConfigError::ValidationError(
                "rewriter.max_concurrent_rewrites must be > 0".into(),
            ));
        }

        if rewriter.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "rewriter.api_base must not be empty".into(),
            ));
        }

        if rewriter.allowed_models.is_empty() {
            return Err(ConfigError::ValidationError(
                "rewriter.allowed_models must list at least one model".into(),
            ));
        }

        rewriter.validate_model(&rewriter.default_model)?;

        Ok(())
    }

    pub fn rules(&self) -> RuleSet {
        self.pipeline.rules()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigError> for contentforge_core::Error {
    fn from(e: ConfigError) -> Self {
        contentforge_core::Error::config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.profile, ContentProfile::Blog);
        assert_eq!(config.pipeline.mode, OptimizationMode::Strict);
        assert_eq!(config.pipeline.chunk_rewrite_budget, DEFAULT_CHUNK_REWRITE_BUDGET);
        assert_eq!(config.rewriter.max_concurrent_rewrites, DEFAULT_MAX_CONCURRENT_REWRITES);
        assert_eq!(config.rewriter.default_model, "google/gemini-3-pro-preview");
        assert_eq!(config.rewriter.timeout_secs, 60);
    }

    #[test]
    fn config_roundtrip_toml() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.pipeline.primary_keyword, config.pipeline.primary_keyword);
        assert_eq!(parsed.rewriter.allowed_models, config.rewriter.allowed_models);
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.rewriter.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_top_p_rejected() {
        let mut config = AppConfig::default();
        config.rewriter.top_p = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.rewriter.max_concurrent_rewrites = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_concurrent_rewrites"));
    }

    #[test]
    fn config_errors_convert_to_core_config_errors() {
        let err: contentforge_core::Error = ConfigError::ValidationError("bad".into()).into();
        assert!(matches!(err, contentforge_core::Error::Config { .. }));
        assert!(err.to_string().contains("bad"));
    }

    #[test]
    fn default_model_must_be_allowed() {
        let mut config = AppConfig::default();
        config.rewriter.default_model = "openai/gpt-2".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("not enabled"));
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let result = AppConfig::load_from(Path::new("/nonexistent/config.toml"));
        assert!(result.is_ok());
        assert_eq!(result.unwrap().pipeline.chunk_rewrite_budget, 5);
    }

    #[test]
    fn loads_partial_file_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[pipeline]
profile = "thought-leadership"
mode = "lite"
chunk_rewrite_budget = 2

[rewriter]
default_model = "qwen/qwen-turbo"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.pipeline.profile, ContentProfile::ThoughtLeadership);
        assert_eq!(config.pipeline.mode, OptimizationMode::Lite);
        assert_eq!(config.pipeline.chunk_rewrite_budget, 2);
        assert_eq!(config.pipeline.primary_keyword, "ai content optimization");
        assert_eq!(config.rewriter.default_model, "qwen/qwen-turbo");
        assert!(!config.rules().require_h2_questions);
    }

    #[test]
    fn malformed_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pipeline\nprofile = ").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn invalid_file_is_validation_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[rewriter]\ntemperature = 3.5").unwrap();
        let err = AppConfig::load_from(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn env_overrides_prefer_contentforge_key() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("CONTENTFORGE_API_KEY", "cf-key"),
            ("OPENROUTER_API_KEY", "or-key"),
            ("CONTENTFORGE_MODEL", "x-ai/grok-4.1-fast"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.rewriter.api_key.as_deref(), Some("cf-key"));
        assert_eq!(config.rewriter.default_model, "x-ai/grok-4.1-fast");
    }

    #[test]
    fn env_overrides_fall_back_to_named_variable() {
        let mut config = AppConfig::default();
        config.apply_env_overrides(|name| (name == "OPENROUTER_API_KEY").then(|| "or-key".into()));
        assert_eq!(config.rewriter.api_key.as_deref(), Some("or-key"));
    }

    #[test]
    fn file_key_wins_over_environment() {
        let mut config = AppConfig::default();
        config.rewriter.api_key = Some("file-key".into());
        config.apply_env_overrides(|_| Some("env-key".into()));
        assert_eq!(config.rewriter.api_key.as_deref(), Some("file-key"));
    }

    #[test]
    fn debug_redacts_api_key() {
        let mut config = AppConfig::default();
        config.rewriter.api_key = Some("sk-or-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-or-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_toml_generation() {
        let toml_str = AppConfig::default_toml();
        assert!(toml_str.contains("[pipeline]"));
        assert!(toml_str.contains("openrouter.ai"));
        assert!(toml_str.contains("blog"));
    }
}
