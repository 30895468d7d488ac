//! `contentforge optimize` — Run the pipeline over a document.

use clap::{Args, ValueEnum};
use contentforge_agent::{Pipeline, PipelineReport};
use contentforge_config::AppConfig;
use contentforge_core::{ContentProfile, Metadata, OptimizationMode, Result, TextRewriter};
use contentforge_providers::OpenRouterRewriter;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Markdown,
    Json,
}

#[derive(Debug, Args)]
pub struct OptimizeArgs {
    /// Document to optimize, or `-` to read stdin
    pub input: String,

    /// Content profile (blog, product-page, service-page, thought-leadership, knowledge-base)
    #[arg(short, long)]
    pub profile: Option<ContentProfile>,

    /// Optimization mode (strict or lite)
    #[arg(short, long)]
    pub mode: Option<OptimizationMode>,

    /// Rewrite model id; must be on the allow-list
    #[arg(long)]
    pub model: Option<String>,

    /// Primary keyword to optimize for
    #[arg(short, long)]
    pub keyword: Option<String>,

    /// Existing page title
    #[arg(long)]
    pub title: Option<String>,

    /// Existing meta description
    #[arg(long)]
    pub meta_description: Option<String>,

    /// JSON file with existing page metadata (title, schema, ...)
    #[arg(long)]
    pub metadata: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Skip the rewriter and run structural checks only
    #[arg(long)]
    pub offline: bool,

    /// Maximum chunk rewrite attempts per run
    #[arg(long)]
    pub chunk_budget: Option<usize>,
}

pub async fn run(args: OptimizeArgs) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    apply_overrides(&mut config, &args)?;

    let raw_text = read_input(&args.input)?;
    let metadata = build_metadata(&args)?;
    let rewriter = build_rewriter(&config, args.offline)?;

    let pipeline = Pipeline::from_config(&config, rewriter);
    let outcome = pipeline.run(&raw_text, metadata).await?;
    let report = PipelineReport::from_outcome(&outcome);

    info!(run_id = %report.run_id, status = %report.status, "Report ready");

    match args.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Markdown => print!("{}", report.markdown()),
        OutputFormat::Json => println!("{}", report.to_json()?),
    }

    Ok(())
}

/// Fold command-line flags into the loaded configuration. The model is
/// checked against the allow-list before anything runs.
fn apply_overrides(config: &mut AppConfig, args: &OptimizeArgs) -> Result<()> {
    if let Some(profile) = args.profile {
        config.pipeline.profile = profile;
    }
    if let Some(mode) = args.mode {
        config.pipeline.mode = mode;
    }
    if let Some(budget) = args.chunk_budget {
        config.pipeline.chunk_rewrite_budget = budget;
    }
    if let Some(keyword) = args.keyword.as_deref().filter(|k| !k.trim().is_empty()) {
        config.pipeline.primary_keyword = keyword.trim().to_string();
    }
    if let Some(model) = &args.model {
        config.rewriter.validate_model(model)?;
        config.rewriter.default_model = model.clone();
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    if input == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(read_file(Path::new(input))?)
}

/// Read `path`, naming it in the error.
fn read_file(path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| io::Error::new(e.kind(), format!("Failed to read {}: {e}", path.display())))
}

/// The metadata file must hold a single JSON object.
fn read_metadata_file(path: &Path) -> Result<Metadata> {
    let content = read_file(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Metadata from `--metadata`, then the individual flags on top.
fn build_metadata(args: &OptimizeArgs) -> Result<Metadata> {
    let mut metadata = match &args.metadata {
        Some(path) => read_metadata_file(path)?,
        None => Metadata::new(),
    };
    if let Some(keyword) = &args.keyword {
        metadata = metadata.with_primary_keyword(keyword.trim());
    }
    if let Some(title) = &args.title {
        metadata = metadata.with_title(title.as_str());
    }
    if let Some(description) = &args.meta_description {
        metadata = metadata.with_meta_description(description.as_str());
    }
    Ok(metadata)
}

/// The HTTP rewriter, or `None` when offline or no API key is configured.
fn build_rewriter(config: &AppConfig, offline: bool) -> Result<Option<Arc<dyn TextRewriter>>> {
    if offline {
        info!("Offline mode: copy passes disabled");
        return Ok(None);
    }
    if !config.rewriter.has_api_key() {
        warn!(
            "No API key configured (set {} or CONTENTFORGE_API_KEY); running structural checks only",
            config.rewriter.api_key_env
        );
        return Ok(None);
    }

    let rewriter: Arc<dyn TextRewriter> = Arc::new(OpenRouterRewriter::from_config(&config.rewriter)?);
    info!(model = %config.rewriter.default_model, "Rewriter ready");
    Ok(Some(rewriter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use contentforge_core::Error;
    use std::io::Write;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: OptimizeArgs,
    }

    fn parse(argv: &[&str]) -> OptimizeArgs {
        let mut full = vec!["contentforge"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn flags_parse_into_domain_types() {
        let args = parse(&[
            "post.md",
            "--profile",
            "thought-leadership",
            "--mode",
            "lite",
            "--format",
            "json",
            "--chunk-budget",
            "2",
            "--offline",
        ]);
        assert_eq!(args.input, "post.md");
        assert_eq!(args.profile, Some(ContentProfile::ThoughtLeadership));
        assert_eq!(args.mode, Some(OptimizationMode::Lite));
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.chunk_budget, Some(2));
        assert!(args.offline);
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let result = Harness::try_parse_from(["contentforge", "post.md", "--profile", "landing-page"]);
        assert!(result.is_err());
    }

    #[test]
    fn overrides_replace_pipeline_settings() {
        let mut config = AppConfig::default();
        let args = parse(&[
            "-",
            "--profile",
            "knowledge-base",
            "--keyword",
            "  rust  ",
            "--chunk-budget",
            "0",
        ]);
        apply_overrides(&mut config, &args).unwrap();
        assert_eq!(config.pipeline.profile, ContentProfile::KnowledgeBase);
        assert_eq!(config.pipeline.primary_keyword, "rust");
        assert_eq!(config.pipeline.chunk_rewrite_budget, 0);
    }

    #[test]
    fn disallowed_model_is_rejected_up_front() {
        let mut config = AppConfig::default();
        let args = parse(&["-", "--model", "acme/unknown-model"]);
        let err = apply_overrides(&mut config, &args).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
        assert!(err.to_string().contains("not enabled for this deployment"));
        assert_eq!(config.rewriter.default_model, AppConfig::default().rewriter.default_model);
    }

    #[test]
    fn flags_layer_over_metadata_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"title": "Old", "schema": {{"faq": []}}}}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = parse(&["-", "--metadata", &path, "--title", "New title"]);
        let metadata = build_metadata(&args).unwrap();
        assert_eq!(metadata.title(), Some("New title"));
        assert!(metadata.get("schema").is_some());
    }

    #[test]
    fn metadata_file_must_be_an_object() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[1, 2, 3]").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let args = parse(&["-", "--metadata", &path]);
        let err = build_metadata(&args).unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn offline_or_keyless_runs_without_rewriter() {
        let mut config = AppConfig::default();
        config.rewriter.api_key = None;
        assert!(build_rewriter(&config, false).unwrap().is_none());

        config.rewriter.api_key = Some("sk-or-test".into());
        assert!(build_rewriter(&config, true).unwrap().is_none());
        assert!(build_rewriter(&config, false).unwrap().is_some());
    }

    #[test]
    fn missing_input_file_reports_path() {
        let err = read_input("/definitely/not/here.md").unwrap_err();
        assert!(matches!(&err, Error::Io(e) if e.kind() == io::ErrorKind::NotFound));
        assert!(err.to_string().contains("/definitely/not/here.md"));
    }
}
