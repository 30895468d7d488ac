//! The pipeline orchestrator.
//!
//! Sequences the stage agents over an evolving [`Document`]:
//!
//! 1. Parse the raw text (an empty document is rejected up front)
//! 2. Seed the canonical metadata with the primary keyword
//! 3. For each stage: run it, derive the next document from its merged
//!    blocks and the current metadata snapshot
//! 4. Return every [`StageResult`] in order together with the final document

use chrono::{DateTime, Utc};
use contentforge_config::{AppConfig, PipelineConfig, RuleSet};
use contentforge_core::metadata::PRIMARY_KEYWORD;
use contentforge_core::{
    ContentProfile, Document, Error, Metadata, OptimizationMode, Result, StageResult, TextRewriter,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::copywriter::{Copywriter, RewriteStats};
use crate::runtime::{AgentRuntime, StageAgent};
use crate::stages::default_stages;

/// Everything one pipeline run produced.
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub profile: ContentProfile,
    pub mode: OptimizationMode,
    /// Rewrite model, `None` when running offline
    pub model: Option<String>,
    /// Stage results in execution order
    pub stages: Vec<StageResult>,
    /// The document after every stage's merged edits
    pub document: Document,
    /// Final canonical metadata
    pub metadata: Metadata,
    pub rewrites: RewriteStats,
}

pub struct Pipeline {
    profile: ContentProfile,
    primary_keyword: String,
    runtime: AgentRuntime,
    stages: Vec<Box<dyn StageAgent>>,
    copywriter: Arc<Copywriter>,
}

impl Pipeline {
    /// The standard five-stage pipeline.
    pub fn new(config: &PipelineConfig, copywriter: Arc<Copywriter>) -> Self {
        Self {
            profile: config.profile,
            primary_keyword: config.primary_keyword.clone(),
            runtime: AgentRuntime::new(config.rules(), config.mode),
            stages: default_stages(copywriter.clone(), config.chunk_rewrite_budget),
            copywriter,
        }
    }

    /// Build from full configuration, using `rewriter` for copy passes when
    /// present.
    pub fn from_config(config: &AppConfig, rewriter: Option<Arc<dyn TextRewriter>>) -> Self {
        let rw = &config.rewriter;
        let copywriter = Copywriter::new(rewriter, &rw.default_model).with_sampling(
            rw.temperature,
            rw.max_tokens,
            rw.top_p,
        )
        .with_max_concurrent(rw.max_concurrent_rewrites);
        Self::new(&config.pipeline, Arc::new(copywriter))
    }

    /// Replace the stage lineup.
    pub fn with_stages(mut self, stages: Vec<Box<dyn StageAgent>>) -> Self {
        self.stages = stages;
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn rules(&self) -> &RuleSet {
        self.runtime.rules()
    }

    /// Parse `raw_text` and run every stage over it.
    pub async fn run(&self, raw_text: &str, metadata: Metadata) -> Result<PipelineOutcome> {
        let mut canonical = metadata;
        if canonical.primary_keyword().is_none() && !self.primary_keyword.trim().is_empty() {
            canonical.insert(PRIMARY_KEYWORD, self.primary_keyword.clone());
        }

        let document = Document::parse(raw_text, self.profile, canonical.clone());
        self.run_document(document, canonical).await
    }

    /// Run every stage over an already-parsed document. `metadata` becomes
    /// the canonical map; the document's own snapshot is replaced by it.
    pub async fn run_document(
        &self,
        document: Document,
        metadata: Metadata,
    ) -> Result<PipelineOutcome> {
        if document.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut canonical = metadata;
        let mut current = document.derive(document.blocks.clone(), canonical.clone());
        let mut results = Vec::with_capacity(self.stages.len());

        info!(
            %run_id,
            profile = %current.profile,
            mode = %self.runtime.mode(),
            blocks = current.blocks.len(),
            rewriter = self.copywriter.is_available(),
            "Pipeline starting"
        );

        for stage in &self.stages {
            debug!(%run_id, stage = stage.name(), "Stage starting");
            let result = self.runtime.run(stage.as_ref(), &current, &mut canonical).await;
            current = current.derive(result.merged_blocks.clone(), canonical.clone());
            results.push(result);
        }

        let rewrites = self.copywriter.stats();
        info!(
            %run_id,
            stages = results.len(),
            rewrites = rewrites.succeeded,
            failed_rewrites = rewrites.failed,
            tokens = rewrites.usage.total_tokens,
            "Pipeline finished"
        );

        Ok(PipelineOutcome {
            run_id,
            started_at,
            profile: current.profile,
            mode: self.runtime.mode(),
            model: self
                .copywriter
                .is_available()
                .then(|| self.copywriter.model().to_string()),
            stages: results,
            document: current,
            metadata: canonical,
            rewrites,
        })
    }
}
