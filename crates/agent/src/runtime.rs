//! The shared stage lifecycle.
//!
//! Every stage agent implements [`StageAgent`]: a synchronous structural pass
//! and an async copy pass. [`AgentRuntime`] drives any agent through the same
//! sequence:
//!
//! ```text
//! structural pass ─► copy pass ─► merge ─► score ─► gate ─► summary
//! ```
//!
//! The runtime never fails: a stage always produces a [`StageResult`].

use async_trait::async_trait;
use contentforge_config::RuleSet;
use contentforge_core::{
    Block, Document, Feedback, GateDecision, Metadata, OptimizationMode, Severity,
    StagePassResult, StageResult, StageScore,
};
use std::collections::HashMap;
use tracing::{info, warn};

/// Score at or above which a stage passes outright.
pub const PASS_THRESHOLD: u32 = 80;

pub const SCORE_LABEL: &str = "AI Readiness";

/// Everything a stage may read while it runs.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub document: &'a Document,
    pub rules: &'a RuleSet,
    pub mode: OptimizationMode,
}

impl StageContext<'_> {
    /// Primary keyword from the metadata snapshot.
    pub fn primary_keyword(&self) -> Option<&str> {
        self.document.metadata.primary_keyword()
    }
}

/// A pipeline stage.
#[async_trait]
pub trait StageAgent: Send + Sync {
    /// Display name, e.g. "Stage 1 · Content Strategist".
    fn name(&self) -> &str;

    /// Whether this stage's `metadata_writes` are applied to the canonical
    /// metadata.
    fn writes_metadata(&self) -> bool {
        false
    }

    /// Rule-based checks on structure, headings and intent.
    fn structural_pass(&self, ctx: &StageContext<'_>) -> StagePassResult;

    /// Paragraph- and sentence-level work, which may call the rewriter.
    async fn copy_pass(
        &self,
        ctx: &StageContext<'_>,
        structural: &StagePassResult,
    ) -> StagePassResult;
}

/// Drives any [`StageAgent`] through the stage lifecycle.
#[derive(Debug, Clone)]
pub struct AgentRuntime {
    rules: RuleSet,
    mode: OptimizationMode,
}

impl AgentRuntime {
    pub fn new(rules: RuleSet, mode: OptimizationMode) -> Self {
        Self { rules, mode }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn mode(&self) -> OptimizationMode {
        self.mode
    }

    /// Run one stage over `document`.
    ///
    /// `metadata` is the canonical metadata map; it is only written when the
    /// agent declares write access.
    pub async fn run(
        &self,
        agent: &dyn StageAgent,
        document: &Document,
        metadata: &mut Metadata,
    ) -> StageResult {
        let ctx = StageContext {
            document,
            rules: &self.rules,
            mode: self.mode,
        };

        let structural = agent.structural_pass(&ctx);
        let copy = agent.copy_pass(&ctx, &structural).await;

        let merged_blocks = merge_blocks(
            &document.blocks,
            &structural.proposed_blocks,
            &copy.proposed_blocks,
        );
        let value = combine_scores(structural.score_delta, copy.score_delta);

        let mut feedback = structural.feedback;
        feedback.extend(copy.feedback);

        let decision = decide_gate(value, &feedback, self.mode);
        let summary = summarize(&feedback, decision);

        for writes in [&structural.metadata_writes, &copy.metadata_writes] {
            if writes.is_empty() {
                continue;
            }
            if agent.writes_metadata() {
                metadata.apply(writes);
            } else {
                warn!(
                    stage = agent.name(),
                    fields = writes.len(),
                    "Stage without metadata access proposed metadata writes; discarded"
                );
            }
        }

        info!(
            stage = agent.name(),
            score = value,
            decision = %decision,
            issues = feedback.len(),
            "Stage finished"
        );

        StageResult {
            stage_name: agent.name().to_string(),
            decision,
            score: StageScore {
                value,
                label: SCORE_LABEL.into(),
                rationale: score_rationale(document, self.mode),
            },
            feedback,
            merged_blocks,
            summary,
        }
    }
}

/// Substitute proposals into `original` by id. Copy proposals win over
/// structural ones; ids not present in `original` are ignored, so order and
/// length are always preserved.
pub fn merge_blocks(original: &[Block], structural: &[Block], copy: &[Block]) -> Vec<Block> {
    let replacements: HashMap<_, _> = structural
        .iter()
        .chain(copy)
        .map(|block| (&block.id, block))
        .collect();

    original
        .iter()
        .map(|block| (*replacements.get(&block.id).unwrap_or(&block)).clone())
        .collect()
}

/// `clamp(structural + copy, 0, 100)`.
pub fn combine_scores(structural: u32, copy: u32) -> u32 {
    structural.saturating_add(copy).min(100)
}

/// Critical findings fail the stage regardless of score; otherwise a score
/// at or above [`PASS_THRESHOLD`] passes, Lite mode skips, Strict fails.
pub fn decide_gate(score: u32, feedback: &[Feedback], mode: OptimizationMode) -> GateDecision {
    if feedback.iter().any(|f| f.severity == Severity::Critical) {
        return GateDecision::Failed;
    }
    if score >= PASS_THRESHOLD {
        return GateDecision::Passed;
    }
    match mode {
        OptimizationMode::Lite => GateDecision::Skipped,
        OptimizationMode::Strict => GateDecision::Failed,
    }
}

pub fn summarize(feedback: &[Feedback], decision: GateDecision) -> String {
    let count = |severity| feedback.iter().filter(|f| f.severity == severity).count();
    format!(
        "Decision: {decision}. Issues -> Critical {}, High {}, Medium {}, Low {}.",
        count(Severity::Critical),
        count(Severity::High),
        count(Severity::Medium),
        count(Severity::Low),
    )
}

pub fn score_rationale(document: &Document, mode: OptimizationMode) -> String {
    format!("Profile: {}; Mode: {}", document.profile, mode.description())
}
