//! Stage 2: rebuilds body copy into AI-extractable semantic chunks.
//!
//! A chunk is a paragraph together with the text of the nearest preceding
//! H2. Labels are read from the current blocks, so they reflect any heading
//! rewrites made by Stage 1.

use async_trait::async_trait;
use contentforge_core::{Block, BlockKind, Document, Feedback, Severity, StagePassResult};
use std::sync::Arc;
use tracing::debug;

use crate::copywriter::Copywriter;
use crate::runtime::{StageAgent, StageContext};
use crate::text;

const SYSTEM: &str = "You optimize chunks for AI extraction.";
const INSTRUCTION: &str = "Rewrite the chunk using Answer→Evidence→Context. First sentence must answer \
the H2 question directly, next 2-3 sentences cite data or logic, final sentence explains why it matters.";

struct Chunk<'a> {
    block: &'a Block,
    label: Option<&'a str>,
}

impl Chunk<'_> {
    fn element(&self) -> String {
        format!("Chunk {}", self.label.unwrap_or("N/A"))
    }
}

fn collect_chunks(document: &Document) -> Vec<Chunk<'_>> {
    let mut current_h2 = None;
    let mut chunks = Vec::new();
    for block in &document.blocks {
        match block.kind {
            BlockKind::H2 => current_h2 = Some(block.text.as_str()),
            BlockKind::Paragraph => chunks.push(Chunk {
                block,
                label: current_h2,
            }),
            _ => {}
        }
    }
    chunks
}

pub struct ChunkOptimizer {
    copywriter: Arc<Copywriter>,
    rewrite_budget: usize,
}

impl ChunkOptimizer {
    /// `rewrite_budget` caps rewrite attempts per run; failing chunks past
    /// the budget are left as they are.
    pub fn new(copywriter: Arc<Copywriter>, rewrite_budget: usize) -> Self {
        Self {
            copywriter,
            rewrite_budget,
        }
    }

    fn issue(
        element: impl Into<String>,
        issue: impl Into<String>,
        mandate: impl Into<String>,
        sample: impl Into<String>,
        severity: Severity,
    ) -> Feedback {
        let impact = match severity {
            Severity::Critical | Severity::High => 85,
            Severity::Medium | Severity::Low => 60,
        };
        Feedback::new(element, issue, mandate, sample, severity, impact)
    }
}

#[async_trait]
impl StageAgent for ChunkOptimizer {
    fn name(&self) -> &str {
        "Stage 2 · Chunk Optimizer"
    }

    fn structural_pass(&self, ctx: &StageContext<'_>) -> StagePassResult {
        let mut pass = StagePassResult::new();
        let rules = ctx.rules;

        for chunk in collect_chunks(ctx.document) {
            let words = chunk.block.word_count();
            if words < rules.chunk_length_min {
                pass.push(Self::issue(
                    chunk.element(),
                    format!("Chunk under {} words cannot stand alone.", rules.chunk_length_min),
                    format!(
                        "Expand evidence/context so the chunk reaches {}+ words.",
                        rules.chunk_length_min
                    ),
                    chunk.block.text.clone(),
                    Severity::Medium,
                ));
            } else if words > rules.chunk_length_max {
                pass.push(Self::issue(
                    chunk.element(),
                    format!("Chunk exceeds {} words and mixes concepts.", rules.chunk_length_max),
                    "Split into multiple semantic chunks with clear focus.",
                    format!("{}...", text::truncate_chars(&chunk.block.text, 200)),
                    Severity::Medium,
                ));
            }
        }

        pass.scored_by_penalty(100, 15)
    }

    async fn copy_pass(&self, ctx: &StageContext<'_>, _structural: &StagePassResult) -> StagePassResult {
        let mut pass = StagePassResult::new();
        let mut attempts = 0usize;

        for chunk in collect_chunks(ctx.document) {
            if text::passes_aec(&chunk.block.text) {
                continue;
            }
            if attempts >= self.rewrite_budget {
                debug!(block = %chunk.block.id, budget = self.rewrite_budget, "Chunk rewrite budget exhausted");
                continue;
            }
            attempts += 1;

            let Some(rewritten) = self.copywriter.rewrite(SYSTEM, INSTRUCTION, &chunk.block.text).await else {
                continue;
            };
            pass.propose(chunk.block.rewritten(rewritten.clone()));
            pass.push(Self::issue(
                chunk.element(),
                "Chunk does not follow Answer→Evidence→Context style.",
                "Rewrite chunk so first sentence answers, middle cites data, last sentence explains relevance.",
                rewritten,
                Severity::High,
            ));
        }

        pass.scored_by_penalty(80, 10)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::AgentRuntime;
    use crate::test_helpers::{FailingRewriter, ScriptedRewriter};
    use contentforge_config::RuleSet;
    use contentforge_core::{ContentProfile, Metadata, OptimizationMode, RewriteError};

    fn ctx_for<'a>(doc: &'a Document, rules: &'a RuleSet) -> StageContext<'a> {
        StageContext {
            document: doc,
            rules,
            mode: OptimizationMode::Strict,
        }
    }

    fn sentences(n: usize) -> String {
        (0..n).map(|i| format!("Sentence number {i} here.")).collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn length_bounds_flag_short_and_long_chunks() {
        let long = "word ".repeat(260);
        let ok = "word ".repeat(100);
        let raw = format!("## Short?\nTiny chunk.\n## Long?\n{long}\n## Fine?\n{ok}");
        let doc = Document::parse(raw, ContentProfile::Blog, Metadata::new());
        let rules = RuleSet::default();
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::offline()), 5);

        let pass = agent.structural_pass(&ctx_for(&doc, &rules));
        assert_eq!(pass.feedback.len(), 2);
        assert_eq!(pass.feedback[0].element, "Chunk Short?");
        assert_eq!(pass.feedback[0].issue, "Chunk under 75 words cannot stand alone.");
        assert_eq!(pass.feedback[1].element, "Chunk Long?");
        assert!(pass.feedback[1].rewritten_sample.ends_with("..."));
        assert_eq!(pass.feedback[1].rewritten_sample.chars().count(), 203);
        assert_eq!(pass.score_delta, 70);
        assert!(pass.proposed_blocks.is_empty());
    }

    #[test]
    fn thought_leadership_allows_longer_chunks() {
        let raw = format!("## Topic?\n{}", "word ".repeat(280));
        let doc = Document::parse(raw, ContentProfile::ThoughtLeadership, Metadata::new());
        let rules = RuleSet::for_profile(ContentProfile::ThoughtLeadership);
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::offline()), 5);
        assert!(agent.structural_pass(&ctx_for(&doc, &rules)).feedback.is_empty());
    }

    #[test]
    fn chunks_before_any_h2_are_unlabelled() {
        let doc = Document::parse("Orphan.", ContentProfile::Blog, Metadata::new());
        let rules = RuleSet::default();
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::offline()), 5);
        let pass = agent.structural_pass(&ctx_for(&doc, &rules));
        assert_eq!(pass.feedback[0].element, "Chunk N/A");
    }

    #[tokio::test]
    async fn budget_caps_rewrites_and_leaves_the_rest_untouched() {
        let raw = (1..=6)
            .map(|i| format!("## Question {i}?\nChunk {i} has one sentence."))
            .collect::<Vec<_>>()
            .join("\n");
        let doc = Document::parse(raw, ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(ScriptedRewriter::always("Answer. Evidence. Context."));
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::online(rewriter.clone(), "qwen/qwen-turbo")), 5);
        let runtime = AgentRuntime::new(RuleSet::default(), OptimizationMode::Strict);

        let result = runtime.run(&agent, &doc, &mut Metadata::new()).await;

        assert_eq!(rewriter.call_count(), 5);
        let rewrites: Vec<&Feedback> = result.feedback.iter().filter(|f| f.severity == Severity::High).collect();
        assert_eq!(rewrites.len(), 5);
        assert!(rewrites.iter().all(|f| f.element != "Chunk Question 6?"));
        assert_eq!(result.merged_blocks[11].text, "Chunk 6 has one sentence.");
        assert_eq!(result.merged_blocks[9].text, "Answer. Evidence. Context.");
        assert_eq!(rewriter.requests()[0].system_instruction, SYSTEM);
    }

    #[tokio::test]
    async fn budget_counts_failed_attempts() {
        let raw = format!("## A?\nOne.\n## B?\nTwo.\n## C?\n{}", sentences(1));
        let doc = Document::parse(raw, ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(FailingRewriter::new(RewriteError::Timeout(60)));
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::online(rewriter.clone(), "qwen/qwen-turbo")), 2);
        let rules = RuleSet::default();
        let ctx = ctx_for(&doc, &rules);

        let structural = agent.structural_pass(&ctx);
        let copy = agent.copy_pass(&ctx, &structural).await;
        assert_eq!(rewriter.call_count(), 2);
        assert!(copy.feedback.is_empty());
        assert!(copy.proposed_blocks.is_empty());
        assert_eq!(copy.score_delta, 80);
    }

    #[tokio::test]
    async fn aec_compliant_chunks_are_not_rewritten() {
        let raw = format!("## A?\n{}", sentences(3));
        let doc = Document::parse(raw, ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(ScriptedRewriter::always("unused"));
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::online(rewriter.clone(), "qwen/qwen-turbo")), 5);
        let rules = RuleSet::default();
        let ctx = ctx_for(&doc, &rules);

        let copy = agent.copy_pass(&ctx, &StagePassResult::new()).await;
        assert_eq!(rewriter.call_count(), 0);
        assert_eq!(copy.score_delta, 80);
    }

    #[tokio::test]
    async fn zero_budget_disables_rewrites() {
        let doc = Document::parse("## A?\nOne.", ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(ScriptedRewriter::always("unused"));
        let agent = ChunkOptimizer::new(Arc::new(Copywriter::online(rewriter.clone(), "qwen/qwen-turbo")), 0);
        let rules = RuleSet::default();
        let copy = agent.copy_pass(&ctx_for(&doc, &rules), &StagePassResult::new()).await;
        assert_eq!(rewriter.call_count(), 0);
        assert!(copy.feedback.is_empty());
    }
}
