//! Stage 4: injects citations, dates and first-hand experience signals.

use async_trait::async_trait;
use contentforge_core::{Feedback, Severity, StagePassResult};
use std::sync::Arc;

use crate::copywriter::Copywriter;
use crate::runtime::{StageAgent, StageContext};
use crate::text;

const SYSTEM: &str = "You add authoritative citations.";
const INSTRUCTION: &str = "Strengthen this paragraph with: 1) an explicit source + URL, 2) a \
publication year, and 3) a first-hand/experience statement. Keep tone factual and cite reputable \
domains (.gov/.edu/.org).";

pub struct AuthorityBuilder {
    copywriter: Arc<Copywriter>,
}

impl AuthorityBuilder {
    pub fn new(copywriter: Arc<Copywriter>) -> Self {
        Self { copywriter }
    }

    fn issue(
        element: impl Into<String>,
        issue: impl Into<String>,
        mandate: impl Into<String>,
        sample: impl Into<String>,
        severity: Severity,
    ) -> Feedback {
        let impact = if severity == Severity::High { 95 } else { 70 };
        Feedback::new(element, issue, mandate, sample, severity, impact)
    }
}

#[async_trait]
impl StageAgent for AuthorityBuilder {
    fn name(&self) -> &str {
        "Stage 4 · Authority Builder"
    }

    fn structural_pass(&self, ctx: &StageContext<'_>) -> StagePassResult {
        let mut pass = StagePassResult::new();

        for block in ctx.document.paragraphs() {
            let element = format!("Paragraph {}", block.id);
            if !text::has_citation(&block.text) {
                pass.push(Self::issue(
                    element.clone(),
                    "Missing inline attribution with a specific source.",
                    "Reference a named source with a direct URL and publication year.",
                    "Add citation",
                    Severity::High,
                ));
            }
            if !text::has_fresh_year(&block.text) {
                pass.push(Self::issue(
                    element,
                    "No publication year attached to the cited evidence.",
                    "Add a year (2022+) to signal freshness.",
                    "Add year",
                    Severity::Medium,
                ));
            }
        }

        pass.scored_by_penalty(85, 10)
    }

    async fn copy_pass(&self, ctx: &StageContext<'_>, _structural: &StagePassResult) -> StagePassResult {
        let candidates: Vec<_> = ctx
            .document
            .paragraphs()
            .filter(|b| text::needs_authority_upgrade(&b.text))
            .collect();

        let texts: Vec<&str> = candidates.iter().map(|b| b.text.as_str()).collect();
        let rewrites = self.copywriter.rewrite_all(SYSTEM, INSTRUCTION, &texts).await;

        let mut pass = StagePassResult::new();
        for (block, rewritten) in candidates.into_iter().zip(rewrites) {
            let Some(rewritten) = rewritten else { continue };
            pass.propose(block.rewritten(rewritten.clone()));
            pass.push(Self::issue(
                format!("Paragraph {}", block.id),
                "Paragraph lacks explicit E-E-A-T markers.",
                "Add data-backed citation, date, and first-hand signal (e.g., 'In our audits...').",
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
    use crate::test_helpers::{FailingRewriter, InFlightRewriter, ScriptedRewriter};
    use contentforge_config::RuleSet;
    use contentforge_core::{ContentProfile, Document, Metadata, OptimizationMode, RewriteError};
    use std::time::Duration;

    const CITED: &str = "Per https://www.nist.gov/ai (2024), adoption doubled.";

    fn ctx_for<'a>(doc: &'a Document, rules: &'a RuleSet) -> StageContext<'a> {
        StageContext {
            document: doc,
            rules,
            mode: OptimizationMode::Strict,
        }
    }

    #[test]
    fn missing_citation_and_year_are_separate_findings() {
        let raw = format!("# T\nNo evidence here.\n{CITED}\nSee https://example.org for more.");
        let doc = Document::parse(raw, ContentProfile::Blog, Metadata::new());
        let rules = RuleSet::default();
        let pass = AuthorityBuilder::new(Arc::new(Copywriter::offline())).structural_pass(&ctx_for(&doc, &rules));

        let summary: Vec<(&str, Severity)> = pass
            .feedback
            .iter()
            .map(|f| (f.element.as_str(), f.severity))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Paragraph 2", Severity::High),
                ("Paragraph 2", Severity::Medium),
                ("Paragraph 4", Severity::Medium),
            ]
        );
        assert_eq!(pass.feedback[0].impact, 95);
        assert_eq!(pass.feedback[1].impact, 70);
        assert_eq!(pass.score_delta, 55);
    }

    #[tokio::test]
    async fn copy_pass_rewrites_every_weak_paragraph() {
        let raw = format!("No evidence.\n{CITED}\nOnly a year: 2023.");
        let doc = Document::parse(raw, ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(ScriptedRewriter::always(CITED));
        let agent = AuthorityBuilder::new(Arc::new(Copywriter::online(rewriter.clone(), "qwen/qwen-turbo")));
        let rules = RuleSet::default();

        let copy = agent.copy_pass(&ctx_for(&doc, &rules), &StagePassResult::new()).await;
        assert_eq!(rewriter.call_count(), 2);
        let ids: Vec<&str> = copy.proposed_blocks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert!(copy.feedback.iter().all(|f| f.severity == Severity::High));
        assert_eq!(copy.score_delta, 60);
        assert!(rewriter.requests()[0].user_text.starts_with("Strengthen this paragraph"));
    }

    #[tokio::test]
    async fn failed_rewrites_leave_no_feedback() {
        let doc = Document::parse("No evidence.", ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(FailingRewriter::new(RewriteError::UnsupportedModel("x".into())));
        let agent = AuthorityBuilder::new(Arc::new(Copywriter::online(rewriter.clone(), "x")));
        let rules = RuleSet::default();

        let copy = agent.copy_pass(&ctx_for(&doc, &rules), &StagePassResult::new()).await;
        assert_eq!(rewriter.call_count(), 1);
        assert!(copy.feedback.is_empty());
        assert_eq!(copy.score_delta, 80);
    }

    #[tokio::test]
    async fn weak_paragraphs_are_rewritten_a_few_at_a_time() {
        let raw: Vec<String> = (0..30).map(|i| format!("Claim number {i} without a source.")).collect();
        let doc = Document::parse(raw.join("\n"), ContentProfile::Blog, Metadata::new());
        let rewriter = Arc::new(InFlightRewriter::new(Duration::from_millis(5)));
        let copywriter = Copywriter::online(rewriter.clone(), "qwen/qwen-turbo").with_max_concurrent(4);
        let rules = RuleSet::default();

        let copy = AuthorityBuilder::new(Arc::new(copywriter))
            .copy_pass(&ctx_for(&doc, &rules), &StagePassResult::new())
            .await;

        assert_eq!(rewriter.peak(), 4);
        assert_eq!(copy.feedback.len(), 30);
        assert_eq!(copy.feedback[29].element, "Paragraph 30");
    }
}
