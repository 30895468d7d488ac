//! Stage 1: guarantees structural readiness before the other stages run.

use async_trait::async_trait;
use contentforge_core::{Block, BlockKind, Feedback, Severity, StagePassResult};
use std::sync::Arc;

use crate::copywriter::Copywriter;
use crate::runtime::{StageAgent, StageContext};
use crate::text;

const SYSTEM: &str = "You are an SEO content strategist.";
const INSTRUCTION: &str = "Rewrite the introduction into a 35-45 word answer-first paragraph. \
State the direct answer in sentence one, then preview the H2 questions.";

pub struct ContentStrategist {
    copywriter: Arc<Copywriter>,
}

impl ContentStrategist {
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
        let impact = match severity {
            Severity::Critical | Severity::High => 90,
            Severity::Medium | Severity::Low => 60,
        };
        Feedback::new(element, issue, mandate, sample, severity, impact)
    }

    fn suggest_core_question(first_h1: Option<&Block>) -> String {
        let topic = first_h1.map_or("the main topic", |b| b.text.trim_end_matches('?'));
        format!("What is {topic}?")
    }

    fn templated_intro(ctx: &StageContext<'_>) -> String {
        let keyword = ctx.primary_keyword().unwrap_or("your topic");
        format!(
            "The fastest way to understand {keyword} is to answer the core question up front, \
             then preview the H2 questions this guide covers."
        )
    }
}

#[async_trait]
impl StageAgent for ContentStrategist {
    fn name(&self) -> &str {
        "Stage 1 · Content Strategist"
    }

    fn structural_pass(&self, ctx: &StageContext<'_>) -> StagePassResult {
        let mut pass = StagePassResult::new();
        let doc = ctx.document;
        let rules = ctx.rules;

        let h1s: Vec<&Block> = doc.blocks_of(BlockKind::H1).collect();
        if h1s.len() != 1 {
            pass.push(Self::issue(
                "H1",
                "Document should contain exactly one H1 heading.",
                "Create a single H1 that states the primary question this page answers for AI Overviews.",
                Self::suggest_core_question(h1s.first().copied()),
                Severity::High,
            ));
        }

        if rules.require_answer_first_intro {
            if let Some(intro) = doc.first_paragraph() {
                if !text::is_answer_first_intro(&intro.text, rules.intro_range()) {
                    let rewritten = Self::templated_intro(ctx);
                    pass.propose(intro.rewritten(rewritten.clone()));
                    pass.push(Self::issue(
                        "Introduction",
                        format!(
                            "Opening paragraph is not an answer-first {}-{} word summary.",
                            rules.intro_min_words, rules.intro_max_words
                        ),
                        "Lead with the direct answer and preview the H2 questions you will cover.",
                        rewritten,
                        Severity::High,
                    ));
                }
            }
        }

        if rules.require_h2_questions {
            for h2 in doc.blocks_of(BlockKind::H2) {
                if h2.text.trim().ends_with('?') {
                    continue;
                }
                let question = text::questionize(&h2.text);
                pass.propose(h2.rewritten(question.clone()));
                pass.push(Self::issue(
                    format!("H2 · {}", text::truncate_chars(&h2.text, 50)),
                    "H2 headings must be phrased as natural questions aligned to intent.",
                    "Rewrite H2s into intent-based questions so AI crawlers can map them to clear needs.",
                    question,
                    Severity::Medium,
                ));
            }
        }

        if rules.require_faq {
            let faq_count = doc.blocks_of(BlockKind::Faq).count();
            if faq_count < rules.faq_min_entries {
                pass.push(Self::issue(
                    "FAQ section",
                    format!(
                        "Needs at least {} long-tail follow-up questions beyond the H2 coverage.",
                        rules.faq_min_entries
                    ),
                    "Add 3-5 FAQ entries covering adjacent intents so AI overviews can reference them.",
                    "Add FAQ entries referencing the H2 coverage and new long-tail intents.",
                    Severity::Medium,
                ));
            }
        }

        pass.scored_by_penalty(100, 20)
    }

    async fn copy_pass(&self, ctx: &StageContext<'_>, structural: &StagePassResult) -> StagePassResult {
        let mut pass = StagePassResult::new();

        if let Some(intro) = ctx.document.first_paragraph() {
            if !structural.proposes(&intro.id) {
                if let Some(rewritten) = self.copywriter.rewrite(SYSTEM, INSTRUCTION, &intro.text).await {
                    pass.propose(intro.rewritten(rewritten.clone()));
                    pass.push(Self::issue(
                        "Introduction",
                        "LLM rewrite enforced the answer-first structure AI crawlers expect.",
                        "Adopt the Strategist rewrite so Stage 2 can chunk around a clean answer-first intro.",
                        rewritten,
                        Severity::Medium,
                    ));
                }
            }
        }

        let score = if pass.feedback.is_empty() { 10 } else { 0 };
        pass.with_score(score)
    }
}
