//! Stage 3: refactors sentences so they are extraction-friendly.

use async_trait::async_trait;
use contentforge_core::{Feedback, Severity, StagePassResult};
use std::sync::Arc;

use crate::copywriter::Copywriter;
use crate::runtime::{StageAgent, StageContext};
use crate::text;

const SYSTEM: &str = "You polish text for NLP extraction.";
const INSTRUCTION: &str = "Rephrase this paragraph using short SVO sentences and causal connectors. \
Add quantified comparisons and cite explicit entities.";

pub struct NlpStylist {
    copywriter: Arc<Copywriter>,
}

impl NlpStylist {
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
        let impact = if severity == Severity::High { 85 } else { 60 };
        Feedback::new(element, issue, mandate, sample, severity, impact)
    }
}

#[async_trait]
impl StageAgent for NlpStylist {
    fn name(&self) -> &str {
        "Stage 3 · NLP Stylist"
    }

    fn structural_pass(&self, ctx: &StageContext<'_>) -> StagePassResult {
        let mut pass = StagePassResult::new();
        let max_words = ctx.rules.max_sentence_words;

        for block in ctx.document.paragraphs() {
            let sentences = text::split_sentences(&block.text);
            let element = format!("Paragraph {}", block.id);

            if let Some(long) = sentences.iter().find(|s| text::word_count(s) > max_words) {
                pass.push(Self::issue(
                    element.clone(),
                    format!("Contains sentences longer than {max_words} words."),
                    "Split sentences so each carries one subject-verb-object idea.",
                    *long,
                    Severity::Medium,
                ));
            }

            if let Some(passive) = sentences.iter().find(|s| text::looks_passive(s)) {
                pass.push(Self::issue(
                    element,
                    "Relies on passive voice, which hinders AI extraction.",
                    "Rewrite sentences so the subject performs the action directly.",
                    *passive,
                    Severity::Medium,
                ));
            }
        }

        pass.scored_by_penalty(90, 10)
    }

    async fn copy_pass(&self, ctx: &StageContext<'_>, _structural: &StagePassResult) -> StagePassResult {
        let candidates: Vec<_> = ctx
            .document
            .paragraphs()
            .filter(|b| text::needs_density_upgrade(&b.text))
            .collect();

        let texts: Vec<&str> = candidates.iter().map(|b| b.text.as_str()).collect();
        let rewrites = self.copywriter.rewrite_all(SYSTEM, INSTRUCTION, &texts).await;

        let mut pass = StagePassResult::new();
        for (block, rewritten) in candidates.into_iter().zip(rewrites) {
            let Some(rewritten) = rewritten else { continue };
            pass.propose(block.rewritten(rewritten.clone()));
            pass.push(Self::issue(
                format!("Paragraph {}", block.id),
                "Sentences lack entity-rich, active constructions.",
                "Rewrite using SVO, explicit entities, and cause→effect connectors.",
                rewritten,
                Severity::High,
            ));
        }

        pass.scored_by_penalty(80, 10)
    }
}
