//! Stage 5: aligns title, meta description and FAQ schema with the body.
//!
//! The only stage with metadata write access. Its copy pass is templated and
//! never calls the rewriter.

use async_trait::async_trait;
use contentforge_config::RuleSet;
use contentforge_core::document::H2_LABEL_TAG;
use contentforge_core::metadata::{META_DESCRIPTION, TITLE};
use contentforge_core::parser::is_faq_heading;
use contentforge_core::{BlockKind, Document, Feedback, Severity, StagePassResult};

use crate::runtime::{StageAgent, StageContext};
use crate::text;

pub const DEFAULT_KEYWORD: &str = "AI content optimization";

/// Appended one at a time until a synthesized description is long enough.
const DESCRIPTION_PADDING: &[&str] = &[
    "Answer-first by design.",
    "Built for AI Overviews and featured snippets.",
    "Every section answers one question directly.",
    "Includes FAQ schema guidance for rich results.",
];

#[derive(Debug, Default)]
pub struct MetadataOptimizer;

impl MetadataOptimizer {
    pub fn new() -> Self {
        Self
    }

    fn issue(
        element: impl Into<String>,
        issue: impl Into<String>,
        mandate: impl Into<String>,
        sample: impl Into<String>,
        severity: Severity,
    ) -> Feedback {
        let impact = match severity {
            Severity::Critical | Severity::High => 80,
            Severity::Medium | Severity::Low => 55,
        };
        Feedback::new(element, issue, mandate, sample, severity, impact)
    }

    fn title_needs_work(title: Option<&str>, rules: &RuleSet) -> bool {
        title.is_none_or(|t| text::char_count(t) > rules.title_max_chars)
    }

    fn description_needs_work(description: Option<&str>, rules: &RuleSet) -> bool {
        description.is_none_or(|d| !rules.meta_description_range().contains(&text::char_count(d)))
    }

    fn has_faq_schema(document: &Document) -> bool {
        let has_faq_blocks = document.blocks.iter().any(|b| {
            b.kind == BlockKind::Faq || b.tag(H2_LABEL_TAG).is_some_and(is_faq_heading)
        });
        has_faq_blocks && !document.metadata.faq_schema_entries().is_empty()
    }
}

/// `"{Keyword} – Answer, Evidence, Authority"` with the keyword title-cased.
///
/// Long keywords drop the suffix, then get cut at a word boundary, so the
/// result never exceeds `rules.title_max_chars`.
pub fn synthesize_title(keyword: &str, rules: &RuleSet) -> String {
    let max = rules.title_max_chars;
    let cased = text::title_case(keyword);
    let full = format!("{cased} – Answer, Evidence, Authority");
    if text::char_count(&full) <= max {
        return full;
    }
    match text::truncate_at_word(&cased, max) {
        "" => text::truncate_chars(&cased, max).to_string(),
        cut => cut.to_string(),
    }
}

/// A meta description for `keyword` whose length always falls inside the
/// rule set's character window.
pub fn synthesize_meta_description(keyword: &str, rules: &RuleSet) -> String {
    let range = rules.meta_description_range();
    let mut description = format!(
        "Learn how to optimize {keyword} with question-based structure, AEC chunks, \
         NLP-friendly sentences, and cited authority."
    );

    for padding in DESCRIPTION_PADDING {
        if text::char_count(&description) >= *range.start() {
            break;
        }
        description.push(' ');
        description.push_str(padding);
    }

    let max = *range.end();
    if range.contains(&text::char_count(&description)) {
        return description;
    }

    let cut = text::truncate_at_word(&description, max);
    if range.contains(&text::char_count(cut)) {
        return cut.to_string();
    }

    format!("{}...", text::truncate_chars(&description, max.saturating_sub(3)))
}

#[async_trait]
impl StageAgent for MetadataOptimizer {
    fn name(&self) -> &str {
        "Stage 5 · Metadata & Schema"
    }

    fn writes_metadata(&self) -> bool {
        true
    }

    fn structural_pass(&self, ctx: &StageContext<'_>) -> StagePassResult {
        let mut pass = StagePassResult::new();
        let meta = &ctx.document.metadata;
        let rules = ctx.rules;

        if Self::title_needs_work(meta.title(), rules) {
            pass.push(Self::issue(
                "Title Tag",
                format!("Missing or exceeds {} characters.", rules.title_max_chars),
                format!(
                    "Provide an answer-first title under {} characters that reflects the Stage 1 core question.",
                    rules.title_max_chars
                ),
                meta.title().unwrap_or_default(),
                Severity::High,
            ));
        }

        if Self::description_needs_work(meta.meta_description(), rules) {
            pass.push(Self::issue(
                "Meta Description",
                format!(
                    "Meta description missing or outside the {}-{} character window.",
                    rules.meta_description_min_chars, rules.meta_description_max_chars
                ),
                format!(
                    "Summarize the core answer plus authority signal within the {}-{} character band.",
                    rules.meta_description_min_chars, rules.meta_description_max_chars
                ),
                meta.meta_description().unwrap_or_default(),
                Severity::Medium,
            ));
        }

        if !Self::has_faq_schema(ctx.document) {
            pass.push(Self::issue(
                "FAQ Schema",
                "FAQPage schema missing or out of sync with the on-page FAQ blocks.",
                "Generate FAQPage JSON-LD that mirrors the Stage 1 entries to keep SERP metadata aligned.",
                "Add FAQ schema",
                Severity::Medium,
            ));
        }

        pass.scored_by_penalty(90, 15)
    }

    async fn copy_pass(&self, ctx: &StageContext<'_>, _structural: &StagePassResult) -> StagePassResult {
        let mut pass = StagePassResult::new();
        let meta = &ctx.document.metadata;
        let rules = ctx.rules;
        let keyword = ctx.primary_keyword().unwrap_or(DEFAULT_KEYWORD);

        if Self::title_needs_work(meta.title(), rules) {
            let title = synthesize_title(keyword, rules);
            pass.metadata_writes.insert(TITLE, title.clone());
            pass.push(Self::issue(
                "Title Tag",
                "Generated optimized title ready for SERP and AI overview display.",
                "Adopt the synthesized answer-first title before publishing.",
                title,
                Severity::Medium,
            ));
        }

        if Self::description_needs_work(meta.meta_description(), rules) {
            let description = synthesize_meta_description(keyword, rules);
            pass.metadata_writes.insert(META_DESCRIPTION, description.clone());
            pass.push(Self::issue(
                "Meta Description",
                "Optimized meta generated from Stage 1-4 outputs.",
                "Use the synthesized meta to keep SERP and AI messaging fully aligned.",
                description,
                Severity::Medium,
            ));
        }

        let score = if pass.feedback.is_empty() { 0 } else { 10 };
        pass.with_score(score)
    }
}
