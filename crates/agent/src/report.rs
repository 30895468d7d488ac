//! Pipeline reports: aggregate stage results and render them as plain text,
//! Markdown or JSON.

use chrono::{DateTime, Utc};
use contentforge_core::{
    Block, BlockKind, ContentProfile, GateDecision, Metadata, OptimizationMode, Severity,
    StageResult,
};
use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use crate::copywriter::RewriteStats;
use crate::pipeline::PipelineOutcome;

/// Feedback counts across all stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeverityTotals {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl SeverityTotals {
    pub fn from_stages(stages: &[StageResult]) -> Self {
        let mut totals = Self::default();
        for item in stages.iter().flat_map(|s| &s.feedback) {
            match item.severity {
                Severity::Critical => totals.critical += 1,
                Severity::High => totals.high += 1,
                Severity::Medium => totals.medium += 1,
                Severity::Low => totals.low += 1,
            }
        }
        totals
    }

    pub fn total(&self) -> usize {
        self.critical + self.high + self.medium + self.low
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub run_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub profile: ContentProfile,
    pub mode: OptimizationMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub status: GateDecision,
    pub totals: SeverityTotals,
    pub stages: Vec<StageResult>,
    pub metadata: Metadata,
    pub blocks: Vec<Block>,
    pub optimized_text: String,
    pub rewrites: RewriteStats,
}

impl PipelineReport {
    pub fn from_outcome(outcome: &PipelineOutcome) -> Self {
        Self {
            run_id: outcome.run_id,
            generated_at: Utc::now(),
            profile: outcome.profile,
            mode: outcome.mode,
            model: outcome.model.clone(),
            status: overall_status(&outcome.stages),
            totals: SeverityTotals::from_stages(&outcome.stages),
            stages: outcome.stages.clone(),
            metadata: outcome.metadata.clone(),
            blocks: outcome.document.blocks.clone(),
            optimized_text: render_blocks(&outcome.document.blocks),
            rewrites: outcome.rewrites,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// The Markdown rendering; plain text is the [`Display`](fmt::Display) impl.
    pub fn markdown(&self) -> MarkdownReport<'_> {
        MarkdownReport(self)
    }
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Content optimization report ({})", self.run_id)?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "  Profile:  {}", self.profile)?;
        writeln!(f, "  Mode:     {}", self.mode.description())?;
        writeln!(f, "  Model:    {}", self.model.as_deref().unwrap_or("offline"))?;
        writeln!(f, "  Status:   {}", self.status.to_string().to_uppercase())?;
        writeln!(
            f,
            "  Issues:   {} (Critical {}, High {}, Medium {}, Low {})",
            self.totals.total(),
            self.totals.critical,
            self.totals.high,
            self.totals.medium,
            self.totals.low
        )?;
        if self.rewrites.attempted > 0 {
            writeln!(
                f,
                "  Rewrites: {}/{} succeeded, {} tokens",
                self.rewrites.succeeded, self.rewrites.attempted, self.rewrites.usage.total_tokens
            )?;
        }

        for stage in &self.stages {
            writeln!(f)?;
            writeln!(
                f,
                "[{}] {}  {}/100 {}",
                stage.decision, stage.stage_name, stage.score.value, stage.score.label
            )?;
            writeln!(f, "    {}", stage.summary)?;
            for item in &stage.feedback {
                writeln!(f, "    - ({}) {}: {}", item.severity, item.element, item.issue)?;
                writeln!(f, "      Mandate: {}", item.mandate)?;
                if !item.rewritten_sample.is_empty() {
                    writeln!(f, "      Sample:  {}", item.rewritten_sample)?;
                }
            }
        }

        if !self.metadata.is_empty() {
            writeln!(f)?;
            writeln!(f, "Metadata")?;
            writeln!(f, "{}", "-".repeat(60))?;
            for (key, value) in self.metadata.iter() {
                writeln!(f, "  {key}: {}", display_value(value))?;
            }
        }

        writeln!(f)?;
        writeln!(f, "Optimized content")?;
        writeln!(f, "{}", "-".repeat(60))?;
        writeln!(f, "{}", self.optimized_text)
    }
}

/// Markdown view of a [`PipelineReport`].
pub struct MarkdownReport<'a>(&'a PipelineReport);

impl fmt::Display for MarkdownReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.0;
        writeln!(f, "# Content Optimization Report")?;
        writeln!(f)?;
        writeln!(f, "- **Run:** `{}`", report.run_id)?;
        writeln!(f, "- **Generated:** {}", report.generated_at.to_rfc3339())?;
        writeln!(f, "- **Profile:** {}", report.profile)?;
        writeln!(f, "- **Mode:** {}", report.mode.description())?;
        writeln!(f, "- **Model:** {}", report.model.as_deref().unwrap_or("offline"))?;
        writeln!(f, "- **Status:** {}", report.status)?;
        writeln!(f)?;
        writeln!(f, "| Stage | Decision | Score | Critical | High | Medium | Low |")?;
        writeln!(f, "|---|---|---|---|---|---|---|")?;
        for stage in &report.stages {
            writeln!(
                f,
                "| {} | {} | {} | {} | {} | {} | {} |",
                cell(&stage.stage_name),
                stage.decision,
                stage.score.value,
                stage.count(Severity::Critical),
                stage.count(Severity::High),
                stage.count(Severity::Medium),
                stage.count(Severity::Low)
            )?;
        }

        for stage in report.stages.iter().filter(|s| !s.feedback.is_empty()) {
            writeln!(f)?;
            writeln!(f, "## {}", stage.stage_name)?;
            writeln!(f)?;
            writeln!(f, "_{}_", stage.score.rationale)?;
            writeln!(f)?;
            writeln!(f, "| Severity | Element | Issue | Mandate | Impact |")?;
            writeln!(f, "|---|---|---|---|---|")?;
            for item in &stage.feedback {
                writeln!(
                    f,
                    "| {} | {} | {} | {} | {} |",
                    item.severity,
                    cell(&item.element),
                    cell(&item.issue),
                    cell(&item.mandate),
                    item.impact
                )?;
            }
        }

        if !report.metadata.is_empty() {
            let json = serde_json::to_string_pretty(&report.metadata).map_err(|_| fmt::Error)?;
            writeln!(f)?;
            writeln!(f, "## Metadata")?;
            writeln!(f)?;
            writeln!(f, "```json")?;
            writeln!(f, "{json}")?;
            writeln!(f, "```")?;
        }

        writeln!(f)?;
        writeln!(f, "## Optimized Content")?;
        writeln!(f)?;
        writeln!(f, "```markdown")?;
        writeln!(f, "{}", report.optimized_text)?;
        writeln!(f, "```")
    }
}

/// Failed if any stage failed, else Skipped if any skipped, else Passed.
pub fn overall_status(stages: &[StageResult]) -> GateDecision {
    let any = |decision| stages.iter().any(|s| s.decision == decision);
    if any(GateDecision::Failed) {
        GateDecision::Failed
    } else if any(GateDecision::Skipped) {
        GateDecision::Skipped
    } else {
        GateDecision::Passed
    }
}

/// Reassemble blocks into line-prefixed text; metadata blocks are dropped.
pub fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .filter_map(|block| match block.kind {
            BlockKind::H1 => Some(format!("# {}", block.text)),
            BlockKind::H2 => Some(format!("## {}", block.text)),
            BlockKind::H3 | BlockKind::Faq => Some(format!("### {}", block.text)),
            BlockKind::Paragraph | BlockKind::List => Some(block.text.clone()),
            BlockKind::Metadata => None,
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn display_value(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}
