//! Feedback, pass results and stage results.
//!
//! A stage produces two [`StagePassResult`]s (structural, then copy) which the
//! runtime folds into one immutable [`StageResult`].

use serde::{Deserialize, Serialize};

use crate::document::{Block, BlockId};
use crate::metadata::Metadata;

/// How serious a finding is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        };
        write!(f, "{label}")
    }
}

/// A single itemized finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Human-readable locator (e.g. "H2 · Benefits", "Paragraph 4")
    pub element: String,

    pub issue: String,

    /// What the author must do about it
    pub mandate: String,

    /// Suggested or applied replacement text
    pub rewritten_sample: String,

    pub severity: Severity,

    /// Estimated impact, 0..=100
    pub impact: u32,
}

impl Feedback {
    pub fn new(
        element: impl Into<String>,
        issue: impl Into<String>,
        mandate: impl Into<String>,
        rewritten_sample: impl Into<String>,
        severity: Severity,
        impact: u32,
    ) -> Self {
        Self {
            element: element.into(),
            issue: issue.into(),
            mandate: mandate.into(),
            rewritten_sample: rewritten_sample.into(),
            severity,
            impact: impact.min(100),
        }
    }
}

/// Outcome of a stage gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    Passed,
    Failed,
    Skipped,
}

impl std::fmt::Display for GateDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

/// Output of one pass (structural or copy) of a stage.
#[derive(Debug, Clone, Default)]
pub struct StagePassResult {
    pub feedback: Vec<Feedback>,

    /// Replacement blocks keyed by their id
    pub proposed_blocks: Vec<Block>,

    /// Contribution to the stage score, 0..=100
    pub score_delta: u32,

    /// Metadata fields this pass wants written back; honored only for
    /// stages that declare metadata write access.
    pub metadata_writes: Metadata,
}

impl StagePassResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, feedback: Feedback) {
        self.feedback.push(feedback);
    }

    pub fn propose(&mut self, block: Block) {
        self.proposed_blocks.push(block);
    }

    /// Whether this pass already proposed a replacement for `id`.
    pub fn proposes(&self, id: &BlockId) -> bool {
        self.proposed_blocks.iter().any(|b| &b.id == id)
    }

    /// Set the score as `max(0, base - penalty * feedback_count)`.
    pub fn scored_by_penalty(mut self, base: u32, penalty: u32) -> Self {
        let count = u32::try_from(self.feedback.len()).unwrap_or(u32::MAX);
        self.score_delta = base.saturating_sub(penalty.saturating_mul(count));
        self
    }

    pub fn with_score(mut self, score_delta: u32) -> Self {
        self.score_delta = score_delta;
        self
    }
}

/// The aggregate score of a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageScore {
    /// 0..=100
    pub value: u32,
    pub label: String,
    pub rationale: String,
}

/// Immutable result of one agent invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    pub stage_name: String,
    pub decision: GateDecision,
    pub score: StageScore,
    /// Structural-pass items first, then copy-pass items
    pub feedback: Vec<Feedback>,
    /// Full block sequence with replacements applied
    pub merged_blocks: Vec<Block>,
    pub summary: String,
}

impl StageResult {
    pub fn count(&self, severity: Severity) -> usize {
        self.feedback.iter().filter(|f| f.severity == severity).count()
    }
}
