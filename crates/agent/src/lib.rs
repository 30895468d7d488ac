//! The ContentForge optimization pipeline.
//!
//! A document passes through five stage agents in order:
//!
//! 1. **Parse** the raw text into blocks
//! 2. **Run each stage**: a deterministic structural pass, then a copy pass
//!    that may call the rewriter
//! 3. **Merge** proposed blocks by id and gate the stage on its score
//! 4. **Derive** the next document from the merged blocks
//! 5. **Report** every stage result plus the final document
//!
//! Copy passes degrade to passthrough when no rewriter is configured, so the
//! whole pipeline also runs offline.

pub mod copywriter;
pub mod pipeline;
pub mod report;
pub mod runtime;
pub mod stages;
pub mod text;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use copywriter::{Copywriter, RewriteStats};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use report::{MarkdownReport, PipelineReport, SeverityTotals};
pub use runtime::{AgentRuntime, PASS_THRESHOLD, StageAgent, StageContext};
pub use stages::{
    AuthorityBuilder, ChunkOptimizer, ContentStrategist, MetadataOptimizer, NlpStylist,
    default_stages,
};
