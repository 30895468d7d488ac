//! The five stage agents, in pipeline order.
//!
//! 1. **Strategist**: H1, answer-first intro, question H2s, FAQ coverage
//! 2. **Chunk**: chunk length and Answer→Evidence→Context rewrites
//! 3. **Stylist**: sentence length, passive voice, entity density
//! 4. **Authority**: citations, publication years, experience signals
//! 5. **Metadata**: title, meta description, FAQ schema

pub mod authority;
pub mod chunk;
pub mod metadata;
pub mod strategist;
pub mod stylist;

pub use authority::AuthorityBuilder;
pub use chunk::ChunkOptimizer;
pub use metadata::MetadataOptimizer;
pub use strategist::ContentStrategist;
pub use stylist::NlpStylist;

use crate::copywriter::Copywriter;
use crate::runtime::StageAgent;
use std::sync::Arc;

/// The standard five-stage lineup sharing one copywriter.
pub fn default_stages(copywriter: Arc<Copywriter>, chunk_rewrite_budget: usize) -> Vec<Box<dyn StageAgent>> {
    vec![
        Box::new(ContentStrategist::new(copywriter.clone())),
        Box::new(ChunkOptimizer::new(copywriter.clone(), chunk_rewrite_budget)),
        Box::new(NlpStylist::new(copywriter.clone())),
        Box::new(AuthorityBuilder::new(copywriter)),
        Box::new(MetadataOptimizer::new()),
    ]
}
