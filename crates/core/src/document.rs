//! Document and Block domain types.
//!
//! These are the value objects that flow through the pipeline:
//! raw text is parsed into blocks → each stage proposes replacements by id →
//! the runtime merges them → a new Document is derived for the next stage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::metadata::Metadata;

/// Tag carrying the text of the nearest preceding H2 heading.
pub const H2_LABEL_TAG: &str = "h2_label";

/// Stable identifier of a block within a document.
///
/// Assigned once at parse time; never reused or duplicated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(String);

impl BlockId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<usize> for BlockId {
    fn from(n: usize) -> Self {
        Self(n.to_string())
    }
}

impl From<&str> for BlockId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Structural kind of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    H1,
    H2,
    H3,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "list")]
    List,
    #[serde(rename = "faq")]
    Faq,
    #[serde(rename = "metadata")]
    Metadata,
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::H1 => "H1",
            Self::H2 => "H2",
            Self::H3 => "H3",
            Self::Paragraph => "paragraph",
            Self::List => "list",
            Self::Faq => "faq",
            Self::Metadata => "metadata",
        };
        write!(f, "{label}")
    }
}

/// The atomic structural unit of a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,

    pub kind: BlockKind,

    pub text: String,

    /// Free-form annotations (e.g. the governing H2 label)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<String, String>,
}

impl Block {
    pub fn new(id: impl Into<BlockId>, kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            tags: BTreeMap::new(),
        }
    }

    /// Builder-style tag insertion.
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// A replacement proposal for this block: same id, kind and tags, new text.
    pub fn rewritten(&self, text: impl Into<String>) -> Self {
        Self {
            id: self.id.clone(),
            kind: self.kind,
            text: text.into(),
            tags: self.tags.clone(),
        }
    }

    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// The kind of page being optimized; selects the rule set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentProfile {
    #[default]
    Blog,
    ProductPage,
    ServicePage,
    ThoughtLeadership,
    KnowledgeBase,
}

impl ContentProfile {
    pub const ALL: [ContentProfile; 5] = [
        Self::Blog,
        Self::ProductPage,
        Self::ServicePage,
        Self::ThoughtLeadership,
        Self::KnowledgeBase,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Blog => "Blog Post",
            Self::ProductPage => "Product Page",
            Self::ServicePage => "Service Page",
            Self::ThoughtLeadership => "Thought Leadership",
            Self::KnowledgeBase => "Knowledge Base",
        }
    }

    /// Identifier used in config files and on the command line.
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Blog => "blog",
            Self::ProductPage => "product-page",
            Self::ServicePage => "service-page",
            Self::ThoughtLeadership => "thought-leadership",
            Self::KnowledgeBase => "knowledge-base",
        }
    }
}

impl std::fmt::Display for ContentProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for ContentProfile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace(['_', ' '], "-");
        Self::ALL
            .into_iter()
            .find(|p| p.slug() == needle || p.label().to_lowercase().replace(' ', "-") == needle)
            .ok_or_else(|| {
                format!(
                    "unknown content profile '{s}' (expected one of: {})",
                    Self::ALL.map(|p| p.slug()).join(", ")
                )
            })
    }
}

/// How strictly non-critical findings gate a stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationMode {
    /// Enforce all rules
    #[default]
    Strict,
    /// Suggestions only
    Lite,
}

impl OptimizationMode {
    pub fn description(&self) -> &'static str {
        match self {
            Self::Strict => "Strict (Enforce all rules)",
            Self::Lite => "Lite (Suggestions only)",
        }
    }
}

impl std::fmt::Display for OptimizationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "Strict"),
            Self::Lite => write!(f, "Lite"),
        }
    }
}

impl FromStr for OptimizationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "lite" => Ok(Self::Lite),
            other => Err(format!("unknown optimization mode '{other}' (expected strict or lite)")),
        }
    }
}

/// A parsed document moving through the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The original input, never modified.
    pub raw_text: String,

    /// Ordered blocks; replaced wholesale after each stage.
    pub blocks: Vec<Block>,

    pub profile: ContentProfile,

    /// Snapshot of the orchestrator-owned metadata at stage entry.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Document {
    pub fn new(
        raw_text: impl Into<String>,
        blocks: Vec<Block>,
        profile: ContentProfile,
        metadata: Metadata,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            blocks,
            profile,
            metadata,
        }
    }

    /// Parse raw text with the line-prefix block parser.
    pub fn parse(raw_text: impl Into<String>, profile: ContentProfile, metadata: Metadata) -> Self {
        let raw_text = raw_text.into();
        let blocks = crate::parser::parse_blocks(&raw_text);
        Self::new(raw_text, blocks, profile, metadata)
    }

    /// Derive the next-stage document: same raw text and profile, new blocks
    /// and metadata snapshot.
    pub fn derive(&self, blocks: Vec<Block>, metadata: Metadata) -> Self {
        Self {
            raw_text: self.raw_text.clone(),
            blocks,
            profile: self.profile,
            metadata,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks_of(&self, kind: BlockKind) -> impl Iterator<Item = &Block> {
        self.blocks.iter().filter(move |b| b.kind == kind)
    }

    pub fn paragraphs(&self) -> impl Iterator<Item = &Block> {
        self.blocks_of(BlockKind::Paragraph)
    }

    pub fn first_paragraph(&self) -> Option<&Block> {
        self.paragraphs().next()
    }
}
