//! # ContentForge Core
//!
//! Domain types, traits, and error definitions for the ContentForge
//! content-optimization pipeline. This crate has **no framework
//! dependencies**: it defines the document model, the feedback/result types,
//! and the [`TextRewriter`] seam that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! The language-model backend is defined as a trait here and implemented in
//! `contentforge-providers`. Stage agents only see the trait, so they can be
//! tested with scripted rewriters and run offline with no rewriter at all.

pub mod document;
pub mod error;
pub mod feedback;
pub mod metadata;
pub mod parser;
pub mod rewriter;

// Re-export key types at crate root for ergonomics
pub use document::{Block, BlockId, BlockKind, ContentProfile, Document, OptimizationMode};
pub use error::{Error, Result, RewriteError};
pub use feedback::{Feedback, GateDecision, Severity, StagePassResult, StageResult, StageScore};
pub use metadata::Metadata;
pub use parser::parse_blocks;
pub use rewriter::{RewriteRequest, RewriteResponse, TextRewriter, Usage};
