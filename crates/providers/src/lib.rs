//! Text rewriter implementations for ContentForge.
//!
//! All rewriters implement the `contentforge_core::TextRewriter` trait.
//! Stage agents never depend on this crate directly; the CLI builds a
//! rewriter from configuration and hands it to the pipeline.

pub mod openrouter;

pub use openrouter::OpenRouterRewriter;
