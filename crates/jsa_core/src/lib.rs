//! jsa_core: Core utilities shared by every stage of the jsa analysis pipeline.
//!
//! Provides text spans, ranges and line/column mapping for tokens, syntax
//! nodes and diagnostics.

pub mod text;

// Re-export commonly used types
pub use text::{LineMap, Position, TextPos, TextRange, TextSpan};
