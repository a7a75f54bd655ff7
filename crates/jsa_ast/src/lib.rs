//! jsa_ast: Syntax kinds and the arena-allocated syntax tree.
//!
//! Node shapes are tagged enums so every consumer matches all kinds
//! exhaustively. A malformed sub-construct is kept in the tree as an explicit
//! `Error` variant rather than being dropped.

pub mod generated;
pub mod node;
pub mod syntax_kind;
pub mod types;
pub mod visitor;

// Re-export key types
pub use node::*;
pub use syntax_kind::SyntaxKind;
pub use types::*;
