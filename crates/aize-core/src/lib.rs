//! Core data structures for the Aize compiler's semantic model: source text
//! and positions, the IR arena, and the symbol table with its subtyping
//! rules.
//!
//! This crate has no notion of a "pass" or a "diagnostic"; it only owns the
//! data those concepts operate on. See `aize-compiler` for everything that
//! builds, walks, and analyzes an [`ir::Ir`] tree.

pub mod ir;
pub mod source;
pub mod symbol;

pub use source::{Position, SourceId, SourceKey, SourceRegistry, TextPosition};
