//! Parser module for building the concrete syntax tree.
//!
//! This module contains the recursive-descent parser that transforms the
//! token stream into the node-identified syntax tree consumed by scope
//! analysis, type checking and both code generators. It handles:
//!
//! - The fixed grammar (one parse function per production)
//! - Monotonic unique-id assignment per node
//! - Keyword and punctuation leaves kept in their grammar positions, since
//!   downstream passes index children positionally
//!
//! Empty productions are represented by a single `e` leaf.

pub mod parser;

#[cfg(test)]
mod tests;
