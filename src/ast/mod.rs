//! Syntax tree module.
//!
//! This module defines the node-identified concrete syntax tree shared by
//! every pass:
//!
//! - An arena of nodes indexed by `NodeId`, with child links as indices and
//!   parent links as optional indices
//! - A closed `Label` union, one variant per grammar production, so each
//!   pass dispatches with an exhaustive `match`
//! - Leaf nodes carrying terminal text
//!
//! Child counts and positions are fixed by the production a node represents;
//! passes index children positionally.

pub mod tree;
