//! Scope analysis module for name resolution.
//!
//! This module walks the syntax tree depth-first, maintaining a tree of
//! lexical scopes, and rewrites every reference leaf's unique id to the id
//! of its declaration leaf. It handles:
//!
//! - Scope lifecycle: `main` for the program, one scope per `begin ... end`
//!   block, one scope per function body (named after the function)
//! - Variable and function declaration with duplicate and reserved-word
//!   rejection
//! - Internal unique-name assignment (`varName{n}` / `functionName{n}`)
//! - Deferred function-call resolution after the walk, so calls may refer
//!   forward to functions declared later in the same scope
//! - Consolidation of all scopes into one flat binding table keyed by
//!   declaration id
//!
//! Scope analysis is all-or-nothing: the first violation aborts with a
//! [`ScopeError`](crate::errors::errors::ScopeError).

pub mod scope_analysis;
pub mod symbol_table;
