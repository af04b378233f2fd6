//! Error types and error handling for the compiler.
//!
//! This module defines the error types used throughout the compilation
//! process. It includes:
//!
//! - One error enum per pipeline stage (lexing, parsing, scope analysis,
//!   type lookup, code generation)
//! - An umbrella `CompileError` for the driver
//! - Error formatting via `thiserror`
//!
//! Fatal errors abort the pipeline; the type checker's soft verdict is a
//! plain `bool` and is not represented here.

pub mod errors;
