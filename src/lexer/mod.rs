//! Lexical analysis module for the compiler.
//!
//! This module contains the tokenizer that converts source code into a
//! stream of classified tokens. It handles:
//!
//! - Whitespace-separated word classification using regex patterns
//! - Reserved words, `V_` variable names, `F_` function names
//! - Short quoted text literals and decimal number literals
//! - The two-word `< input` token
//!
//! Words that match no class are a fatal lexical error.

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
