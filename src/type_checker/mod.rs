//! Type checker module.
//!
//! This module computes the type of every expression node and judges the
//! whole tree, in one pass over the resolved syntax tree. It handles:
//!
//! - The type judgment (`n`/`t`/`b`/`c`/`v`/`u`) for atoms, operator
//!   applications, calls and conditions
//! - Back-filling declared types into the binding table for global
//!   variables, locals and function names
//! - The rule checks per command, assignment, branch and function header,
//!   including the return-command requirement for `num` functions
//!
//! The verdict is a soft boolean: a rule violation makes the aggregate
//! `false` but does not abort. [`TypeError`](crate::errors::errors::TypeError)
//! is reserved for trees that were not actually resolved.

pub mod type_checker;

#[cfg(test)]
mod tests;
