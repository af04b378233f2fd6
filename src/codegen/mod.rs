//! Code generation module.
//!
//! Two back ends run over the resolved, type-checked tree:
//!
//! - [`intermediate`]: a flat three-address listing of the entry algorithm,
//!   with fresh `t{n}` temporaries, `l{n}` labels and jumping code for
//!   short-circuit conditions
//! - [`target`]: line-numbered BASIC with a simulated call stack in the
//!   `M` array, frame spill/restore around calls, and a post-pass that
//!   patches `GOSUB` targets to line numbers
//!
//! Both assume the tree passed scope analysis and type checking; internal
//! shape violations surface as
//! [`CodeGenError`](crate::errors::errors::CodeGenError).

pub mod intermediate;
pub mod target;

#[cfg(test)]
mod tests;
