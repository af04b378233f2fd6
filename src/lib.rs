#![allow(clippy::module_inception)]

pub mod ast;
pub mod codegen;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod type_checker;

use crate::{
    ast::tree::SyntaxTree,
    codegen::{intermediate::IntermediateGenerator, target::TargetGenerator},
    errors::errors::CompileError,
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::{scope_analysis::ScopeAnalyzer, symbol_table::BindingTable},
    type_checker::type_checker::type_check,
};

/// Everything the pipeline produces for one source file.
#[derive(Debug)]
pub struct Compilation {
    pub tree: SyntaxTree,
    pub table: BindingTable,
    pub intermediate: String,
    pub target: String,
}

/// Runs the whole pipeline: tokenize, parse, resolve, type check, then both
/// code generators. Code generation only runs on a tree that checked clean.
pub fn compile(source: &str) -> Result<Compilation, CompileError> {
    let tokens = tokenize(source)?;
    let mut tree = parse(tokens)?;
    let mut table = ScopeAnalyzer::new().resolve(&mut tree)?;

    if !type_check(&tree, &mut table)? {
        return Err(CompileError::TypeCheckFailed);
    }

    let intermediate = IntermediateGenerator::new(&table).lower(&tree)?;
    let target = TargetGenerator::new(&table).generate(&tree)?;

    Ok(Compilation {
        tree,
        table,
        intermediate,
        target,
    })
}
