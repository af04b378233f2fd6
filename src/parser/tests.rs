//! Unit tests for the parser module.
//!
//! Each test lexes a small source fragment, parses it, and checks the shape
//! of the resulting tree through positional child access.

use super::parser::parse;
use crate::{
    ast::tree::{Label, NodeId, SyntaxTree},
    errors::errors::ParseError,
    lexer::lexer::tokenize,
};

fn parse_source(source: &str) -> Result<SyntaxTree, ParseError> {
    parse(tokenize(source).unwrap())
}

fn child_label(tree: &SyntaxTree, id: NodeId, i: usize) -> Option<Label> {
    tree.label(tree.child(id, i))
}

fn child_text<'a>(tree: &'a SyntaxTree, id: NodeId, i: usize) -> Option<&'a str> {
    tree.leaf_text(tree.child(id, i))
}

#[test]
fn test_parse_minimal_program() {
    let tree = parse_source("main begin skip ; end").unwrap();
    let prog = tree.root();

    assert_eq!(tree.label(prog), Some(Label::Prog));
    assert_eq!(tree.children(prog).len(), 4);
    assert_eq!(child_text(&tree, prog, 0), Some("main"));
    assert_eq!(child_label(&tree, prog, 1), Some(Label::GlobVars));
    assert_eq!(child_label(&tree, prog, 2), Some(Label::Algo));
    assert_eq!(child_label(&tree, prog, 3), Some(Label::Functions));
}

#[test]
fn test_parse_empty_globvars_is_e_leaf() {
    let tree = parse_source("main begin skip ; end").unwrap();
    let globvars = tree.child(tree.root(), 1);

    assert_eq!(tree.children(globvars).len(), 1);
    assert_eq!(child_text(&tree, globvars, 0), Some("e"));
}

#[test]
fn test_parse_globvars_chain() {
    let tree = parse_source("main num V_a , text V_b , begin skip ; end").unwrap();
    let globvars = tree.child(tree.root(), 1);

    // VTYP VNAME , GLOBVARS
    assert_eq!(tree.children(globvars).len(), 4);
    assert_eq!(child_label(&tree, globvars, 0), Some(Label::VTyp));
    assert_eq!(child_label(&tree, globvars, 1), Some(Label::VName));
    assert_eq!(child_text(&tree, globvars, 2), Some(","));

    let rest = tree.child(globvars, 3);
    assert_eq!(tree.label(rest), Some(Label::GlobVars));
    assert_eq!(tree.first_leaf_text(tree.child(rest, 0)), Some("text"));

    let tail = tree.child(rest, 3);
    assert_eq!(child_text(&tree, tail, 0), Some("e"));
}

#[test]
fn test_parse_instruc_chain() {
    let tree = parse_source("main begin skip ; halt ; end").unwrap();
    let algo = tree.child(tree.root(), 2);

    assert_eq!(child_text(&tree, algo, 0), Some("begin"));
    let instruc = tree.child(algo, 1);
    assert_eq!(tree.label(instruc), Some(Label::Instruc));
    assert_eq!(child_label(&tree, instruc, 0), Some(Label::Command));
    assert_eq!(child_text(&tree, instruc, 1), Some(";"));

    let second = tree.child(instruc, 2);
    assert_eq!(child_label(&tree, second, 0), Some(Label::Command));
    let tail = tree.child(second, 2);
    assert_eq!(child_text(&tree, tail, 0), Some("e"));
    assert_eq!(child_text(&tree, algo, 2), Some("end"));
}

#[test]
fn test_parse_assign_input() {
    let tree = parse_source("main begin V_x < input ; end").unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let assign = tree.child(tree.child(instruc, 0), 0);

    assert_eq!(tree.label(assign), Some(Label::Assign));
    assert_eq!(child_label(&tree, assign, 0), Some(Label::VName));
    assert_eq!(child_text(&tree, assign, 1), Some("< input"));
}

#[test]
fn test_parse_assign_term() {
    let tree = parse_source("main begin V_x = add ( V_a , 2 ) ; end").unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let assign = tree.child(tree.child(instruc, 0), 0);

    assert_eq!(child_text(&tree, assign, 1), Some("="));
    let term = tree.child(assign, 2);
    assert_eq!(tree.label(term), Some(Label::Term));

    let op = tree.child(term, 0);
    assert_eq!(tree.label(op), Some(Label::Op));
    assert_eq!(child_label(&tree, op, 0), Some(Label::BinOp));
    assert_eq!(child_label(&tree, op, 2), Some(Label::Arg));
    assert_eq!(child_label(&tree, op, 4), Some(Label::Arg));
}

#[test]
fn test_parse_unop_op() {
    let tree = parse_source("main begin V_x = sqrt ( V_a ) ; end").unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let assign = tree.child(tree.child(instruc, 0), 0);
    let op = tree.child(tree.child(assign, 2), 0);

    // UNOP ( ARG )
    assert_eq!(tree.children(op).len(), 4);
    assert_eq!(child_label(&tree, op, 0), Some(Label::UnOp));
    assert_eq!(child_label(&tree, op, 2), Some(Label::Arg));
}

#[test]
fn test_parse_call_argument_positions() {
    let tree = parse_source("main begin F_f ( V_a , 1 , V_b ) ; end").unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let call = tree.child(tree.child(instruc, 0), 0);

    assert_eq!(tree.label(call), Some(Label::Call));
    assert_eq!(tree.children(call).len(), 8);
    assert_eq!(child_label(&tree, call, 0), Some(Label::FName));
    assert_eq!(child_label(&tree, call, 2), Some(Label::Atomic));
    assert_eq!(child_label(&tree, call, 4), Some(Label::Atomic));
    assert_eq!(child_label(&tree, call, 6), Some(Label::Atomic));
}

#[test]
fn test_parse_branch_simple_cond() {
    let tree =
        parse_source("main begin if grt ( V_a , 0 ) then begin skip ; end else begin halt ; end ; end")
            .unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let branch = tree.child(tree.child(instruc, 0), 0);

    assert_eq!(tree.label(branch), Some(Label::Branch));
    assert_eq!(child_label(&tree, branch, 1), Some(Label::Cond));
    assert_eq!(child_label(&tree, branch, 3), Some(Label::Algo));
    assert_eq!(child_label(&tree, branch, 5), Some(Label::Algo));

    let cond = tree.child(branch, 1);
    assert_eq!(child_label(&tree, cond, 0), Some(Label::Simple));
}

#[test]
fn test_parse_composit_binop_cond() {
    let tree = parse_source(
        "main begin if and ( eq ( V_a , 1 ) , grt ( V_b , 0 ) ) then begin skip ; end else begin skip ; end ; end",
    )
    .unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let branch = tree.child(tree.child(instruc, 0), 0);
    let composit = tree.child(tree.child(branch, 1), 0);

    assert_eq!(tree.label(composit), Some(Label::Composit));
    assert_eq!(tree.children(composit).len(), 6);
    assert_eq!(child_label(&tree, composit, 0), Some(Label::BinOp));
    assert_eq!(child_label(&tree, composit, 2), Some(Label::Simple));
    assert_eq!(child_label(&tree, composit, 4), Some(Label::Simple));
}

#[test]
fn test_parse_composit_unop_cond() {
    let tree = parse_source(
        "main begin if not ( eq ( V_a , 1 ) ) then begin skip ; end else begin skip ; end ; end",
    )
    .unwrap();
    let instruc = tree.child(tree.child(tree.root(), 2), 1);
    let branch = tree.child(tree.child(instruc, 0), 0);
    let composit = tree.child(tree.child(branch, 1), 0);

    assert_eq!(tree.label(composit), Some(Label::Composit));
    assert_eq!(tree.children(composit).len(), 4);
    assert_eq!(child_label(&tree, composit, 0), Some(Label::UnOp));
    assert_eq!(child_label(&tree, composit, 2), Some(Label::Simple));
}

const FUNCTION_SOURCE: &str = "main begin skip ; end \
    num F_f ( V_p , V_q , V_r ) { \
    num V_l1 , num V_l2 , num V_l3 , \
    begin return V_p ; end } end";

#[test]
fn test_parse_function_declaration() {
    let tree = parse_source(FUNCTION_SOURCE).unwrap();
    let functions = tree.child(tree.root(), 3);

    assert_eq!(tree.children(functions).len(), 2);
    let decl = tree.child(functions, 0);
    assert_eq!(tree.label(decl), Some(Label::Decl));

    let header = tree.child(decl, 0);
    assert_eq!(tree.children(header).len(), 9);
    assert_eq!(child_label(&tree, header, 0), Some(Label::FTyp));
    assert_eq!(child_label(&tree, header, 1), Some(Label::FName));
    assert_eq!(child_label(&tree, header, 3), Some(Label::VName));
    assert_eq!(child_label(&tree, header, 5), Some(Label::VName));
    assert_eq!(child_label(&tree, header, 7), Some(Label::VName));

    let body = tree.child(decl, 1);
    assert_eq!(tree.children(body).len(), 6);
    assert_eq!(child_label(&tree, body, 0), Some(Label::Prolog));
    assert_eq!(child_label(&tree, body, 1), Some(Label::LocVars));
    assert_eq!(child_label(&tree, body, 2), Some(Label::Algo));
    assert_eq!(child_label(&tree, body, 3), Some(Label::Epilog));
    assert_eq!(child_label(&tree, body, 4), Some(Label::SubFuncs));
    assert_eq!(child_text(&tree, body, 5), Some("end"));

    let locvars = tree.child(body, 1);
    assert_eq!(tree.children(locvars).len(), 9);
}

#[test]
fn test_parse_unids_are_distinct() {
    let tree = parse_source(FUNCTION_SOURCE).unwrap();

    let mut unids: Vec<u32> = (0..tree.len()).map(|i| tree.unid(NodeId(i))).collect();
    unids.sort_unstable();
    unids.dedup();
    assert_eq!(unids.len(), tree.len());
}

#[test]
fn test_parse_rejects_missing_semicolon() {
    assert!(parse_source("main begin skip end").is_err());
}

#[test]
fn test_parse_rejects_trailing_tokens() {
    let result = parse_source("main begin skip ; end skip");
    assert!(matches!(result, Err(ParseError::UnexpectedToken { .. })));
}

#[test]
fn test_parse_rejects_truncated_input() {
    let result = parse_source("main begin skip ;");
    assert!(matches!(result, Err(ParseError::UnexpectedEof { .. })));
}

#[test]
fn test_parse_reports_eof_inside_productions() {
    // Truncation right before an atomic and before a condition operator
    // both surface as end-of-input, not as a stray token.
    assert!(matches!(
        parse_source("main begin print"),
        Err(ParseError::UnexpectedEof { .. })
    ));
    assert!(matches!(
        parse_source("main begin if"),
        Err(ParseError::UnexpectedEof { .. })
    ));
}
