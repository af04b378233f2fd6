//! Unit tests for the type checker.
//!
//! Each test runs the full front half of the pipeline on a small program
//! and asserts on the verdict or the back-filled binding types.

use super::type_checker::type_check;
use crate::{
    ast::tree::{NodeId, SyntaxTree},
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::{
        scope_analysis::ScopeAnalyzer,
        symbol_table::{BindingTable, TypeTag},
    },
};

fn checked(source: &str) -> (SyntaxTree, BindingTable, bool) {
    let mut tree = parse(tokenize(source).unwrap()).unwrap();
    let mut table = ScopeAnalyzer::new().resolve(&mut tree).unwrap();
    let verdict = type_check(&tree, &mut table).unwrap();
    (tree, table, verdict)
}

fn verdict(source: &str) -> bool {
    checked(source).2
}

fn first_leaf_unid(tree: &SyntaxTree, text: &str) -> u32 {
    (0..tree.len())
        .map(NodeId)
        .find(|&id| tree.leaf_text(id) == Some(text))
        .map(|id| tree.unid(id))
        .unwrap()
}

#[test]
fn test_minimal_program_checks() {
    assert!(verdict("main begin skip ; end"));
}

#[test]
fn test_global_types_backfilled() {
    let (tree, table, verdict) = checked("main num V_a , text V_b , begin skip ; end");
    assert!(verdict);

    let a = table.get(first_leaf_unid(&tree, "V_a")).unwrap();
    let b = table.get(first_leaf_unid(&tree, "V_b")).unwrap();
    assert_eq!(a.ty, Some(TypeTag::Numeric));
    assert_eq!(b.ty, Some(TypeTag::Text));
}

#[test]
fn test_local_types_backfilled() {
    let (tree, table, verdict) = checked(
        "main begin skip ; end \
         void F_f ( V_a , V_b , V_c ) { num V_x , text V_y , num V_z , \
         begin skip ; end } end",
    );
    assert!(verdict);

    let y = table.get(first_leaf_unid(&tree, "V_y")).unwrap();
    assert_eq!(y.ty, Some(TypeTag::Text));
}

#[test]
fn test_numeric_assignment_checks() {
    assert!(verdict("main num V_x , begin V_x = add ( 1 , 2 ) ; end"));
}

#[test]
fn test_mismatched_assignment_fails() {
    assert!(!verdict("main text V_x , begin V_x = add ( 1 , 2 ) ; end"));
}

#[test]
fn test_text_constant_assignment_checks() {
    assert!(verdict("main text V_x , begin V_x = \"Hello\" ; end"));
}

#[test]
fn test_input_requires_numeric_variable() {
    assert!(verdict("main num V_x , begin V_x < input ; end"));
    assert!(!verdict("main text V_x , begin V_x < input ; end"));
}

#[test]
fn test_print_accepts_numeric_and_text() {
    assert!(verdict("main num V_a , text V_b , begin print V_a ; print V_b ; end"));
}

#[test]
fn test_branch_needs_boolean_condition() {
    assert!(verdict(
        "main num V_a , begin \
         if grt ( V_a , 0 ) then begin skip ; end else begin skip ; end ; \
         end"
    ));
    // An arithmetic operator in condition position is numeric, not boolean.
    assert!(!verdict(
        "main num V_a , begin \
         if add ( V_a , 1 ) then begin skip ; end else begin skip ; end ; \
         end"
    ));
}

#[test]
fn test_composite_condition_checks() {
    assert!(verdict(
        "main num V_a , num V_b , begin \
         if and ( grt ( V_a , 0 ) , eq ( V_b , 1 ) ) \
         then begin skip ; end else begin skip ; end ; \
         end"
    ));
}

#[test]
fn test_negated_condition_checks() {
    assert!(verdict(
        "main num V_a , begin \
         if not ( eq ( V_a , 0 ) ) then begin skip ; end else begin skip ; end ; \
         end"
    ));
}

#[test]
fn test_comparison_requires_numeric_operands() {
    assert!(!verdict(
        "main text V_a , begin \
         if grt ( V_a , 0 ) then begin skip ; end else begin skip ; end ; \
         end"
    ));
}

#[test]
fn test_nested_arithmetic_checks() {
    assert!(verdict(
        "main num V_x , begin V_x = mul ( add ( 1 , 2 ) , sqrt ( 9 ) ) ; end"
    ));
}

#[test]
fn test_void_call_command_checks() {
    assert!(verdict(
        "main begin F_f ( 1 , 2 , 3 ) ; end \
         void F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin skip ; end } end"
    ));
}

#[test]
fn test_numeric_call_as_command_fails() {
    // A num function's result must be consumed by an assignment.
    assert!(!verdict(
        "main begin F_f ( 1 , 2 , 3 ) ; end \
         num F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin return V_a ; end } end"
    ));
}

#[test]
fn test_numeric_call_assignment_checks() {
    assert!(verdict(
        "main num V_r , begin V_r = F_f ( 1 , 2 , 3 ) ; end \
         num F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin return V_a ; end } end"
    ));
}

#[test]
fn test_call_with_text_argument_fails() {
    assert!(!verdict(
        "main text V_t , begin F_f ( V_t , 2 , 3 ) ; end \
         void F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin skip ; end } end"
    ));
}

#[test]
fn test_num_function_without_return_fails() {
    assert!(!verdict(
        "main begin skip ; end \
         num F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin skip ; end } end"
    ));
}

#[test]
fn test_return_type_must_be_numeric() {
    assert!(!verdict(
        "main begin skip ; end \
         num F_f ( V_a , V_b , V_c ) { num V_x , text V_y , num V_z , \
         begin return V_y ; end } end"
    ));
}

#[test]
fn test_function_type_recorded() {
    let (tree, table, _) = checked(
        "main begin skip ; end \
         num F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin return V_a ; end } end",
    );

    let f = table.get(first_leaf_unid(&tree, "F_f")).unwrap();
    assert_eq!(f.ty, Some(TypeTag::Numeric));
}
