//! Unit tests for both code generators.
//!
//! Programs run through the full front half (lex, parse, resolve, check)
//! before generation, mirroring how the driver gates the back ends.

use super::{intermediate::IntermediateGenerator, target::TargetGenerator};
use crate::{
    ast::tree::SyntaxTree,
    lexer::lexer::tokenize,
    parser::parser::parse,
    scope::{scope_analysis::ScopeAnalyzer, symbol_table::BindingTable},
    type_checker::type_checker::type_check,
};

fn front_half(source: &str) -> (SyntaxTree, BindingTable) {
    let mut tree = parse(tokenize(source).unwrap()).unwrap();
    let mut table = ScopeAnalyzer::new().resolve(&mut tree).unwrap();
    assert!(type_check(&tree, &mut table).unwrap());
    (tree, table)
}

fn intermediate(source: &str) -> String {
    let (tree, table) = front_half(source);
    IntermediateGenerator::new(&table).lower(&tree).unwrap()
}

fn target(source: &str) -> String {
    let (tree, table) = front_half(source);
    TargetGenerator::new(&table).generate(&tree).unwrap()
}

const NUM_FUNCTION_PROGRAM: &str = "main num V_r , begin V_r = F_f ( 1 , 2 , 3 ) ; end \
    num F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
    begin return V_a ; end } end";

const VOID_FUNCTION_PROGRAM: &str = "main begin F_f ( 1 , 2 , 3 ) ; end \
    void F_f ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
    begin skip ; end } end";

#[test]
fn test_lower_minimal_program() {
    assert_eq!(
        intermediate("main begin skip ; end"),
        "REM DO NOTHING\nREM END\nSTOP\n"
    );
}

#[test]
fn test_lower_halt() {
    assert_eq!(
        intermediate("main begin halt ; end"),
        "STOP\nREM END\nSTOP\n"
    );
}

#[test]
fn test_lower_assignment_uses_temporaries() {
    let code = intermediate("main num V_x , begin V_x = add ( 1 , 2 ) ; end");
    assert_eq!(
        code,
        "t2 := 1\nt3 := 2\nt1 := t2 + t3\nvarName1 := t1\nREM END\nSTOP\n"
    );
}

#[test]
fn test_lower_input_and_print() {
    let code = intermediate("main num V_x , begin V_x < input ; print V_x ; end");
    assert_eq!(code, "INPUT varName1\nPRINT varName1\nREM END\nSTOP\n");
}

#[test]
fn test_lower_nested_operator() {
    let code = intermediate("main num V_x , begin V_x = sqrt ( add ( 4 , 5 ) ) ; end");
    // dest t1, unop temp t2, then the inner binop's t3/t4
    assert_eq!(
        code,
        "t3 := 4\nt4 := 5\nt2 := t3 + t4\nt1 := SQR(t2)\nvarName1 := t1\nREM END\nSTOP\n"
    );
}

#[test]
fn test_lower_branch_label_structure() {
    let code = intermediate(
        "main num V_a , begin \
         if grt ( V_a , 0 ) then begin skip ; end else begin halt ; end ; \
         end",
    );
    assert_eq!(
        code,
        "t1 := varName1\n\
         t2 := 0\n\
         IF t1 > t2 THEN l1 ELSE l2\n\
         LABEL l1\n\
         REM DO NOTHING\n\
         REM END\n\
         GOTO l3\n\
         LABEL l2\n\
         STOP\n\
         REM END\n\
         LABEL l3\n\
         REM END\n\
         STOP\n"
    );
}

#[test]
fn test_lower_and_short_circuits_through_mid_label() {
    let code = intermediate(
        "main num V_a , num V_b , begin \
         if and ( grt ( V_a , 0 ) , eq ( V_b , 1 ) ) \
         then begin skip ; end else begin skip ; end ; \
         end",
    );
    // Left simple falls through to l4 on success, bails to l2 on failure.
    let fall_through = code.find("THEN l4 ELSE l2").unwrap();
    let mid = code.find("LABEL l4").unwrap();
    let right = code.find("THEN l1 ELSE l2").unwrap();
    assert!(fall_through < mid && mid < right);
}

#[test]
fn test_lower_or_short_circuits_on_success() {
    let code = intermediate(
        "main num V_a , num V_b , begin \
         if or ( grt ( V_a , 0 ) , eq ( V_b , 1 ) ) \
         then begin skip ; end else begin skip ; end ; \
         end",
    );
    // Left simple jumps straight to l1 on success, falls to l4 otherwise.
    let left = code.find("THEN l1 ELSE l4").unwrap();
    let mid = code.find("LABEL l4").unwrap();
    let right = code.find("THEN l1 ELSE l2").unwrap();
    assert!(left < mid && mid < right);
}

#[test]
fn test_lower_not_swaps_branch_targets() {
    let code = intermediate(
        "main num V_a , begin \
         if not ( eq ( V_a , 0 ) ) then begin skip ; end else begin skip ; end ; \
         end",
    );
    assert!(code.contains("THEN l2 ELSE l1"));
}

#[test]
fn test_lower_call_command() {
    let code = intermediate(VOID_FUNCTION_PROGRAM);
    assert!(code.contains("CALL_functionName1(1,2,3)"));
}

#[test]
fn test_lower_call_assignment() {
    let code = intermediate(NUM_FUNCTION_PROGRAM);
    assert!(code.contains("t1 := CALL_functionName1(1,2,3)"));
    assert!(code.contains("varName1 := t1"));
}

#[test]
fn test_lower_skips_function_bodies() {
    let code = intermediate(NUM_FUNCTION_PROGRAM);
    // Only the entry algorithm is lowered; the listing ends at STOP.
    assert!(code.ends_with("STOP\n"));
    assert!(!code.contains("RETURN"));
}

#[test]
fn test_target_minimal_program() {
    assert_eq!(
        target("main num V_x , begin skip ; end"),
        "10 DIM M(7, 20)\n\
         20 LET f = 0\n\
         30 LET varName1 = 0\n\
         40 REM DO NOTHING\n\
         50 REM END\n\
         60 END\n"
    );
}

#[test]
fn test_target_respects_max_depth() {
    let (tree, table) = front_half("main begin skip ; end");
    let code = TargetGenerator::with_max_depth(&table, 5)
        .generate(&tree)
        .unwrap();
    assert!(code.contains("DIM M(7, 5)"));
}

#[test]
fn test_target_text_variables_get_string_suffix() {
    let code = target("main text V_t , begin V_t = \"Hello\" ; print V_t ; end");
    assert!(code.contains("LET varName1$ = \"Hello\""));
    assert!(code.contains("PRINT varName1$"));
}

#[test]
fn test_target_branch_structure() {
    let code = target(
        "main num V_a , begin \
         if grt ( V_a , 0 ) then begin V_a = 0 ; end else begin skip ; end ; \
         end",
    );
    assert!(code.contains("IF varName1 > 0 THEN"));
    assert!(code.contains(" ELSE"));
    assert!(code.contains(" END IF"));
}

#[test]
fn test_target_composite_condition_renders_and() {
    let code = target(
        "main num V_a , num V_b , begin \
         if and ( grt ( V_a , 0 ) , eq ( V_b , 1 ) ) \
         then begin skip ; end else begin skip ; end ; \
         end",
    );
    assert!(code.contains("IF varName1 > 0 AND varName2 = 1 THEN"));
}

#[test]
fn test_target_num_function_call() {
    let code = target(NUM_FUNCTION_PROGRAM);

    // Overflow guard and argument marshalling around the jump.
    assert!(code.contains(" IF f > 20 THEN"));
    assert!(code.contains(" LET M(1, f) = 1"));
    assert!(code.contains(" LET M(3, f) = 3"));

    // The result is read out of the return slot.
    assert!(code.contains(" LET varName1 =  M(0,f)"));

    // Function prologue: header comment, parameter loads, local init.
    assert!(code.contains(" REM DEF FNfunctionName1(a1, a2, a3)"));
    assert!(code.contains(" LET varName2 = M(1, f)"));
    assert!(code.contains(" LET varName5 = 0"));
    assert!(code.contains(" LET M(4, f) = varName5"));

    // Numeric return unwinds the frame before storing the result.
    assert!(code.contains(" LET M(0, f) = varName2"));
}

#[test]
fn test_target_gosub_patched_to_line_number() {
    let code = target(NUM_FUNCTION_PROGRAM);
    assert!(!code.contains("GOSUB functionName1"));
    assert!(code.contains("120 GOSUB 160"));
    assert!(code.contains("160 REM DEF FNfunctionName1(a1, a2, a3)"));
}

#[test]
fn test_target_num_callee_skips_caller_decrement() {
    let code = target(NUM_FUNCTION_PROGRAM);
    // The num function decrements f in its own return sequence, so the
    // caller goes straight from the GOSUB to reading the result.
    assert!(code.contains("120 GOSUB 160\n130 LET varName1 =  M(0,f)"));
}

#[test]
fn test_target_void_callee_decrements_after_gosub() {
    let code = target(VOID_FUNCTION_PROGRAM);
    let gosub = code.find("GOSUB").unwrap();
    let after = &code[gosub..];
    assert!(after.contains("LET f = f - 1"));

    // Void epilog emits the RETURN.
    assert!(code.contains(" RETURN\n"));
}

#[test]
fn test_target_emits_nested_functions() {
    let code = target(
        "main begin skip ; end \
         void F_outer ( V_a , V_b , V_c ) { num V_x , num V_y , num V_z , \
         begin skip ; end } \
         void F_inner ( V_d , V_e , V_g ) { num V_p , num V_q , num V_r , \
         begin skip ; end } end \
         end",
    );
    assert!(code.contains("REM DEF FNfunctionName1(a1, a2, a3)"));
    assert!(code.contains("REM DEF FNfunctionName2(a1, a2, a3)"));
}
