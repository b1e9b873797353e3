//! String storage, functions and in-place assignment

mod common;

use common::run_output;
use rstest::rstest;

#[test]
fn assignment_auto_creates_with_default_capacity() {
    assert_eq!(run_output(&["A$=\"HELLO\"", "PRINT A$"]), "HELLO\n");
}

#[test]
fn mid_assignment_replaces_in_place() {
    let out = run_output(&["A$=\"HELLO\": MID$(A$,2,3)=\"XYZ\": PRINT A$"]);
    assert_eq!(out, "HXYZO\n");
}

#[test]
fn left_and_right_assignment() {
    assert_eq!(
        run_output(&["A$=\"HELLO\"", "LEFT$(A$,2)=\"JJ\"", "PRINT A$"]),
        "JJLLO\n"
    );
    assert_eq!(
        run_output(&["A$=\"HELLO\"", "RIGHT$(A$,2)=\"XY\"", "PRINT A$"]),
        "HELXY\n"
    );
}

#[rstest]
#[case("PRINT LEN(\"HELLO\")", "5\n")]
#[case("PRINT LEFT$(\"HELLO\",2)", "HE\n")]
#[case("PRINT RIGHT$(\"HELLO\",2)", "LO\n")]
#[case("PRINT MID$(\"HELLO\",2,3)", "ELL\n")]
#[case("PRINT MID$(\"HELLO\",3)", "LLO\n")]
#[case("PRINT CHR$(65)", "A\n")]
#[case("PRINT ASC(\"A\")", "65\n")]
#[case("PRINT STR$(42)", "42\n")]
#[case("PRINT VAL(\"42X\")", "42\n")]
#[case("PRINT VAL(\"3.5\")", "3.5\n")]
#[case("PRINT VAL(\"NOPE\")", "0\n")]
#[case("PRINT VAL(\"$FF\")", "255\n")]
fn string_functions(#[case] src: &str, #[case] want: &str) {
    assert_eq!(run_output(&[src]), want);
}

#[test]
fn concatenation_with_plus() {
    assert_eq!(run_output(&["PRINT \"AB\"+\"CD\""]), "ABCD\n");
    assert_eq!(
        run_output(&["A$=\"HI\"", "B$=A$+\" \"+A$", "PRINT B$"]),
        "HI HI\n"
    );
}

#[test]
fn instr_is_one_indexed_with_zero_for_missing() {
    assert_eq!(run_output(&["PRINT INSTR(\"HELLO\",\"LL\")"]), "3\n");
    assert_eq!(run_output(&["PRINT INSTR(\"HELLO\",\"Z\")"]), "0\n");
}

#[test]
fn minimal_instr_rejects_substrings() {
    let mut m = minibasic::Machine::default();
    m.features -= minibasic::Features::FULLINSTR;
    let mut host = common::MockHost::new();
    common::feed(&mut m, &mut host, &["PRINT INSTR(\"HELLO\",\"LL\")"]);
    assert_eq!(host.out(), "out of range\n");
}

#[test]
fn string_comparison_is_by_value() {
    assert_eq!(run_output(&["PRINT \"ABC\"=\"ABC\""]), "-1\n");
    assert_eq!(run_output(&["IF \"ABC\"<\"ABD\" THEN PRINT \"Y\""]), "Y\n");
}

#[test]
fn substring_access_reads_and_writes() {
    assert_eq!(run_output(&["A$=\"HELLO\"", "PRINT A$(2,3)"]), "EL\n");
    assert_eq!(run_output(&["A$=\"HELLO\"", "PRINT A$(3)"]), "LLO\n");
    assert_eq!(
        run_output(&["A$=\"HELLO\"", "A$(2,3)=\"XY\"", "PRINT A$"]),
        "HXYLO\n"
    );
}

#[test]
fn substring_mode_can_be_switched_off() {
    assert_eq!(
        run_output(&["A$=\"HELLO\"", "SET 20,0", "PRINT A$(2,3)"]),
        "syntax error\n"
    );
}

#[test]
fn capacity_is_enforced() {
    let out = run_output(&["DIM S$(4)", "S$=\"ABCDE\""]);
    assert_eq!(out, "out of range\n");
    // the default capacity holds 32 bytes
    let out = run_output(&["A$=\"ABCDEFGHIJKLMNOPQRSTUVWXYZ012345\"", "PRINT LEN(A$)"]);
    assert_eq!(out, "32\n");
}

#[test]
fn dim_grows_string_capacity() {
    let long = "X".repeat(40);
    let out = run_output(&[&format!("DIM S$(64): S$=\"{}\"", long), "PRINT LEN(S$)"]);
    assert_eq!(out, "40\n");
}

#[test]
fn numbers_and_strings_do_not_mix() {
    assert_eq!(run_output(&["PRINT 1+\"A\""]), "type mismatch\n");
    assert_eq!(run_output(&["A$=\"X\"", "A$=5"]), "type mismatch\n");
}
