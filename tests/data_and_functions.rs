//! DATA/READ/RESTORE and DEF FN

mod common;

use common::run_output;

#[test]
fn read_walks_data_in_line_order() {
    let out = run_output(&[
        "10 DATA 1,2",
        "20 READ A,B",
        "30 DATA 3",
        "40 READ C",
        "50 PRINT A;B;C",
        "RUN",
    ]);
    assert_eq!(out, "123\n");
}

#[test]
fn data_handles_signs_and_strings() {
    let out = run_output(&[
        "10 DATA -5, +6, \"HI\"",
        "20 READ A,B,C$",
        "30 PRINT A;B;C$",
        "RUN",
    ]);
    assert_eq!(out, "-56HI\n");
}

#[test]
fn data_lines_are_skipped_by_normal_flow() {
    let out = run_output(&["10 PRINT \"X\"", "20 DATA 1,2,3", "30 PRINT \"Y\"", "RUN"]);
    assert_eq!(out, "X\nY\n");
}

#[test]
fn read_past_end_is_undefined() {
    let out = run_output(&["10 DATA 1", "20 READ A,B", "RUN"]);
    assert_eq!(out, "undefined in line 20\n");
}

#[test]
fn restore_rewinds_the_cursor() {
    let out = run_output(&[
        "10 DATA 7,8",
        "20 READ A",
        "30 RESTORE",
        "40 READ B",
        "50 PRINT A;B",
        "RUN",
    ]);
    assert_eq!(out, "77\n");
}

#[test]
fn restore_to_a_line() {
    let out = run_output(&[
        "10 DATA 1",
        "20 DATA 2",
        "30 RESTORE 20",
        "40 READ A",
        "50 PRINT A",
        "RUN",
    ]);
    assert_eq!(out, "2\n");
}

#[test]
fn read_into_arrays() {
    let out = run_output(&[
        "10 DIM A(3)",
        "20 DATA 10,20,30",
        "30 FOR I=1 TO 3",
        "40 READ A(I)",
        "50 NEXT",
        "60 PRINT A(2)",
        "RUN",
    ]);
    assert_eq!(out, "20\n");
}

#[test]
fn single_line_function() {
    let out = run_output(&[
        "10 DEF FN D(X) = X*2",
        "20 PRINT FN D(21)",
        "RUN",
    ]);
    assert_eq!(out, "42\n");
}

#[test]
fn function_parameters_do_not_leak() {
    let out = run_output(&[
        "10 X=7",
        "20 DEF FN D(X) = X*2",
        "30 PRINT FN D(5)",
        "40 PRINT X",
        "RUN",
    ]);
    assert_eq!(out, "10\n7\n");
}

#[test]
fn function_of_two_arguments() {
    let out = run_output(&[
        "10 DEF FN M(A,B) = A*10+B",
        "20 PRINT FN M(4,2)",
        "RUN",
    ]);
    assert_eq!(out, "42\n");
}

#[test]
fn multiline_function_returns_its_own_name() {
    let out = run_output(&[
        "10 DEF FN F(X)",
        "20 F=X*X",
        "30 FEND",
        "40 PRINT FN F(5)",
        "RUN",
    ]);
    assert_eq!(out, "25\n");
}

#[test]
fn multiline_body_is_skipped_during_definition() {
    let out = run_output(&[
        "10 DEF FN F(X)",
        "20 PRINT \"BODY\"",
        "30 F=1",
        "40 FEND",
        "50 PRINT \"DONE\"",
        "RUN",
    ]);
    assert_eq!(out, "DONE\n");
}

#[test]
fn undefined_function_call() {
    assert_eq!(
        run_output(&["10 PRINT FN NOPE(1)", "RUN"]),
        "undefined in line 10\n"
    );
}

#[test]
fn functions_nest_in_expressions() {
    let out = run_output(&[
        "10 DEF FN D(X) = X*2",
        "20 PRINT FN D(FN D(3))+1",
        "RUN",
    ]);
    assert_eq!(out, "13\n");
}
