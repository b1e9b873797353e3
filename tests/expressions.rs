//! Expression evaluation: precedence, boolean modes, arithmetic edges

mod common;

use common::run_output;
use rstest::rstest;

#[rstest]
#[case("PRINT 2+3*4", "14\n")]
#[case("PRINT (2+3)*4", "20\n")]
#[case("PRINT 10-2-3", "5\n")]
#[case("PRINT 7/2", "3\n")]
#[case("PRINT -7/2", "-3\n")]
#[case("PRINT 7 MOD 3", "1\n")]
#[case("PRINT -7 MOD 3", "-1\n")]
#[case("PRINT 7 MOD -3", "1\n")]
#[case("PRINT 2^10", "1024\n")]
#[case("PRINT -2^2", "4\n")]
fn arithmetic(#[case] src: &str, #[case] want: &str) {
    assert_eq!(run_output(&[src]), want);
}

#[test]
fn shifts_bind_tighter_than_multiplication() {
    assert_eq!(run_output(&["PRINT 2*4>>1"]), "4\n");
    assert_eq!(run_output(&["PRINT 1+2<<1"]), "5\n");
    assert_eq!(run_output(&["PRINT 16>>2"]), "4\n");
    assert_eq!(run_output(&["PRINT 1<<40"]), "0\n");
}

#[test]
fn power_is_left_associative_by_default() {
    assert_eq!(run_output(&["PRINT 2^3^2"]), "64\n");
}

#[test]
fn set_22_switches_power_to_right_associative() {
    assert_eq!(run_output(&["SET 22,1", "PRINT 2^3^2"]), "512\n");
}

#[test]
fn bitwise_boolean_mode_is_the_default() {
    assert_eq!(run_output(&["PRINT (1=1)+1"]), "0\n");
    assert_eq!(run_output(&["PRINT 2<3"]), "-1\n");
    assert_eq!(run_output(&["PRINT NOT 0"]), "-1\n");
    assert_eq!(run_output(&["PRINT 6 AND 3"]), "2\n");
    assert_eq!(run_output(&["PRINT 4 OR 1"]), "5\n");
}

#[test]
fn c_boolean_mode_yields_zero_and_one() {
    assert_eq!(run_output(&["SET 19,1", "PRINT (1=1)+1"]), "2\n");
    assert_eq!(run_output(&["SET 19,1", "PRINT NOT 0"]), "1\n");
    assert_eq!(run_output(&["SET 19,1", "PRINT NOT 5"]), "0\n");
    // AND and OR stay bitwise on their operands
    assert_eq!(run_output(&["SET 19,1", "PRINT 6 AND 3"]), "2\n");
}

#[rstest]
#[case("PRINT 1=1", "-1\n")]
#[case("PRINT 1<>1", "0\n")]
#[case("PRINT 2<=2", "-1\n")]
#[case("PRINT 2>=3", "0\n")]
#[case("PRINT 2>1 AND 3>2", "-1\n")]
fn comparisons(#[case] src: &str, #[case] want: &str) {
    assert_eq!(run_output(&[src]), want);
}

#[test]
fn integer_division_by_zero_is_an_error() {
    assert_eq!(run_output(&["PRINT 1/0"]), "division by zero\n");
    assert_eq!(run_output(&["PRINT 1 MOD 0"]), "division by zero\n");
}

#[test]
fn float_division_by_zero_is_infinite() {
    assert_eq!(run_output(&["PRINT 1.0/0"]), "inf\n");
}

#[test]
fn mixed_arithmetic_widens_to_float() {
    assert_eq!(run_output(&["PRINT 1.5+1"]), "2.5\n");
    assert_eq!(run_output(&["PRINT 3.0*2"]), "6.0\n");
}

#[test]
fn builtins() {
    assert_eq!(run_output(&["PRINT ABS(-5)"]), "5\n");
    assert_eq!(run_output(&["PRINT SGN(-3);SGN(0);SGN(9)"]), "-101\n");
    assert_eq!(run_output(&["PRINT INT(2.7)"]), "2.0\n");
    assert_eq!(run_output(&["PRINT INT(-2.7)"]), "-3.0\n");
    assert_eq!(run_output(&["PRINT SQR(9)"]), "3.0\n");
    assert_eq!(run_output(&["PRINT POW(2,10)"]), "1024\n");
}

#[test]
fn rnd_stays_in_range() {
    let out = run_output(&[
        "10 FOR I=1 TO 50",
        "20 A=RND(6)",
        "30 IF A<0 OR A>5 THEN PRINT \"BAD\"",
        "40 NEXT",
        "50 PRINT \"OK\"",
        "RUN",
    ]);
    assert_eq!(out, "OK\n");
}

#[test]
fn millis_reads_the_host_clock() {
    let mut m = minibasic::Machine::default();
    let mut host = common::MockHost::new();
    host.now = 5000;
    common::feed(&mut m, &mut host, &["PRINT MILLIS"]);
    assert_eq!(host.out(), "5000\n");
}

#[test]
fn scalars_default_to_zero_on_first_read() {
    assert_eq!(run_output(&["PRINT Q"]), "0\n");
}

#[test]
fn deep_nesting_overflows_the_expression_stack() {
    let expr = format!("PRINT {}1{}", "(".repeat(70), ")".repeat(70));
    assert_eq!(run_output(&[&expr]), "stack overflow\n");
}
