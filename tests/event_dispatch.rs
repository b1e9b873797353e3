//! Timers, pin events, break: the between-statement dispatcher

mod common;

use common::{feed, MockHost};
use minibasic::Machine;

fn run_with(host: &mut MockHost, lines: &[&str]) -> Machine {
    let mut m = Machine::default();
    feed(&mut m, host, lines);
    m
}

#[test]
fn every_fires_periodically_on_the_host_clock() {
    let mut host = MockHost::new();
    let m = run_with(
        &mut host,
        &[
            "10 EVERY 50 GOSUB 100",
            "20 DELAY 60",
            "30 DELAY 60",
            "40 END",
            "100 PRINT \"T\";:RETURN",
            "RUN",
        ],
    );
    assert_eq!(host.out(), "TT");
    assert!(m.gosub.is_empty());
}

#[test]
fn after_fires_once() {
    let mut host = MockHost::new();
    run_with(
        &mut host,
        &[
            "10 AFTER 50 GOSUB 100",
            "20 DELAY 60",
            "30 DELAY 60",
            "40 DELAY 60",
            "50 END",
            "100 PRINT \"T\";:RETURN",
            "RUN",
        ],
    );
    assert_eq!(host.out(), "T");
}

#[test]
fn every_zero_disarms() {
    let mut host = MockHost::new();
    run_with(
        &mut host,
        &[
            "10 EVERY 50 GOSUB 100",
            "20 EVERY 0 GOSUB 100",
            "30 DELAY 200",
            "40 END",
            "100 PRINT \"T\";:RETURN",
            "RUN",
        ],
    );
    assert_eq!(host.out(), "");
}

#[test]
fn handlers_do_not_reenter() {
    let mut host = MockHost::new();
    // the handler outlasts its own period, so the timer comes due again
    // while it runs; the tick must not nest, and the handler disarms
    // itself before returning
    run_with(
        &mut host,
        &[
            "10 EVERY 50 GOSUB 100",
            "20 DELAY 60",
            "30 END",
            "100 PRINT \"[\";:DELAY 200:PRINT \"]\";:EVERY 0 GOSUB 100:RETURN",
            "RUN",
        ],
    );
    assert_eq!(host.out(), "[]");
}

#[test]
fn pin_event_fires_on_rising_edge() {
    let mut host = MockHost::new();
    // first read arms the subscription at low, later reads go high
    host.pin_reads = [0u8, 0, 1, 1, 1].into_iter().collect();
    run_with(
        &mut host,
        &[
            "10 EVENT 4,1 GOSUB 100",
            "20 A=1",
            "30 A=2",
            "40 A=3",
            "50 END",
            "100 PRINT \"E\";:RETURN",
            "RUN",
        ],
    );
    assert_eq!(host.out(), "E");
}

#[test]
fn change_mode_fires_on_both_edges() {
    let mut host = MockHost::new();
    host.pin_reads = [0u8, 1, 1, 0].into_iter().collect();
    run_with(
        &mut host,
        &[
            "10 EVENT 4,2 GOSUB 100",
            "20 A=1",
            "30 A=2",
            "40 A=3",
            "50 A=4",
            "60 END",
            "100 PRINT \"E\";:RETURN",
            "RUN",
        ],
    );
    assert_eq!(host.out(), "EE");
}

#[test]
fn break_stops_a_spinning_program() {
    let mut host = MockHost::new();
    host.break_countdown = Some(100);
    run_with(&mut host, &["10 GOTO 10", "RUN"]);
    assert_eq!(host.out(), "break in line 10\n");
}

#[test]
fn pin_statements_reach_the_host() {
    let mut host = MockHost::new();
    run_with(&mut host, &["PINM 13,1", "DWRITE 13,1", "AWRITE 9,128"]);
    assert_eq!(host.pin_writes, vec![(13, 1), (9, 128)]);
}

#[test]
fn dread_returns_the_host_level() {
    let mut host = MockHost::new();
    host.pin_reads = [1u8].into_iter().collect();
    run_with(&mut host, &["PRINT DREAD(4);AREAD(0)"]);
    assert_eq!(host.out(), "1512\n");
}
