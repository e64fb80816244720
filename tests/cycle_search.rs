//! End-to-end cycle-budget searches over the public driver API, checking the
//! stopping rule, best-result selection and the decision log on disk.

use assert2::check;
use htm_tune::cycles::{CycleDriver, CANDIDATE_CYCLES};
use htm_tune::perf::{Counters, SampleCounts, SymbolSamples};
use tempfile::TempDir;

fn no_perf() -> (Counters, SampleCounts, SymbolSamples) {
    (Counters::new(), SampleCounts::new(), SymbolSamples::new())
}

/// Run a full search feeding `times` back in order; returns the driver and
/// the number of analyze() calls made.
fn run_search(
    target_time: f64,
    max_iters: usize,
    times: &[f64],
    dir: &TempDir,
) -> (CycleDriver, usize) {
    let mut driver = CycleDriver::new(target_time, 10.0, max_iters, dir.path()).unwrap();
    let (c, n, s) = no_perf();
    let mut calls = 0;
    let mut times = times.iter().cycle();
    while driver.keep_going() {
        driver.get_configuration().unwrap();
        driver.analyze(*times.next().unwrap(), &c, &n, &s).unwrap();
        calls += 1;
    }
    (driver, calls)
}

#[test]
fn search_visits_min_of_candidates_and_budget() {
    // Default list has 11 candidates; budget of 10 allows 11 analyze calls.
    let dir = TempDir::new().unwrap();
    let (_driver, calls) = run_search(30.0, 10, &[30.0], &dir);
    check!(calls == CANDIDATE_CYCLES.len());

    // A tighter budget wins: min(11, 4 + 1) = 5.
    let dir = TempDir::new().unwrap();
    let (_driver, calls) = run_search(30.0, 4, &[30.0], &dir);
    check!(calls == 5);
}

#[test]
fn full_search_selects_global_minimum() {
    let dir = TempDir::new().unwrap();
    // Eleven measurements, minimum at the 6th candidate (100 cycles).
    let times = [
        33.0, 32.5, 32.0, 31.0, 30.5, 28.0, 30.0, 31.5, 32.0, 33.5, 34.0,
    ];
    let (mut driver, calls) = run_search(30.0, 10, &times, &dir);
    check!(calls == 11);

    let best = driver.write_best().unwrap();
    check!(best.cycles == 100);
    check!(best.time == 28.0);
    check!((best.slowdown - (28.0 / 30.0 * 100.0 - 100.0)).abs() < 1e-9);
}

#[test]
fn decision_log_records_every_iteration_and_the_final_result() {
    let dir = TempDir::new().unwrap();
    let (mut driver, _calls) = run_search(30.0, 2, &[33.0, 31.5, 30.9], &dir);
    driver.write_best().unwrap();
    drop(driver);

    let log = std::fs::read_to_string(dir.path().join("decision-log.txt")).unwrap();
    check!(log.contains("[ Iteration  1 ] Configuration: capacity=95, start=95, return=95, cycles=1"));
    check!(log.contains("[ Iteration  1 ] Results from configuration: 33.000s (10.00% slowdown)"));
    check!(log.contains("[ Iteration  2 ] Configuration: capacity=95, start=95, return=95, cycles=5"));
    check!(log.contains("[ Iteration  3 ] Hit maximum number of iterations"));
    check!(log.contains("[ Final Result ] Best configuration:"));
    check!(log.contains("[ Final Result ] Time: 30.900s, 3.00% slowdown, 10 million cycles"));
}

#[test]
fn candidate_exhaustion_is_logged() {
    let dir = TempDir::new().unwrap();
    let (_driver, _calls) = run_search(30.0, 100, &[30.0], &dir);

    let log = std::fs::read_to_string(dir.path().join("decision-log.txt")).unwrap();
    check!(log.contains("[ Iteration 11 ] No more cycle targets to test"));
}

#[test]
fn flags_walk_the_candidate_list_in_order() {
    let dir = TempDir::new().unwrap();
    let mut driver = CycleDriver::new(30.0, 10.0, 100, dir.path()).unwrap();
    let (c, n, s) = no_perf();
    let mut flags = Vec::new();
    while driver.keep_going() {
        flags.push(driver.get_configuration().unwrap().compiler_flag);
        driver.analyze(30.0, &c, &n, &s).unwrap();
    }
    let expected: Vec<String> = CANDIDATE_CYCLES
        .iter()
        .map(|v| format!("-mllvm -migpoint-cycles={}", v))
        .collect();
    check!(flags == expected);
}
