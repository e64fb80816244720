use crate::cycles::log::DecisionLog;
use crate::perf::{Counters, SampleCounts, SymbolSamples};
use std::io::{Error, ErrorKind, Result};
use std::path::Path;

/// Fixed candidate cycle budgets, probed in ascending order.
pub const CANDIDATE_CYCLES: [u64; 11] = [1, 5, 10, 25, 50, 100, 250, 500, 1000, 2500, 5000];

// TODO: tune these thresholds; 95 is a first guess that has not been
// validated against real abort profiles.
const CAPACITY_THRESH: u32 = 95;
const START_THRESH: u32 = 95;
const RETURN_THRESH: u32 = 95;

/// Percentage of `numerator` over `denominator`, guarding against
/// non-positive denominators with the maximum representable value.
pub fn percent(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        f64::MAX
    } else {
        (numerator / denominator) * 100.0
    }
}

/// The tuning parameters handed to the build harness for one iteration.
#[derive(Debug, Clone)]
pub struct CycleConfiguration {
    pub capacity: u32,
    pub start: u32,
    pub ret: u32,
    /// Candidate cycle budget for this iteration.
    pub cycles: u64,
    /// Compiler flag embedding the candidate, e.g. `-mllvm -migpoint-cycles=50`.
    pub compiler_flag: String,
}

/// The winning (candidate, time) pair selected by [`CycleDriver::write_best`].
#[derive(Debug, Clone, Copy)]
pub struct BestResult {
    pub cycles: u64,
    pub time: f64,
    /// Percent slowdown of `time` relative to the target time.
    pub slowdown: f64,
}

/// Best-of-N search over the candidate cycle budgets.
///
/// One instance drives one search: call [`get_configuration`] to obtain the
/// flag for the current candidate, measure externally, feed the time back
/// through [`analyze`], and repeat while [`keep_going`] holds. The search
/// stops when the iteration budget or the candidate list is exhausted.
///
/// [`get_configuration`]: CycleDriver::get_configuration
/// [`analyze`]: CycleDriver::analyze
/// [`keep_going`]: CycleDriver::keep_going
pub struct CycleDriver {
    target_time: f64,
    /// Runtime above which a configuration exceeds the slowdown threshold.
    /// Not yet consulted by the decision policy.
    stop_runtime: f64,
    max_iters: usize,
    /// Current iteration, 1-based. Only advances while the search is running.
    iteration: usize,
    candidates: Vec<u64>,
    /// Measured time per iteration, parallel to `candidates`.
    results: Vec<f64>,
    keep_going: bool,
    log: DecisionLog,
}

impl CycleDriver {
    /// Start a search over [`CANDIDATE_CYCLES`], logging decisions to
    /// `decision-log.txt` inside `results_dir`.
    pub fn new(
        target_time: f64,
        slowdown_thresh: f64,
        max_iters: usize,
        results_dir: impl AsRef<Path>,
    ) -> Result<Self> {
        Self::with_candidates(
            target_time,
            slowdown_thresh,
            max_iters,
            results_dir,
            CANDIDATE_CYCLES.to_vec(),
        )
    }

    /// Start a search over a caller-supplied candidate list.
    pub fn with_candidates(
        target_time: f64,
        slowdown_thresh: f64,
        max_iters: usize,
        results_dir: impl AsRef<Path>,
        candidates: Vec<u64>,
    ) -> Result<Self> {
        Ok(Self {
            target_time,
            stop_runtime: target_time * ((slowdown_thresh + 100.0) / 100.0),
            max_iters,
            iteration: 1,
            candidates,
            results: Vec::new(),
            keep_going: true,
            log: DecisionLog::create(results_dir)?,
        })
    }

    /// False once a stop condition has triggered; callers must not request
    /// another configuration afterwards.
    pub fn keep_going(&self) -> bool {
        self.keep_going
    }

    /// Current 1-based iteration.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn target_time(&self) -> f64 {
        self.target_time
    }

    /// Runtime corresponding to the slowdown threshold over the target time.
    pub fn stop_runtime(&self) -> f64 {
        self.stop_runtime
    }

    /// Fixed tuning parameters plus the compiler flag for the current
    /// candidate. Errors if the candidate list is already exhausted.
    pub fn get_configuration(&mut self) -> Result<CycleConfiguration> {
        let cycles = *self.candidates.get(self.iteration - 1).ok_or_else(|| {
            Error::new(
                ErrorKind::InvalidInput,
                "candidate list exhausted; check keep_going() before requesting a configuration",
            )
        })?;
        self.log.iteration(
            self.iteration,
            format_args!(
                "Configuration: capacity={}, start={}, return={}, cycles={}",
                CAPACITY_THRESH, START_THRESH, RETURN_THRESH, cycles
            ),
        )?;
        Ok(CycleConfiguration {
            capacity: CAPACITY_THRESH,
            start: START_THRESH,
            ret: RETURN_THRESH,
            cycles,
            compiler_flag: format!("-mllvm -migpoint-cycles={}", cycles),
        })
    }

    /// Record the measured time for the current iteration and advance, unless
    /// a stop condition holds (iteration budget spent or candidates
    /// exhausted), in which case the keep-going flag is cleared and the
    /// iteration left unchanged.
    ///
    /// `counters`, `num_samples` and `symbol_samples` come from the perf
    /// scrapers and are reserved for refining the decision policy; the
    /// current policy looks at the measured time only.
    pub fn analyze(
        &mut self,
        time: f64,
        _counters: &Counters,
        _num_samples: &SampleCounts,
        _symbol_samples: &SymbolSamples,
    ) -> Result<()> {
        self.results.push(time);
        let slowdown = percent(time, self.target_time) - 100.0;
        self.log.iteration(
            self.iteration,
            format_args!(
                "Results from configuration: {:.3}s ({:.2}% slowdown)",
                time, slowdown
            ),
        )?;

        if self.iteration > self.max_iters {
            self.log
                .iteration(self.iteration, "Hit maximum number of iterations")?;
            self.keep_going = false;
            return Ok(());
        }

        if self.iteration >= self.candidates.len() {
            self.log
                .iteration(self.iteration, "No more cycle targets to test")?;
            self.keep_going = false;
            return Ok(());
        }

        self.iteration += 1;
        Ok(())
    }

    /// Select the (candidate, time) pair with the strictly lowest time (first
    /// occurrence wins ties), write the final summary to the log and return
    /// it. Errors if no results have been recorded.
    pub fn write_best(&mut self) -> Result<BestResult> {
        let mut best: Option<(u64, f64)> = None;
        for (&cycles, &time) in self.candidates.iter().zip(&self.results) {
            match best {
                None => best = Some((cycles, time)),
                Some((_, best_time)) if time < best_time => best = Some((cycles, time)),
                Some(_) => {}
            }
        }
        let (cycles, time) = best.ok_or_else(|| {
            Error::new(ErrorKind::InvalidData, "no results recorded; nothing to report")
        })?;

        let slowdown = percent(time, self.target_time) - 100.0;
        self.log.final_result("Best configuration:")?;
        self.log.final_result(format_args!(
            "Time: {:.3}s, {:.2}% slowdown, {} million cycles",
            time, slowdown, cycles
        ))?;
        Ok(BestResult {
            cycles,
            time,
            slowdown,
        })
    }
}
