//! Cycle-budget search driver.
//!
//! Iterates over a fixed ascending list of candidate migration-point cycle
//! budgets. For each candidate the driver hands out a compiler flag embedding
//! the value, the external harness rebuilds and measures the benchmark, and
//! the measured time is fed back through [`CycleDriver::analyze`]. Every
//! decision is appended to `decision-log.txt` in the results directory. Once
//! the candidate list or the iteration budget runs out,
//! [`CycleDriver::write_best`] reports the candidate with the lowest time.

mod driver;
mod log;

pub use driver::{percent, BestResult, CycleConfiguration, CycleDriver, CANDIDATE_CYCLES};
pub use log::DecisionLog;
