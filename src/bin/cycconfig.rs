//! Drive a cycle-budget search under an external build/measure harness.
//!
//! Each iteration prints the compiler flag for the current candidate to
//! stdout, then reads one line from stdin: the measured runtime in seconds,
//! or with `--perf-stat` a path to a `perf stat` output file to scrape. EOF
//! ends the search early. Decisions land in `decision-log.txt` under the
//! results directory; the best configuration is echoed at the end.

use clap::Parser;
use htm_tune::cycles::CycleDriver;
use htm_tune::perf::{self, Counters, SampleCounts, SymbolSamples};
use std::io::{self, BufRead, Error, ErrorKind};
use std::process;

#[derive(Parser)]
#[command(
    name = "cycconfig",
    about = "Search migration-point cycle budgets for the lowest-slowdown configuration"
)]
struct Args {
    /// Baseline runtime of the untransformed application, in seconds
    #[arg(long)]
    target_time: f64,

    /// Acceptable percent slowdown over the baseline
    #[arg(long, default_value = "10.0")]
    slowdown_threshold: f64,

    /// Maximum number of search iterations
    #[arg(long, default_value = "10")]
    max_iters: usize,

    /// Directory receiving decision-log.txt
    #[arg(long, default_value = ".")]
    results_dir: String,

    /// Treat each input line as a perf-stat output file instead of a raw time
    #[arg(long)]
    perf_stat: bool,
}

fn run(args: &Args) -> io::Result<()> {
    let mut driver = CycleDriver::new(
        args.target_time,
        args.slowdown_threshold,
        args.max_iters,
        &args.results_dir,
    )?;

    let stdin = io::stdin();
    let mut measurements = stdin.lock().lines();
    let no_samples = SampleCounts::new();
    let no_symbols = SymbolSamples::new();

    while driver.keep_going() {
        let config = driver.get_configuration()?;
        println!("{}", config.compiler_flag);

        let Some(line) = measurements.next() else {
            eprintln!("cycconfig: input exhausted, stopping early");
            break;
        };
        let line = line?;

        let (time, counters) = if args.perf_stat {
            let stat = perf::scrape_perf_stat(line.trim())?;
            (stat.elapsed_secs, stat.counters)
        } else {
            let time = line.trim().parse::<f64>().map_err(|_| {
                Error::new(
                    ErrorKind::InvalidData,
                    format!("not a measured time in seconds: {:?}", line.trim()),
                )
            })?;
            (time, Counters::new())
        };
        driver.analyze(time, &counters, &no_samples, &no_symbols)?;
    }

    let best = driver.write_best()?;
    println!(
        "best: {} cycles, {:.3}s ({:.2}% slowdown)",
        best.cycles, best.time, best.slowdown
    );
    Ok(())
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("cycconfig: {}", e);
        process::exit(1);
    }
}
