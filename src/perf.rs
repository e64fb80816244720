//! Scrapers for `perf stat` and `perf report` output.
//!
//! The measurement harness runs the benchmark under `perf`; these parsers
//! recover the elapsed time, event counters and per-symbol sample breakdowns
//! that feed the cycle driver's `analyze()` inputs.

use std::collections::HashMap;
use std::fs;
use std::io::{Error, ErrorKind, Result};
use std::path::Path;
use std::process::Command;

/// Event name → counter value, from `perf stat`.
pub type Counters = HashMap<String, f64>;
/// Event name → count, from `perf report` headers.
pub type SampleCounts = HashMap<String, u64>;
/// Event name → `(symbol, percent)` rows in descending-percent order.
pub type SymbolSamples = HashMap<String, Vec<(String, f64)>>;

/// Elapsed time and counters scraped from one `perf stat` run.
#[derive(Debug, Clone)]
pub struct PerfStat {
    pub elapsed_secs: f64,
    pub counters: Counters,
}

/// Sample counts, approximate event counts and per-symbol breakdowns scraped
/// from `perf report --stdio`.
#[derive(Debug, Clone)]
pub struct PerfReport {
    pub num_samples: SampleCounts,
    pub event_counts: SampleCounts,
    pub symbols: SymbolSamples,
}

// Per-architecture HTM event names. Only architectures with hardware
// transactional memory counters are listed; everything else gets None.

/// Total cycles event for `arch`.
pub fn cycles_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" | "powerpc64le" => Some("cycles"),
        _ => None,
    }
}

/// Cycles spent in transactional execution.
pub fn transact_cycles_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("cycles-t"),
        _ => None,
    }
}

/// Cycles spent in committed transactions.
pub fn committed_cycles_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("cycles-ct"),
        _ => None,
    }
}

/// Number of transactions started.
pub fn htm_begins_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("tx-start"),
        _ => None,
    }
}

/// Number of committed transactions.
pub fn htm_ends_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("tx-commit"),
        _ => None,
    }
}

/// Number of aborted transactions.
pub fn htm_aborts_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("tx-abort"),
        _ => None,
    }
}

/// Sampling event recording HTM abort locations.
pub fn htm_abort_locs_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("cpu/tx-abort/pp"),
        _ => None,
    }
}

/// Transactions aborted on HTM buffer capacity.
pub fn htm_capacity_aborts_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("tx-capacity"),
        _ => None,
    }
}

/// Transactions aborted on memory conflicts.
pub fn htm_conflict_aborts_event(arch: &str) -> Option<&'static str> {
    match arch {
        "x86_64" => Some("tx-conflict"),
        _ => None,
    }
}

/// Parse the text of a `perf stat` output file.
///
/// Comment lines and the "Performance counter stats" banner are skipped. The
/// "time elapsed" line supplies the elapsed seconds; every other line with at
/// least two fields contributes `fields[1] → fields[0]` (commas stripped).
/// Unparseable counter values (e.g. `<not supported>`) are skipped.
pub fn parse_perf_stat(text: &str) -> Result<PerfStat> {
    let mut elapsed: Option<f64> = None;
    let mut counters = Counters::new();

    for line in text.lines() {
        if line.contains('#') || line.contains("Performance counter stats") {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if line.contains("time elapsed") {
            elapsed = Some(parse_field(&fields, 0, "elapsed time")?);
        } else {
            if fields.len() < 2 {
                continue;
            }
            if let Ok(value) = fields[0].replace(',', "").parse::<f64>() {
                counters.insert(fields[1].to_string(), value);
            }
        }
    }

    if counters.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "no counter values in perf-stat output",
        ));
    }
    let elapsed_secs = elapsed.ok_or_else(|| {
        Error::new(
            ErrorKind::InvalidData,
            "no elapsed time in perf-stat output",
        )
    })?;
    Ok(PerfStat {
        elapsed_secs,
        counters,
    })
}

/// Read and parse a `perf stat` output file.
pub fn scrape_perf_stat(path: impl AsRef<Path>) -> Result<PerfStat> {
    parse_perf_stat(&fs::read_to_string(path)?)
}

fn parse_field(fields: &[&str], idx: usize, what: &str) -> Result<f64> {
    fields
        .get(idx)
        .and_then(|f| f.replace(',', "").parse().ok())
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, format!("malformed {} field", what)))
}

/// Expand a sample count with an optional K/M/B multiplier suffix.
fn parse_sample_count(field: &str) -> Result<u64> {
    let last = field
        .chars()
        .last()
        .ok_or_else(|| Error::new(ErrorKind::InvalidData, "empty sample count"))?;
    let (digits, multiplier) = match last {
        'K' => (&field[..field.len() - 1], 1_000),
        'M' => (&field[..field.len() - 1], 1_000_000),
        'B' => (&field[..field.len() - 1], 1_000_000_000),
        _ if last.is_ascii_digit() => (field, 1),
        _ => {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("unknown sample multiplier '{}'", last),
            ));
        }
    };
    digits
        .parse::<u64>()
        .map(|n| n * multiplier)
        .map_err(|_| {
            Error::new(
                ErrorKind::InvalidData,
                format!("malformed sample count '{}'", field),
            )
        })
}

/// Parse the stdout of `perf report --stdio`.
///
/// Warning text emitted before the first `#` line (typically about kernel
/// symbols) is skipped. `# Samples:` lines open a new event section;
/// `# Event count` lines record its approximate total; data rows (first field
/// ending in `%`) append `(symbol, percent)` pairs in perf's descending
/// output order.
pub fn parse_perf_report(text: &str) -> Result<PerfReport> {
    let mut num_samples = SampleCounts::new();
    let mut event_counts = SampleCounts::new();
    let mut symbols = SymbolSamples::new();
    let mut current_event: Option<String> = None;
    let mut skip_warnings = true;

    for line in text.lines() {
        if line.contains('#') {
            skip_warnings = false;
        } else if skip_warnings {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        if line.contains("# Samples:") {
            let event = fields
                .get(5)
                .map(|f| f.trim_matches('\'').to_string())
                .ok_or_else(|| {
                    Error::new(ErrorKind::InvalidData, "malformed '# Samples:' line")
                })?;
            let samples = parse_sample_count(fields.get(2).ok_or_else(|| {
                Error::new(ErrorKind::InvalidData, "malformed '# Samples:' line")
            })?)?;
            num_samples.insert(event.clone(), samples);
            current_event = Some(event);
        } else if line.contains("# Event count") {
            let event = current_event.clone().ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidData,
                    "'# Event count' before any '# Samples:' line",
                )
            })?;
            event_counts.insert(event, parse_field(&fields, 4, "event count")? as u64);
        } else if !line.contains('#') {
            if fields.len() < 5 || !fields[0].ends_with('%') {
                continue;
            }
            let event = current_event.clone().ok_or_else(|| {
                Error::new(
                    ErrorKind::InvalidData,
                    "sample row before any '# Samples:' line",
                )
            })?;
            let percent: f64 = fields[0]
                .trim_end_matches('%')
                .parse()
                .map_err(|_| Error::new(ErrorKind::InvalidData, "malformed percent field"))?;
            symbols
                .entry(event)
                .or_default()
                .push((fields[4].to_string(), percent));
        }
    }

    if num_samples.is_empty() || event_counts.is_empty() || symbols.is_empty() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "no samples found in perf-report output",
        ));
    }
    if num_samples.len() != event_counts.len() || num_samples.len() != symbols.len() {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "perf-report event sections do not match up",
        ));
    }
    Ok(PerfReport {
        num_samples,
        event_counts,
        symbols,
    })
}

/// Run `<perf> report -i <data_file> --stdio` and parse its output.
pub fn scrape_perf_report(perf: &str, data_file: impl AsRef<Path>) -> Result<PerfReport> {
    let output = Command::new(perf)
        .arg("report")
        .arg("-i")
        .arg(data_file.as_ref())
        .arg("--stdio")
        .output()?;
    if !output.status.success() {
        return Err(Error::new(
            ErrorKind::Other,
            format!("perf report failed with {}", output.status),
        ));
    }
    let text = String::from_utf8(output.stdout)
        .map_err(|_| Error::new(ErrorKind::InvalidData, "perf report output is not UTF-8"))?;
    parse_perf_report(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STAT_OUTPUT: &str = "
 Performance counter stats for './benchmark':

     9,732,117,872      cycles
     1,234,567,890      cycles-t
         1,042,117      tx-start
            51,223      tx-abort
   <not supported>      tx-capacity

      12.345678901 seconds time elapsed
";

    #[test]
    fn perf_stat_counters_and_time() {
        let stat = parse_perf_stat(STAT_OUTPUT).unwrap();
        assert_eq!(stat.counters["cycles"], 9_732_117_872.0);
        assert_eq!(stat.counters["tx-abort"], 51_223.0);
        assert!((stat.elapsed_secs - 12.345678901).abs() < 1e-12);
        // <not supported> rows contribute nothing
        assert!(!stat.counters.contains_key("tx-capacity"));
    }

    #[test]
    fn perf_stat_requires_counters() {
        let err = parse_perf_stat("      1.5 seconds time elapsed\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn perf_stat_requires_elapsed_time() {
        let err = parse_perf_stat("  1,000  cycles\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    const REPORT_OUTPUT: &str = "\
Warning: kernel symbols unavailable
# To display the perf.data header info, please use --header/--header-only options.
#
# Samples: 40K of event 'tx-abort'
# Event count (approx.): 40960
#
# Overhead  Command  Shared Object  Symbol
    61.20%  bench    bench          [.] compute_kernel
    22.43%  bench    libc.so        [.] memcpy
     9.01%  bench    bench          [.] update_state
";

    #[test]
    fn perf_report_sections() {
        let report = parse_perf_report(REPORT_OUTPUT).unwrap();
        assert_eq!(report.num_samples["tx-abort"], 40_000);
        assert_eq!(report.event_counts["tx-abort"], 40_960);
        let syms = &report.symbols["tx-abort"];
        assert_eq!(syms[0], ("compute_kernel".to_string(), 61.20));
        assert_eq!(syms.len(), 3);
    }

    #[test]
    fn sample_count_multipliers() {
        assert_eq!(parse_sample_count("123").unwrap(), 123);
        assert_eq!(parse_sample_count("40K").unwrap(), 40_000);
        assert_eq!(parse_sample_count("2M").unwrap(), 2_000_000);
        assert_eq!(parse_sample_count("1B").unwrap(), 1_000_000_000);
        assert!(parse_sample_count("40Q").is_err());
    }

    #[test]
    fn perf_report_rejects_empty() {
        let err = parse_perf_report("# nothing here\n").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }

    #[test]
    fn event_names_by_arch() {
        assert_eq!(cycles_event("x86_64"), Some("cycles"));
        assert_eq!(cycles_event("powerpc64le"), Some("cycles"));
        assert_eq!(transact_cycles_event("powerpc64le"), None);
        assert_eq!(htm_abort_locs_event("x86_64"), Some("cpu/tx-abort/pp"));
        assert_eq!(htm_begins_event("riscv64"), None);
    }
}
