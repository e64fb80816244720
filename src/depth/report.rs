//! Report rendering for parsed stack depth dumps.
//!
//! Two mutually exclusive text modes: raw (addresses only) and detailed
//! (symbol-annotated, requires the originating binary). Detailed mode has a
//! names-only filter; the verbose flag adds per-function caller lists. A JSON
//! mode serializes the whole profile for downstream tooling.

use crate::depth::records::{CallerRecord, DepthProfile, FunctionRecord};
use crate::depth::symbols::SymbolTable;
use serde::Serialize;
use std::io::{Error, ErrorKind, Result, Write};

/// Rendering switches, fixed for the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Print per-function caller lists.
    pub verbose: bool,
    /// Print only resolved function names (detailed mode).
    pub only_functions: bool,
}

/// Callers sorted descending by call count (stable).
fn sorted_callers(record: &FunctionRecord) -> Vec<&CallerRecord> {
    let mut callers: Vec<&CallerRecord> = record.callers.iter().collect();
    callers.sort_by(|a, b| b.count.cmp(&a.count));
    callers
}

/// Render the address-only report.
pub fn print_raw(
    w: &mut impl Write,
    data_file: &str,
    profile: &DepthProfile,
    opts: &ReportOptions,
) -> Result<()> {
    writeln!(w, "Data from {}", data_file)?;
    writeln!(w, "Average depth: {:.3}", profile.avg_depth)?;
    writeln!(
        w,
        "Max depth: {}, 0x{:x} called by 0x{:x}",
        profile.max_depth.depth, profile.max_depth.function, profile.max_depth.caller
    )?;
    writeln!(w)?;
    writeln!(w, "{:<14} {:>12} {:>12}", "Function:", "Num Calls", "Avg. Depth")?;
    for record in &profile.functions {
        writeln!(
            w,
            "0x{:<12x} {:>12} {:>12.3}",
            record.address, record.call_count, record.avg_depth
        )?;
    }

    if opts.verbose {
        for record in &profile.functions {
            writeln!(w, "\n0x{:x} called by:", record.address)?;
            for caller in sorted_callers(record) {
                writeln!(w, "  0x{:x}: {} time(s)", caller.address, caller.count)?;
            }
        }
    }
    Ok(())
}

/// Render the symbol-annotated report (or just the function names when
/// `opts.only_functions` is set).
pub fn print_detailed(
    w: &mut impl Write,
    data_file: &str,
    bin_file: &str,
    symbols: &SymbolTable,
    profile: &DepthProfile,
    opts: &ReportOptions,
) -> Result<()> {
    if opts.only_functions {
        for record in &profile.functions {
            writeln!(w, "{}", symbols.resolve_or_na(record.address))?;
        }
        return Ok(());
    }

    writeln!(w, "Data from {}, generated by {}", data_file, bin_file)?;
    writeln!(w, "Average depth: {:.3}", profile.avg_depth)?;
    writeln!(
        w,
        "Max depth: {}, {} (0x{:x}) called by {} (0x{:x})",
        profile.max_depth.depth,
        symbols.resolve_or_na(profile.max_depth.function),
        profile.max_depth.function,
        symbols.resolve_or_na(profile.max_depth.caller),
        profile.max_depth.caller
    )?;
    writeln!(w)?;
    writeln!(w, "{:<55} {:>12} {:>12}", "Function:", "Num Calls", "Avg. Depth")?;
    for record in &profile.functions {
        let name = format!(
            "{} (0x{:x})",
            symbols.resolve_or_na(record.address),
            record.address
        );
        writeln!(
            w,
            "{:<55} {:>12} {:>12.3}",
            name, record.call_count, record.avg_depth
        )?;
    }

    if opts.verbose {
        for record in &profile.functions {
            writeln!(
                w,
                "\n{} called by:",
                symbols.resolve_or_na(record.address)
            )?;
            for caller in sorted_callers(record) {
                writeln!(
                    w,
                    "  {} (0x{:x}): {} time(s)",
                    symbols.resolve_or_na(caller.address),
                    caller.address,
                    caller.count
                )?;
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct JsonCaller<'a> {
    address: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
    count: u64,
}

#[derive(Serialize)]
struct JsonFunction<'a> {
    address: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    symbol: Option<&'a str>,
    call_count: u64,
    avg_depth: f64,
    callers: Vec<JsonCaller<'a>>,
}

#[derive(Serialize)]
struct JsonMaxDepth<'a> {
    function: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    function_symbol: Option<&'a str>,
    caller: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    caller_symbol: Option<&'a str>,
    depth: u64,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    source: &'a str,
    average_depth: f64,
    max_depth: JsonMaxDepth<'a>,
    functions: Vec<JsonFunction<'a>>,
}

/// Serialize the profile as a single JSON document, with symbol names
/// attached when a table is available.
pub fn print_json(
    w: &mut impl Write,
    data_file: &str,
    symbols: Option<&SymbolTable>,
    profile: &DepthProfile,
) -> Result<()> {
    let resolve = |addr: u64| symbols.and_then(|t| t.resolve(addr));
    let report = JsonReport {
        source: data_file,
        average_depth: profile.avg_depth,
        max_depth: JsonMaxDepth {
            function: profile.max_depth.function,
            function_symbol: resolve(profile.max_depth.function),
            caller: profile.max_depth.caller,
            caller_symbol: resolve(profile.max_depth.caller),
            depth: profile.max_depth.depth,
        },
        functions: profile
            .functions
            .iter()
            .map(|record| JsonFunction {
                address: record.address,
                symbol: resolve(record.address),
                call_count: record.call_count,
                avg_depth: record.avg_depth,
                callers: sorted_callers(record)
                    .into_iter()
                    .map(|caller| JsonCaller {
                        address: caller.address,
                        symbol: resolve(caller.address),
                        count: caller.count,
                    })
                    .collect(),
            })
            .collect(),
    };
    serde_json::to_writer(&mut *w, &report)
        .map_err(|e| Error::new(ErrorKind::Other, e))?;
    writeln!(w)
}
