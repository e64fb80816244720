//! Parse stack depth data dumped by the instrumentation library and
//! summarize it, optionally resolving addresses against the originating
//! binary's symbol table.

use clap::{CommandFactory, Parser};
use htm_tune::depth::{self, report, ReportOptions, SymbolTable};
use std::io::{self, Write};
use std::process;

#[derive(Parser)]
#[command(
    name = "stack-depth-info",
    about = "Parse stack depth data and summarize information"
)]
struct Args {
    /// Stack depth file dumped by the library (usually stack_depth.dat)
    #[arg(short = 'd', value_name = "FILE")]
    data_file: Option<String>,

    /// Binary from which the data was dumped; gives more detailed information
    #[arg(short = 'b', value_name = "FILE")]
    binary: Option<String>,

    /// Only print names of functions which called the stack depth library
    /// (requires -b)
    #[arg(short = 'f')]
    only_functions: bool,

    /// Verbose output, prints caller information
    #[arg(short = 'v')]
    verbose: bool,

    /// Emit the report as a JSON document
    #[arg(short = 'j', long = "json")]
    json: bool,
}

fn usage_error(msg: &str) -> ! {
    eprintln!("{}\n", msg);
    let _ = Args::command().print_help();
    process::exit(1);
}

fn run(args: &Args, data_file: &str) -> io::Result<()> {
    let profile = depth::parse_data(data_file)?;
    let opts = ReportOptions {
        verbose: args.verbose,
        only_functions: args.only_functions,
    };

    let symbols = match &args.binary {
        Some(binary) => Some(SymbolTable::from_binary(binary)?),
        None => None,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if args.json {
        report::print_json(&mut out, data_file, symbols.as_ref(), &profile)?;
    } else {
        match (&symbols, &args.binary) {
            (Some(symbols), Some(binary)) => {
                report::print_detailed(&mut out, data_file, binary, symbols, &profile, &opts)?
            }
            _ => report::print_raw(&mut out, data_file, &profile, &opts)?,
        }
    }
    out.flush()
}

fn main() {
    let args = Args::parse();

    let Some(data_file) = args.data_file.clone() else {
        usage_error("Please supply a data file!");
    };
    if args.only_functions && args.binary.is_none() {
        usage_error("Please supply a binary to print function names!");
    }

    if let Err(e) = run(&args, &data_file) {
        eprintln!("stack-depth-info: {}", e);
        process::exit(1);
    }
}
