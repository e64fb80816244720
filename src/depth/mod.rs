//! Stack depth report tool.
//!
//! The instrumentation library dumps one record per function to a flat text
//! file (usually `stack_depth.dat`), one tuple literal per line:
//!
//! ```text
//! (<function addr>, <# calls>, <avg depth>, (<max-depth caller>, <max depth>), [(<caller>, <count>), ...])
//! ```
//!
//! [`parse_data`] reads the dump into a [`DepthProfile`]; [`SymbolTable`]
//! optionally maps the raw addresses back to symbol names using the
//! originating binary; [`report`] renders the raw, symbol-annotated or JSON
//! summaries.

mod parse;
mod records;
pub mod report;
mod symbols;

pub use parse::{parse_data, parse_record};
pub use records::{CallerRecord, DepthProfile, FunctionRecord, MaxDepthRecord};
pub use report::ReportOptions;
pub use symbols::{SymbolEntry, SymbolTable, UNRESOLVED};
