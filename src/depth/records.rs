use serde::Serialize;
use std::fmt;

/// One caller of an instrumented function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallerRecord {
    pub address: u64,
    pub count: u64,
}

/// Per-function statistics dumped by the instrumentation library.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionRecord {
    /// Address of the instrumented function.
    pub address: u64,
    /// Number of times the function invoked the library.
    pub call_count: u64,
    /// Average call-stack depth across those invocations.
    pub avg_depth: f64,
    /// Caller observed at the deepest invocation.
    pub max_depth_caller: u64,
    /// Deepest observed call-stack depth.
    pub max_depth: u64,
    /// All observed callers with their call counts.
    pub callers: Vec<CallerRecord>,
}

/// The globally deepest invocation across all records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MaxDepthRecord {
    pub function: u64,
    pub caller: u64,
    pub depth: u64,
}

/// A fully parsed stack depth dump.
#[derive(Debug, Clone)]
pub struct DepthProfile {
    /// Call-count-weighted mean depth across all records.
    pub avg_depth: f64,
    pub max_depth: MaxDepthRecord,
    /// Function records, sorted descending by call count (stable).
    pub functions: Vec<FunctionRecord>,
}

impl fmt::Display for FunctionRecord {
    /// Re-emits the dump file line format, so synthetic data files can be
    /// written with `writeln!` and read back by the parser.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({}, {}, {}, ({}, {}), [",
            self.address, self.call_count, self.avg_depth, self.max_depth_caller, self.max_depth
        )?;
        for (i, caller) in self.callers.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "({}, {})", caller.address, caller.count)?;
        }
        write!(f, "])")
    }
}
