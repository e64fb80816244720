//! Symbol table extraction via `readelf --symbols`.

use std::io::{Error, ErrorKind, Result};
use std::path::Path;
use std::process::Command;

/// Rendered in reports when no symbol range contains an address.
pub const UNRESOLVED: &str = "(n/a)";

/// One defined symbol: name plus `[start, start + size)` address range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymbolEntry {
    pub name: String,
    pub start: u64,
    pub size: u64,
}

/// Symbol ranges in `readelf` output order.
///
/// Lookups are a linear range-containment scan; first match in table order
/// wins when ranges overlap. Fine for offline runs over modest tables.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    entries: Vec<SymbolEntry>,
}

/// Parse one `readelf --symbols` row.
///
/// Returns None for header lines (`Symbol table`, `Num:`), rows with fewer
/// than 8 whitespace-separated fields, undefined symbols (address 0) and rows
/// whose numeric fields don't parse. Zero sizes become 1 so dynamically
/// resolved symbols stay addressable; a `@version` suffix is stripped from
/// the name.
fn parse_symbol_line(line: &str) -> Option<SymbolEntry> {
    if line.contains("Symbol table") || line.contains("Num:") {
        return None;
    }
    let fields: Vec<&str> = line.split_whitespace().collect();
    if fields.len() < 8 {
        return None;
    }
    let start = u64::from_str_radix(fields[1], 16).ok()?;
    if start == 0 {
        return None;
    }
    let size = if fields[2].contains('x') {
        u64::from_str_radix(fields[2].trim_start_matches("0x"), 16).ok()?
    } else {
        fields[2].parse().ok()?
    };
    let name = fields[7].split('@').next()?.to_string();
    Some(SymbolEntry {
        name,
        start,
        size: size.max(1),
    })
}

impl SymbolTable {
    /// Build the table from `readelf --symbols` text.
    pub fn parse(text: &str) -> Self {
        Self {
            entries: text.lines().filter_map(parse_symbol_line).collect(),
        }
    }

    /// Run `readelf --symbols` against `binary` and parse its output.
    pub fn from_binary(binary: impl AsRef<Path>) -> Result<Self> {
        let output = Command::new("readelf")
            .arg("--symbols")
            .arg(binary.as_ref())
            .output()?;
        if !output.status.success() {
            return Err(Error::new(
                ErrorKind::Other,
                format!(
                    "readelf --symbols {} failed with {}",
                    binary.as_ref().display(),
                    output.status
                ),
            ));
        }
        let text = String::from_utf8(output.stdout)
            .map_err(|_| Error::new(ErrorKind::InvalidData, "readelf output is not UTF-8"))?;
        Ok(Self::parse(&text))
    }

    /// Name of the first symbol whose range contains `addr`.
    pub fn resolve(&self, addr: u64) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.start <= addr && addr < e.start + e.size)
            .map(|e| e.name.as_str())
    }

    /// Like [`resolve`](Self::resolve), with the `(n/a)` sentinel for misses.
    pub fn resolve_or_na(&self, addr: u64) -> &str {
        self.resolve(addr).unwrap_or(UNRESOLVED)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
