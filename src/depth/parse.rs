//! Explicit grammar parser for the stack depth dump format.
//!
//! Each line is a tuple literal:
//!
//! ```text
//! (addr, calls, avg_depth, (max_caller, max_depth), [(caller, count), ...])
//! ```
//!
//! Integers may be decimal or `0x`-prefixed hex. The original dump format was
//! deserialized with dynamic expression evaluation; this is a closed grammar
//! over untrusted text instead.

use crate::depth::records::{CallerRecord, DepthProfile, FunctionRecord, MaxDepthRecord};
use std::fs::File;
use std::io::{BufRead, BufReader, Error, ErrorKind, Result};
use std::path::Path;

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|c| c.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn fail(&self, what: &str) -> Error {
        Error::new(
            ErrorKind::InvalidData,
            format!("expected {} at column {}", what, self.pos + 1),
        )
    }

    fn expect(&mut self, c: char) -> Result<()> {
        self.skip_ws();
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            Ok(())
        } else {
            Err(self.fail(&format!("'{}'", c)))
        }
    }

    /// Decimal or `0x`-prefixed hex integer.
    fn integer(&mut self) -> Result<u64> {
        self.skip_ws();
        let rest = self.rest();
        if let Some(hex) = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X")) {
            let len = hex.chars().take_while(|c| c.is_ascii_hexdigit()).count();
            if len == 0 {
                return Err(self.fail("hex digits"));
            }
            let value = u64::from_str_radix(&hex[..len], 16)
                .map_err(|_| self.fail("a hex integer in range"))?;
            self.pos += 2 + len;
            Ok(value)
        } else {
            let len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
            if len == 0 {
                return Err(self.fail("an integer"));
            }
            let value = rest[..len]
                .parse()
                .map_err(|_| self.fail("an integer in range"))?;
            self.pos += len;
            Ok(value)
        }
    }

    /// Non-negative float literal (plain integers accepted).
    fn float(&mut self) -> Result<f64> {
        self.skip_ws();
        let rest = self.rest();
        let len = rest
            .chars()
            .take_while(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
            .count();
        if len == 0 {
            return Err(self.fail("a float"));
        }
        let value = rest[..len].parse().map_err(|_| self.fail("a float"))?;
        self.pos += len;
        Ok(value)
    }

    fn end(&mut self) -> Result<()> {
        self.skip_ws();
        if self.pos == self.input.len() {
            Ok(())
        } else {
            Err(self.fail("end of line"))
        }
    }
}

/// Parse one dump line into a [`FunctionRecord`].
pub fn parse_record(line: &str) -> Result<FunctionRecord> {
    let mut c = Cursor::new(line);
    c.expect('(')?;
    let address = c.integer()?;
    c.expect(',')?;
    let call_count = c.integer()?;
    c.expect(',')?;
    let avg_depth = c.float()?;
    c.expect(',')?;
    c.expect('(')?;
    let max_depth_caller = c.integer()?;
    c.expect(',')?;
    let max_depth = c.integer()?;
    c.expect(')')?;
    c.expect(',')?;
    c.expect('[')?;
    let mut callers = Vec::new();
    c.skip_ws();
    if c.peek() != Some(']') {
        loop {
            c.expect('(')?;
            let address = c.integer()?;
            c.expect(',')?;
            let count = c.integer()?;
            c.expect(')')?;
            callers.push(CallerRecord { address, count });
            c.skip_ws();
            if c.peek() == Some(',') {
                c.expect(',')?;
            } else {
                break;
            }
        }
    }
    c.expect(']')?;
    c.expect(')')?;
    c.end()?;
    Ok(FunctionRecord {
        address,
        call_count,
        avg_depth,
        max_depth_caller,
        max_depth,
        callers,
    })
}

/// Read a stack depth dump into a [`DepthProfile`].
///
/// Malformed lines and a zero total call count both fail with
/// `ErrorKind::InvalidData` rather than producing wrong statistics.
pub fn parse_data(path: impl AsRef<Path>) -> Result<DepthProfile> {
    let reader = BufReader::new(File::open(path)?);

    let mut total_calls = 0u64;
    let mut weighted_depth = 0.0f64;
    let mut max_depth = MaxDepthRecord::default();
    let mut functions = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record = parse_record(trimmed)
            .map_err(|e| Error::new(ErrorKind::InvalidData, format!("line {}: {}", idx + 1, e)))?;

        total_calls += record.call_count;
        weighted_depth += record.call_count as f64 * record.avg_depth;
        if record.max_depth > max_depth.depth {
            max_depth = MaxDepthRecord {
                function: record.address,
                caller: record.max_depth_caller,
                depth: record.max_depth,
            };
        }
        functions.push(record);
    }

    if total_calls == 0 {
        return Err(Error::new(
            ErrorKind::InvalidData,
            "data file records no calls; average depth is undefined",
        ));
    }

    // Stable sort keeps dump order among equal call counts.
    functions.sort_by(|a, b| b.call_count.cmp(&a.call_count));

    Ok(DepthProfile {
        avg_depth: weighted_depth / total_calls as f64,
        max_depth,
        functions,
    })
}
