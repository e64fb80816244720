use std::fmt;
use std::fs::File;
use std::io::{LineWriter, Result, Write};
use std::path::Path;

/// Name of the log file created inside the results directory.
pub const LOG_FILE_NAME: &str = "decision-log.txt";

/// Append-only decision log, one line per driver decision.
///
/// Line-buffered so the log is readable while a long measurement run is still
/// in flight. The file handle is held for the driver's lifetime and released
/// on drop.
pub struct DecisionLog {
    writer: LineWriter<File>,
}

impl DecisionLog {
    /// Create `decision-log.txt` inside `results_dir`, truncating any
    /// previous log.
    pub fn create(results_dir: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(results_dir.as_ref().join(LOG_FILE_NAME))?;
        Ok(Self {
            writer: LineWriter::new(file),
        })
    }

    /// Log a per-iteration decision: `[ Iteration NN ] msg`.
    pub fn iteration(&mut self, iteration: usize, msg: impl fmt::Display) -> Result<()> {
        writeln!(self.writer, "[ Iteration {:>2} ] {}", iteration, msg)
    }

    /// Log a final summary line: `[ Final Result ] msg`.
    pub fn final_result(&mut self, msg: impl fmt::Display) -> Result<()> {
        writeln!(self.writer, "[ Final Result ] {}", msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn log_line_format() {
        let dir = TempDir::new().unwrap();
        let mut log = DecisionLog::create(dir.path()).unwrap();
        log.iteration(1, "starting").unwrap();
        log.iteration(12, "later").unwrap();
        log.final_result("done").unwrap();
        drop(log);

        let text = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "[ Iteration  1 ] starting");
        assert_eq!(lines[1], "[ Iteration 12 ] later");
        assert_eq!(lines[2], "[ Final Result ] done");
    }

    #[test]
    fn lines_visible_without_explicit_flush() {
        let dir = TempDir::new().unwrap();
        let mut log = DecisionLog::create(dir.path()).unwrap();
        log.iteration(1, "measuring").unwrap();

        // Log still open; the completed line must already be on disk.
        let text = std::fs::read_to_string(dir.path().join(LOG_FILE_NAME)).unwrap();
        assert!(text.contains("measuring"));
    }
}
