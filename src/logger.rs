//! Verbosity-gated log collection for command runs.
//!
//! Output from a child process is gathered here and emitted in one block
//! once the command finishes, so concurrent commands never interleave their
//! logs. Level 1 is for messages that should almost always be shown (the
//! command banner, child stderr); level 2 is for child stdout.

use crate::io_adapters::LineBufferedWriter;
use std::io::{self, Write};

/// A buffering logger that drops anything above its verbosity.
///
/// Writes pass through a line buffer, so a partial line is held back until
/// its newline arrives or the logger is flushed.
pub struct Logger {
    verbosity: u8,
    sink: LineBufferedWriter<Vec<u8>>,
}

impl Logger {
    /// Create a logger that keeps messages at `verbosity` and below.
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity,
            sink: LineBufferedWriter::new(Vec::new()),
        }
    }

    /// The level above which messages are discarded.
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Buffer a chunk at the given level. Chunks above the verbosity are
    /// silently dropped.
    pub fn write(&mut self, level: u8, chunk: &[u8]) -> io::Result<()> {
        if level <= self.verbosity {
            self.sink.write_all(chunk)?;
        }
        Ok(())
    }

    /// Buffer a single message line at the given level.
    pub fn log(&mut self, level: u8, message: &str) -> io::Result<()> {
        self.write(level, message.as_bytes())?;
        self.write(level, b"\n")
    }

    /// Emit everything buffered so far to `out` in one block and clear the
    /// buffer. Any partial trailing line is included.
    pub fn flush_to(&mut self, out: &mut dyn Write) -> io::Result<()> {
        self.sink.flush()?;
        let buffered = std::mem::take(self.sink.get_mut());
        out.write_all(&buffered)?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(logger: &mut Logger) -> String {
        let mut out = Vec::new();
        logger.flush_to(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn messages_at_or_below_verbosity_are_kept() {
        let mut logger = Logger::new(2);
        logger.log(1, "banner").unwrap();
        logger.log(2, "stdout").unwrap();
        assert_eq!(drain(&mut logger), "banner\nstdout\n");
    }

    #[test]
    fn messages_above_verbosity_are_dropped() {
        let mut logger = Logger::new(1);
        logger.log(1, "kept").unwrap();
        logger.log(2, "dropped").unwrap();
        assert_eq!(drain(&mut logger), "kept\n");
    }

    #[test]
    fn verbosity_zero_drops_everything() {
        let mut logger = Logger::new(0);
        logger.log(1, "banner").unwrap();
        logger.write(2, b"output").unwrap();
        assert_eq!(drain(&mut logger), "");
    }

    #[test]
    fn flush_includes_a_partial_trailing_line() {
        let mut logger = Logger::new(2);
        logger.write(2, b"no trailing newline").unwrap();
        assert_eq!(drain(&mut logger), "no trailing newline");
    }

    #[test]
    fn flush_clears_the_buffer() {
        let mut logger = Logger::new(2);
        logger.log(1, "once").unwrap();
        drain(&mut logger);
        assert_eq!(drain(&mut logger), "");
    }
}
