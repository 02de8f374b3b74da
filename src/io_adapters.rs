use std::cell::RefCell;
use std::io::{Cursor, Read, Result as IoResult, Write};
use std::rc::Rc;

/// Write adapter that forwards only whole lines to the wrapped writer.
///
/// Bytes are held in an internal buffer until a newline arrives; `flush`
/// forces out the partial tail. Used by the logger so interleaved partial
/// writes still come out line by line.
pub struct LineBufferedWriter<W: Write> {
    inner: W,
    buffer: Vec<u8>,
}

impl<W: Write> LineBufferedWriter<W> {
    /// Wrap a writer in a line buffer.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buffer: Vec::new(),
        }
    }

    /// Access the wrapped writer. Only complete lines have reached it
    /// unless `flush` was called.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    /// Flush any partial line and return the wrapped writer.
    pub fn into_inner(mut self) -> IoResult<W> {
        self.flush()?;
        Ok(self.inner)
    }
}

impl<W: Write> Write for LineBufferedWriter<W> {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buffer.extend_from_slice(data);
        if let Some(last_newline) = self.buffer.iter().rposition(|&b| b == b'\n') {
            self.inner.write_all(&self.buffer[..=last_newline])?;
            self.buffer.drain(..=last_newline);
        }
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        if !self.buffer.is_empty() {
            self.inner.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        self.inner.flush()
    }
}

/// Memory-backed reader for feeding literal bytes to a command's stdin.
pub struct MemReader {
    cursor: Cursor<Vec<u8>>,
}

impl MemReader {
    /// Create a MemReader that will read from the provided buffer.
    pub fn new(buf: Vec<u8>) -> Self {
        Self {
            cursor: Cursor::new(buf),
        }
    }
}

impl Read for MemReader {
    fn read(&mut self, out: &mut [u8]) -> IoResult<usize> {
        self.cursor.read(out)
    }
}

/// Memory-backed writer for capturing output in tests and log sinks.
pub struct MemWriter {
    buf: Rc<RefCell<Vec<u8>>>,
}

impl MemWriter {
    /// Public constructor.
    pub fn new() -> Self {
        Self {
            buf: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Return inner Rc so the caller can read collected bytes later.
    pub fn into_inner(self) -> Rc<RefCell<Vec<u8>>> {
        self.buf
    }

    /// Convenience: create writer and return (writer, rc_handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Vec<u8>>>) {
        let mw = MemWriter::new();
        let rc = mw.buf.clone();
        (mw, rc)
    }
}

impl Default for MemWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl Write for MemWriter {
    fn write(&mut self, data: &[u8]) -> IoResult<usize> {
        self.buf.borrow_mut().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> IoResult<()> {
        Ok(())
    }
}
