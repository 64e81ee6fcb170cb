// src/system/stream.rs

//! Readable and writable sinks handed out by an [`Environment`](super::environment::Environment).
//!
//! Streams are shared behind `Rc`, so every accessor hands back the same
//! instance and writes go through `&self`.

use std::cell::{Cell, RefCell};
use std::io::{self, Read, Write};

/// A sink text can be written to.
pub trait Writable {
    /// Writes `text` as is.
    fn write(&self, text: &str) -> io::Result<()>;
}

/// A source text can be read from.
pub trait Readable {
    /// Reads everything available.
    fn read_to_string(&self) -> io::Result<String>;
}

/// The process standard output.
#[derive(Debug, Default)]
pub struct StandardOutput;

impl Writable for StandardOutput {
    fn write(&self, text: &str) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(text.as_bytes())?;
        out.flush()
    }
}

/// The process standard error.
#[derive(Debug, Default)]
pub struct StandardError;

impl Writable for StandardError {
    fn write(&self, text: &str) -> io::Result<()> {
        let mut err = io::stderr().lock();
        err.write_all(text.as_bytes())?;
        err.flush()
    }
}

/// The process standard input.
#[derive(Debug, Default)]
pub struct StandardInput;

impl Readable for StandardInput {
    fn read_to_string(&self) -> io::Result<String> {
        let mut content = String::new();
        io::stdin().lock().read_to_string(&mut content)?;
        Ok(content)
    }
}

/// An in-memory stream. Writes are appended; reads return everything written so far.
#[derive(Debug, Default)]
pub struct Buffer {
    content: RefCell<String>,
    writes: Cell<usize>,
}

impl Buffer {
    /// An empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a buffer pre-filled with `content`, e.g. to stand in for stdin.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: RefCell::new(content.into()),
            writes: Cell::new(0),
        }
    }

    /// Everything written so far.
    pub fn contents(&self) -> String {
        self.content.borrow().clone()
    }

    /// The number of `write` calls observed.
    pub fn writes(&self) -> usize {
        self.writes.get()
    }
}

impl Writable for Buffer {
    fn write(&self, text: &str) -> io::Result<()> {
        self.content.borrow_mut().push_str(text);
        self.writes.set(self.writes.get() + 1);
        Ok(())
    }
}

impl Readable for Buffer {
    fn read_to_string(&self) -> io::Result<String> {
        Ok(self.contents())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_accumulates_writes() {
        let buffer = Buffer::new();
        buffer.write("foo").unwrap();
        buffer.write("bar\n").unwrap();

        assert_eq!(buffer.contents(), "foobar\n");
        assert_eq!(buffer.writes(), 2);
    }

    #[test]
    fn test_buffer_reads_initial_content() {
        let buffer = Buffer::with_content("line\n");
        assert_eq!(buffer.read_to_string().unwrap(), "line\n");
        assert_eq!(buffer.writes(), 0);
    }
}
