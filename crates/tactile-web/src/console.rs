#![forbid(unsafe_code)]

//! `tracing` output routed to the browser console.
//!
//! The fmt layer formats one event per writer; the writer buffers it and
//! hands the finished line to a sink on drop, choosing the console method
//! from the event level so DevTools filtering works.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;

/// Receives `(console_method, line)`.
pub type ConsoleSink = fn(&'static str, &str);

/// Console method for a level.
#[must_use]
pub fn console_method(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO => "info",
        Level::DEBUG | Level::TRACE => "debug",
    }
}

/// One buffered event.
pub struct ConsoleWriter {
    method: &'static str,
    buf: Vec<u8>,
    sink: ConsoleSink,
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = String::from_utf8_lossy(&self.buf);
        let line = line.trim_end();
        if !line.is_empty() {
            (self.sink)(self.method, line);
        }
    }
}

/// [`MakeWriter`] producing one [`ConsoleWriter`] per event.
#[derive(Clone, Copy)]
pub struct MakeConsoleWriter {
    sink: ConsoleSink,
}

impl MakeConsoleWriter {
    #[must_use]
    pub const fn new(sink: ConsoleSink) -> Self {
        Self { sink }
    }

    fn writer(&self, method: &'static str) -> ConsoleWriter {
        ConsoleWriter {
            method,
            buf: Vec::with_capacity(128),
            sink: self.sink,
        }
    }
}

impl<'a> MakeWriter<'a> for MakeConsoleWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.writer("log")
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        self.writer(console_method(meta.level()))
    }
}
