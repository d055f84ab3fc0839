//! Shared test utilities and mock infrastructure.

#![allow(dead_code, unused_imports)]

pub mod mock_agent;

use parking_lot::Mutex;
use remexec::output::OutputSink;
use std::io::{self, Write};
use std::net::TcpListener;
use std::sync::Arc;

pub type SpyBuffer = Arc<Mutex<Vec<u8>>>;

/// Writer that records everything written to it.
#[derive(Clone, Default)]
pub struct SpyWriter {
    buffer: SpyBuffer,
}

impl SpyWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock()).into_owned()
    }
}

impl Write for SpyWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Output sink over two spies; returns (sink, stdout, stderr).
pub fn spy_sink(timestamps: bool) -> (OutputSink, SpyWriter, SpyWriter) {
    let out = SpyWriter::new();
    let err = SpyWriter::new();
    let sink = OutputSink::new(Box::new(out.clone()), Box::new(err.clone()), timestamps);
    (sink, out, err)
}

/// A local port with nothing listening on it.
pub fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind to free port");
    listener.local_addr().unwrap().port()
}
