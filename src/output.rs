//! Local rendering of remote output.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::agent::OutputEvent;

type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Writes output chunks to the local stdout/stderr as they arrive.
///
/// Chunks are written and flushed one by one; nothing is buffered across
/// events.
#[derive(Clone)]
pub struct OutputSink {
    stdout: SharedWriter,
    stderr: SharedWriter,
    timestamps: bool,
}

impl OutputSink {
    pub fn new(
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
        timestamps: bool,
    ) -> Self {
        Self {
            stdout: Arc::new(Mutex::new(stdout)),
            stderr: Arc::new(Mutex::new(stderr)),
            timestamps,
        }
    }

    /// Sink bound to the process's standard streams.
    pub fn stdio(timestamps: bool) -> Self {
        Self::new(Box::new(io::stdout()), Box::new(io::stderr()), timestamps)
    }

    pub fn write_event(&self, event: &OutputEvent) -> io::Result<()> {
        let prefix = if self.timestamps {
            format!("{}| ", event.timestamp)
        } else {
            String::new()
        };
        if !event.stdout.is_empty() {
            write_chunk(&self.stdout, &prefix, &event.stdout)?;
        }
        if !event.stderr.is_empty() {
            write_chunk(&self.stderr, &prefix, &event.stderr)?;
        }
        Ok(())
    }
}

fn write_chunk(writer: &SharedWriter, prefix: &str, chunk: &str) -> io::Result<()> {
    let mut w = writer.lock();
    w.write_all(prefix.as_bytes())?;
    w.write_all(chunk.as_bytes())?;
    w.flush()
}
