//! crates/logtree-sink/src/writer.rs
//! Line writers and the background thread draining a line channel.

use std::io::{self, Write};
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use thiserror::Error;

/// Errors raised while starting or stopping a [`BackgroundWriter`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// The writer thread could not be spawned.
    #[error("failed to spawn log writer thread: {0}")]
    Spawn(#[source] io::Error),
    /// The writer thread panicked.
    #[error("log writer thread panicked")]
    WriterPanicked,
}

/// Writes whole lines to an [`io::Write`] target.
///
/// A write that makes no progress is reported as [`io::ErrorKind::WriteZero`]
/// rather than retried forever.
#[derive(Debug)]
pub struct LineWriter<W> {
    writer: W,
    lines: u64,
}

impl<W: Write> LineWriter<W> {
    /// Wraps `writer`.
    pub const fn new(writer: W) -> Self {
        Self { writer, lines: 0 }
    }

    /// Writes `line` in full and flushes.
    pub fn write_line(&mut self, line: &str) -> io::Result<()> {
        let mut remaining = line.as_bytes();
        while !remaining.is_empty() {
            match self.writer.write(remaining) {
                Ok(0) => {
                    return Err(io::Error::new(
                        io::ErrorKind::WriteZero,
                        format!("short write of {line:?}"),
                    ));
                }
                Ok(written) => remaining = &remaining[written..],
                Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
                Err(error) => return Err(error),
            }
        }
        self.writer.flush()?;
        self.lines += 1;
        Ok(())
    }

    /// Number of lines written successfully.
    #[must_use]
    pub const fn lines_written(&self) -> u64 {
        self.lines
    }

    /// Returns the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Thread that drains a line channel into a writer until every sender is gone.
///
/// Failed writes are reported on the `logtree_sink::writer` tracing target and
/// the line is dropped; the thread keeps draining.
#[derive(Debug)]
pub struct BackgroundWriter<W> {
    handle: JoinHandle<LineWriter<W>>,
}

impl<W> BackgroundWriter<W>
where
    W: Write + Send + 'static,
{
    /// Spawns a thread named `name` writing every line received on `lines`.
    pub fn spawn(name: &str, lines: Receiver<String>, writer: W) -> Result<Self, SinkError> {
        let handle = thread::Builder::new()
            .name(name.to_owned())
            .spawn(move || drain(&lines, LineWriter::new(writer)))
            .map_err(SinkError::Spawn)?;
        Ok(Self { handle })
    }

    /// Waits for the channel to disconnect and every queued line to be
    /// written, then returns the writer.
    pub fn join(self) -> Result<LineWriter<W>, SinkError> {
        self.handle.join().map_err(|_| SinkError::WriterPanicked)
    }

    /// Reports whether the thread has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

fn drain<W: Write>(lines: &Receiver<String>, mut writer: LineWriter<W>) -> LineWriter<W> {
    for line in lines {
        if let Err(error) = writer.write_line(&line) {
            tracing::warn!(
                target: "logtree_sink::writer",
                %error,
                kind = ?error.kind(),
                "failed to write log line"
            );
        }
    }
    writer
}
