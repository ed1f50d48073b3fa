//! crates/logtree-sink/src/stdout.rs
//! Standard-output route backed by a buffered channel and a writer thread.

use std::io;
use std::sync::Arc;

use logtree::{Clock, Logger};

use crate::channel::{FormattedRoute, channel_route};
use crate::writer::{BackgroundWriter, SinkError};

/// Lines queued for standard output before loggers block.
pub const STDOUT_BUFFER: usize = 100;

/// Name of the thread writing to standard output.
pub const STDOUT_THREAD_NAME: &str = "logtree-stdout";

/// Creates a formatted route whose lines are written to standard output by a
/// background thread.
///
/// The thread exits once every clone of the route has been dropped; join the
/// returned [`BackgroundWriter`] to wait for queued lines to be written.
pub fn stdout_route() -> Result<(FormattedRoute, BackgroundWriter<io::Stdout>), SinkError> {
    let (route, lines) = channel_route(STDOUT_BUFFER);
    let writer = BackgroundWriter::spawn(STDOUT_THREAD_NAME, lines, io::stdout())?;
    Ok((route, writer))
}

/// Creates a root logger whose default route is standard output.
pub fn stdout_root<C>(clock: C) -> Result<(Logger, BackgroundWriter<io::Stdout>), SinkError>
where
    C: Clock + 'static,
{
    let (route, writer) = stdout_route()?;
    Ok((Logger::root(clock, Arc::new(route)), writer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtree::{FixedClock, record};

    #[test]
    fn stdout_root_flushes_on_shutdown() {
        let (root, writer) = stdout_root(FixedClock::new("now")).unwrap();
        assert!(root.info(logtree::callsite!(), &record! { "test" => "stdout" }));
        drop(root);

        let writer = writer.join().unwrap();
        assert_eq!(writer.lines_written(), 1);
    }
}
