#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logtree-sink` provides the output side of a `logtree` logger tree: a
//! single-line text format for records, routes that hand records to bounded
//! crossbeam channels, and a background writer thread that drains a line
//! channel into any [`std::io::Write`] target, standard output included.
//!
//! # Design
//!
//! Routes never perform I/O on the logging thread. [`FormattedRoute`] renders a
//! record with [`format_record_with_mode`] and sends the line; [`RawRoute`]
//! sends the record itself. A [`BackgroundWriter`] owns the receiving end and
//! the writer. Loggers block only while the channel is full.
//!
//! # Invariants
//!
//! - A formatted record occupies exactly one line: every control character
//!   inside keys and values is escaped.
//! - Keys appear in sorted order, so equal records format identically.
//! - Lines sent from one thread are written in the order they were sent.
//!
//! # Errors
//!
//! Routes report a dropped receiver as [`logtree::RouteError::Disconnected`].
//! Write failures inside the background thread are reported through `tracing`
//! on the `logtree_sink::writer` target. Starting and joining the thread
//! surfaces [`SinkError`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use logtree::{FixedClock, Logger, callsite, record};
//! use logtree_sink::{BackgroundWriter, channel_route};
//!
//! let (route, lines) = channel_route(16);
//! let writer = BackgroundWriter::spawn("doc-writer", lines, Vec::new()).unwrap();
//!
//! let root = Logger::root(FixedClock::new("now"), Arc::new(route));
//! root.info(callsite!(), &record! { "hello" => "world" });
//! drop(root);
//!
//! let output = writer.join().unwrap().into_inner();
//! assert_eq!(output, b"$level=\"INFO\" $time=\"now\" hello=\"world\"\n");
//! ```
//!
//! # See also
//!
//! - `logtree` for the logger tree, selectors and the [`logtree::Route`] trait.

mod channel;
mod format;
mod line_mode;
mod stdout;
mod writer;

pub use channel::{FormattedRoute, RawRoute, channel_route, log_to, raw_channel_route, slog_to};
pub use format::{format_record, format_record_with_mode};
pub use line_mode::LineMode;
pub use stdout::{STDOUT_BUFFER, STDOUT_THREAD_NAME, stdout_root, stdout_route};
pub use writer::{BackgroundWriter, LineWriter, SinkError};
