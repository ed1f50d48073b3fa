//! crates/logtree-sink/src/channel.rs
//! Routes that hand records to a crossbeam channel.
//!
//! Both routes block while the channel is full, applying backpressure to the
//! logging thread, and report a dropped receiver as
//! [`RouteError::Disconnected`].

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, bounded};
use logtree::{Level, Logger, Record, Route, RouteError};

use crate::format::format_record_with_mode;
use crate::line_mode::LineMode;

/// Route sending each record as a formatted line.
#[derive(Clone, Debug)]
pub struct FormattedRoute {
    sender: Sender<String>,
    line_mode: LineMode,
}

impl FormattedRoute {
    /// Creates a route sending newline-terminated lines to `sender`.
    #[must_use]
    pub fn new(sender: Sender<String>) -> Self {
        Self::with_line_mode(sender, LineMode::WithNewline)
    }

    /// Creates a route with an explicit [`LineMode`].
    #[must_use]
    pub fn with_line_mode(sender: Sender<String>, line_mode: LineMode) -> Self {
        Self { sender, line_mode }
    }

    /// The route's newline policy.
    #[must_use]
    pub const fn line_mode(&self) -> LineMode {
        self.line_mode
    }
}

impl Route for FormattedRoute {
    fn deliver(&self, record: Record) -> Result<(), RouteError> {
        let line = format_record_with_mode(&record, self.line_mode);
        self.sender
            .send(line)
            .map_err(|_| RouteError::Disconnected)
    }
}

/// Route sending each record unformatted.
#[derive(Clone, Debug)]
pub struct RawRoute {
    sender: Sender<Record>,
}

impl RawRoute {
    /// Creates a route sending records to `sender`.
    #[must_use]
    pub const fn new(sender: Sender<Record>) -> Self {
        Self { sender }
    }
}

impl Route for RawRoute {
    fn deliver(&self, record: Record) -> Result<(), RouteError> {
        self.sender
            .send(record)
            .map_err(|_| RouteError::Disconnected)
    }
}

/// Creates a formatted route over a fresh bounded channel.
#[must_use]
pub fn channel_route(capacity: usize) -> (FormattedRoute, Receiver<String>) {
    let (sender, receiver) = bounded(capacity);
    (FormattedRoute::new(sender), receiver)
}

/// Creates a raw route over a fresh bounded channel.
#[must_use]
pub fn raw_channel_route(capacity: usize) -> (RawRoute, Receiver<Record>) {
    let (sender, receiver) = bounded(capacity);
    (RawRoute::new(sender), receiver)
}

/// Sends formatted records at `levels` logged through `logger` to `sender`.
///
/// With no levels the channel becomes the logger's default route.
pub fn log_to(logger: &Logger, sender: Sender<String>, levels: &[Level]) {
    logger.set_routes(levels, Arc::new(FormattedRoute::new(sender)));
}

/// Sends raw records at `levels` logged through `logger` to `sender`.
///
/// With no levels the channel becomes the logger's default route.
pub fn slog_to(logger: &Logger, sender: Sender<Record>, levels: &[Level]) {
    logger.set_routes(levels, Arc::new(RawRoute::new(sender)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_route_sends_lines() {
        let (route, receiver) = channel_route(4);
        route.deliver(Record::new().with("k", "v")).unwrap();
        assert_eq!(receiver.try_recv().unwrap(), "k=\"v\"\n");
    }

    #[test]
    fn line_mode_is_honoured() {
        let (sender, receiver) = bounded(1);
        let route = FormattedRoute::with_line_mode(sender, LineMode::WithoutNewline);
        route.deliver(Record::new().with("k", 1)).unwrap();
        assert_eq!(receiver.recv().unwrap(), "k=\"1\"");
        assert_eq!(route.line_mode(), LineMode::WithoutNewline);
    }

    #[test]
    fn raw_route_sends_records() {
        let (route, receiver) = raw_channel_route(1);
        let record = Record::new().with("k", true);
        route.deliver(record.clone()).unwrap();
        assert_eq!(receiver.recv().unwrap(), record);
    }

    #[test]
    fn dropped_receiver_is_reported() {
        let (route, receiver) = channel_route(1);
        drop(receiver);
        assert!(matches!(
            route.deliver(Record::new()),
            Err(RouteError::Disconnected)
        ));

        let (raw, receiver) = raw_channel_route(1);
        drop(receiver);
        assert!(matches!(raw.deliver(Record::new()), Err(RouteError::Disconnected)));
    }
}
