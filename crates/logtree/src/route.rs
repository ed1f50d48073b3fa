//! crates/logtree/src/route.rs
//! Output routes that accept fully merged records.

use std::fmt;
use std::io;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;

use crate::record::Record;

/// Failure reported by a [`Route`] while delivering a record.
///
/// Route errors never reach the caller of a logging method; dispatch reports
/// them through `tracing` on the `logtree::dispatch` target and drops the
/// record.
#[derive(Debug, Error)]
pub enum RouteError {
    /// The consuming side of the route has gone away.
    #[error("route receiver disconnected")]
    Disconnected,
    /// Writing to the underlying sink failed.
    #[error("route write failed: {0}")]
    Io(#[from] io::Error),
    /// The route refused the record.
    #[error("route rejected record: {0}")]
    Rejected(String),
}

/// A sink for merged log records.
///
/// Delivery may block, for example when a bounded queue is full; that is how
/// routes apply backpressure to loggers. Routes are invoked with no logger
/// lock held.
pub trait Route: Send + Sync {
    /// Delivers one record.
    fn deliver(&self, record: Record) -> Result<(), RouteError>;
}

impl<F> Route for F
where
    F: Fn(Record) -> Result<(), RouteError> + Send + Sync,
{
    fn deliver(&self, record: Record) -> Result<(), RouteError> {
        self(record)
    }
}

/// Route that drops every record.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiscardRoute;

impl Route for DiscardRoute {
    fn deliver(&self, _record: Record) -> Result<(), RouteError> {
        Ok(())
    }
}

/// Route that keeps every record in memory, in delivery order.
#[derive(Default)]
pub struct MemoryRoute {
    records: Mutex<Vec<Record>>,
}

impl MemoryRoute {
    /// Creates an empty route.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes and returns every record delivered so far.
    pub fn drain(&self) -> Vec<Record> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        std::mem::take(&mut *records)
    }

    /// Number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Reports whether no records are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Route for MemoryRoute {
    fn deliver(&self, record: Record) -> Result<(), RouteError> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
        Ok(())
    }
}

impl fmt::Debug for MemoryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRoute").field("len", &self.len()).finish()
    }
}
