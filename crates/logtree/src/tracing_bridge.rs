//! crates/logtree/src/tracing_bridge.rs
//! Bridge from `tracing` events into a logger tree.
//!
//! [`LogtreeLayer`] is a tracing-subscriber layer that forwards every event to
//! a [`Logger`]. The event's callsite becomes the logtree call site, named after
//! its module path, so the tree's selector rules decide which events pass.
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use logtree::{Logger, MemoryRoute, SystemClock, init_tracing};
//!
//! let root = Logger::root(SystemClock, Arc::new(MemoryRoute::new()));
//! init_tracing(root.clone())?;
//! tracing::info!(user = "ann", "logged in");
//! ```
//!
//! The crate's own diagnostic targets (`logtree::cache`, `logtree::config`,
//! `logtree::dispatch` and anything under `logtree_sink::`) are never
//! forwarded.

use std::fmt;

use tracing::Subscriber;
use tracing::field::{Field, Visit};
use tracing_subscriber::layer::{Context, Layer};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::TryInitError;

use crate::callsite::{CallSite, CallSiteId};
use crate::level::Level;
use crate::logger::Logger;
use crate::record::Record;

/// Severity given to `tracing` TRACE events, below [`Level::DEBUG`].
pub const TRACE_LEVEL: Level = Level::from_raw(0);

/// Tracing layer forwarding events to a logger.
#[derive(Clone, Debug)]
pub struct LogtreeLayer {
    logger: Logger,
}

impl LogtreeLayer {
    /// Creates a layer logging through `logger`.
    #[must_use]
    pub const fn new(logger: Logger) -> Self {
        Self { logger }
    }

    /// Maps a tracing level to a logtree level.
    #[must_use]
    pub const fn map_level(level: &tracing::Level) -> Level {
        match *level {
            tracing::Level::ERROR => Level::ERROR,
            tracing::Level::WARN => Level::WARN,
            tracing::Level::INFO => Level::INFO,
            tracing::Level::DEBUG => Level::DEBUG,
            tracing::Level::TRACE => TRACE_LEVEL,
        }
    }

    fn is_internal(target: &str) -> bool {
        matches!(
            target,
            "logtree::cache" | "logtree::config" | "logtree::dispatch"
        ) || target.starts_with("logtree_sink::")
    }
}

impl<S> Layer<S> for LogtreeLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if Self::is_internal(metadata.target()) {
            return;
        }

        let level = Self::map_level(metadata.level());
        let site = CallSite::from_module_path(
            CallSiteId::from_raw(std::ptr::from_ref(metadata) as usize),
            metadata.module_path().unwrap_or_else(|| metadata.target()),
        );
        if !self.logger.should_log(level, site) {
            return;
        }

        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);
        self.logger.emit(level, &visitor.record);
    }
}

/// Collects event fields into a record.
#[derive(Default)]
struct RecordVisitor {
    record: Record,
}

impl Visit for RecordVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.record.insert(field.name(), format!("{value:?}"));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record.insert(field.name(), value);
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record.insert(field.name(), value);
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record.insert(field.name(), value);
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record.insert(field.name(), value);
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record.insert(field.name(), value);
    }
}

/// Installs a global subscriber forwarding all events to `logger`.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(logger: Logger) -> Result<(), TryInitError> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(LogtreeLayer::new(logger))
        .try_init()
}

/// Installs a global subscriber that runs `filter` before forwarding events to
/// `logger`.
///
/// ```rust,ignore
/// use tracing_subscriber::EnvFilter;
///
/// logtree::init_tracing_with_filter(root, EnvFilter::from_default_env())?;
/// ```
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing_with_filter<F>(logger: Logger, filter: F) -> Result<(), TryInitError>
where
    F: Layer<tracing_subscriber::Registry> + Send + Sync + 'static,
{
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    tracing_subscriber::registry()
        .with(filter)
        .with(LogtreeLayer::new(logger))
        .try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, FixedClock};
    use crate::record::Value;
    use crate::route::MemoryRoute;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(logger: &Logger, body: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(LogtreeLayer::new(logger.clone()));
        tracing::subscriber::with_default(subscriber, body);
    }

    #[test]
    fn levels_map_onto_logtree_levels() {
        assert_eq!(LogtreeLayer::map_level(&tracing::Level::ERROR), Level::ERROR);
        assert_eq!(LogtreeLayer::map_level(&tracing::Level::INFO), Level::INFO);
        assert_eq!(LogtreeLayer::map_level(&tracing::Level::DEBUG), Level::DEBUG);
        assert!(LogtreeLayer::map_level(&tracing::Level::TRACE) < Level::DEBUG);
    }

    #[test]
    fn events_become_records() {
        let sink = Arc::new(MemoryRoute::new());
        let root = Logger::root(FixedClock::new("now"), sink.clone());

        capture(&root, || {
            tracing::info!(user = "ann", attempts = 3_i64, ok = true, "logged in");
        });

        let records = sink.drain();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.level(), Some(Level::INFO));
        assert_eq!(record.get("user"), Some(&Value::from("ann")));
        assert_eq!(record.get("attempts"), Some(&Value::Int(3)));
        assert_eq!(record.get("ok"), Some(&Value::Bool(true)));
        assert_eq!(record.get("message"), Some(&Value::from("logged in")));
    }

    #[test]
    fn selector_rules_filter_by_module_path() {
        let sink = Arc::new(MemoryRoute::new());
        let root = Logger::root(FixedClock::new("now"), sink.clone());

        capture(&root, || tracing::debug!("hidden"));
        assert!(sink.is_empty());

        root.set_level("logtree/tracing_bridge", Level::DEBUG);
        capture(&root, || tracing::debug!("shown"));
        assert_eq!(sink.len(), 1);

        capture(&root, || tracing::trace!("still hidden"));
        assert_eq!(sink.len(), 1);
    }

    mod nested {
        pub fn debug_event() {
            tracing::debug!("from nested");
        }
    }

    #[test]
    fn package_only_selector_covers_events_of_that_module() {
        let sink = Arc::new(MemoryRoute::new());
        let root = Logger::root(FixedClock::new("now"), sink.clone());
        root.set_level("logtree/tracing_bridge/tests.", Level::DEBUG);

        capture(&root, || {
            tracing::debug!("from tests");
            nested::debug_event();
        });

        let records = sink.drain();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("message"), Some(&Value::from("from tests")));
    }

    struct CountingClock(AtomicUsize);

    impl Clock for CountingClock {
        fn now(&self) -> Value {
            self.0.fetch_add(1, Ordering::SeqCst);
            Value::from("now")
        }
    }

    #[test]
    fn each_passing_event_is_delivered_once() {
        let sink = Arc::new(MemoryRoute::new());
        let clock = Arc::new(CountingClock(AtomicUsize::new(0)));
        let root = Logger::builder(sink.clone())
            .clock(SharedClock(Arc::clone(&clock)))
            .build();

        capture(&root, || {
            tracing::info!(n = 1_i64);
            tracing::debug!(n = 2_i64);
            tracing::warn!(n = 3_i64);
        });

        assert_eq!(sink.len(), 2);
        assert_eq!(clock.0.load(Ordering::SeqCst), 2);
    }

    struct SharedClock(Arc<CountingClock>);

    impl Clock for SharedClock {
        fn now(&self) -> Value {
            self.0.now()
        }
    }

    #[test]
    fn internal_targets_are_not_forwarded() {
        let sink = Arc::new(MemoryRoute::new());
        let root = Logger::root(FixedClock::new("now"), sink.clone());

        capture(&root, || {
            tracing::warn!(target: "logtree::dispatch", "delivery failed");
            tracing::warn!(target: "logtree_sink::writer", "short write");
            tracing::warn!(target: "app", "forwarded");
        });
        assert_eq!(sink.len(), 1);
    }
}
