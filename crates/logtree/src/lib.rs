#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! `logtree` is the core of a hierarchical structured logger. Loggers form a
//! tree: every [`Logger`] except the root is created by [`Logger::bind`] on a
//! parent and carries extra context fields. Each node may override two things
//! for itself and its descendants:
//!
//! - selector rules, which pick a severity threshold per call site from the
//!   site's qualified name (see [`Selector`]), and
//! - routes, which decide where records of a given severity are delivered
//!   (see [`Route`]).
//!
//! # Design
//!
//! Effective settings are cached per node in two immutable snapshots, a
//! [`LevelSnapshot`] and a [`TargetSnapshot`], published through lock-free
//! slots. A log call resolves both without taking a lock unless an ancestor has
//! changed since the node last looked; only then does the node take its own
//! lock and rebuild from the parent's snapshot. Nodes without overrides share
//! their parent's snapshot outright.
//!
//! Call sites are captured with [`callsite!`] and classified lazily: the level
//! snapshot asks the tree's [`NameResolver`] for a site's qualified name the
//! first time the site logs and memoizes the resulting threshold until the
//! snapshot is replaced.
//!
//! # Invariants
//!
//! - A configuration change made through any `set_*` method is visible to every
//!   log call on that node or a descendant that starts after the method
//!   returns.
//! - The most specific (longest) matching selector decides a call site's
//!   threshold; ties keep the rule set earliest, ancestors before descendants.
//! - A call site whose name cannot be resolved is allowed at every severity.
//! - Fields bound closer to the call (and the call's own fields) win over
//!   fields bound further up. `$level` and `$time` are stamped first, so a
//!   bound or call field with the same key replaces them.
//!
//! # Errors
//!
//! Logging never fails from the caller's point of view. Routes report delivery
//! failures as [`RouteError`], which the logger records on the
//! `logtree::dispatch` tracing target. Parsing level names and directives
//! reports [`LevelParseError`] and [`DirectiveError`].
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use logtree::{FixedClock, Level, Logger, MemoryRoute, Value, record};
//!
//! let everything = Arc::new(MemoryRoute::new());
//! let errors = Arc::new(MemoryRoute::new());
//! let root = Logger::root(FixedClock::new("now"), everything.clone());
//! root.set_route(Level::ERROR, errors.clone());
//!
//! let request = root.bind(record! { "req_id" => "abc" });
//! logtree::info!(request, "msg" => "accepted");
//! logtree::error!(request, "msg" => "backend unavailable");
//!
//! assert_eq!(everything.len(), 1);
//! let failed = errors.drain();
//! assert_eq!(failed[0].get("req_id"), Some(&Value::from("abc")));
//! ```
//!
//! # See also
//!
//! - `logtree-sink` for text formatting and channel-backed routes.
//! - [`LoggerConfig`] and [`parse_directives`] for declarative rule sets.

mod callsite;
mod clock;
mod config;
mod level;
mod level_cache;
mod logger;
mod macros;
mod record;
mod resolve;
mod route;
mod selector;
mod target_cache;
#[cfg(feature = "tracing")]
mod tracing_bridge;

pub use callsite::{
    CallSite, CallSiteId, Classifier, NameResolver, NameTable, SiteInfo, StaticNames,
    qualified_name,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{DirectiveError, LoggerConfig, parse_directives};
pub use level::{DEFAULT_LEVEL, Level, LevelParseError};
pub use level_cache::LevelSnapshot;
pub use logger::{Logger, LoggerBuilder, NodeId};
pub use record::{LEVEL_KEY, LazyValue, Record, TIME_KEY, Value};
pub use route::{DiscardRoute, MemoryRoute, Route, RouteError};
pub use selector::{Rule, RuleTable, Selector};
pub use target_cache::TargetSnapshot;
#[cfg(feature = "tracing")]
pub use tracing_bridge::{
    LogtreeLayer, TRACE_LEVEL, init_tracing, init_tracing_with_filter,
};
