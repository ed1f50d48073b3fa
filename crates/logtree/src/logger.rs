//! crates/logtree/src/logger.rs
//! Logger nodes: binding, configuration, and the logging entry points.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::callsite::{CallSite, Classifier, NameResolver, StaticNames};
use crate::clock::{Clock, SystemClock};
use crate::config::LoggerConfig;
use crate::level::{DEFAULT_LEVEL, Level};
use crate::level_cache::LevelSnapshot;
use crate::record::{LEVEL_KEY, Record, TIME_KEY};
use crate::resolve::{Basis, CacheSnapshot, publish, resolve};
use crate::route::Route;
use crate::selector::{Rule, Selector, upsert};
use crate::target_cache::TargetSnapshot;

/// Process-unique identifier of a logger node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Configuration set directly on one node, not inherited values.
#[derive(Default)]
pub(crate) struct LocalConfig {
    pub(crate) rules: Vec<Rule>,
    pub(crate) routes: FxHashMap<Level, Arc<dyn Route>>,
    pub(crate) default_route: Option<Arc<dyn Route>>,
}

/// Where a node sits in its tree.
enum Lineage {
    /// The root, with the route it was built with. A default route set later
    /// on the root overrides it.
    Root { default_route: Arc<dyn Route> },
    /// A bound child, which keeps its parent alive.
    Child(Logger),
}

/// Collaborators shared by every node of one tree.
struct TreeShared {
    classifier: Classifier,
    clock: Arc<dyn Clock>,
    default_level: Level,
}

pub(crate) struct LoggerInner {
    id: NodeId,
    lineage: Lineage,
    context: Record,
    local: Mutex<LocalConfig>,
    levels: ArcSwap<LevelSnapshot>,
    targets: ArcSwap<TargetSnapshot>,
    shared: Arc<TreeShared>,
}

impl LoggerInner {
    pub(crate) fn id(&self) -> NodeId {
        self.id
    }

    /// Resolves what this node's snapshot of kind `S` is built on.
    pub(crate) fn basis<S: CacheSnapshot>(&self) -> Basis<'_, S> {
        match &self.lineage {
            Lineage::Root { default_route } => Basis::Root { default_route },
            Lineage::Child(parent) => Basis::Inherit(resolve::<S>(&parent.inner)),
        }
    }

    pub(crate) fn level_slot(&self) -> &ArcSwap<LevelSnapshot> {
        &self.levels
    }

    pub(crate) fn target_slot(&self) -> &ArcSwap<TargetSnapshot> {
        &self.targets
    }

    /// Takes the node's regeneration lock.
    ///
    /// The configuration is fully re-read on every publish, so a poisoned lock
    /// carries no torn state worth refusing.
    pub(crate) fn lock_local(&self) -> MutexGuard<'_, LocalConfig> {
        self.local.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Applies `change` to the local configuration and republishes this node's
    /// snapshot of kind `S` against the parent's current one.
    fn reconfigure<S, F>(&self, change: F)
    where
        S: CacheSnapshot,
        F: FnOnce(&mut LocalConfig),
    {
        let basis = self.basis::<S>();
        let mut local = self.lock_local();
        change(&mut local);
        publish::<S>(self, &local, &basis);
    }
}

/// A node in a tree of hierarchical structured loggers.
///
/// `Logger` is a cheap handle; clones refer to the same node. Children are
/// created with [`bind`](Self::bind) and keep their parent alive. Each node
/// resolves its effective rules and routes from its own settings layered over
/// its ancestors'; changes made to an ancestor reach descendants on their next
/// log call without any locking on the read path.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use logtree::{FixedClock, Level, Logger, MemoryRoute, callsite, record};
///
/// let sink = Arc::new(MemoryRoute::new());
/// let root = Logger::root(FixedClock::new("now"), sink.clone());
/// let child = root.bind(record! { "req_id" => "abc" });
///
/// assert!(child.info(callsite!(), &record! { "msg" => "hello" }));
/// assert!(!child.debug(callsite!(), &record! { "msg" => "hidden" }));
///
/// root.set_level("", Level::DEBUG);
/// assert!(child.debug(callsite!(), &record! { "msg" => "visible" }));
/// assert_eq!(sink.len(), 2);
/// ```
#[derive(Clone)]
pub struct Logger {
    inner: Arc<LoggerInner>,
}

impl Logger {
    /// Creates a root logger stamping records with `clock` and sending them
    /// to `default_route` unless configured otherwise.
    pub fn root<C, R>(clock: C, default_route: Arc<R>) -> Self
    where
        C: Clock + 'static,
        R: Route + 'static,
    {
        Self::builder(default_route).clock(clock).build()
    }

    /// Starts building a root logger; a default route is mandatory.
    pub fn builder<R>(default_route: Arc<R>) -> LoggerBuilder
    where
        R: Route + 'static,
    {
        LoggerBuilder::new(default_route)
    }

    /// Returns this node's identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.inner.id
    }

    /// Returns the parent node, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<&Self> {
        match &self.inner.lineage {
            Lineage::Root { .. } => None,
            Lineage::Child(parent) => Some(parent),
        }
    }

    /// Returns the context bound at this node, including inherited fields.
    #[must_use]
    pub fn context(&self) -> &Record {
        &self.inner.context
    }

    /// Threshold for call sites no selector matches.
    #[must_use]
    pub fn default_level(&self) -> Level {
        self.inner.shared.default_level
    }

    /// Creates a child that additionally binds `fields`.
    ///
    /// Fields bound by the child override the parent's fields of the same
    /// name. The child starts out sharing its parent's configuration.
    pub fn bind(&self, fields: Record) -> Self {
        let parent = &self.inner;
        let inner = LoggerInner {
            id: NodeId::next(),
            lineage: Lineage::Child(self.clone()),
            context: parent.context.layered(&fields),
            local: Mutex::new(LocalConfig::default()),
            levels: ArcSwap::new(parent.levels.load_full()),
            targets: ArcSwap::new(parent.targets.load_full()),
            shared: Arc::clone(&parent.shared),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Sets the threshold for call sites matched by `selector` at this node
    /// and, unless they override it, its descendants.
    pub fn set_level(&self, selector: impl Into<Selector>, level: Level) {
        let rule = Rule::new(selector, level);
        tracing::debug!(
            target: "logtree::config",
            node = self.inner.id.raw(),
            selector = %rule.selector,
            %level,
            "set level"
        );
        self.inner
            .reconfigure::<LevelSnapshot, _>(|local| upsert(&mut local.rules, rule));
    }

    /// Sends records at `level` logged through this node to `route`.
    pub fn set_route(&self, level: Level, route: Arc<dyn Route>) {
        tracing::debug!(target: "logtree::config", node = self.inner.id.raw(), %level, "set route");
        self.inner.reconfigure::<TargetSnapshot, _>(|local| {
            local.routes.insert(level, route);
        });
    }

    /// Sets the route for levels without a specific one.
    pub fn set_default_route(&self, route: Arc<dyn Route>) {
        tracing::debug!(target: "logtree::config", node = self.inner.id.raw(), "set default route");
        self.inner.reconfigure::<TargetSnapshot, _>(|local| {
            local.default_route = Some(route);
        });
    }

    /// Routes every level in `levels` to `route`; an empty slice sets the
    /// default route instead.
    pub fn set_routes(&self, levels: &[Level], route: Arc<dyn Route>) {
        if levels.is_empty() {
            self.set_default_route(route);
            return;
        }
        tracing::debug!(target: "logtree::config", node = self.inner.id.raw(), ?levels, "set routes");
        self.inner.reconfigure::<TargetSnapshot, _>(|local| {
            for level in levels {
                local.routes.insert(*level, Arc::clone(&route));
            }
        });
    }

    /// Applies every rule of `config` to this node, in order.
    ///
    /// The default level of a tree is fixed at construction; see
    /// [`LoggerBuilder::config`].
    pub fn apply(&self, config: &LoggerConfig) {
        for rule in &config.rules {
            self.set_level(rule.selector.clone(), rule.level);
        }
    }

    /// Rules set directly on this node, in insertion order.
    #[must_use]
    pub fn local_rules(&self) -> Vec<Rule> {
        self.inner.lock_local().rules.clone()
    }

    /// Resolves this node's current level snapshot.
    #[must_use]
    pub fn level_snapshot(&self) -> Arc<LevelSnapshot> {
        resolve::<LevelSnapshot>(&self.inner)
    }

    /// Resolves this node's current target snapshot.
    #[must_use]
    pub fn target_snapshot(&self) -> Arc<TargetSnapshot> {
        resolve::<TargetSnapshot>(&self.inner)
    }

    /// Reports whether a record at `level` from `site` would be logged.
    #[must_use]
    pub fn should_log(&self, level: Level, site: CallSite) -> bool {
        let shared = &self.inner.shared;
        self.level_snapshot()
            .should_log(level, site, &shared.classifier, shared.default_level)
    }

    /// Builds the record delivered for a call: level and time first, then the
    /// bound context, then the call's own fields.
    #[must_use]
    pub fn merged_record(&self, level: Level, fields: &Record) -> Record {
        let mut record = Record::new();
        record.insert(LEVEL_KEY, level);
        record.insert(TIME_KEY, self.inner.shared.clock.now());
        record.extend_from(&self.inner.context);
        record.extend_from(fields);
        record.resolve_lazy();
        record
    }

    /// Logs `fields` at `level` from `site`.
    ///
    /// Returns whether the record passed the level filter. Delivery problems are
    /// never reported to the caller.
    pub fn log(&self, level: Level, site: CallSite, fields: &Record) -> bool {
        if !self.should_log(level, site) {
            return false;
        }
        self.emit(level, fields);
        true
    }

    /// Builds and dispatches the record for a call that already passed
    /// [`should_log`](Self::should_log).
    pub(crate) fn emit(&self, level: Level, fields: &Record) {
        let record = self.merged_record(level, fields);
        self.target_snapshot().dispatch(level, record);
    }

    /// Logs at [`Level::DEBUG`].
    pub fn debug(&self, site: CallSite, fields: &Record) -> bool {
        self.log(Level::DEBUG, site, fields)
    }

    /// Logs at [`Level::INFO`].
    pub fn info(&self, site: CallSite, fields: &Record) -> bool {
        self.log(Level::INFO, site, fields)
    }

    /// Logs at [`Level::WARN`].
    pub fn warn(&self, site: CallSite, fields: &Record) -> bool {
        self.log(Level::WARN, site, fields)
    }

    /// Logs at [`Level::ERROR`].
    pub fn error(&self, site: CallSite, fields: &Record) -> bool {
        self.log(Level::ERROR, site, fields)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("id", &self.inner.id)
            .field("parent", &self.parent().map(Self::id))
            .field("context", &self.inner.context)
            .finish_non_exhaustive()
    }
}

/// Builder for a root [`Logger`].
pub struct LoggerBuilder {
    default_route: Arc<dyn Route>,
    clock: Arc<dyn Clock>,
    resolver: Arc<dyn NameResolver>,
    default_level: Level,
    context: Record,
    rules: Vec<Rule>,
}

impl LoggerBuilder {
    fn new<R: Route + 'static>(default_route: Arc<R>) -> Self {
        Self {
            default_route,
            clock: Arc::new(SystemClock),
            resolver: Arc::new(StaticNames),
            default_level: DEFAULT_LEVEL,
            context: Record::new(),
            rules: Vec::new(),
        }
    }

    /// Sets the clock stamping `$time` (defaults to [`SystemClock`]).
    pub fn clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Sets the call-site name resolver (defaults to [`StaticNames`]).
    pub fn resolver(mut self, resolver: Arc<dyn NameResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Sets the threshold for call sites no selector matches.
    pub fn default_level(mut self, level: Level) -> Self {
        self.default_level = level;
        self
    }

    /// Binds `fields` at the root.
    pub fn context(mut self, fields: Record) -> Self {
        self.context.extend_from(&fields);
        self
    }

    /// Adds a root rule.
    pub fn rule(mut self, selector: impl Into<Selector>, level: Level) -> Self {
        upsert(&mut self.rules, Rule::new(selector, level));
        self
    }

    /// Takes the default level and rules from `config`.
    pub fn config(mut self, config: &LoggerConfig) -> Self {
        self.default_level = config.default_level;
        for rule in &config.rules {
            upsert(&mut self.rules, rule.clone());
        }
        self
    }

    /// Builds the root logger.
    pub fn build(self) -> Logger {
        let id = NodeId::next();
        let local = LocalConfig {
            rules: self.rules,
            ..LocalConfig::default()
        };
        let levels = LevelSnapshot::generate(id, &local, &Basis::Root {
            default_route: &self.default_route,
        });
        let targets = TargetSnapshot::generate(id, &local, &Basis::Root {
            default_route: &self.default_route,
        });
        let inner = LoggerInner {
            id,
            lineage: Lineage::Root {
                default_route: self.default_route,
            },
            context: self.context,
            local: Mutex::new(local),
            levels: ArcSwap::new(levels),
            targets: ArcSwap::new(targets),
            shared: Arc::new(TreeShared {
                classifier: Classifier::new(self.resolver),
                clock: self.clock,
                default_level: self.default_level,
            }),
        };
        Logger {
            inner: Arc::new(inner),
        }
    }
}

impl fmt::Debug for LoggerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerBuilder")
            .field("default_level", &self.default_level)
            .field("context", &self.context)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}
