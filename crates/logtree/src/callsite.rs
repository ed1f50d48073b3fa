//! crates/logtree/src/callsite.rs
//! Call-site identities, name resolution, and classification.
//!
//! A [`CallSite`] identifies the place in code that issued a log call. Its
//! [`CallSiteId`] is the memoization key used by the level cache; the
//! qualified name the selector rules are matched against is looked up through a
//! [`NameResolver`] only when a snapshot has not classified the site yet.
//!
//! Qualified names use package-path form: the module path with `::` replaced
//! by `/`, then `.`, then the function when it is known. A call inside
//! `fn connect` of module `app::net::tcp` is named `app/net/tcp.connect`; a
//! call whose function is unknown is named `app/net/tcp.`, so a package-only
//! selector such as `app/net/tcp.` still covers it.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::level::Level;
use crate::selector::RuleTable;

/// Opaque, process-stable key of a call site.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallSiteId(usize);

impl CallSiteId {
    /// Wraps a raw key supplied by a front end.
    #[must_use]
    pub const fn from_raw(raw: usize) -> Self {
        Self(raw)
    }

    /// Returns the raw key.
    #[must_use]
    pub const fn raw(self) -> usize {
        self.0
    }
}

/// Static description of a call expression, created once per call site by
/// [`callsite!`](crate::callsite!).
#[derive(Debug)]
pub struct SiteInfo {
    module_path: &'static str,
    function: Option<&'static str>,
}

impl SiteInfo {
    /// Describes a call site inside `module_path`, optionally naming the
    /// enclosing function.
    #[must_use]
    pub const fn new(module_path: &'static str, function: Option<&'static str>) -> Self {
        Self {
            module_path,
            function,
        }
    }

    /// Returns the Rust module path of the call site.
    #[must_use]
    pub const fn module_path(&self) -> &'static str {
        self.module_path
    }

    /// Returns the qualified name in package-path form.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        qualified_name(self.module_path, self.function)
    }
}

/// Converts a Rust module path and optional function into package-path form.
///
/// The package part always ends in `.`; an unknown function leaves the name
/// after it empty.
#[must_use]
pub fn qualified_name(module_path: &str, function: Option<&str>) -> String {
    let mut name = module_path.replace("::", "/");
    name.push('.');
    if let Some(function) = function {
        name.push_str(function);
    }
    name
}

/// Where a call site's name comes from.
#[derive(Copy, Clone, Debug)]
enum Origin {
    Static(&'static SiteInfo),
    Module(&'static str),
    Opaque,
}

/// Handle for a call site: its identity plus whatever static description the
/// front end has for it.
#[derive(Copy, Clone, Debug)]
pub struct CallSite {
    id: CallSiteId,
    origin: Origin,
}

impl CallSite {
    /// Builds a handle whose identity is the address of `info`.
    #[must_use]
    pub fn from_static(info: &'static SiteInfo) -> Self {
        Self {
            id: CallSiteId(std::ptr::from_ref(info) as usize),
            origin: Origin::Static(info),
        }
    }

    /// Builds a handle for a site known only by the module it lives in, such
    /// as a `tracing` callsite.
    #[must_use]
    pub const fn from_module_path(id: CallSiteId, module_path: &'static str) -> Self {
        Self {
            id,
            origin: Origin::Module(module_path),
        }
    }

    /// Builds a handle from an identity alone; its name must come from the
    /// tree's resolver.
    #[must_use]
    pub const fn from_id(id: CallSiteId) -> Self {
        Self {
            id,
            origin: Origin::Opaque,
        }
    }

    /// Returns the memoization key.
    #[must_use]
    pub const fn id(self) -> CallSiteId {
        self.id
    }

    /// Returns the static description, if any.
    #[must_use]
    pub const fn info(self) -> Option<&'static SiteInfo> {
        match self.origin {
            Origin::Static(info) => Some(info),
            Origin::Module(_) | Origin::Opaque => None,
        }
    }

    /// Returns the Rust module path of the site, when known.
    #[must_use]
    pub const fn module_path(self) -> Option<&'static str> {
        match self.origin {
            Origin::Static(info) => Some(info.module_path),
            Origin::Module(path) => Some(path),
            Origin::Opaque => None,
        }
    }

    /// Returns the qualified name derivable from the site itself.
    #[must_use]
    pub fn static_name(self) -> Option<String> {
        match self.origin {
            Origin::Static(info) => Some(info.qualified_name()),
            Origin::Module(path) => Some(qualified_name(path, None)),
            Origin::Opaque => None,
        }
    }
}

impl PartialEq for CallSite {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for CallSite {}

/// Resolves a call site to its qualified name.
///
/// Resolution may be expensive; the level cache calls it at most once per call
/// site for each published snapshot. Returning `None` makes the call site fail
/// open: it is allowed at every severity.
pub trait NameResolver: Send + Sync {
    /// Returns the qualified name of `site`.
    fn resolve(&self, site: CallSite) -> Option<Cow<'static, str>>;
}

impl<F> NameResolver for F
where
    F: Fn(CallSite) -> Option<Cow<'static, str>> + Send + Sync,
{
    fn resolve(&self, site: CallSite) -> Option<Cow<'static, str>> {
        self(site)
    }
}

/// Resolver that derives the name from the call site itself.
#[derive(Clone, Copy, Debug, Default)]
pub struct StaticNames;

impl NameResolver for StaticNames {
    fn resolve(&self, site: CallSite) -> Option<Cow<'static, str>> {
        site.static_name().map(Cow::Owned)
    }
}

/// Resolver backed by a table of registered names, for front ends that key
/// call sites by something other than a static description.
///
/// Sites that were never registered fall back to their static description.
#[derive(Debug, Default)]
pub struct NameTable {
    names: DashMap<CallSiteId, Arc<str>>,
}

impl NameTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the qualified name of `id`, replacing any previous entry.
    ///
    /// A replaced name only affects snapshots that have not classified the site
    /// yet.
    pub fn register(&self, id: CallSiteId, name: impl Into<Arc<str>>) {
        self.names.insert(id, name.into());
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Reports whether no names are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl NameResolver for NameTable {
    fn resolve(&self, site: CallSite) -> Option<Cow<'static, str>> {
        match self.names.get(&site.id()) {
            Some(name) => Some(Cow::Owned(name.value().to_string())),
            None => StaticNames.resolve(site),
        }
    }
}

/// Applies a rule table to call sites.
#[derive(Clone)]
pub struct Classifier {
    resolver: Arc<dyn NameResolver>,
}

impl Classifier {
    /// Creates a classifier over `resolver`.
    pub fn new(resolver: Arc<dyn NameResolver>) -> Self {
        Self { resolver }
    }

    /// Decides the threshold of `site` under `rules`.
    ///
    /// Returns `None` when the name cannot be resolved; callers treat that as
    /// "allowed at every severity". A resolved name that no rule matches gets
    /// `default`.
    #[must_use]
    pub fn classify(&self, site: CallSite, rules: &RuleTable, default: Level) -> Option<Level> {
        let name = self.resolver.resolve(site)?;
        Some(rules.level_for(&name).unwrap_or(default))
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(Arc::new(StaticNames))
    }
}

impl fmt::Debug for Classifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Classifier").finish_non_exhaustive()
    }
}
