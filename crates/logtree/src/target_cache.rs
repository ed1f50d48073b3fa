//! crates/logtree/src/target_cache.rs
//! Merged severity-to-route table and record dispatch.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::level::Level;
use crate::logger::{LocalConfig, LoggerInner, NodeId};
use crate::record::Record;
use crate::resolve::{Basis, CacheSnapshot};
use crate::route::Route;

/// Immutable view of the routes in force at a node.
pub struct TargetSnapshot {
    routes: FxHashMap<Level, Arc<dyn Route>>,
    default_route: Arc<dyn Route>,
    parent: Option<Arc<TargetSnapshot>>,
    owner: NodeId,
}

impl TargetSnapshot {
    /// The node that built this snapshot.
    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Levels with an explicit route, in ascending order.
    #[must_use]
    pub fn routed_levels(&self) -> Vec<Level> {
        let mut levels: Vec<Level> = self.routes.keys().copied().collect();
        levels.sort_unstable();
        levels
    }

    /// Returns the route records at `level` go to.
    #[must_use]
    pub fn route_for(&self, level: Level) -> &Arc<dyn Route> {
        self.routes.get(&level).unwrap_or(&self.default_route)
    }

    /// Returns the fallback route.
    #[must_use]
    pub fn default_route(&self) -> &Arc<dyn Route> {
        &self.default_route
    }

    /// Delivers `record` to the route for `level`.
    ///
    /// A delivery failure is reported on the `logtree::dispatch` tracing target
    /// and otherwise ignored.
    pub fn dispatch(&self, level: Level, record: Record) {
        if let Err(error) = self.route_for(level).deliver(record) {
            tracing::warn!(
                target: "logtree::dispatch",
                node = self.owner.raw(),
                %level,
                %error,
                "failed to deliver log record"
            );
        }
    }
}

impl CacheSnapshot for TargetSnapshot {
    const KIND: &'static str = "target";

    fn slot(node: &LoggerInner) -> &ArcSwap<Self> {
        node.target_slot()
    }

    fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    fn generate(owner: NodeId, local: &LocalConfig, basis: &Basis<'_, Self>) -> Arc<Self> {
        let (mut routes, inherited_default, parent) = match basis {
            Basis::Inherit(parent) => {
                if local.routes.is_empty() && local.default_route.is_none() {
                    return Arc::clone(parent);
                }
                (parent.routes.clone(), &parent.default_route, Some(Arc::clone(parent)))
            }
            Basis::Root { default_route } => (FxHashMap::default(), *default_route, None),
        };
        for (level, route) in &local.routes {
            routes.insert(*level, Arc::clone(route));
        }

        Arc::new(Self {
            routes,
            default_route: Arc::clone(local.default_route.as_ref().unwrap_or(inherited_default)),
            parent,
            owner,
        })
    }
}

impl fmt::Debug for TargetSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetSnapshot")
            .field("owner", &self.owner)
            .field("routed_levels", &self.routed_levels())
            .field("has_parent", &self.parent.is_some())
            .finish_non_exhaustive()
    }
}
