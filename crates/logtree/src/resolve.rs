//! crates/logtree/src/resolve.rs
//! Lock-free validation and regeneration of per-node cache snapshots.
//!
//! Both caches a logger keeps (levels and targets) follow the same protocol.
//! Each node holds its current snapshot in an [`ArcSwap`] slot. A snapshot is
//! current when either
//!
//! - the node is the root (whatever the root's slot holds is current by
//!   definition: a change happens exactly when the store completes),
//! - it *is* the parent's current snapshot (the node has no overrides and
//!   shares its parent's), or
//! - it was built from the parent's current snapshot.
//!
//! Readers check this against the parent's resolved snapshot without locking.
//! Only a stale node takes its own lock, re-checks that nobody regenerated in
//! the meantime, rebuilds from the parent's snapshot, and publishes. Rebuilding
//! twice from the same inputs produces an equivalent snapshot, so a lost race
//! only costs work.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::logger::{LocalConfig, LoggerInner, NodeId};
use crate::route::Route;

/// What a node's snapshot is built on.
pub(crate) enum Basis<'a, S> {
    /// The node is the root; `default_route` is the route it was built with.
    Root {
        /// Fallback when the root has no default route of its own.
        default_route: &'a Arc<dyn Route>,
    },
    /// The parent's current snapshot.
    Inherit(Arc<S>),
}

/// A per-node cache snapshot governed by the resolution protocol.
pub(crate) trait CacheSnapshot: Send + Sync + Sized + 'static {
    /// Name used in diagnostics.
    const KIND: &'static str;

    /// The slot holding this cache on `node`.
    fn slot(node: &LoggerInner) -> &ArcSwap<Self>;

    /// The ancestor snapshot this one was built from.
    fn parent(&self) -> Option<&Arc<Self>>;

    /// Builds the snapshot for node `owner` from its local configuration and
    /// what it inherits.
    ///
    /// May return the parent's snapshot itself when the node overrides nothing.
    fn generate(owner: NodeId, local: &LocalConfig, basis: &Basis<'_, Self>) -> Arc<Self>;
}

/// Reports whether `current` is valid against the parent's current snapshot.
fn is_current<S: CacheSnapshot>(current: &Arc<S>, parent: &Arc<S>) -> bool {
    Arc::ptr_eq(current, parent)
        || current
            .parent()
            .is_some_and(|built_from| Arc::ptr_eq(built_from, parent))
}

/// Returns the node's current snapshot, regenerating stale ones on the way up.
///
/// The walk is bounded by the depth of the tree.
pub(crate) fn resolve<S: CacheSnapshot>(node: &LoggerInner) -> Arc<S> {
    let basis = node.basis::<S>();
    let Basis::Inherit(parent_snapshot) = &basis else {
        return S::slot(node).load_full();
    };

    loop {
        let current = S::slot(node).load_full();
        if is_current(&current, parent_snapshot) {
            return current;
        }

        let local = node.lock_local();
        if !Arc::ptr_eq(&*S::slot(node).load(), &current) {
            // Someone regenerated between our load and the lock; validate theirs.
            drop(local);
            continue;
        }
        return publish(node, &local, &basis);
    }
}

/// Builds and stores a new snapshot. The caller must hold the node's lock.
pub(crate) fn publish<S: CacheSnapshot>(
    node: &LoggerInner,
    local: &LocalConfig,
    basis: &Basis<'_, S>,
) -> Arc<S> {
    let snapshot = S::generate(node.id(), local, basis);
    S::slot(node).store(Arc::clone(&snapshot));
    tracing::trace!(
        target: "logtree::cache",
        node = node.id().raw(),
        cache = S::KIND,
        shared = matches!(basis, Basis::Inherit(parent) if Arc::ptr_eq(parent, &snapshot)),
        "published cache snapshot"
    );
    snapshot
}
