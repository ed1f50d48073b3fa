//! crates/logtree/src/level_cache.rs
//! Merged selector rules plus a per-call-site threshold memo.

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap;

use crate::callsite::{CallSite, CallSiteId, Classifier};
use crate::level::Level;
use crate::logger::{LocalConfig, LoggerInner, NodeId};
use crate::resolve::{Basis, CacheSnapshot};
use crate::selector::RuleTable;

/// Decision for one call site; `None` means the name could not be resolved and
/// the site fails open.
type Decision = Option<Level>;

/// Immutable view of the rules in force at a node, together with a memo of the
/// thresholds already decided for individual call sites.
///
/// The memo is the only part that changes after publication. It only grows,
/// and each entry is initialised at most once, so every reader of a snapshot
/// sees the same decision for a call site.
pub struct LevelSnapshot {
    rules: RuleTable,
    memo: RwLock<FxHashMap<CallSiteId, Arc<OnceLock<Decision>>>>,
    parent: Option<Arc<LevelSnapshot>>,
    owner: NodeId,
}

impl LevelSnapshot {
    pub(crate) fn new(owner: NodeId, rules: RuleTable, parent: Option<Arc<Self>>) -> Self {
        Self {
            rules,
            memo: RwLock::new(FxHashMap::default()),
            parent,
            owner,
        }
    }

    /// The merged rules, most specific first.
    #[must_use]
    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    /// The node that built this snapshot.
    #[must_use]
    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// Number of call sites decided so far.
    #[must_use]
    pub fn memoized(&self) -> usize {
        let memo = self.memo.read().unwrap_or_else(PoisonError::into_inner);
        memo.values().filter(|cell| cell.get().is_some()).count()
    }

    /// Returns the threshold for `site`, classifying it on first use.
    ///
    /// `None` means the site could not be named and is allowed at every
    /// severity.
    pub fn threshold(&self, site: CallSite, classifier: &Classifier, default: Level) -> Option<Level> {
        {
            let memo = self.memo.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(decided) = memo.get(&site.id()).and_then(|cell| cell.get()) {
                return *decided;
            }
        }

        let cell = {
            let mut memo = self.memo.write().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(memo.entry(site.id()).or_default())
        };
        // Classification runs outside the map lock; concurrent callers for the
        // same site wait on the cell instead.
        *cell.get_or_init(|| classifier.classify(site, &self.rules, default))
    }

    /// Reports whether a record at `level` from `site` passes.
    pub fn should_log(
        &self,
        level: Level,
        site: CallSite,
        classifier: &Classifier,
        default: Level,
    ) -> bool {
        match self.threshold(site, classifier, default) {
            Some(threshold) => level.passes(threshold),
            None => true,
        }
    }
}

impl CacheSnapshot for LevelSnapshot {
    const KIND: &'static str = "level";

    fn slot(node: &LoggerInner) -> &ArcSwap<Self> {
        node.level_slot()
    }

    fn parent(&self) -> Option<&Arc<Self>> {
        self.parent.as_ref()
    }

    fn generate(owner: NodeId, local: &LocalConfig, basis: &Basis<'_, Self>) -> Arc<Self> {
        match basis {
            Basis::Inherit(parent) if local.rules.is_empty() => Arc::clone(parent),
            Basis::Inherit(parent) => Arc::new(Self::new(
                owner,
                RuleTable::merged(Some(&parent.rules), local.rules.iter().cloned()),
                Some(Arc::clone(parent)),
            )),
            Basis::Root { .. } => Arc::new(Self::new(
                owner,
                RuleTable::from_rules(local.rules.iter().cloned()),
                None,
            )),
        }
    }
}

impl fmt::Debug for LevelSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelSnapshot")
            .field("owner", &self.owner)
            .field("rules", &self.rules)
            .field("memoized", &self.memoized())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
