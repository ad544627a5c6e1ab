use std::sync::Arc;

use arc_swap::{ArcSwap, Guard};
use tracing::info;

use crate::rule_set::RuleSet;

/// Holds the rule set currently used for classification.
///
/// Readers never lock: a load is a single atomic pointer read, and a
/// published rule set is never modified afterwards.
pub struct RuleStore {
    current: ArcSwap<RuleSet>,
}

impl RuleStore {
    pub fn new(rules: RuleSet) -> Self {
        Self::from_arc(Arc::new(rules))
    }

    pub fn from_arc(rules: Arc<RuleSet>) -> Self {
        Self {
            current: ArcSwap::new(rules),
        }
    }

    /// Owned handle to the current rule set.
    pub fn current(&self) -> Arc<RuleSet> {
        self.current.load_full()
    }

    /// Short-lived handle for a single classification.
    pub fn snapshot(&self) -> Guard<Arc<RuleSet>> {
        self.current.load()
    }

    /// Replace the current rule set unconditionally and return the previous
    /// one. Readers holding the old snapshot finish with it.
    pub fn publish(&self, rules: Arc<RuleSet>) -> Arc<RuleSet> {
        let previous = self.current.swap(Arc::clone(&rules));
        info!(from = %previous.version(), to = %rules.version(), "rule set published");
        previous
    }

    /// Install `candidate` only if its version is strictly newer than the
    /// current one. Returns whether it was installed.
    pub fn publish_if_newer(&self, candidate: Arc<RuleSet>) -> bool {
        let previous = self.current.rcu(|current| {
            if candidate.version_number() > current.version_number() {
                Arc::clone(&candidate)
            } else {
                Arc::clone(current)
            }
        });
        let installed = candidate.version_number() > previous.version_number();
        if installed {
            info!(from = %previous.version(), to = %candidate.version(), "rule set published");
        }
        installed
    }

    /// Version token of the current rule set.
    pub fn version(&self) -> String {
        self.current.load().version().to_string()
    }
}

impl std::fmt::Debug for RuleStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleStore")
            .field("version", &self.version())
            .finish()
    }
}
