//! The honest module holds the [HonestClaimTracker], the solver's record of which claims it
//! stands behind during a single tick.

use crate::{ClaimData, ClaimId};
use std::collections::{HashMap, HashSet};

/// The [HonestClaimTracker] records the claims the honest actor agrees with and, for each claim it
/// counters, the counter it has made or plans to make. It lives for a single tick.
#[derive(Debug, Default, Clone)]
pub struct HonestClaimTracker {
    agreed: HashSet<ClaimId>,
    counters: HashMap<ClaimId, ClaimId>,
}

impl HonestClaimTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `claim` as honest, optionally as the counter to `parent`.
    pub fn add_honest_claim(&mut self, parent: Option<&ClaimData>, claim: ClaimId) {
        self.agreed.insert(claim);
        if let Some(parent) = parent {
            self.counters.insert(parent.id(), claim);
        }
    }

    /// Records that the trace agrees with `claim`, without it being a counter to anything.
    pub fn add_agreed(&mut self, claim: &ClaimData) {
        self.agreed.insert(claim.id());
    }

    pub fn is_honest(&self, claim: &ClaimData) -> bool {
        self.agreed.contains(&claim.id())
    }

    /// Returns the honest counter recorded against `claim`, if any.
    pub fn honest_counter(&self, claim: &ClaimData) -> Option<&ClaimId> {
        self.counters.get(&claim.id())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_utils::claim_data, Position};
    use alloy_primitives::B256;

    #[test]
    fn records_counters() {
        let root = claim_data(B256::ZERO, Position::root(), ClaimData::ROOT_PARENT, 0);
        let counter = claim_data(B256::repeat_byte(1), Position::root().attack(), 0, 1);

        let mut tracker = HonestClaimTracker::new();
        assert!(tracker.honest_counter(&root).is_none());

        tracker.add_honest_claim(Some(&root), counter.id());
        assert!(tracker.is_honest(&counter));
        assert!(!tracker.is_honest(&root));
        assert_eq!(tracker.honest_counter(&root), Some(&counter.id()));

        tracker.add_agreed(&root);
        assert!(tracker.is_honest(&root));
    }
}
