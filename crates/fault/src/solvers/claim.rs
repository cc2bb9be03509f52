//! Implementation of the [FaultClaimSolver] trait over a [TraceAccessor].

use crate::{
    ClaimData, FaultAction, FaultClaimSolver, FaultDisputeState, FaultError, Gindex,
    HonestClaimTracker, TraceAccessor,
};
use anyhow::{bail, Result};

/// The [ClaimSolver] decides the honest response to a single claim. It only ever responds to
/// claims whose parent lies on a path of claims the honest trace agrees with, so it never extends
/// a dishonest branch of the game.
pub struct ClaimSolver {
    accessor: TraceAccessor,
}

impl ClaimSolver {
    pub fn new(accessor: TraceAccessor) -> Self {
        Self { accessor }
    }

    /// Returns true if the honest trace agrees with `claim` and every claim two, four, ... levels
    /// above it. Agreements are memoized in the `tracker`.
    async fn agree_with_claim_path(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
        tracker: &mut HonestClaimTracker,
    ) -> Result<bool> {
        let mut current = claim;
        loop {
            if !tracker.is_honest(current) {
                if !self.accessor.agree_with_claim(game, current).await? {
                    return Ok(false);
                }
                tracker.add_agreed(current);
            }
            if current.is_root() {
                return Ok(true);
            }
            let parent = game.parent_of(current)?;
            if parent.is_root() {
                return Ok(true);
            }
            current = game.parent_of(parent)?;
        }
    }

    async fn counter(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
        is_attack: bool,
    ) -> Result<FaultAction> {
        let position = claim.position.make_move(is_attack);
        let value = self.accessor.get(game, claim, position).await?;
        Ok(FaultAction::Move {
            parent_index: claim.contract_index,
            parent_position: claim.position,
            is_attack,
            value,
        })
    }
}

#[async_trait::async_trait]
impl FaultClaimSolver for ClaimSolver {
    async fn next_move(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
        tracker: &mut HonestClaimTracker,
    ) -> Result<Option<FaultAction>> {
        if claim.depth() >= game.max_depth() {
            bail!(FaultError::GameDepthReached);
        }

        if claim.is_root() {
            if self.accessor.agree_with_claim(game, claim).await? {
                return Ok(None);
            }
            return self.counter(game, claim, true).await.map(Some);
        }

        let parent = game.parent_of(claim)?;
        if !self.agree_with_claim_path(game, parent, tracker).await? {
            return Ok(None);
        }
        if tracker.honest_counter(claim).is_some() {
            return Ok(None);
        }

        let agree = self.accessor.agree_with_claim(game, claim).await?;
        self.counter(game, claim, !agree).await.map(Some)
    }

    async fn attempt_step(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
        tracker: &mut HonestClaimTracker,
    ) -> Result<FaultAction> {
        if claim.depth() != game.max_depth() {
            bail!(FaultError::StepNonLeafNode(claim.depth()));
        }
        let parent = game.parent_of(claim)?;
        if !self.agree_with_claim_path(game, parent, tracker).await? {
            bail!(FaultError::StepIgnoreInvalidPath);
        }

        // Defending a leaf steps from its own state to the next one.
        let agree = self.accessor.agree_with_claim(game, claim).await?;
        let position = if agree {
            claim.position.move_right()
        } else {
            claim.position
        };
        let witness = self.accessor.get_step_data(game, claim, position).await?;

        Ok(FaultAction::Step {
            parent_index: claim.contract_index,
            parent_position: claim.position,
            is_attack: !agree,
            pre_state: witness.pre_state,
            proof: witness.proof,
            oracle: witness.oracle,
        })
    }
}
