//! This module contains the [FaultDisputeSolver], which finds every honest response to a
//! [FaultDisputeState].

use crate::{
    rules, solvers::ClaimSolver, FaultAction, FaultClaimSolver, FaultDisputeState, FaultError,
    HonestClaimTracker, TraceAccessor,
};
use anyhow::{Context, Result};
use challenger_primitives::DisputeSolver;
use std::sync::Arc;

/// A [FaultDisputeSolver] is a [DisputeSolver] that is played over a fault proof VM backend. It
/// walks the claims of a [FaultDisputeState] in contract order and asks a [FaultClaimSolver] for
/// the honest response to each claim that is not on the honest actor's own level.
pub struct FaultDisputeSolver {
    claim_solver: Arc<dyn FaultClaimSolver>,
    accessor: TraceAccessor,
    agree_with_proposed_output: bool,
}

impl FaultDisputeSolver {
    pub fn new(accessor: TraceAccessor, agree_with_proposed_output: bool) -> Self {
        let claim_solver = Arc::new(ClaimSolver::new(accessor.clone()));
        Self::with_claim_solver(claim_solver, accessor, agree_with_proposed_output)
    }

    pub fn with_claim_solver(
        claim_solver: Arc<dyn FaultClaimSolver>,
        accessor: TraceAccessor,
        agree_with_proposed_output: bool,
    ) -> Self {
        Self {
            claim_solver,
            accessor,
            agree_with_proposed_output,
        }
    }

    async fn solve(&self, game: &FaultDisputeState) -> Result<Vec<FaultAction>> {
        let mut tracker = HonestClaimTracker::new();
        let root = game.root();
        match self.accessor.agree_with_claim(game, root).await {
            Ok(true) => tracker.add_honest_claim(None, root.id()),
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(
                    target: "solver",
                    error = %err,
                    "failed to check root claim, skipping game"
                );
                return Ok(Vec::new());
            }
        }

        let mut actions = Vec::new();
        for claim in game.claims() {
            if game.agree_with_claim_level(claim, self.agree_with_proposed_output) {
                continue;
            }

            let result = if claim.depth() == game.max_depth() {
                if claim.countered {
                    continue;
                }
                self.claim_solver
                    .attempt_step(game, claim, &mut tracker)
                    .await
                    .map(Some)
            } else {
                match self.claim_solver.next_move(game, claim, &mut tracker).await {
                    Ok(Some(action)) => match action.claim_id() {
                        Some(id) => {
                            tracker.add_honest_claim(Some(claim), id);
                            Ok((!game.contains(&id)).then_some(action))
                        }
                        None => Ok(Some(action)),
                    },
                    other => other,
                }
            };

            match result {
                Ok(Some(action)) => actions.push(action),
                Ok(None) => {}
                Err(err) if FaultError::is_fatal_error(&err) => {
                    return Err(err).with_context(|| {
                        format!("failed to solve claim {}", claim.contract_index)
                    });
                }
                Err(err) if FaultError::is_kind(&err, &FaultError::StepIgnoreInvalidPath) => {
                    tracing::debug!(
                        target: "solver",
                        claim_index = claim.contract_index,
                        "leaf disputes an invalid path, not stepping"
                    );
                }
                Err(err) => {
                    tracing::warn!(
                        target: "solver",
                        claim_index = claim.contract_index,
                        position = ?claim.position,
                        error = %err,
                        "failed to solve claim"
                    );
                }
            }
        }

        Ok(actions
            .into_iter()
            .filter_map(|action| {
                let parent_index = action.parent_index();
                match rules::check_action(game, action) {
                    Ok(action) => Some(action),
                    Err(err) => {
                        tracing::warn!(
                            target: "solver",
                            parent_index,
                            error = %err,
                            "dropping action that breaks a rule"
                        );
                        None
                    }
                }
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl DisputeSolver<FaultDisputeState, Result<Vec<FaultAction>>> for FaultDisputeSolver {
    async fn available_moves(&self, game: &FaultDisputeState) -> Result<Vec<FaultAction>> {
        self.solve(game).await
    }
}
