//! This module contains the [Rule]s every [FaultAction] must pass before it is sent on-chain.
//! They catch solver output the contracts would revert on.

use crate::{FaultAction, FaultDisputeState, FaultError};
use anyhow::{bail, Result};
use challenger_primitives::{chain_rules, Rule};

/// The value threaded through the action rules: the game the action was derived from and the
/// action itself.
pub type ActionCheck<'a> = (&'a FaultDisputeState, FaultAction);

/// The parent of the action must be a claim in the game.
pub fn parent_must_exist<'a>() -> Rule<ActionCheck<'a>> {
    Box::new(|(game, action): ActionCheck<'a>| {
        let index = action.parent_index();
        if game.claim(index).is_err() {
            bail!(FaultError::ParentNotFound(index));
        }
        Ok((game, action))
    })
}

/// Steps are only made against leaves, and moves only against claims above the leaves.
pub fn only_step_at_max_depth<'a>() -> Rule<ActionCheck<'a>> {
    Box::new(|(game, action): ActionCheck<'a>| {
        let index = action.parent_index();
        let parent = game.claim(index)?;
        if action.is_step() != (parent.depth() == game.max_depth()) {
            bail!(FaultError::InvalidActionDepth(index));
        }
        Ok((game, action))
    })
}

/// A move must not recreate an existing claim, and a countered leaf is not stepped on again.
pub fn no_duplicate<'a>() -> Rule<ActionCheck<'a>> {
    Box::new(|(game, action): ActionCheck<'a>| {
        let index = action.parent_index();
        let duplicate = match action.claim_id() {
            Some(id) => game.contains(&id),
            None => game.claim(index)?.countered,
        };
        if duplicate {
            bail!(FaultError::DuplicateAction(index));
        }
        Ok((game, action))
    })
}

/// The root claim can only be attacked.
pub fn no_defending_root<'a>() -> Rule<ActionCheck<'a>> {
    Box::new(|(game, action): ActionCheck<'a>| {
        if !action.is_attack() && action.parent_position().is_root() {
            bail!(FaultError::DefendingRoot);
        }
        Ok((game, action))
    })
}

/// Runs `action` through every rule, handing it back if it passes all of them.
pub fn check_action(game: &FaultDisputeState, action: FaultAction) -> Result<FaultAction> {
    let (_, action) = chain_rules!(
        (game, action),
        parent_must_exist(),
        only_step_at_max_depth(),
        no_duplicate(),
        no_defending_root()
    )?;
    Ok(action)
}
