//! This module contains the in-memory representation of a [crate::FaultDisputeGame]'s state

use crate::{Clock, FaultDisputeGame, FaultError, Gindex, Position};
use alloy_primitives::Address;
use anyhow::{bail, Result};
use challenger_primitives::{Claim, DisputeGame, GameStatus};
use std::collections::HashMap;

/// The [ClaimData] struct holds the data associated with a claim within a
/// [crate::FaultDisputeGame]'s state on-chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClaimData {
    /// The claimed value at `position`.
    pub value: Claim,
    pub position: Position,
    /// The contract index of the parent claim, [ClaimData::ROOT_PARENT] for the root.
    pub parent_index: u32,
    /// The index of this claim within the contract's claim array.
    pub contract_index: u32,
    pub countered: bool,
    pub counterer: Option<Address>,
    pub claimant: Option<Address>,
    pub clock: Clock,
}

impl ClaimData {
    /// The parent index stored on-chain for the root claim.
    pub const ROOT_PARENT: u32 = u32::MAX;

    pub fn id(&self) -> ClaimId {
        ClaimId {
            position: self.position,
            parent_index: self.parent_index,
            value: self.value,
        }
    }

    pub fn is_root(&self) -> bool {
        self.position.is_root()
    }

    pub fn depth(&self) -> u8 {
        self.position.depth()
    }

    /// Two claims agree when they claim the same value at the same position.
    pub fn agrees_with(&self, other: &ClaimData) -> bool {
        self.position == other.position && self.value == other.value
    }
}

/// The [ClaimId] struct identifies a claim the same way the contract does when rejecting
/// duplicates: by position, parent and value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimId {
    pub position: Position,
    pub parent_index: u32,
    pub value: Claim,
}

/// the [FaultDisputeState] struct holds an immutable snapshot of a [crate::FaultDisputeGame]'s
/// claims, taken once per tick.
#[derive(Debug, Clone)]
pub struct FaultDisputeState {
    /// The claims of the game in contract order. Parents are referenced by index, so the DAG is
    /// walked through this arena.
    claims: Vec<ClaimData>,
    /// Contract index of every claim, keyed by its identity.
    ids: HashMap<ClaimId, u32>,
    /// The status of the dispute game.
    status: GameStatus,
    /// The depth at which the output root bisection ends.
    split_depth: u8,
    /// The max depth of the position tree.
    max_depth: u8,
}

impl FaultDisputeState {
    /// Builds the game from its on-chain claims, checking that they form a well shaped tree.
    pub fn new(
        claims: Vec<ClaimData>,
        status: GameStatus,
        split_depth: u8,
        max_depth: u8,
    ) -> Result<Self> {
        if split_depth >= max_depth {
            bail!(FaultError::InvalidGame(format!(
                "split depth {split_depth} must be below max depth {max_depth}"
            )));
        }
        let Some(root) = claims.first() else {
            bail!(FaultError::InvalidGame("no claims".to_string()));
        };
        if !root.is_root() || root.parent_index != ClaimData::ROOT_PARENT {
            bail!(FaultError::InvalidGame(
                "first claim is not the root".to_string()
            ));
        }

        let mut ids = HashMap::with_capacity(claims.len());
        for (i, claim) in claims.iter().enumerate() {
            let index = i as u32;
            if claim.contract_index != index {
                bail!(FaultError::InvalidGame(format!(
                    "claim at {i} has contract index {}",
                    claim.contract_index
                )));
            }
            if claim.depth() > max_depth {
                bail!(FaultError::InvalidClaimPosition {
                    index,
                    position: claim.position
                });
            }
            if i > 0 {
                if claim.parent_index >= index {
                    bail!(FaultError::ClaimNotFound(format!(
                        "parent {} of claim {i}",
                        claim.parent_index
                    )));
                }
                let parent = &claims[claim.parent_index as usize];
                let attack = claim.position == parent.position.attack();
                let defend = !parent.is_root() && claim.position == parent.position.defend();
                if !attack && !defend {
                    bail!(FaultError::InvalidClaimPosition {
                        index,
                        position: claim.position
                    });
                }
            }
            if ids.insert(claim.id(), index).is_some() {
                bail!(FaultError::ClaimExists(index));
            }
        }

        Ok(Self {
            claims,
            ids,
            status,
            split_depth,
            max_depth,
        })
    }

    pub fn claims(&self) -> &[ClaimData] {
        &self.claims
    }

    pub fn claim(&self, index: u32) -> Result<&ClaimData> {
        match self.claims.get(index as usize) {
            Some(claim) => Ok(claim),
            None => bail!(FaultError::ClaimNotFound(format!("claim {index}"))),
        }
    }

    pub fn root(&self) -> &ClaimData {
        &self.claims[0]
    }

    /// Returns the parent of `claim`. The root has no parent.
    pub fn parent_of(&self, claim: &ClaimData) -> Result<&ClaimData> {
        if claim.is_root() {
            bail!(FaultError::ClaimNotFound(
                "root claim has no parent".to_string()
            ));
        }
        self.claim(claim.parent_index)
    }

    /// Returns true if a claim with the same position, parent and value is already in the game.
    pub fn is_duplicate(&self, claim: &ClaimData) -> bool {
        self.contains(&claim.id())
    }

    pub fn contains(&self, id: &ClaimId) -> bool {
        self.ids.contains_key(id)
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    pub fn split_depth(&self) -> u8 {
        self.split_depth
    }

    /// Returns true if `claim` defends its parent rather than attacking it.
    pub fn defends_parent(&self, claim: &ClaimData) -> Result<bool> {
        let parent = self.parent_of(claim)?;
        Ok(claim.position.defends(&parent.position))
    }

    /// Returns true if `claim` sits on a level the honest actor posts on, and therefore never
    /// counters. Agreeing with the proposed output means challenging the root, so the honest actor
    /// owns the odd levels; otherwise it owns the root's level and every even one.
    pub fn agree_with_claim_level(
        &self,
        claim: &ClaimData,
        agree_with_proposed_output: bool,
    ) -> bool {
        let odd = claim.depth() % 2 == 1;
        odd == agree_with_proposed_output
    }
}

impl DisputeGame for FaultDisputeState {
    fn root_claim(&self) -> Claim {
        self.root().value
    }

    fn status(&self) -> GameStatus {
        self.status
    }
}

impl FaultDisputeGame for FaultDisputeState {
    fn state(&self) -> &[ClaimData] {
        &self.claims
    }

    fn split_depth(&self) -> u8 {
        self.split_depth
    }

    fn max_depth(&self) -> u8 {
        self.max_depth
    }
}
