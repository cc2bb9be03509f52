//! This module holds traits related to the [FaultDisputeGame]

use crate::{
    ClaimData, FaultAction, FaultDisputeState, HonestClaimTracker, Position, PreimageOracleData,
    StepWitness,
};
use alloy_primitives::{Bytes, B256, U256};
use anyhow::Result;
use challenger_primitives::{Claim, DisputeGame, GameStatus};
use std::sync::Arc;

/// A [FaultDisputeGame] is a [DisputeGame] bisected over an output root trace down to
/// `split_depth` and over a fault proof VM trace below it.
pub trait FaultDisputeGame: DisputeGame {
    /// Returns a shared reference to the claims of the game, in contract order.
    fn state(&self) -> &[ClaimData];

    /// Returns the depth at which the output root bisection ends.
    fn split_depth(&self) -> u8;

    /// Returns the depth of the leaves of the position tree.
    fn max_depth(&self) -> u8;
}

/// A [FaultClaimSolver] finds the correct response to a single [ClaimData] within a
/// [FaultDisputeState].
#[async_trait::async_trait]
pub trait FaultClaimSolver: Send + Sync {
    /// Finds the move to make against a non-leaf claim.
    ///
    /// ### Takes
    /// - `game`: The [FaultDisputeState] to solve against.
    /// - `claim`: The claim to respond to.
    /// - `tracker`: The honest claims known so far this tick.
    ///
    /// ### Returns
    /// - `Ok(Some(`[FaultAction::Move]`))` if the claim must be countered, `Ok(None)` if not.
    async fn next_move(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
        tracker: &mut HonestClaimTracker,
    ) -> Result<Option<FaultAction>>;

    /// Builds the [FaultAction::Step] against a leaf claim.
    async fn attempt_step(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
        tracker: &mut HonestClaimTracker,
    ) -> Result<FaultAction>;
}

/// A [TraceProvider] serves the honest trace of a game: the claim at any [Position] within its
/// bounds, and the data needed to step at its leaves.
#[async_trait::async_trait]
pub trait TraceProvider: Send + Sync {
    /// Returns the honest claim at the given position.
    async fn get(&self, position: Position) -> Result<Claim>;

    /// Returns the pre-state, proof and preimage needed to execute the step at the given leaf.
    async fn get_step_data(&self, position: Position) -> Result<StepWitness>;

    /// Returns the commitment to the state before the first step of the trace.
    async fn absolute_prestate_commitment(&self) -> Result<Claim>;
}

/// A [ProviderSelector] picks the [TraceProvider] that answers for a [Position], given the claim
/// the question is asked on behalf of.
#[async_trait::async_trait]
pub trait ProviderSelector: Send + Sync {
    async fn select(
        &self,
        game: &FaultDisputeState,
        reference: &ClaimData,
        position: Position,
    ) -> Result<Arc<dyn TraceProvider>>;
}

/// The [Responder] turns solver output into on-chain calls.
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    /// Simulates resolving the game, returning the status it would resolve to.
    async fn call_resolve(&self) -> Result<GameStatus>;

    /// Resolves the game.
    async fn resolve(&self) -> Result<()>;

    /// Sends the transaction(s) for a single action.
    async fn perform_action(&self, action: FaultAction) -> Result<()>;
}

/// A [ClaimLoader] fetches the claims of a game, in on-chain storage order.
#[async_trait::async_trait]
pub trait ClaimLoader: Send + Sync {
    async fn fetch_claims(&self) -> Result<Vec<ClaimData>>;
}

/// A [PreimageUploader] makes a preimage available to the on-chain oracle before a step reads it.
#[async_trait::async_trait]
pub trait PreimageUploader: Send + Sync {
    async fn upload_preimage(&self, claim_index: u64, data: &PreimageOracleData) -> Result<()>;
}

/// A [PreimageSource] reads raw preimages by oracle key.
#[async_trait::async_trait]
pub trait PreimageSource: Send + Sync {
    async fn get(&self, key: B256) -> Result<Bytes>;
}

/// A [SyncValidator] checks that the local rollup node has caught up to a game's L1 head.
#[async_trait::async_trait]
pub trait SyncValidator: Send + Sync {
    async fn validate_node_synced(&self, l1_head: u64) -> Result<()>;
}

/// A [GameCaller] reads view functions of the game contract.
#[async_trait::async_trait]
pub trait GameCaller: Send + Sync {
    /// Returns the status the game would resolve to if resolved now.
    async fn call_resolve(&self) -> Result<GameStatus>;

    /// Returns the bond required to post a claim at the given position.
    async fn required_bond(&self, position: Position) -> Result<U256>;
}

/// The [Gindex] trait defines the interface of a generalized index within a binary tree.
/// A "Generalized Index" is calculated as `2^{depth} + index_at_depth`.
pub trait Gindex {
    /// Returns the depth of the [Position] within the tree.
    fn depth(&self) -> u8;

    /// Returns the index at depth of the [Position] within the tree.
    fn index_at_depth(&self) -> U256;

    /// Returns the generalized index of the [Position].
    fn to_gindex(&self) -> U256;

    /// Returns the left child [Position] relative to the current [Position].
    fn left(&self) -> Self;

    /// Returns the right child [Position] relative to the current [Position].
    fn right(&self) -> Self;

    /// Returns the parent [Position] relative to the current [Position].
    fn parent(&self) -> Self;

    /// Returns the rightmost [Position] that commits to the same trace index as the current [Position].
    fn right_index(&self, max_depth: u8) -> Self;

    /// Returns the trace index that the current [Position] commits to.
    fn trace_index(&self, max_depth: u8) -> U256;

    /// Returns the relative [Position] for an attack or defense move against the current [Position].
    fn make_move(&self, is_attack: bool) -> Self;
}

/// The [ChessClock] trait defines the interface of a single side of a chess clock at a given state in time.
pub trait ChessClock: Sized {
    /// Packs a duration and timestamp into a clock.
    fn new_clock(duration: u64, timestamp: u64) -> Self;

    /// Returns the seconds elapsed on the chess clock in seconds when it was last stopped.
    fn duration(&self) -> u64;

    /// Returns the timestamp of when the chess clock was last stopped.
    fn timestamp(&self) -> u64;
}
