//! The traits module contains the game and solver abstractions shared by every game type.

use crate::{dispute_game::Claim, GameStatus};

/// The [DisputeGame] trait describes a read-only snapshot of a dispute over a single root
/// [Claim]. The dispute is resolved on-chain, and a resolution is only observed through a newer
/// snapshot's [GameStatus].
pub trait DisputeGame {
    /// Returns the claim under dispute.
    fn root_claim(&self) -> Claim;

    /// Returns the status of the game when the snapshot was taken.
    fn status(&self) -> GameStatus;
}

/// The [DisputeSolver] trait finds the responses an honest actor makes to a [DisputeGame]. The
/// caller dispatches them.
#[async_trait::async_trait]
pub trait DisputeSolver<DG: DisputeGame + Sync, R> {
    async fn available_moves(&self, game: &DG) -> R;
}
