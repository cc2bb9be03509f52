//! This module contains the [Agent], which plays one tick of a single game at a time.

use crate::{
    config::AgentConfig,
    providers::{L1Clock, ProviderCache},
    ClaimLoader, FaultDisputeSolver, FaultDisputeState, FaultError, Responder, SyncValidator,
    TraceAccessor, TraceProvider,
};
use anyhow::{bail, Context, Result};
use challenger_primitives::{Claim, DisputeSolver, GameStatus};
use std::{future::Future, sync::Arc};

/// Checks that `provider`'s absolute prestate matches the one the game committed to on-chain.
pub async fn validate_prestate(provider: &dyn TraceProvider, on_chain: Claim) -> Result<()> {
    let ours = provider.absolute_prestate_commitment().await?;
    if ours != on_chain {
        bail!(FaultError::InvalidPrestate {
            provider: ours,
            on_chain,
        });
    }
    Ok(())
}

/// The [Agent] drives a single game. Each call to [Agent::act] is one tick: resolve the game if
/// it ended in our favour, otherwise load the claims, solve them and dispatch the responses.
///
/// Ticks of the same game must not overlap. Dropping the future returned by [Agent::act]
/// abandons the tick.
pub struct Agent {
    solver: FaultDisputeSolver,
    loader: Arc<dyn ClaimLoader>,
    responder: Arc<dyn Responder>,
    sync_validator: Option<Arc<dyn SyncValidator>>,
    anchor: Option<(Arc<dyn L1Clock>, Arc<ProviderCache>)>,
    split_depth: u8,
    max_depth: u8,
    /// The number of the L1 block the game is anchored to.
    l1_head: u64,
    config: AgentConfig,
}

impl Agent {
    pub fn new(
        accessor: TraceAccessor,
        loader: Arc<dyn ClaimLoader>,
        responder: Arc<dyn Responder>,
        split_depth: u8,
        max_depth: u8,
        l1_head: u64,
        config: AgentConfig,
    ) -> Self {
        Self {
            solver: FaultDisputeSolver::new(accessor, config.agree_with_proposed_output),
            loader,
            responder,
            sync_validator: None,
            anchor: None,
            split_depth,
            max_depth,
            l1_head,
            config,
        }
    }

    /// Checks the rollup node against the game's L1 head before acting.
    pub fn with_sync_validator(mut self, validator: Arc<dyn SyncValidator>) -> Self {
        self.sync_validator = Some(validator);
        self
    }

    /// Ties `cache`, the bottom provider cache behind the agent's trace accessor, to the hash of
    /// the game's L1 head as read from `clock` at the start of every tick.
    pub fn with_provider_cache(
        mut self,
        clock: Arc<dyn L1Clock>,
        cache: Arc<ProviderCache>,
    ) -> Self {
        self.anchor = Some((clock, cache));
        self
    }

    /// Runs a single tick. Only errors that make further ticks pointless are returned; the rest
    /// are logged and retried on the next tick.
    pub async fn act(&self) -> Result<()> {
        if self.try_resolve().await {
            return Ok(());
        }

        if let Some(validator) = &self.sync_validator {
            match self
                .read("sync status", validator.validate_node_synced(self.l1_head))
                .await
            {
                Ok(()) => {}
                Err(err) if FaultError::is_kind(&err, &FaultError::NotInSync) => {
                    tracing::warn!(
                        target: "agent",
                        l1_head = self.l1_head,
                        "local node not synced, skipping tick"
                    );
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }

        if !self.refresh_anchor().await {
            return Ok(());
        }

        let claims = match self.read("claims", self.loader.fetch_claims()).await {
            Ok(claims) => claims,
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, "failed to fetch claims");
                return Ok(());
            }
        };
        let game = match FaultDisputeState::new(
            claims,
            GameStatus::InProgress,
            self.split_depth,
            self.max_depth,
        ) {
            Ok(game) => game,
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, "failed to build game");
                return Ok(());
            }
        };

        let actions = self
            .solver
            .available_moves(&game)
            .await
            .context("failed to solve game")?;
        tracing::debug!(
            target: "agent",
            claims = game.claims().len(),
            actions = actions.len(),
            "solved game"
        );

        for action in actions {
            let parent_index = action.parent_index();
            let is_step = action.is_step();
            if let Err(err) = self.responder.perform_action(action).await {
                tracing::error!(
                    target: "agent",
                    parent_index,
                    is_step,
                    error = %err,
                    "failed to perform action"
                );
            }
        }
        Ok(())
    }

    /// Resolves the game if it would resolve to the outcome we argue for. Returns true when the
    /// tick should end here.
    async fn try_resolve(&self) -> bool {
        let status = match self.read("resolve status", self.responder.call_resolve()).await {
            Ok(status) => status,
            Err(err) => {
                tracing::debug!(target: "agent", error = %err, "game not resolvable");
                return false;
            }
        };
        let expected = if self.config.agree_with_proposed_output {
            GameStatus::ChallengerWins
        } else {
            GameStatus::DefenderWins
        };
        if status != expected {
            return false;
        }

        tracing::info!(target: "agent", ?status, "resolving game");
        if let Err(err) = self.responder.resolve().await {
            tracing::error!(target: "agent", error = %err, "failed to resolve game");
        }
        true
    }

    /// Re-anchors the provider cache on the current hash of the game's L1 head, evicting bottom
    /// game providers built before a reorg. Returns false when the tick should end here.
    async fn refresh_anchor(&self) -> bool {
        let Some((clock, cache)) = &self.anchor else {
            return true;
        };
        let head = match self.read("L1 head", clock.head()).await {
            Ok(head) => head,
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, "failed to read L1 head");
                return false;
            }
        };
        if head.number < self.l1_head {
            tracing::warn!(
                target: "agent",
                l1_head = self.l1_head,
                head = head.number,
                "L1 node behind the game's L1 head, skipping tick"
            );
            return false;
        }
        match self.read("L1 anchor", clock.block_hash(self.l1_head)).await {
            Ok(hash) => {
                tracing::trace!(
                    target: "agent",
                    anchor = %hash,
                    l1_time = head.timestamp,
                    "anchored provider cache"
                );
                cache.set_anchor(hash).await;
                true
            }
            Err(err) => {
                tracing::warn!(target: "agent", error = %err, "failed to read L1 anchor");
                false
            }
        }
    }

    async fn read<T>(&self, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::time::timeout(self.config.rpc_timeout(), call)
            .await
            .with_context(|| format!("timed out reading {what}"))?
    }
}
