//! This module contains the implementation of the [crate::TraceProvider] trait for the bottom game of output root
//! games, backed by proof files written by `cannon`.

use crate::{
    config::VmConfig,
    preimage::{DiskKv, PreimageLoader},
    proofs::{self, ProofData, VmState, FINAL_STATE, PREIMAGES_DIR},
    providers::{
        executor::{LocalGameInputs, VmExecutor},
        L2HeaderSource, Proposal, ProposalProviderCreator,
    },
    FaultError, Gindex, Position, StepWitness, TraceProvider,
};
use alloy_primitives::{Bytes, B256};
use anyhow::{anyhow, bail, Result};
use challenger_primitives::Claim;
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

/// Marks the last step of the trace as not yet known.
const UNKNOWN_LAST_STEP: u64 = u64::MAX;

/// A [ProofGenerator] runs the VM to write the proof file for a single step into a trace directory.
#[async_trait::async_trait]
pub trait ProofGenerator: Send + Sync {
    async fn generate_proof(&self, dir: &Path, step: u64) -> Result<()>;
}

/// The [CannonTraceProvider] is a [TraceProvider] that serves claims and step data from the proof
/// files of a single bottom game, generating missing ones on demand.
pub struct CannonTraceProvider {
    /// The trace directory of the bottom game.
    dir: PathBuf,
    /// The VM state the trace starts from.
    prestate: PathBuf,
    generator: Arc<dyn ProofGenerator>,
    loader: PreimageLoader,
    /// The depth of the bottom game.
    depth: u8,
    /// The last step of the trace once the VM is known to have exited.
    last_step: AtomicU64,
}

impl CannonTraceProvider {
    pub fn new(
        dir: impl Into<PathBuf>,
        prestate: impl Into<PathBuf>,
        generator: Arc<dyn ProofGenerator>,
        loader: PreimageLoader,
        depth: u8,
    ) -> Self {
        Self {
            dir: dir.into(),
            prestate: prestate.into(),
            generator,
            loader,
            depth,
            last_step: AtomicU64::new(UNKNOWN_LAST_STEP),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn step_at(&self, position: Position) -> Result<u64> {
        let trace_index = position.trace_index(self.depth);
        u64::try_from(trace_index)
            .map_err(|_| anyhow!(FaultError::TraceIndexOutOfBounds(trace_index)))
    }

    /// Returns the last step of the trace if the VM has been seen to exit, reading the on-disk
    /// cache on first use.
    async fn last_step(&self) -> Result<Option<u64>> {
        let cached = self.last_step.load(Ordering::Acquire);
        if cached != UNKNOWN_LAST_STEP {
            return Ok(Some(cached));
        }
        let stored = proofs::read_last_step(&self.dir).await?;
        if let Some(step) = stored {
            self.last_step.store(step, Ordering::Release);
        }
        Ok(stored)
    }

    /// Loads the proof for `step`, running the VM if it has not been generated yet. Steps past the
    /// end of the trace are served the proof of the final step.
    pub async fn load_proof(&self, step: u64) -> Result<ProofData> {
        let step = match self.last_step().await? {
            Some(last) if step > last => last,
            _ => step,
        };

        let path = proofs::proof_path(&self.dir, step);
        if let Some(proof) = proofs::read_json(&path).await? {
            return Ok(proof);
        }

        self.generator.generate_proof(&self.dir, step).await?;
        if let Some(proof) = proofs::read_json(&path).await? {
            return Ok(proof);
        }

        // No proof was written, which happens when the VM stopped before reaching `step`.
        let Some(state) = proofs::read_json::<VmState>(&self.dir.join(FINAL_STATE)).await? else {
            bail!("missing proof and final state for step {step}");
        };
        if !state.exited || state.step > step {
            bail!("VM did not produce a proof for step {step}");
        }

        let last = state.step.saturating_sub(1);
        let proof = ProofData {
            claim_value: state.state_hash(),
            state_data: state.witness.clone(),
            proof_data: Bytes::new(),
            ..Default::default()
        };
        if let Err(err) = proofs::write_last_step(&self.dir, &proof, last).await {
            tracing::warn!(
                target: "cannon",
                dir = %self.dir.display(),
                last_step = last,
                error = %err,
                "failed to cache last step"
            );
        }
        self.last_step.store(last, Ordering::Release);
        tracing::debug!(
            target: "cannon",
            dir = %self.dir.display(),
            last_step = last,
            "trace exhausted"
        );
        Ok(proof)
    }
}

#[async_trait::async_trait]
impl TraceProvider for CannonTraceProvider {
    async fn get(&self, position: Position) -> Result<Claim> {
        let proof = self.load_proof(self.step_at(position)?).await?;
        if proof.claim_value.is_zero() {
            bail!("proof missing post hash");
        }
        Ok(proof.claim_value)
    }

    async fn get_step_data(&self, position: Position) -> Result<StepWitness> {
        let proof = self.load_proof(self.step_at(position)?).await?;
        if proof.state_data.is_empty() {
            bail!("missing state data");
        }
        let oracle = self.loader.load_oracle(&proof).await?;
        Ok(StepWitness {
            pre_state: proof.state_data,
            proof: proof.proof_data,
            oracle,
        })
    }

    async fn absolute_prestate_commitment(&self) -> Result<Claim> {
        let state: VmState = proofs::read_json(&self.prestate)
            .await?
            .ok_or_else(|| anyhow!("missing absolute prestate {}", self.prestate.display()))?;
        Ok(state.state_hash())
    }
}

/// The [CannonProviderCreator] builds a [CannonTraceProvider] for every bottom game of a game,
/// each in its own directory under the game directory.
pub struct CannonProviderCreator {
    game_dir: PathBuf,
    prestate: PathBuf,
    config: VmConfig,
    l1_head: B256,
    l2: Arc<dyn L2HeaderSource>,
}

impl CannonProviderCreator {
    pub fn new(
        game_dir: impl Into<PathBuf>,
        prestate: impl Into<PathBuf>,
        config: VmConfig,
        l1_head: B256,
        l2: Arc<dyn L2HeaderSource>,
    ) -> Self {
        Self {
            game_dir: game_dir.into(),
            prestate: prestate.into(),
            config,
            l1_head,
            l2,
        }
    }

    /// Returns the inputs the VM runs the bottom game between `agreed` and `claimed` with.
    pub async fn local_inputs(
        &self,
        agreed: Proposal,
        claimed: Proposal,
    ) -> Result<LocalGameInputs> {
        Ok(LocalGameInputs {
            l1_head: self.l1_head,
            l2_head: self.l2.block_hash(agreed.l2_block_number).await?,
            l2_output_root: agreed.output_root,
            l2_claim: claimed.output_root,
            l2_block_number: claimed.l2_block_number,
        })
    }
}

#[async_trait::async_trait]
impl ProposalProviderCreator for CannonProviderCreator {
    async fn create(
        &self,
        local_context: B256,
        depth: u8,
        agreed: Proposal,
        claimed: Proposal,
    ) -> Result<Arc<dyn TraceProvider>> {
        let dir = self.game_dir.join(local_context.to_string());
        let inputs = self.local_inputs(agreed, claimed).await?;
        let executor = VmExecutor::new(self.config.clone(), self.prestate.clone(), inputs);
        let loader = PreimageLoader::new(Arc::new(DiskKv::new(dir.join(PREIMAGES_DIR))));
        Ok(Arc::new(CannonTraceProvider::new(
            dir,
            self.prestate.clone(),
            Arc::new(executor),
            loader,
            depth,
        )))
    }
}
