//! This module contains the implementation of the [crate::TraceProvider] trait for the mock Alphabet VM.

use crate::{FaultError, Gindex, Position, StepWitness, TraceProvider, VMStatus};
use alloy_primitives::{keccak256, Bytes, U256};
use alloy_sol_types::{sol_data, SolType};
use anyhow::Result;
use challenger_primitives::Claim;

type AlphabetStateConstruction = (sol_data::Uint<256>, sol_data::Uint<256>);

/// The letter before `a`, the state of the alphabet VM before its first step.
const ABSOLUTE_PRESTATE_LETTER: u8 = 0x60;

/// The [AlphabetTraceProvider] is a [TraceProvider] that provides the correct trace for the mock
/// Alphabet VM. Step `i` of the VM moves from letter `i - 1` to letter `i`; once the letters run
/// out, the last state repeats until the end of the trace.
#[derive(Debug, Clone)]
pub struct AlphabetTraceProvider {
    /// The letters of the honest trace.
    state: Vec<u8>,
    /// The depth of the position tree the trace spans.
    depth: u8,
}

impl AlphabetTraceProvider {
    pub fn new(state: impl AsRef<[u8]>, depth: u8) -> Self {
        Self {
            state: state.as_ref().to_vec(),
            depth,
        }
    }

    /// Returns the encoded state the VM is in before the step at `trace_index` is applied.
    pub fn pre_state(&self, trace_index: U256) -> Result<Bytes> {
        if trace_index.is_zero() {
            return Ok(Self::absolute_prestate());
        }
        let index = trace_index - U256::from(1u8);
        if index >= U256::from(1u8) << self.depth as usize {
            anyhow::bail!(FaultError::IndexTooLarge(index));
        }
        let last = self.state.len().saturating_sub(1);
        let clamped = usize::try_from(index).map_or(last, |i| i.min(last));
        let letter = self.state.get(clamped).copied().unwrap_or(ABSOLUTE_PRESTATE_LETTER);
        Ok(<AlphabetStateConstruction as SolType>::abi_encode(&(
            U256::from(clamped),
            U256::from(letter),
        ))
        .into())
    }

    /// Returns the honest claim at `position`: the hash of the state after its trace index's step.
    pub fn claim(&self, position: Position) -> Result<Claim> {
        let post = self.pre_state(position.trace_index(self.depth) + U256::from(1u8))?;
        Ok(Self::state_hash(&post))
    }

    fn absolute_prestate() -> Bytes {
        <sol_data::Uint<256> as SolType>::abi_encode(&U256::from(ABSOLUTE_PRESTATE_LETTER)).into()
    }

    fn state_hash(state: &[u8]) -> Claim {
        let mut hash = keccak256(state);
        hash[0] = VMStatus::Invalid as u8;
        hash
    }
}

#[async_trait::async_trait]
impl TraceProvider for AlphabetTraceProvider {
    async fn get(&self, position: Position) -> Result<Claim> {
        self.claim(position)
    }

    async fn get_step_data(&self, position: Position) -> Result<StepWitness> {
        Ok(StepWitness {
            pre_state: self.pre_state(position.trace_index(self.depth))?,
            proof: Bytes::new(),
            oracle: None,
        })
    }

    async fn absolute_prestate_commitment(&self) -> Result<Claim> {
        let mut hash = keccak256(Self::absolute_prestate());
        hash[0] = VMStatus::Unfinished as u8;
        Ok(hash)
    }
}
