//! Shared fixtures for the crate's tests.

use crate::{
    contracts::{TxCandidate, TxSender},
    providers::AlphabetTraceProvider,
    ClaimData, FaultDisputeState, Gindex, Position, TraceProvider,
};
use alloy_primitives::B256;
use anyhow::Result;
use challenger_primitives::{Claim, GameStatus};
use std::sync::{Arc, Mutex};

pub(crate) const ALPHABET: &str = "abcdefg";
pub(crate) const MAX_DEPTH: u8 = 4;
pub(crate) const SPLIT_DEPTH: u8 = 2;

/// The honest alphabet trace of the test games.
pub(crate) fn alphabet_provider() -> Arc<dyn TraceProvider> {
    Arc::new(AlphabetTraceProvider::new(ALPHABET, MAX_DEPTH))
}

pub(crate) fn claim_data(
    value: Claim,
    position: Position,
    parent_index: u32,
    contract_index: u32,
) -> ClaimData {
    ClaimData {
        value,
        position,
        parent_index,
        contract_index,
        countered: false,
        counterer: None,
        claimant: None,
        clock: 0,
    }
}

/// Builds games over the [ALPHABET] trace claim by claim, with either the honest value or a
/// deliberately wrong one at each position.
pub(crate) struct GameBuilder {
    trace: AlphabetTraceProvider,
    claims: Vec<ClaimData>,
    split_depth: u8,
    max_depth: u8,
}

impl GameBuilder {
    pub(crate) fn new(correct_root: bool) -> Self {
        Self::with_depths(correct_root, SPLIT_DEPTH, MAX_DEPTH)
    }

    pub(crate) fn with_depths(correct_root: bool, split_depth: u8, max_depth: u8) -> Self {
        let mut builder = Self {
            trace: AlphabetTraceProvider::new(ALPHABET, max_depth),
            claims: Vec::new(),
            split_depth,
            max_depth,
        };
        let root = builder.value(Position::root(), correct_root);
        builder
            .claims
            .push(claim_data(root, Position::root(), ClaimData::ROOT_PARENT, 0));
        builder
    }

    /// The honest claim at `position`.
    pub(crate) fn correct(&self, position: Position) -> Claim {
        self.trace.claim(position).unwrap()
    }

    /// A claim at `position` that differs from the honest one.
    pub(crate) fn incorrect(&self, position: Position) -> Claim {
        let mut value = self.correct(position);
        value[31] ^= 0xff;
        value
    }

    fn value(&self, position: Position, correct: bool) -> Claim {
        if correct {
            self.correct(position)
        } else {
            self.incorrect(position)
        }
    }

    pub(crate) fn attack(self, parent: u32, correct: bool) -> Self {
        let position = self.claims[parent as usize].position.attack();
        let value = self.value(position, correct);
        self.add(parent, true, value)
    }

    pub(crate) fn defend(self, parent: u32, correct: bool) -> Self {
        let position = self.claims[parent as usize].position.defend();
        let value = self.value(position, correct);
        self.add(parent, false, value)
    }

    /// Adds a claim with an explicit value.
    pub(crate) fn add(mut self, parent: u32, is_attack: bool, value: Claim) -> Self {
        let position = self.claims[parent as usize].position.make_move(is_attack);
        let index = self.claims.len() as u32;
        self.claims.push(claim_data(value, position, parent, index));
        self
    }

    /// Marks the claim at `index` as countered on-chain.
    pub(crate) fn countered(mut self, index: u32) -> Self {
        let claim = &mut self.claims[index as usize];
        claim.countered = true;
        claim.counterer = Some(alloy_primitives::Address::repeat_byte(0xcc));
        self
    }

    pub(crate) fn build(self) -> FaultDisputeState {
        FaultDisputeState::new(
            self.claims,
            GameStatus::InProgress,
            self.split_depth,
            self.max_depth,
        )
        .unwrap()
    }
}

/// A [TxSender] that records every transaction instead of sending it.
#[derive(Default)]
pub(crate) struct RecordingSender {
    sent: Mutex<Vec<(String, TxCandidate)>>,
}

impl RecordingSender {
    pub(crate) fn sent(&self) -> Vec<TxCandidate> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(_, tx)| tx.clone())
            .collect()
    }

    pub(crate) fn purposes(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(purpose, _)| purpose.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl TxSender for RecordingSender {
    async fn send_and_wait(&self, purpose: &str, candidate: TxCandidate) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((purpose.to_string(), candidate));
        Ok(())
    }
}

/// An arbitrary claim value no honest trace produces.
pub(crate) fn junk(byte: u8) -> Claim {
    B256::repeat_byte(byte)
}
