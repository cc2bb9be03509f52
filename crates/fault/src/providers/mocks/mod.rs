//! Mock collaborators for the trace providers.

use crate::providers::{L2HeaderSource, OutputRollupClient};
use alloy_primitives::{keccak256, B256};
use anyhow::Result;
use std::sync::atomic::{AtomicU64, Ordering};

/// Deterministic output root for an L2 block.
pub(crate) fn mock_output_root(block_number: u64) -> B256 {
    keccak256(block_number.to_be_bytes())
}

/// Deterministic hash of an L2 block.
pub(crate) fn mock_block_hash(block_number: u64) -> B256 {
    keccak256([b"block".as_slice(), &block_number.to_be_bytes()].concat())
}

/// The [MockRollupClient] serves [mock_output_root]s with a fixed safe head and L1 progress.
pub(crate) struct MockRollupClient {
    pub safe_head: u64,
    pub current_l1: AtomicU64,
}

impl MockRollupClient {
    pub(crate) fn new(safe_head: u64, current_l1: u64) -> Self {
        Self {
            safe_head,
            current_l1: AtomicU64::new(current_l1),
        }
    }
}

#[async_trait::async_trait]
impl OutputRollupClient for MockRollupClient {
    async fn output_at_block(&self, block_number: u64) -> Result<B256> {
        Ok(mock_output_root(block_number))
    }

    async fn safe_head_at_l1_block(&self, _: u64) -> Result<u64> {
        Ok(self.safe_head)
    }

    async fn current_l1(&self) -> Result<u64> {
        Ok(self.current_l1.load(Ordering::SeqCst))
    }
}

/// The [MockL2Headers] serves [mock_block_hash]es.
pub(crate) struct MockL2Headers;

#[async_trait::async_trait]
impl L2HeaderSource for MockL2Headers {
    async fn block_hash(&self, block_number: u64) -> Result<B256> {
        Ok(mock_block_hash(block_number))
    }
}
