//! This module contains the implementation of the [crate::TraceProvider] trait for fetching output roots from the
//! rollup node, along with the adapter that builds bottom game providers from pairs of output root claims.

use crate::{
    providers::{
        split::{local_context, BottomProviderCreator},
        AlphabetTraceProvider, OutputRollupClient,
    },
    ClaimData, FaultError, Gindex, Position, StepWitness, SyncValidator, TraceProvider,
};
use alloy_primitives::B256;
use anyhow::{bail, Result};
use challenger_primitives::Claim;
use std::sync::Arc;

/// The [OutputTraceProvider] is a [TraceProvider] that provides L2 output commitments relative to a [Position] in the
/// output bisection portion of the dispute game.
pub struct OutputTraceProvider {
    rollup: Arc<dyn OutputRollupClient>,
    /// The L2 block of the game's anchor output root.
    prestate_block: u64,
    /// The L2 block the root claim is about.
    poststate_block: u64,
    /// The L1 head of the game. Only data derived from L1 up to this block may be used.
    l1_head_number: u64,
    /// The depth of the output bisection, the game's split depth.
    depth: u8,
}

impl OutputTraceProvider {
    pub fn new(
        rollup: Arc<dyn OutputRollupClient>,
        prestate_block: u64,
        poststate_block: u64,
        l1_head_number: u64,
        depth: u8,
    ) -> Self {
        Self {
            rollup,
            prestate_block,
            poststate_block,
            l1_head_number,
            depth,
        }
    }

    pub fn prestate_block(&self) -> u64 {
        self.prestate_block
    }

    /// Returns the L2 block a claim at `position` is about, as the contract sees it.
    pub fn claimed_block_number(&self, position: Position) -> Result<u64> {
        let trace_index = position.trace_index(self.depth);
        let Ok(offset) = u64::try_from(trace_index) else {
            bail!(FaultError::IndexTooLarge(trace_index));
        };
        let block = offset
            .checked_add(self.prestate_block)
            .and_then(|b| b.checked_add(1))
            .ok_or(FaultError::IndexTooLarge(trace_index))?;
        Ok(block.min(self.poststate_block))
    }

    /// Returns the L2 block whose output the honest actor posts at `position`: the claimed block,
    /// capped at the safe head derivable from the game's L1 head.
    pub async fn honest_block_number(&self, position: Position) -> Result<u64> {
        let claimed = self.claimed_block_number(position)?;
        let safe_head = self
            .rollup
            .safe_head_at_l1_block(self.l1_head_number)
            .await?;
        Ok(claimed.min(safe_head))
    }
}

#[async_trait::async_trait]
impl TraceProvider for OutputTraceProvider {
    async fn get(&self, position: Position) -> Result<Claim> {
        let block = self.honest_block_number(position).await?;
        self.rollup.output_at_block(block).await
    }

    async fn get_step_data(&self, _: Position) -> Result<StepWitness> {
        bail!(FaultError::StepDataUnsupported)
    }

    async fn absolute_prestate_commitment(&self) -> Result<Claim> {
        self.rollup.output_at_block(self.prestate_block).await
    }
}

/// An output root at a given L2 block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Proposal {
    pub l2_block_number: u64,
    pub output_root: B256,
}

/// A [ProposalProviderCreator] builds the bottom game provider checking the transition from the
/// agreed to the claimed output root.
#[async_trait::async_trait]
pub trait ProposalProviderCreator: Send + Sync {
    async fn create(
        &self,
        local_context: B256,
        depth: u8,
        agreed: Proposal,
        claimed: Proposal,
    ) -> Result<Arc<dyn TraceProvider>>;
}

/// The [OutputRootSplitAdapter] turns the pre and post claims of a bottom game into the agreed
/// and claimed proposals a [ProposalProviderCreator] works from.
pub struct OutputRootSplitAdapter {
    top: Arc<OutputTraceProvider>,
    creator: Arc<dyn ProposalProviderCreator>,
}

impl OutputRootSplitAdapter {
    pub fn new(top: Arc<OutputTraceProvider>, creator: Arc<dyn ProposalProviderCreator>) -> Self {
        Self { top, creator }
    }

    /// Resolves the proposals the bottom game between `pre` and `post` runs between.
    pub async fn proposals(
        &self,
        pre: Option<&ClaimData>,
        post: &ClaimData,
    ) -> Result<(Proposal, Proposal)> {
        let agreed = match pre {
            Some(pre) => Proposal {
                l2_block_number: self.top.honest_block_number(pre.position).await?,
                output_root: pre.value,
            },
            None => Proposal {
                l2_block_number: self.top.prestate_block(),
                output_root: self.top.absolute_prestate_commitment().await?,
            },
        };
        let claimed = Proposal {
            l2_block_number: self.top.claimed_block_number(post.position)?,
            output_root: post.value,
        };
        Ok((agreed, claimed))
    }
}

#[async_trait::async_trait]
impl BottomProviderCreator for OutputRootSplitAdapter {
    async fn create(
        &self,
        depth: u8,
        pre: Option<&ClaimData>,
        post: &ClaimData,
    ) -> Result<Arc<dyn TraceProvider>> {
        let (agreed, claimed) = self.proposals(pre, post).await?;
        self.creator
            .create(local_context(pre, post), depth, agreed, claimed)
            .await
    }
}

/// The [AlphabetProposalCreator] serves an alphabet trace spelled by the hex local context, giving
/// every bottom game of an output alphabet game its own trace.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlphabetProposalCreator;

#[async_trait::async_trait]
impl ProposalProviderCreator for AlphabetProposalCreator {
    async fn create(
        &self,
        local_context: B256,
        depth: u8,
        _: Proposal,
        _: Proposal,
    ) -> Result<Arc<dyn TraceProvider>> {
        Ok(Arc::new(AlphabetTraceProvider::new(
            local_context.to_string(),
            depth,
        )))
    }
}

/// The [RollupSyncValidator] checks a rollup node's L1 progress against a game's L1 head.
pub struct RollupSyncValidator {
    rollup: Arc<dyn OutputRollupClient>,
}

impl RollupSyncValidator {
    pub fn new(rollup: Arc<dyn OutputRollupClient>) -> Self {
        Self { rollup }
    }
}

#[async_trait::async_trait]
impl SyncValidator for RollupSyncValidator {
    async fn validate_node_synced(&self, l1_head: u64) -> Result<()> {
        if self.rollup.current_l1().await? <= l1_head {
            bail!(FaultError::NotInSync);
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        providers::mocks::{mock_output_root, MockRollupClient},
        test_utils::claim_data,
    };
    use alloy_primitives::U256;

    const PRESTATE_BLOCK: u64 = 1000;
    const POSTSTATE_BLOCK: u64 = 1010;
    const DEPTH: u8 = 4;

    fn provider(safe_head: u64) -> OutputTraceProvider {
        OutputTraceProvider::new(
            Arc::new(MockRollupClient::new(safe_head, 0)),
            PRESTATE_BLOCK,
            POSTSTATE_BLOCK,
            20,
            DEPTH,
        )
    }

    #[tokio::test]
    async fn outputs_by_trace_index() {
        let provider = provider(u64::MAX);
        let first = Position::new(DEPTH, U256::ZERO);
        assert_eq!(provider.claimed_block_number(first).unwrap(), 1001);
        assert_eq!(provider.get(first).await.unwrap(), mock_output_root(1001));

        // Trace index 9 maps to the poststate block, anything later is capped there.
        let last = Position::new(DEPTH, U256::from(9));
        assert_eq!(provider.claimed_block_number(last).unwrap(), POSTSTATE_BLOCK);
        let past = Position::new(DEPTH, U256::from(15));
        assert_eq!(provider.claimed_block_number(past).unwrap(), POSTSTATE_BLOCK);
        assert_eq!(
            provider.get(Position::root()).await.unwrap(),
            mock_output_root(POSTSTATE_BLOCK)
        );

        assert_eq!(
            provider.absolute_prestate_commitment().await.unwrap(),
            mock_output_root(PRESTATE_BLOCK)
        );
    }

    #[tokio::test]
    async fn honest_outputs_stop_at_safe_head() {
        let provider = provider(1005);
        let position = Position::new(DEPTH, U256::from(8));
        assert_eq!(provider.claimed_block_number(position).unwrap(), 1009);
        assert_eq!(provider.honest_block_number(position).await.unwrap(), 1005);
        assert_eq!(provider.get(position).await.unwrap(), mock_output_root(1005));
    }

    #[tokio::test]
    async fn no_step_data() {
        let err = provider(u64::MAX)
            .get_step_data(Position::new(DEPTH, U256::ZERO))
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<FaultError>(),
            Some(&FaultError::StepDataUnsupported)
        );
    }

    #[test]
    fn trace_index_must_fit_block_numbers() {
        let provider = OutputTraceProvider::new(
            Arc::new(MockRollupClient::new(0, 0)),
            PRESTATE_BLOCK,
            POSTSTATE_BLOCK,
            20,
            70,
        );
        let err = provider.claimed_block_number(Position::root()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FaultError>(),
            Some(FaultError::IndexTooLarge(_))
        ));
    }

    #[tokio::test]
    async fn adapter_proposals() {
        let adapter = OutputRootSplitAdapter::new(
            Arc::new(provider(u64::MAX)),
            Arc::new(AlphabetProposalCreator),
        );
        let pre = claim_data(
            B256::repeat_byte(1),
            Position::new(DEPTH, U256::from(2)),
            0,
            3,
        );
        let post = claim_data(
            B256::repeat_byte(2),
            Position::new(DEPTH, U256::from(3)),
            0,
            4,
        );

        let (agreed, claimed) = adapter.proposals(Some(&pre), &post).await.unwrap();
        assert_eq!(
            agreed,
            Proposal {
                l2_block_number: 1003,
                output_root: pre.value
            }
        );
        assert_eq!(
            claimed,
            Proposal {
                l2_block_number: 1004,
                output_root: post.value
            }
        );

        let (agreed, _) = adapter.proposals(None, &post).await.unwrap();
        assert_eq!(
            agreed,
            Proposal {
                l2_block_number: PRESTATE_BLOCK,
                output_root: mock_output_root(PRESTATE_BLOCK)
            }
        );

        let bottom = adapter.create(2, Some(&pre), &post).await.unwrap();
        let expected = AlphabetTraceProvider::new(local_context(Some(&pre), &post).to_string(), 2);
        assert_eq!(
            bottom.get(Position::root()).await.unwrap(),
            expected.get(Position::root()).await.unwrap()
        );
    }

    #[tokio::test]
    async fn sync_validation() {
        let rollup = Arc::new(MockRollupClient::new(0, 10));
        let validator = RollupSyncValidator::new(rollup.clone());
        assert!(validator.validate_node_synced(9).await.is_ok());
        let err = validator.validate_node_synced(10).await.unwrap_err();
        assert_eq!(err.downcast_ref::<FaultError>(), Some(&FaultError::NotInSync));
    }
}
