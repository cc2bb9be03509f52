//! This module contains the [SplitProviderSelector], which routes trace queries either to the top
//! game's provider or to a bottom game provider built for the pair of top game claims a bottom
//! game disputes.

use crate::{
    providers::{ProviderCache, TranslatingProvider},
    ClaimData, FaultDisputeState, FaultError, Gindex, Position, ProviderSelector, TraceProvider,
};
use alloy_primitives::{keccak256, B256, U256};
use anyhow::{bail, Result};
use std::sync::Arc;

/// A [BottomProviderCreator] builds the provider for one bottom game.
#[async_trait::async_trait]
pub trait BottomProviderCreator: Send + Sync {
    /// Creates the provider for the bottom game between `pre` and `post`.
    ///
    /// ### Takes
    /// - `depth`: The depth of the bottom game's own tree.
    /// - `pre`: The top game leaf the bottom game starts from, or [None] when it starts from the
    ///   game's anchor state.
    /// - `post`: The top game leaf whose claim the bottom game checks.
    async fn create(
        &self,
        depth: u8,
        pre: Option<&ClaimData>,
        post: &ClaimData,
    ) -> Result<Arc<dyn TraceProvider>>;
}

/// Computes the local context of a bottom game, the key its provider and on-disk data live under.
/// A missing `pre` claim is encoded as `u32::MAX`.
pub fn local_context(pre: Option<&ClaimData>, post: &ClaimData) -> B256 {
    let mut buf = [0u8; 8];
    let pre_index = pre.map_or(u32::MAX, |c| c.contract_index);
    buf[..4].copy_from_slice(&pre_index.to_be_bytes());
    buf[4..].copy_from_slice(&post.contract_index.to_be_bytes());
    keccak256(buf)
}

/// The [SplitProviderSelector] answers positions at or above `split_depth` with the top provider.
/// Deeper positions belong to the bottom game hanging off one of the top game's leaves; its
/// provider is created on demand, cached, and mounted one level below the split depth.
pub struct SplitProviderSelector {
    top: Arc<dyn TraceProvider>,
    split_depth: u8,
    bottom: Arc<dyn BottomProviderCreator>,
    cache: Arc<ProviderCache>,
}

impl SplitProviderSelector {
    pub fn new(
        top: Arc<dyn TraceProvider>,
        split_depth: u8,
        bottom: Arc<dyn BottomProviderCreator>,
        cache: Arc<ProviderCache>,
    ) -> Self {
        Self {
            top,
            split_depth,
            bottom,
            cache,
        }
    }

    /// Resolves the pre and post claims of the bottom game `position` belongs to, as seen from
    /// `reference`.
    fn bottom_game_claims<'a>(
        &self,
        game: &'a FaultDisputeState,
        reference: &'a ClaimData,
        position: Position,
    ) -> Result<(Option<&'a ClaimData>, &'a ClaimData)> {
        if reference.depth() < self.split_depth {
            bail!(FaultError::RefClaimNotDeepEnough {
                depth: reference.depth(),
                split_depth: self.split_depth,
            });
        }

        let top_leaf = find_ancestor_at_depth(game, reference, self.split_depth)?;
        let leaf_index = top_leaf.position.trace_index(self.split_depth);
        let depth = position.depth();

        if position.trace_index(depth) > top_leaf.position.trace_index(depth) {
            // The bottom game defends the top leaf, so it runs up to the next output root.
            let post = find_ancestor_with_trace_index(
                game,
                top_leaf,
                self.split_depth,
                leaf_index + U256::from(1u8),
            )?;
            Ok((Some(top_leaf), post))
        } else if leaf_index.is_zero() {
            Ok((None, top_leaf))
        } else {
            let pre = find_ancestor_with_trace_index(
                game,
                top_leaf,
                self.split_depth,
                leaf_index - U256::from(1u8),
            )?;
            Ok((Some(pre), top_leaf))
        }
    }
}

#[async_trait::async_trait]
impl ProviderSelector for SplitProviderSelector {
    async fn select(
        &self,
        game: &FaultDisputeState,
        reference: &ClaimData,
        position: Position,
    ) -> Result<Arc<dyn TraceProvider>> {
        if position.depth() <= self.split_depth {
            return Ok(self.top.clone());
        }

        let (pre, post) = self.bottom_game_claims(game, reference, position)?;
        let bottom_depth = game.max_depth() - self.split_depth - 1;
        let context = local_context(pre, post);
        tracing::trace!(
            target: "split",
            pre = ?pre.map(|c| c.contract_index),
            post = post.contract_index,
            %context,
            "selecting bottom provider"
        );

        let provider = self
            .cache
            .get_or_create(context, || self.bottom.create(bottom_depth, pre, post))
            .await?;
        Ok(Arc::new(TranslatingProvider::new(
            self.split_depth + 1,
            provider,
        )))
    }
}

fn find_ancestor_at_depth<'a>(
    game: &'a FaultDisputeState,
    claim: &'a ClaimData,
    depth: u8,
) -> Result<&'a ClaimData> {
    let mut ancestor = claim;
    while ancestor.depth() > depth {
        ancestor = game.parent_of(ancestor)?;
    }
    Ok(ancestor)
}

/// Walks up from `claim` (inclusive) to the first claim committing to `trace_index` at `depth`.
fn find_ancestor_with_trace_index<'a>(
    game: &'a FaultDisputeState,
    claim: &'a ClaimData,
    depth: u8,
    trace_index: U256,
) -> Result<&'a ClaimData> {
    let mut candidate = claim;
    loop {
        if candidate.position.trace_index(depth) == trace_index {
            return Ok(candidate);
        }
        if candidate.is_root() {
            bail!(FaultError::ClaimNotFound(format!(
                "no ancestor of claim {} at trace index {trace_index}",
                claim.contract_index
            )));
        }
        candidate = game.parent_of(candidate)?;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        providers::AlphabetTraceProvider,
        test_utils::{claim_data, GameBuilder},
    };
    use std::sync::Mutex;

    const SPLIT_DEPTH: u8 = 2;
    const MAX_DEPTH: u8 = 5;

    /// Records the claims every bottom game was created for and serves an alphabet trace.
    #[derive(Default)]
    struct RecordingCreator {
        created: Mutex<Vec<(Option<u32>, u32, u8)>>,
    }

    #[async_trait::async_trait]
    impl BottomProviderCreator for RecordingCreator {
        async fn create(
            &self,
            depth: u8,
            pre: Option<&ClaimData>,
            post: &ClaimData,
        ) -> Result<Arc<dyn TraceProvider>> {
            self.created
                .lock()
                .unwrap()
                .push((pre.map(|c| c.contract_index), post.contract_index, depth));
            Ok(Arc::new(AlphabetTraceProvider::new("xyz", depth)))
        }
    }

    fn selector(creator: Arc<RecordingCreator>) -> SplitProviderSelector {
        SplitProviderSelector::new(
            Arc::new(AlphabetTraceProvider::new("abcd", SPLIT_DEPTH)),
            SPLIT_DEPTH,
            creator,
            Arc::new(ProviderCache::default()),
        )
    }

    /// root(0) -> attack(1) @ (1,0) -> attack(2) @ (2,0) -> attack(3) @ (3,0)
    ///                                 defend(4) @ (2,2) -> attack(5) @ (3,4), defend(6) @ (3,6)
    fn game() -> FaultDisputeState {
        GameBuilder::with_depths(false, SPLIT_DEPTH, MAX_DEPTH)
            .attack(0, true)
            .attack(1, true)
            .attack(2, true)
            .defend(1, true)
            .attack(4, true)
            .defend(4, true)
            .build()
    }

    #[tokio::test]
    async fn top_positions_use_the_top_provider() {
        let creator = Arc::new(RecordingCreator::default());
        let selector = selector(creator.clone());
        let game = game();
        let reference = &game.claims()[1];
        selector
            .select(&game, reference, Position::new(2, U256::ZERO))
            .await
            .unwrap();
        assert!(creator.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rejects_shallow_reference() {
        let selector = selector(Arc::new(RecordingCreator::default()));
        let game = game();
        let err = selector
            .select(&game, &game.claims()[1], Position::new(3, U256::ZERO))
            .await
            .err()
            .unwrap();
        assert_eq!(
            err.downcast_ref::<FaultError>(),
            Some(&FaultError::RefClaimNotDeepEnough {
                depth: 1,
                split_depth: SPLIT_DEPTH
            })
        );
    }

    #[tokio::test]
    async fn attacking_first_leaf_starts_from_the_anchor() {
        let creator = Arc::new(RecordingCreator::default());
        let selector = selector(creator.clone());
        let game = game();
        let top_leaf = &game.claims()[2];
        selector
            .select(&game, top_leaf, top_leaf.position.attack())
            .await
            .unwrap();
        assert_eq!(
            creator.created.lock().unwrap().as_slice(),
            &[(None, 2, MAX_DEPTH - SPLIT_DEPTH - 1)]
        );
    }

    #[tokio::test]
    async fn attack_and_defend_pick_neighbouring_outputs() {
        let creator = Arc::new(RecordingCreator::default());
        let selector = selector(creator.clone());
        let game = game();

        // Top leaf 4 sits at trace index 2, its attack runs from index 1 (claim 1) to 2.
        let top_leaf = &game.claims()[4];
        selector
            .select(&game, top_leaf, top_leaf.position.attack())
            .await
            .unwrap();

        // Claim 6 defends the leaf, so the bottom game runs from index 2 to 3 (the root).
        let defender = &game.claims()[6];
        selector
            .select(&game, defender, defender.position)
            .await
            .unwrap();

        assert_eq!(
            creator.created.lock().unwrap().as_slice(),
            &[(Some(1), 4, 2), (Some(4), 0, 2)]
        );
    }

    #[tokio::test]
    async fn providers_are_cached_per_local_context() {
        let creator = Arc::new(RecordingCreator::default());
        let selector = selector(creator.clone());
        let game = game();
        let reference = &game.claims()[5];
        for _ in 0..2 {
            selector
                .select(&game, reference, reference.position.attack())
                .await
                .unwrap();
        }
        assert_eq!(creator.created.lock().unwrap().len(), 1);
    }

    #[test]
    fn local_context_encoding() {
        let post = claim_data(B256::ZERO, Position::root(), ClaimData::ROOT_PARENT, 3);
        let expected = keccak256([0xff, 0xff, 0xff, 0xff, 0, 0, 0, 3]);
        assert_eq!(local_context(None, &post), expected);

        let pre = claim_data(B256::ZERO, Position::root(), ClaimData::ROOT_PARENT, 1);
        let expected = keccak256([0, 0, 0, 1, 0, 0, 0, 3]);
        assert_eq!(local_context(Some(&pre), &post), expected);
    }
}
