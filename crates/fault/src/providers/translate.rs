//! This module contains the [TranslatingProvider], which mounts a bottom game trace below a leaf of
//! the top game.

use crate::{Position, StepWitness, TraceProvider};
use anyhow::Result;
use challenger_primitives::Claim;
use std::sync::Arc;

/// The [TranslatingProvider] rebases every position it is asked about so that `root_depth` becomes
/// the root of the wrapped provider's tree.
pub struct TranslatingProvider {
    root_depth: u8,
    provider: Arc<dyn TraceProvider>,
}

impl TranslatingProvider {
    pub fn new(root_depth: u8, provider: Arc<dyn TraceProvider>) -> Self {
        Self {
            root_depth,
            provider,
        }
    }

    pub fn original(&self) -> &Arc<dyn TraceProvider> {
        &self.provider
    }
}

#[async_trait::async_trait]
impl TraceProvider for TranslatingProvider {
    async fn get(&self, position: Position) -> Result<Claim> {
        let relative = position.relative_to_ancestor_at_depth(self.root_depth)?;
        self.provider.get(relative).await
    }

    async fn get_step_data(&self, position: Position) -> Result<StepWitness> {
        let relative = position.relative_to_ancestor_at_depth(self.root_depth)?;
        self.provider.get_step_data(relative).await
    }

    async fn absolute_prestate_commitment(&self) -> Result<Claim> {
        self.provider.absolute_prestate_commitment().await
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{providers::AlphabetTraceProvider, FaultError};
    use alloy_primitives::U256;

    #[tokio::test]
    async fn rebases_positions() {
        let bottom = Arc::new(AlphabetTraceProvider::new("abcdefg", 3));
        let translated = TranslatingProvider::new(3, bottom.clone());

        // Depth 3 is the bottom root, depth 6 the bottom leaves.
        let top_leaf_attack = Position::new(3, U256::from(6));
        assert_eq!(
            translated.get(top_leaf_attack).await.unwrap(),
            bottom.get(Position::root()).await.unwrap()
        );

        let leaf = Position::new(6, U256::from(0b110_101));
        assert_eq!(
            translated.get(leaf).await.unwrap(),
            bottom.get(Position::new(3, U256::from(0b101))).await.unwrap()
        );
        assert_eq!(
            translated.get_step_data(leaf).await.unwrap(),
            bottom
                .get_step_data(Position::new(3, U256::from(5)))
                .await
                .unwrap()
        );
        assert_eq!(
            translated.absolute_prestate_commitment().await.unwrap(),
            bottom.absolute_prestate_commitment().await.unwrap()
        );
    }

    #[tokio::test]
    async fn rejects_positions_above_the_bottom_root() {
        let translated =
            TranslatingProvider::new(3, Arc::new(AlphabetTraceProvider::new("abc", 3)));
        let err = translated.get(Position::new(2, U256::ZERO)).await.unwrap_err();
        assert!(FaultError::is_fatal_error(&err));
    }
}
