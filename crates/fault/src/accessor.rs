//! This module contains the [TraceAccessor], which answers trace queries on behalf of a claim.

use crate::{
    ClaimData, FaultDisputeState, Position, ProviderSelector, StepWitness, TraceProvider,
};
use anyhow::Result;
use challenger_primitives::Claim;
use std::sync::Arc;

/// The [TraceAccessor] evaluates every trace query in the context of a reference claim, letting a
/// [ProviderSelector] pick the [TraceProvider] that is responsible for the queried [Position].
#[derive(Clone)]
pub struct TraceAccessor {
    selector: Arc<dyn ProviderSelector>,
}

impl TraceAccessor {
    pub fn new(selector: Arc<dyn ProviderSelector>) -> Self {
        Self { selector }
    }

    /// Creates an accessor that always answers from `provider`, for games with a single trace.
    pub fn simple(provider: Arc<dyn TraceProvider>) -> Self {
        Self::new(Arc::new(SingleProviderSelector(provider)))
    }

    /// Returns the honest claim at `position`.
    pub async fn get(
        &self,
        game: &FaultDisputeState,
        reference: &ClaimData,
        position: Position,
    ) -> Result<Claim> {
        let provider = self.selector.select(game, reference, position).await?;
        provider.get(position).await
    }

    /// Returns the step data for the leaf at `position`.
    pub async fn get_step_data(
        &self,
        game: &FaultDisputeState,
        reference: &ClaimData,
        position: Position,
    ) -> Result<StepWitness> {
        let provider = self.selector.select(game, reference, position).await?;
        provider.get_step_data(position).await
    }

    /// Returns true if the honest trace holds `claim`'s value at its position.
    pub async fn agree_with_claim(
        &self,
        game: &FaultDisputeState,
        claim: &ClaimData,
    ) -> Result<bool> {
        let ours = self.get(game, claim, claim.position).await?;
        Ok(ours == claim.value)
    }
}

struct SingleProviderSelector(Arc<dyn TraceProvider>);

#[async_trait::async_trait]
impl ProviderSelector for SingleProviderSelector {
    async fn select(
        &self,
        _: &FaultDisputeState,
        _: &ClaimData,
        _: Position,
    ) -> Result<Arc<dyn TraceProvider>> {
        Ok(self.0.clone())
    }
}
