//! This modules contains trace providers for the variants of the [crate::FaultDisputeGame].

mod alphabet;
pub use self::alphabet::AlphabetTraceProvider;

mod output;
pub use self::output::{
    AlphabetProposalCreator, OutputRootSplitAdapter, OutputTraceProvider, Proposal,
    ProposalProviderCreator, RollupSyncValidator,
};

mod split;
pub use self::split::{local_context, BottomProviderCreator, SplitProviderSelector};

mod translate;
pub use self::translate::TranslatingProvider;

mod cache;
pub use self::cache::{ProviderCache, DEFAULT_PROVIDER_CACHE_SIZE};

mod rpc;
pub use self::rpc::{
    EthRpcClient, L1BlockRef, L1Clock, L2HeaderSource, OutputRollupClient, RollupNodeClient,
};

mod cannon;
pub use self::cannon::{CannonProviderCreator, CannonTraceProvider, ProofGenerator};

mod executor;
pub use self::executor::{find_starting_snapshot, LocalGameInputs, VmExecutor};

#[cfg(test)]
pub(crate) mod mocks;
