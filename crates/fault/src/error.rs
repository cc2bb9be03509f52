//! The error module contains the [FaultError] taxonomy shared by every component of the fault game.
//!
//! Fallible functions in this crate return [anyhow::Result]. A [FaultError] travels inside the
//! [anyhow::Error] and is recovered with [anyhow::Error::downcast_ref] whenever a caller needs to
//! branch on the kind of failure.

use crate::Position;
use alloy_primitives::{B256, U256};
use thiserror::Error;

/// The [FaultError] enum describes every failure the fault game components classify.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FaultError {
    /// A move was requested against a claim that already sits at the maximum game depth.
    #[error("game depth reached")]
    GameDepthReached,
    /// A step was requested against a claim that is not a leaf.
    #[error("cannot step on non-leaf claims (depth {0})")]
    StepNonLeafNode(u8),
    /// A step was requested against a leaf whose ancestors are not all honest.
    #[error("cannot step on claims that dispute invalid paths")]
    StepIgnoreInvalidPath,
    /// A claim referenced by index does not exist in the game.
    #[error("claim not found: {0}")]
    ClaimNotFound(String),
    /// A claim with the same position, parent and value already exists.
    #[error("claim already exists at index {0}")]
    ClaimExists(u32),
    /// A claim sits at a position that is neither the attack nor the defend move of its parent.
    #[error("claim {index} at {position:?} is not a valid move against its parent")]
    InvalidClaimPosition { index: u32, position: Position },
    /// The claim list could not be turned into a game.
    #[error("invalid game: {0}")]
    InvalidGame(String),
    /// A trace index is past the end of the trace served by a provider.
    #[error("index too large: {0}")]
    IndexTooLarge(U256),
    /// A trace index does not fit in the integer type a provider indexes with.
    #[error("trace index out of bounds: {0}")]
    TraceIndexOutOfBounds(U256),
    /// A position was rebased onto an ancestor deeper than itself.
    #[error("position at depth {depth} is above ancestor depth {ancestor}")]
    PositionDepthTooSmall { depth: u8, ancestor: u8 },
    /// A bottom game query was made with a reference claim above the split depth.
    #[error("reference claim at depth {depth} is not deep enough for split depth {split_depth}")]
    RefClaimNotDeepEnough { depth: u8, split_depth: u8 },
    /// The provider cannot produce step data.
    #[error("step data is not supported by this provider")]
    StepDataUnsupported,
    /// A reconstructed blob does not commit to the expected commitment.
    #[error("invalid blob commitment")]
    InvalidBlobCommitment,
    /// The preimage of a blob commitment key is malformed.
    #[error("invalid blob key preimage")]
    InvalidBlobKeyPreimage,
    /// A KZG evaluation does not match the field element read by the VM.
    #[error("invalid scalar value")]
    InvalidScalarValue,
    /// No field element of the reconstructed blob matches the requested oracle key.
    #[error("no matching field element")]
    NoMatchingFieldElement,
    /// The last hint emitted by the VM cannot be used to locate a blob.
    #[error("invalid hint: {0}")]
    InvalidHint(String),
    /// The preimage key type is not handled.
    #[error("unsupported preimage key type: {0}")]
    UnsupportedKeyType(u8),
    /// The rollup node has not yet processed the game's L1 head.
    #[error("local node too far behind")]
    NotInSync,
    /// The provider's absolute prestate differs from the one committed to on-chain.
    #[error("trace provider's absolute prestate {provider} does not match on-chain {on_chain}")]
    InvalidPrestate { provider: B256, on_chain: B256 },
    /// The requested operation is not supported.
    #[error("not supported")]
    NotSupported,
    /// A preimage upload was requested without any data.
    #[error("cannot upload nil preimage data")]
    NilPreimageData,
    /// An action refers to a parent that is not in the game.
    #[error("parent claim {0} does not exist")]
    ParentNotFound(u32),
    /// A step targets a non-leaf or a move targets a leaf.
    #[error("action kind does not match the depth of claim {0}")]
    InvalidActionDepth(u32),
    /// An action would duplicate an existing claim, or step on a countered leaf.
    #[error("action against claim {0} is a duplicate")]
    DuplicateAction(u32),
    /// An action defends the root claim.
    #[error("cannot defend the root claim")]
    DefendingRoot,
}

impl FaultError {
    /// Returns true when the error indicates a programming defect that should stop work on the
    /// game rather than skip a single claim.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            FaultError::PositionDepthTooSmall { .. } | FaultError::GameDepthReached
        )
    }

    /// Returns true if `err` carries a fatal [FaultError].
    pub fn is_fatal_error(err: &anyhow::Error) -> bool {
        err.downcast_ref::<FaultError>()
            .is_some_and(FaultError::is_fatal)
    }

    /// Returns true if `err` carries exactly `kind`.
    pub fn is_kind(err: &anyhow::Error, kind: &FaultError) -> bool {
        err.downcast_ref::<FaultError>() == Some(kind)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use anyhow::{anyhow, Context};

    #[test]
    fn fatal_errors_survive_context() {
        let err = Err::<(), _>(FaultError::GameDepthReached)
            .context("solving claim 3")
            .unwrap_err();
        assert!(FaultError::is_fatal_error(&err));
        assert!(FaultError::is_kind(&err, &FaultError::GameDepthReached));
    }

    #[test]
    fn non_fatal_errors() {
        let err = anyhow::Error::from(FaultError::StepIgnoreInvalidPath);
        assert!(!FaultError::is_fatal_error(&err));
        assert!(!FaultError::is_fatal_error(&anyhow!("rpc failure")));
    }
}
