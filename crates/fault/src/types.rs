//! The types module holds the values passed between the solvers, providers and responders of the
//! [crate::FaultDisputeGame].

use crate::{ClaimId, FaultError, Gindex, Position};
use alloy_primitives::{keccak256, Bytes, FixedBytes, B256};
use challenger_primitives::Claim;

/// The [VMStatus] enum describes the status of a VM at a given position.
/// - [VMStatus::Valid]: The VM is exited with a valid status.
/// - [VMStatus::Invalid]: The VM is exited with an invalid status.
/// - [VMStatus::Panic]: The VM is exited with a panic status.
/// - [VMStatus::Unfinished]: The VM is not yet exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VMStatus {
    Valid = 0,
    Invalid = 1,
    Panic = 2,
    Unfinished = 3,
}

impl VMStatus {
    /// Derives the status from a VM's exit flag and exit code.
    pub fn from_exit(exited: bool, exit_code: u8) -> Self {
        match (exited, exit_code) {
            (false, _) => VMStatus::Unfinished,
            (true, 0) => VMStatus::Valid,
            (true, 1) => VMStatus::Invalid,
            (true, _) => VMStatus::Panic,
        }
    }
}

/// Hashes a VM state witness into the claim committed to on-chain: `keccak256(witness)` with the
/// first byte replaced by the [VMStatus].
pub fn state_hash(witness: &[u8], status: VMStatus) -> Claim {
    let mut hash = keccak256(witness);
    hash[0] = status as u8;
    hash
}

/// The [PreimageKeyType] enum is the first byte of every preimage oracle key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreimageKeyType {
    Local = 1,
    Keccak256 = 2,
    GlobalGeneric = 3,
    Sha256 = 4,
    Blob = 5,
    Precompile = 6,
}

impl TryFrom<u8> for PreimageKeyType {
    type Error = FaultError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PreimageKeyType::Local),
            2 => Ok(PreimageKeyType::Keccak256),
            3 => Ok(PreimageKeyType::GlobalGeneric),
            4 => Ok(PreimageKeyType::Sha256),
            5 => Ok(PreimageKeyType::Blob),
            6 => Ok(PreimageKeyType::Precompile),
            _ => Err(FaultError::UnsupportedKeyType(value)),
        }
    }
}

impl PreimageKeyType {
    /// Turns a 32 byte hash into an oracle key of this type by overwriting its first byte.
    pub fn key(self, hash: B256) -> B256 {
        let mut key = hash;
        key[0] = self as u8;
        key
    }
}

/// The [PreimageOracleData] enum holds the preimage a VM step reads from the preimage oracle.
///
/// `data` always carries the 8 byte big-endian length prefix emitted by the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreimageOracleData {
    /// Data local to the game, such as its L1 head or the disputed output roots.
    Local { key: B256, data: Bytes, offset: u32 },
    /// A global keccak256 preimage.
    Keccak256 { key: B256, data: Bytes, offset: u32 },
    /// A global sha256 preimage.
    Sha256 { key: B256, data: Bytes, offset: u32 },
    /// A single field element of an EIP-4844 blob, along with the data needed to prove it.
    Blob {
        key: B256,
        data: Bytes,
        offset: u32,
        field_index: u64,
        commitment: FixedBytes<48>,
        kzg_proof: FixedBytes<48>,
    },
}

impl PreimageOracleData {
    /// Builds the preimage data for a non-blob key, dispatching on its key type byte.
    pub fn new(key: B256, data: Bytes, offset: u32) -> Result<Self, FaultError> {
        match PreimageKeyType::try_from(key[0])? {
            PreimageKeyType::Local => Ok(Self::Local { key, data, offset }),
            PreimageKeyType::Keccak256 => Ok(Self::Keccak256 { key, data, offset }),
            PreimageKeyType::Sha256 => Ok(Self::Sha256 { key, data, offset }),
            other => Err(FaultError::UnsupportedKeyType(other as u8)),
        }
    }

    pub fn key(&self) -> B256 {
        match self {
            Self::Local { key, .. }
            | Self::Keccak256 { key, .. }
            | Self::Sha256 { key, .. }
            | Self::Blob { key, .. } => *key,
        }
    }

    pub fn data(&self) -> &Bytes {
        match self {
            Self::Local { data, .. }
            | Self::Keccak256 { data, .. }
            | Self::Sha256 { data, .. }
            | Self::Blob { data, .. } => data,
        }
    }

    pub fn offset(&self) -> u32 {
        match self {
            Self::Local { offset, .. }
            | Self::Keccak256 { offset, .. }
            | Self::Sha256 { offset, .. }
            | Self::Blob { offset, .. } => *offset,
        }
    }

    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local { .. })
    }

    /// Returns the preimage with its 8 byte length prefix stripped.
    pub fn preimage_without_size(&self) -> &[u8] {
        self.data().get(8..).unwrap_or_default()
    }
}

/// The [StepWitness] struct holds what is needed to execute a single VM step on-chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepWitness {
    /// The encoded VM state before the step.
    pub pre_state: Bytes,
    /// The memory proof for the step.
    pub proof: Bytes,
    /// The preimage read during the step, if any.
    pub oracle: Option<PreimageOracleData>,
}

/// The [FaultAction] enum describes a single response the solver wants to make on-chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultAction {
    /// Post a new claim attacking or defending the parent claim.
    Move {
        parent_index: u32,
        parent_position: Position,
        is_attack: bool,
        value: Claim,
    },
    /// Execute a single VM step against a leaf claim.
    Step {
        parent_index: u32,
        parent_position: Position,
        is_attack: bool,
        pre_state: Bytes,
        proof: Bytes,
        oracle: Option<PreimageOracleData>,
    },
}

impl FaultAction {
    pub fn parent_index(&self) -> u32 {
        match self {
            Self::Move { parent_index, .. } | Self::Step { parent_index, .. } => *parent_index,
        }
    }

    pub fn parent_position(&self) -> Position {
        match self {
            Self::Move {
                parent_position, ..
            }
            | Self::Step {
                parent_position, ..
            } => *parent_position,
        }
    }

    pub fn is_attack(&self) -> bool {
        match self {
            Self::Move { is_attack, .. } | Self::Step { is_attack, .. } => *is_attack,
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, Self::Step { .. })
    }

    /// Returns the identity of the claim a [FaultAction::Move] would create. Steps create no claim.
    pub fn claim_id(&self) -> Option<ClaimId> {
        match self {
            Self::Move {
                parent_index,
                parent_position,
                is_attack,
                value,
            } => Some(ClaimId {
                position: parent_position.make_move(*is_attack),
                parent_index: *parent_index,
                value: *value,
            }),
            Self::Step { .. } => None,
        }
    }
}
