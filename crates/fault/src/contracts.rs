//! The contracts module encodes calls to the `FaultDisputeGame` and `PreimageOracle` contracts
//! into transaction candidates. Signing and sending them is left to a [TxSender].

use crate::PreimageOracleData;
use alloy_primitives::{Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolCall};
use anyhow::{bail, Result};

sol! {
    interface IFaultDisputeGame {
        function attack(uint256 parentIndex, bytes32 claim) external payable;
        function defend(uint256 parentIndex, bytes32 claim) external payable;
        function step(uint256 claimIndex, bool isAttack, bytes stateData, bytes proof) external;
        function addLocalData(uint256 ident, uint256 execLeafIdx, uint256 partOffset) external;
        function resolve() external returns (uint8 status);
    }

    interface IPreimageOracle {
        function loadKeccak256PreimagePart(uint256 partOffset, bytes preimage) external;
        function loadSha256PreimagePart(uint256 partOffset, bytes preimage) external;
        function loadBlobPreimagePart(
            uint256 z,
            uint256 y,
            bytes commitment,
            bytes proof,
            uint256 partOffset
        ) external;
    }
}

/// A transaction to be signed and sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxCandidate {
    pub to: Address,
    pub data: Bytes,
    pub value: U256,
}

impl TxCandidate {
    fn call(to: Address, call: impl SolCall) -> Self {
        Self {
            to,
            data: call.abi_encode().into(),
            value: U256::ZERO,
        }
    }
}

/// A [TxSender] signs and sends a [TxCandidate], returning once it is mined. A reverted
/// transaction is an error.
#[async_trait::async_trait]
pub trait TxSender: Send + Sync {
    async fn send_and_wait(&self, purpose: &str, candidate: TxCandidate) -> Result<()>;
}

/// Encodes calls to a single `FaultDisputeGame`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultDisputeGameContract {
    pub address: Address,
}

impl FaultDisputeGameContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    pub fn attack_tx(&self, parent_index: u32, claim: B256, bond: U256) -> TxCandidate {
        let call = IFaultDisputeGame::attackCall {
            parentIndex: U256::from(parent_index),
            claim,
        };
        TxCandidate {
            value: bond,
            ..TxCandidate::call(self.address, call)
        }
    }

    pub fn defend_tx(&self, parent_index: u32, claim: B256, bond: U256) -> TxCandidate {
        let call = IFaultDisputeGame::defendCall {
            parentIndex: U256::from(parent_index),
            claim,
        };
        TxCandidate {
            value: bond,
            ..TxCandidate::call(self.address, call)
        }
    }

    pub fn step_tx(
        &self,
        claim_index: u32,
        is_attack: bool,
        state_data: Bytes,
        proof: Bytes,
    ) -> TxCandidate {
        let call = IFaultDisputeGame::stepCall {
            claimIndex: U256::from(claim_index),
            isAttack: is_attack,
            stateData: state_data,
            proof,
        };
        TxCandidate::call(self.address, call)
    }

    /// Loads a local preimage part into the oracle through the game, which owns its local data.
    pub fn add_local_data_tx(
        &self,
        claim_index: u64,
        data: &PreimageOracleData,
    ) -> Result<TxCandidate> {
        if !data.is_local() {
            bail!("{:?} is not local data", data.key());
        }
        let call = IFaultDisputeGame::addLocalDataCall {
            ident: U256::from_be_slice(&data.key()[1..]),
            execLeafIdx: U256::from(claim_index),
            partOffset: U256::from(data.offset()),
        };
        Ok(TxCandidate::call(self.address, call))
    }

    pub fn resolve_tx(&self) -> TxCandidate {
        TxCandidate::call(self.address, IFaultDisputeGame::resolveCall {})
    }
}

/// Encodes calls to the `PreimageOracle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreimageOracleContract {
    pub address: Address,
}

impl PreimageOracleContract {
    pub fn new(address: Address) -> Self {
        Self { address }
    }

    /// Loads a part of a global preimage into the oracle.
    pub fn add_global_data_tx(&self, data: &PreimageOracleData) -> Result<TxCandidate> {
        let tx = match data {
            PreimageOracleData::Keccak256 { offset, .. } => {
                let call = IPreimageOracle::loadKeccak256PreimagePartCall {
                    partOffset: U256::from(*offset),
                    preimage: Bytes::copy_from_slice(data.preimage_without_size()),
                };
                TxCandidate::call(self.address, call)
            }
            PreimageOracleData::Sha256 { offset, .. } => {
                let call = IPreimageOracle::loadSha256PreimagePartCall {
                    partOffset: U256::from(*offset),
                    preimage: Bytes::copy_from_slice(data.preimage_without_size()),
                };
                TxCandidate::call(self.address, call)
            }
            PreimageOracleData::Blob {
                offset,
                field_index,
                commitment,
                kzg_proof,
                ..
            } => {
                let call = IPreimageOracle::loadBlobPreimagePartCall {
                    z: crate::preimage::root_of_unity(*field_index),
                    y: U256::from_be_slice(data.preimage_without_size()),
                    commitment: Bytes::copy_from_slice(commitment.as_slice()),
                    proof: Bytes::copy_from_slice(kzg_proof.as_slice()),
                    partOffset: U256::from(*offset),
                };
                TxCandidate::call(self.address, call)
            }
            PreimageOracleData::Local { .. } => bail!("local data is loaded through the game"),
        };
        Ok(tx)
    }
}
