//! This module contains the [PreimageUploader]s that make step preimages available on-chain.

use crate::{
    contracts::{FaultDisputeGameContract, PreimageOracleContract, TxSender},
    FaultError, PreimageOracleData, PreimageUploader,
};
use anyhow::{bail, Result};
use std::sync::Arc;

/// The default size, in bytes, from which preimages go through the large preimage uploader.
pub const DEFAULT_LARGE_PREIMAGE_THRESHOLD: usize = 136_000;

/// The [SplitPreimageUploader] routes local and small preimages to a direct uploader and the rest
/// to a large preimage uploader.
pub struct SplitPreimageUploader {
    direct: Arc<dyn PreimageUploader>,
    large: Arc<dyn PreimageUploader>,
    threshold: usize,
}

impl SplitPreimageUploader {
    pub fn new(
        direct: Arc<dyn PreimageUploader>,
        large: Arc<dyn PreimageUploader>,
        threshold: usize,
    ) -> Self {
        Self {
            direct,
            large,
            threshold,
        }
    }
}

#[async_trait::async_trait]
impl PreimageUploader for SplitPreimageUploader {
    async fn upload_preimage(&self, claim_index: u64, data: &PreimageOracleData) -> Result<()> {
        if data.data().is_empty() {
            bail!(FaultError::NilPreimageData);
        }
        if data.is_local() || data.preimage_without_size().len() < self.threshold {
            self.direct.upload_preimage(claim_index, data).await
        } else {
            self.large.upload_preimage(claim_index, data).await
        }
    }
}

/// The [DirectPreimageUploader] loads a preimage part in a single transaction: local data through
/// the game, global data straight into the oracle.
pub struct DirectPreimageUploader {
    game: FaultDisputeGameContract,
    oracle: PreimageOracleContract,
    sender: Arc<dyn TxSender>,
}

impl DirectPreimageUploader {
    pub fn new(
        game: FaultDisputeGameContract,
        oracle: PreimageOracleContract,
        sender: Arc<dyn TxSender>,
    ) -> Self {
        Self {
            game,
            oracle,
            sender,
        }
    }
}

#[async_trait::async_trait]
impl PreimageUploader for DirectPreimageUploader {
    async fn upload_preimage(&self, claim_index: u64, data: &PreimageOracleData) -> Result<()> {
        if data.data().is_empty() {
            bail!(FaultError::NilPreimageData);
        }
        let tx = if data.is_local() {
            self.game.add_local_data_tx(claim_index, data)?
        } else {
            self.oracle.add_global_data_tx(data)?
        };
        tracing::debug!(
            target: "preimage",
            key = %data.key(),
            offset = data.offset(),
            claim_index,
            "uploading preimage"
        );
        self.sender.send_and_wait("populate pre-image oracle", tx).await
    }
}

/// The [LargePreimageUploader] would stream preimages too large for a single transaction through
/// the oracle's large preimage proposals. That flow is not supported.
#[derive(Debug, Default, Clone, Copy)]
pub struct LargePreimageUploader;

#[async_trait::async_trait]
impl PreimageUploader for LargePreimageUploader {
    async fn upload_preimage(&self, _: u64, data: &PreimageOracleData) -> Result<()> {
        if data.data().is_empty() {
            bail!(FaultError::NilPreimageData);
        }
        bail!(FaultError::NotSupported)
    }
}
