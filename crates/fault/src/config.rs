//! The `config` module contains the [VmConfig] used to run the fault proof VM and the
//! [AgentConfig] of a game's [crate::Agent].

use crate::{
    preimage::{SplitPreimageUploader, DEFAULT_LARGE_PREIMAGE_THRESHOLD},
    providers::{ProviderCache, DEFAULT_PROVIDER_CACHE_SIZE},
    PreimageUploader,
};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, sync::Arc, time::Duration};

/// The [VmConfig] struct describes how to invoke the VM and the program server it runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VmConfig {
    /// The VM binary.
    pub vm_bin: PathBuf,
    /// The program server binary run inside the VM.
    pub server: PathBuf,
    /// A named network, used instead of `rollup_config` and `l2_genesis`.
    pub network: Option<String>,
    pub rollup_config: Option<PathBuf>,
    pub l2_genesis: Option<PathBuf>,
    pub l1_rpc: String,
    pub l1_beacon: String,
    pub l2_rpc: String,
    /// Steps between state snapshots.
    pub snapshot_freq: u64,
    /// Steps between progress logs.
    pub info_freq: u64,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            vm_bin: PathBuf::new(),
            server: PathBuf::new(),
            network: None,
            rollup_config: None,
            l2_genesis: None,
            l1_rpc: String::new(),
            l1_beacon: String::new(),
            l2_rpc: String::new(),
            snapshot_freq: 1_000_000_000,
            info_freq: 10_000_000,
        }
    }
}

/// The [AgentConfig] struct holds the per-game settings of an [crate::Agent].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AgentConfig {
    /// Whether the honest actor supports the proposed output root.
    pub agree_with_proposed_output: bool,
    /// Timeout for each RPC read, in seconds.
    pub rpc_timeout: u64,
    /// Preimages of at least this many bytes go through the large preimage uploader.
    pub large_preimage_threshold: usize,
    /// Number of bottom game providers kept per game.
    pub provider_cache_size: usize,
}

impl AgentConfig {
    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout)
    }

    /// Builds the cache of bottom game providers of one game.
    pub fn provider_cache(&self) -> Arc<ProviderCache> {
        Arc::new(ProviderCache::new(self.provider_cache_size))
    }

    /// Builds the uploader sending preimages of at least `large_preimage_threshold` bytes to
    /// `large` and everything else to `direct`.
    pub fn preimage_uploader(
        &self,
        direct: Arc<dyn PreimageUploader>,
        large: Arc<dyn PreimageUploader>,
    ) -> SplitPreimageUploader {
        SplitPreimageUploader::new(direct, large, self.large_preimage_threshold)
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agree_with_proposed_output: true,
            rpc_timeout: 30,
            large_preimage_threshold: DEFAULT_LARGE_PREIMAGE_THRESHOLD,
            provider_cache_size: DEFAULT_PROVIDER_CACHE_SIZE,
        }
    }
}
