//! This module contains the JSON-RPC clients used by the output root providers and the agent: the
//! rollup node, for output roots and sync status, and execution nodes, for L1 and L2 blocks.

use alloy_primitives::{B256, U64};
use alloy_rpc_client::RpcClient;
use alloy_transport::TransportResult;
use alloy_transport_http::Http;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use url::Url;

/// An [OutputRollupClient] reads L2 output roots and sync progress from a rollup node.
#[async_trait::async_trait]
pub trait OutputRollupClient: Send + Sync {
    /// Returns the output root of the given L2 block.
    async fn output_at_block(&self, block_number: u64) -> Result<B256>;

    /// Returns the number of the L2 safe head derived from L1 data up to the given L1 block.
    async fn safe_head_at_l1_block(&self, l1_block_number: u64) -> Result<u64>;

    /// Returns the number of the L1 block the rollup node has processed up to.
    async fn current_l1(&self) -> Result<u64>;
}

/// An [L2HeaderSource] reads L2 block hashes.
#[async_trait::async_trait]
pub trait L2HeaderSource: Send + Sync {
    async fn block_hash(&self, block_number: u64) -> Result<B256>;
}

/// An [L1Clock] reads the canonical L1 chain. Games are anchored to an L1 block, and a change of
/// that block's hash means the chain reorganised under the game.
#[async_trait::async_trait]
pub trait L1Clock: Send + Sync {
    /// Returns the latest L1 block.
    async fn head(&self) -> Result<L1BlockRef>;

    /// Returns the hash of the canonical L1 block with the given number.
    async fn block_hash(&self, block_number: u64) -> Result<B256>;
}

/// An L1 block's identity and time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct L1BlockRef {
    pub hash: B256,
    pub number: u64,
    pub timestamp: u64,
}

/// A block hash and number pair, as returned by the rollup node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockId {
    pub hash: B256,
    pub number: u64,
}

/// A minified response of the `optimism_outputAtBlock` RPC method from the rollup node, containing only the output root
/// requested.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputAtBlockResponse {
    pub output_root: B256,
}

/// The response of the `optimism_safeHeadAtL1Block` RPC method.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafeHeadResponse {
    pub l1_block: BlockId,
    pub safe_head: BlockId,
}

/// A minified response of the `optimism_syncStatus` RPC method.
#[derive(Debug, Serialize, Deserialize)]
pub struct SyncStatusResponse {
    pub current_l1: BlockId,
}

/// A minified response of `eth_getBlockByNumber`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BlockHeaderResponse {
    pub hash: B256,
    pub number: U64,
    pub timestamp: U64,
}

impl From<BlockHeaderResponse> for L1BlockRef {
    fn from(header: BlockHeaderResponse) -> Self {
        Self {
            hash: header.hash,
            number: header.number.to(),
            timestamp: header.timestamp.to(),
        }
    }
}

/// The [RollupNodeClient] is an [OutputRollupClient] backed by a rollup node's JSON-RPC API.
pub struct RollupNodeClient {
    rpc_client: RpcClient<Http<Client>>,
}

impl RollupNodeClient {
    pub fn try_new(rollup_rpc_url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(rollup_rpc_url.as_ref()).context("invalid rollup rpc url")?;
        Ok(Self {
            rpc_client: RpcClient::builder().http(url),
        })
    }
}

#[async_trait::async_trait]
impl OutputRollupClient for RollupNodeClient {
    async fn output_at_block(&self, block_number: u64) -> Result<B256> {
        let result: TransportResult<OutputAtBlockResponse> = self
            .rpc_client
            .request("optimism_outputAtBlock", (U64::from(block_number),))
            .await;
        Ok(result
            .with_context(|| format!("fetching output at block {block_number}"))?
            .output_root)
    }

    async fn safe_head_at_l1_block(&self, l1_block_number: u64) -> Result<u64> {
        let result: TransportResult<SafeHeadResponse> = self
            .rpc_client
            .request("optimism_safeHeadAtL1Block", (U64::from(l1_block_number),))
            .await;
        Ok(result
            .with_context(|| format!("fetching safe head at L1 block {l1_block_number}"))?
            .safe_head
            .number)
    }

    async fn current_l1(&self) -> Result<u64> {
        let result: TransportResult<SyncStatusResponse> =
            self.rpc_client.request("optimism_syncStatus", ()).await;
        Ok(result.context("fetching sync status")?.current_l1.number)
    }
}

/// The [EthRpcClient] reads blocks from an execution node's JSON-RPC API. Pointed at an L2 node it
/// is an [L2HeaderSource], pointed at an L1 node an [L1Clock].
pub struct EthRpcClient {
    rpc_client: RpcClient<Http<Client>>,
}

impl EthRpcClient {
    pub fn try_new(rpc_url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(rpc_url.as_ref()).context("invalid execution rpc url")?;
        Ok(Self {
            rpc_client: RpcClient::builder().http(url),
        })
    }

    async fn header<P>(&self, block: P, name: &str) -> Result<BlockHeaderResponse>
    where
        P: Serialize + Clone + std::fmt::Debug + Send + Sync + Unpin + 'static,
    {
        let result: TransportResult<Option<BlockHeaderResponse>> = self
            .rpc_client
            .request("eth_getBlockByNumber", (block, false))
            .await;
        result
            .with_context(|| format!("fetching block {name}"))?
            .with_context(|| format!("block {name} not found"))
    }
}

#[async_trait::async_trait]
impl L2HeaderSource for EthRpcClient {
    async fn block_hash(&self, block_number: u64) -> Result<B256> {
        let header = self
            .header(U64::from(block_number), &block_number.to_string())
            .await?;
        Ok(header.hash)
    }
}

#[async_trait::async_trait]
impl L1Clock for EthRpcClient {
    async fn head(&self) -> Result<L1BlockRef> {
        Ok(self.header("latest", "latest").await?.into())
    }

    async fn block_hash(&self, block_number: u64) -> Result<B256> {
        let header = self
            .header(U64::from(block_number), &block_number.to_string())
            .await?;
        Ok(header.hash)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_rollup_responses() {
        let output: OutputAtBlockResponse = serde_json::from_str(
            r#"{"version":"0x00","outputRoot":"0x1111111111111111111111111111111111111111111111111111111111111111","blockRef":{}}"#,
        )
        .unwrap();
        assert_eq!(output.output_root, B256::repeat_byte(0x11));

        let safe_head: SafeHeadResponse = serde_json::from_str(
            r#"{"l1Block":{"hash":"0x2222222222222222222222222222222222222222222222222222222222222222","number":100},"safeHead":{"hash":"0x3333333333333333333333333333333333333333333333333333333333333333","number":42}}"#,
        )
        .unwrap();
        assert_eq!(safe_head.safe_head.number, 42);
        assert_eq!(safe_head.l1_block.number, 100);

        let status: SyncStatusResponse = serde_json::from_str(
            r#"{"current_l1":{"hash":"0x4444444444444444444444444444444444444444444444444444444444444444","number":7,"parentHash":"0x","timestamp":1},"head_l1":{}}"#,
        )
        .unwrap();
        assert_eq!(status.current_l1.number, 7);

        let header: BlockHeaderResponse = serde_json::from_str(
            r#"{"hash":"0x5555555555555555555555555555555555555555555555555555555555555555","number":"0x1b4","timestamp":"0x65f1c2a0","parentHash":"0x"}"#,
        )
        .unwrap();
        assert_eq!(
            L1BlockRef::from(header),
            L1BlockRef {
                hash: B256::repeat_byte(0x55),
                number: 436,
                timestamp: 0x65f1c2a0,
            }
        );
    }

    #[test]
    fn rejects_invalid_urls() {
        assert!(RollupNodeClient::try_new("not a url").is_err());
        assert!(EthRpcClient::try_new("http://localhost:9545").is_ok());
    }
}
