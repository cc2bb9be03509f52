//! The proofs module holds the on-disk formats written by the VM and the per-game trace
//! directories: proof files, VM states and the last-step cache.

use crate::{state_hash, VMStatus};
use alloy_primitives::{Bytes, B256};
use anyhow::{Context, Result};
use flate2::{read::GzDecoder, write::GzEncoder, Compression};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::{
    io::{ErrorKind, Read, Write},
    path::{Path, PathBuf},
};

/// Directory holding the proof files of a trace.
pub const PROOFS_DIR: &str = "proofs";
/// Directory holding the VM snapshots of a trace.
pub const SNAPSHOTS_DIR: &str = "snapshots";
/// Directory holding the preimages fetched while executing a trace.
pub const PREIMAGES_DIR: &str = "preimages";
/// File holding the final VM state of a trace.
pub const FINAL_STATE: &str = "final.json.gz";
/// File caching the last step of a trace.
pub const LAST_STEP_STATE: &str = "state.json.gz";

/// The [ProofData] struct is a proof file written by the VM for a single step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData {
    /// The state hash after the step.
    #[serde(rename = "post", default)]
    pub claim_value: B256,
    /// The encoded VM state before the step.
    #[serde(rename = "state-data", default)]
    pub state_data: Bytes,
    #[serde(rename = "proof-data", default)]
    pub proof_data: Bytes,
    #[serde(rename = "oracle-key", default, skip_serializing_if = "Option::is_none")]
    pub oracle_key: Option<Bytes>,
    #[serde(rename = "oracle-value", default, skip_serializing_if = "Option::is_none")]
    pub oracle_value: Option<Bytes>,
    #[serde(rename = "oracle-offset", default)]
    pub oracle_offset: u32,
    /// The last hint the program sent to the host before the step.
    #[serde(rename = "last-hint", default, skip_serializing_if = "Option::is_none")]
    pub last_hint: Option<String>,
}

/// The [VmState] struct is the subset of a VM state file the challenger reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmState {
    #[serde(default)]
    pub step: u64,
    #[serde(default)]
    pub exited: bool,
    #[serde(default)]
    pub exit: u8,
    /// The state encoded the way the on-chain VM hashes it.
    #[serde(default)]
    pub witness: Bytes,
}

impl VmState {
    pub fn status(&self) -> VMStatus {
        VMStatus::from_exit(self.exited, self.exit)
    }

    pub fn state_hash(&self) -> B256 {
        state_hash(&self.witness, self.status())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct LastStep {
    step: u64,
}

/// Returns the path of the proof file for `step` within `dir`.
pub fn proof_path(dir: &Path, step: u64) -> PathBuf {
    dir.join(PROOFS_DIR).join(format!("{step}.json.gz"))
}

/// Reads a JSON file, transparently decompressing it when its name ends in `.gz`. Returns
/// [None] if the file does not exist.
pub async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let raw = match tokio::fs::read(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("reading {}", path.display())),
    };
    let json = if path.extension().is_some_and(|ext| ext == "gz") {
        let mut json = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut json)
            .with_context(|| format!("decompressing {}", path.display()))?;
        json
    } else {
        raw
    };
    let value = serde_json::from_slice(&json)
        .with_context(|| format!("decoding {}", path.display()))?;
    Ok(Some(value))
}

/// Writes a value as JSON, compressing it when the file name ends in `.gz`.
pub async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec(value)?;
    let bytes = if path.extension().is_some_and(|ext| ext == "gz") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json)?;
        encoder.finish()?
    } else {
        json
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

/// Reads the cached last step of the trace in `dir`.
pub async fn read_last_step(dir: &Path) -> Result<Option<u64>> {
    let last: Option<LastStep> = read_json(&dir.join(LAST_STEP_STATE)).await?;
    Ok(last.map(|l| l.step))
}

/// Caches `step` as the last step of the trace in `dir`, together with its proof.
pub async fn write_last_step(dir: &Path, proof: &ProofData, step: u64) -> Result<()> {
    write_json(&proof_path(dir, step), proof).await?;
    write_json(&dir.join(LAST_STEP_STATE), &LastStep { step }).await
}

#[cfg(test)]
mod test {
    use super::*;
    use alloy_primitives::bytes;

    #[test]
    fn proof_file_schema() {
        let proof: ProofData = serde_json::from_str(
            r#"{
                "post": "0x0100000000000000000000000000000000000000000000000000000000000001",
                "state-data": "0x1234",
                "proof-data": "0x",
                "oracle-key": "0x02aa",
                "oracle-value": "0x0000000000000001ff",
                "oracle-offset": 4,
                "last-hint": "l1-blob 0x01",
                "step": 12
            }"#,
        )
        .unwrap();
        assert_eq!(proof.state_data, bytes!("1234"));
        assert!(proof.proof_data.is_empty());
        assert_eq!(proof.oracle_key, Some(bytes!("02aa")));
        assert_eq!(proof.oracle_offset, 4);
        assert_eq!(proof.last_hint.as_deref(), Some("l1-blob 0x01"));

        let minimal: ProofData = serde_json::from_str(
            r#"{"post": "0x0000000000000000000000000000000000000000000000000000000000000001"}"#,
        )
        .unwrap();
        assert!(minimal.oracle_key.is_none());
        assert!(minimal.state_data.is_empty());
    }

    #[tokio::test]
    async fn compressed_round_trip_and_last_step() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_last_step(dir.path()).await.unwrap(), None);

        let proof = ProofData {
            claim_value: B256::repeat_byte(3),
            state_data: bytes!("aabb"),
            ..Default::default()
        };
        write_last_step(dir.path(), &proof, 41).await.unwrap();
        assert_eq!(read_last_step(dir.path()).await.unwrap(), Some(41));

        let read: ProofData = read_json(&proof_path(dir.path(), 41)).await.unwrap().unwrap();
        assert_eq!(read, proof);

        let raw = std::fs::read(proof_path(dir.path(), 41)).unwrap();
        assert_eq!(&raw[..2], &[0x1f, 0x8b]);
    }

    #[test]
    fn vm_state_hash() {
        let state = VmState {
            step: 10,
            exited: true,
            exit: 0,
            witness: bytes!("00112233"),
        };
        assert_eq!(state.state_hash()[0], VMStatus::Valid as u8);
    }
}
