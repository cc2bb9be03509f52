//! This module contains the [PreimageLoader], which turns the oracle fields of a proof file into
//! the [PreimageOracleData] a step needs uploaded.

use super::kzg::{self, BYTES_PER_BLOB, BYTES_PER_FIELD_ELEMENT, FIELD_ELEMENTS_PER_BLOB};
use crate::{
    proofs::ProofData, FaultError, PreimageKeyType, PreimageOracleData, PreimageSource,
};
use alloy_primitives::{hex, FixedBytes, B256};
use anyhow::{anyhow, bail, Result};
use std::sync::Arc;

/// The hint type the program sends before reading a blob field element.
const HINT_L1_BLOB: &str = "l1-blob";

/// The [PreimageLoader] resolves the preimage read by a step, reconstructing and proving the blob
/// when the step reads a blob field element.
#[derive(Clone)]
pub struct PreimageLoader {
    source: Arc<dyn PreimageSource>,
}

impl PreimageLoader {
    pub fn new(source: Arc<dyn PreimageSource>) -> Self {
        Self { source }
    }

    /// Returns the preimage read by the step of `proof`, or [None] if the step reads nothing.
    pub async fn load_oracle(&self, proof: &ProofData) -> Result<Option<PreimageOracleData>> {
        let Some(key) = proof.oracle_key.as_ref().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };
        if key.len() != 32 {
            bail!("invalid oracle key length {}", key.len());
        }
        let key = B256::from_slice(key);
        let data = proof.oracle_value.clone().unwrap_or_default();

        if PreimageKeyType::try_from(key[0])? == PreimageKeyType::Blob {
            let hint = proof.last_hint.as_deref().unwrap_or_default();
            return self.load_blob(hint, key, data, proof.oracle_offset).await.map(Some);
        }
        Ok(Some(PreimageOracleData::new(key, data, proof.oracle_offset)?))
    }

    async fn load_blob(
        &self,
        hint: &str,
        key: B256,
        data: alloy_primitives::Bytes,
        offset: u32,
    ) -> Result<PreimageOracleData> {
        let versioned_hash = parse_blob_hint(hint)?;

        let commitment = self
            .source
            .get(PreimageKeyType::Sha256.key(versioned_hash))
            .await?;
        if commitment.len() != 48 {
            bail!(FaultError::InvalidBlobKeyPreimage);
        }
        let commitment = FixedBytes::<48>::from_slice(&commitment);
        if kzg::versioned_hash(&commitment) != versioned_hash {
            bail!(FaultError::InvalidBlobCommitment);
        }

        let mut blob = vec![0u8; BYTES_PER_BLOB];
        let mut field_index = None;
        for i in 0..FIELD_ELEMENTS_PER_BLOB {
            let element_key = kzg::field_element_key(&commitment, i);
            if element_key == key {
                if field_index.is_some() {
                    bail!(FaultError::NoMatchingFieldElement);
                }
                field_index = Some(i);
            }
            let element = self.source.get(element_key).await?;
            if element.len() != BYTES_PER_FIELD_ELEMENT {
                bail!("invalid field element {i} of length {}", element.len());
            }
            let start = i as usize * BYTES_PER_FIELD_ELEMENT;
            blob[start..start + BYTES_PER_FIELD_ELEMENT].copy_from_slice(&element);
        }
        let field_index = field_index.ok_or(FaultError::NoMatchingFieldElement)?;

        if kzg::blob_commitment(&blob)? != commitment {
            bail!(FaultError::InvalidBlobCommitment);
        }
        let (kzg_proof, y) = kzg::compute_proof(&blob, field_index)?;
        if data.get(8..) != Some(y.as_slice()) {
            bail!(FaultError::InvalidScalarValue);
        }
        if !kzg::verify_proof(&commitment, field_index, y, &kzg_proof)? {
            bail!("kzg proof for field element {field_index} failed verification");
        }

        tracing::debug!(target: "preimage", %key, field_index, "reconstructed blob field element");
        Ok(PreimageOracleData::Blob {
            key,
            data,
            offset,
            field_index,
            commitment,
            kzg_proof,
        })
    }
}

/// Extracts the versioned hash from an `l1-blob` hint of the form `l1-blob 0x<hash><timestamp>`.
fn parse_blob_hint(hint: &str) -> Result<B256> {
    let invalid = || anyhow!(FaultError::InvalidHint(hint.to_string()));
    let (kind, payload) = hint.split_once(' ').ok_or_else(invalid)?;
    if kind != HINT_L1_BLOB {
        return Err(invalid());
    }
    let payload = hex::decode(payload).map_err(|_| invalid())?;
    if payload.len() < 32 {
        return Err(invalid());
    }
    Ok(B256::from_slice(&payload[..32]))
}
