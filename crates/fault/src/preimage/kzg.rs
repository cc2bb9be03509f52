//! EIP-4844 blob helpers: field element keys, versioned hashes and KZG proofs over the Ethereum
//! trusted setup.

use crate::PreimageKeyType;
use alloy_primitives::{keccak256, uint, FixedBytes, B256, U256};
use anyhow::{anyhow, Result};
use c_kzg::{Blob, Bytes32, Bytes48, KzgCommitment, KzgProof};
use sha2::{Digest, Sha256};

pub const FIELD_ELEMENTS_PER_BLOB: u64 = 4096;
pub const BYTES_PER_FIELD_ELEMENT: usize = 32;
pub const BYTES_PER_BLOB: usize = FIELD_ELEMENTS_PER_BLOB as usize * BYTES_PER_FIELD_ELEMENT;

/// The order of the BLS12-381 scalar field.
pub const BLS_MODULUS: U256 =
    uint!(0x73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001_U256);

/// Generator of the multiplicative group of the scalar field.
const PRIMITIVE_ROOT: u64 = 7;

const VERSIONED_HASH_VERSION_KZG: u8 = 1;

/// Returns the evaluation point of field element `field_index`: the bit-reversed
/// `field_index`-th power of the 4096th root of unity.
pub fn root_of_unity(field_index: u64) -> U256 {
    let order = U256::from(FIELD_ELEMENTS_PER_BLOB);
    let omega = U256::from(PRIMITIVE_ROOT)
        .pow_mod((BLS_MODULUS - U256::from(1u8)) / order, BLS_MODULUS);
    let exponent = bit_reverse(field_index % FIELD_ELEMENTS_PER_BLOB);
    omega.pow_mod(U256::from(exponent), BLS_MODULUS)
}

fn bit_reverse(index: u64) -> u64 {
    let bits = FIELD_ELEMENTS_PER_BLOB.trailing_zeros();
    index.reverse_bits() >> (u64::BITS - bits)
}

/// Returns the versioned hash of a KZG commitment.
pub fn versioned_hash(commitment: &FixedBytes<48>) -> B256 {
    let mut hash = B256::from_slice(&Sha256::digest(commitment.as_slice()));
    hash[0] = VERSIONED_HASH_VERSION_KZG;
    hash
}

/// Returns the oracle key of field element `index` of the blob committed to by `commitment`:
/// the blob key of `keccak256(commitment ‖ z)`, with `z` the element's [root_of_unity]. The oracle
/// contract derives the same key from the `z` it is given.
pub fn field_element_key(commitment: &FixedBytes<48>, index: u64) -> B256 {
    let mut preimage = [0u8; 80];
    preimage[..48].copy_from_slice(commitment.as_slice());
    preimage[48..].copy_from_slice(&root_of_unity(index).to_be_bytes::<32>());
    PreimageKeyType::Blob.key(keccak256(preimage))
}

/// Computes the KZG commitment of a blob.
pub fn blob_commitment(blob: &[u8]) -> Result<FixedBytes<48>> {
    let blob = Blob::from_bytes(blob).map_err(|e| anyhow!("invalid blob: {e:?}"))?;
    let commitment = KzgCommitment::blob_to_kzg_commitment(&blob, c_kzg::ethereum_kzg_settings())
        .map_err(|e| anyhow!("computing commitment: {e:?}"))?;
    Ok(FixedBytes::from_slice(commitment.to_bytes().as_slice()))
}

/// Computes the KZG proof of the blob's evaluation at the point of field element `field_index`,
/// returning the proof and the evaluation.
pub fn compute_proof(blob: &[u8], field_index: u64) -> Result<(FixedBytes<48>, B256)> {
    let blob = Blob::from_bytes(blob).map_err(|e| anyhow!("invalid blob: {e:?}"))?;
    let z = Bytes32::from_bytes(&root_of_unity(field_index).to_be_bytes::<32>())
        .map_err(|e| anyhow!("{e:?}"))?;
    let (proof, y) = KzgProof::compute_kzg_proof(&blob, &z, c_kzg::ethereum_kzg_settings())
        .map_err(|e| anyhow!("computing proof: {e:?}"))?;
    Ok((
        FixedBytes::from_slice(proof.to_bytes().as_slice()),
        B256::from_slice(y.as_slice()),
    ))
}

/// Verifies that `proof` opens `commitment` to `y` at the point of field element `field_index`.
pub fn verify_proof(
    commitment: &FixedBytes<48>,
    field_index: u64,
    y: B256,
    proof: &FixedBytes<48>,
) -> Result<bool> {
    let to_48 =
        |b: &FixedBytes<48>| Bytes48::from_bytes(b.as_slice()).map_err(|e| anyhow!("{e:?}"));
    let z = Bytes32::from_bytes(&root_of_unity(field_index).to_be_bytes::<32>())
        .map_err(|e| anyhow!("{e:?}"))?;
    let y = Bytes32::from_bytes(y.as_slice()).map_err(|e| anyhow!("{e:?}"))?;
    KzgProof::verify_kzg_proof(
        &to_48(commitment)?,
        &z,
        &y,
        &to_48(proof)?,
        c_kzg::ethereum_kzg_settings(),
    )
    .map_err(|e| anyhow!("verifying proof: {e:?}"))
}
