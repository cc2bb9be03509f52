//! This module contains the [DiskKv], the preimage store the op-program server fills while the VM
//! runs.

use crate::PreimageSource;
use alloy_primitives::{hex, Bytes, B256};
use anyhow::{anyhow, Context, Result};
use std::{io::ErrorKind, path::PathBuf};

/// The [DiskKv] stores each preimage as a hex encoded `{key}.txt` file in a single directory.
#[derive(Debug, Clone)]
pub struct DiskKv {
    dir: PathBuf,
}

impl DiskKv {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path(&self, key: B256) -> PathBuf {
        self.dir.join(format!("{}.txt", hex::encode(key)))
    }

    pub async fn put(&self, key: B256, value: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.path(key), hex::encode(value))
            .await
            .with_context(|| format!("writing preimage {key}"))
    }
}

#[async_trait::async_trait]
impl PreimageSource for DiskKv {
    async fn get(&self, key: B256) -> Result<Bytes> {
        let encoded = match tokio::fs::read_to_string(self.path(key)).await {
            Ok(encoded) => encoded,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(anyhow!("preimage {key} not found"))
            }
            Err(e) => return Err(e).with_context(|| format!("reading preimage {key}")),
        };
        let value =
            hex::decode(encoded.trim()).with_context(|| format!("decoding preimage {key}"))?;
        Ok(value.into())
    }
}
