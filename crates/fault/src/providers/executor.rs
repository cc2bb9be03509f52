//! This module contains the [VmExecutor], which runs `cannon` to write the proof file of a step.

use crate::{
    config::VmConfig,
    proofs::{FINAL_STATE, PREIMAGES_DIR, PROOFS_DIR, SNAPSHOTS_DIR},
    providers::ProofGenerator,
};
use alloy_primitives::B256;
use anyhow::{bail, Context, Result};
use std::{
    path::{Path, PathBuf},
    process::Stdio,
    time::Instant,
};
use tokio::process::Command;

/// The [LocalGameInputs] struct holds the inputs of a bottom game that the program reads as local
/// preimages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalGameInputs {
    pub l1_head: B256,
    /// The hash of the L2 block the agreed output root commits to.
    pub l2_head: B256,
    /// The agreed output root.
    pub l2_output_root: B256,
    /// The disputed output root.
    pub l2_claim: B256,
    /// The L2 block the disputed output root commits to.
    pub l2_block_number: u64,
}

/// The [VmExecutor] is a [ProofGenerator] that runs the VM binary with the op-program server as
/// its preimage host.
pub struct VmExecutor {
    config: VmConfig,
    prestate: PathBuf,
    inputs: LocalGameInputs,
}

impl VmExecutor {
    pub fn new(config: VmConfig, prestate: impl Into<PathBuf>, inputs: LocalGameInputs) -> Self {
        Self {
            config,
            prestate: prestate.into(),
            inputs,
        }
    }

    /// Builds the VM arguments for running from `start` until the proof of `step` is written.
    pub fn args(&self, dir: &Path, start: &Path, step: u64) -> Vec<String> {
        let path = |p: PathBuf| p.to_string_lossy().into_owned();
        let mut args = vec![
            "run".to_string(),
            "--input".to_string(),
            path(start.to_path_buf()),
            "--output".to_string(),
            path(dir.join(FINAL_STATE)),
            "--meta".to_string(),
            String::new(),
            "--info-at".to_string(),
            format!("%{}", self.config.info_freq),
            "--proof-at".to_string(),
            format!("={step}"),
            "--proof-fmt".to_string(),
            path(dir.join(PROOFS_DIR).join("%d.json.gz")),
            "--snapshot-at".to_string(),
            format!("%{}", self.config.snapshot_freq),
            "--snapshot-fmt".to_string(),
            path(dir.join(SNAPSHOTS_DIR).join("%d.json.gz")),
            "--stop-at".to_string(),
            format!("={}", step + 1),
            "--".to_string(),
            path(self.config.server.clone()),
            "--server".to_string(),
            "--l1".to_string(),
            self.config.l1_rpc.clone(),
            "--l1.beacon".to_string(),
            self.config.l1_beacon.clone(),
            "--l2".to_string(),
            self.config.l2_rpc.clone(),
            "--datadir".to_string(),
            path(dir.join(PREIMAGES_DIR)),
            "--l1.head".to_string(),
            self.inputs.l1_head.to_string(),
            "--l2.head".to_string(),
            self.inputs.l2_head.to_string(),
            "--l2.outputroot".to_string(),
            self.inputs.l2_output_root.to_string(),
            "--l2.claim".to_string(),
            self.inputs.l2_claim.to_string(),
            "--l2.blocknumber".to_string(),
            self.inputs.l2_block_number.to_string(),
        ];
        if let Some(network) = &self.config.network {
            args.extend(["--network".to_string(), network.clone()]);
        }
        if let Some(rollup_config) = &self.config.rollup_config {
            args.extend(["--rollup.config".to_string(), path(rollup_config.clone())]);
        }
        if let Some(l2_genesis) = &self.config.l2_genesis {
            args.extend(["--l2.genesis".to_string(), path(l2_genesis.clone())]);
        }
        args
    }
}

#[async_trait::async_trait]
impl ProofGenerator for VmExecutor {
    async fn generate_proof(&self, dir: &Path, step: u64) -> Result<()> {
        let start = find_starting_snapshot(&dir.join(SNAPSHOTS_DIR), &self.prestate, step).await?;
        for sub in [SNAPSHOTS_DIR, PREIMAGES_DIR, PROOFS_DIR] {
            tokio::fs::create_dir_all(dir.join(sub)).await?;
        }

        tracing::info!(
            target: "executor",
            step,
            start = %start.display(),
            dir = %dir.display(),
            "generating proof"
        );
        let started = Instant::now();
        let status = Command::new(&self.config.vm_bin)
            .args(self.args(dir, &start, step))
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("invoking {}", self.config.vm_bin.display()))?
            .wait()
            .await?;
        tracing::info!(
            target: "executor",
            step,
            elapsed_ms = started.elapsed().as_millis() as u64,
            %status,
            "VM execution finished"
        );

        if !status.success() {
            bail!("VM exited with {status} generating proof for step {step}");
        }
        Ok(())
    }
}

/// Returns the latest snapshot strictly before `step`, or the absolute prestate when there is
/// none.
pub async fn find_starting_snapshot(
    snapshot_dir: &Path,
    prestate: &Path,
    step: u64,
) -> Result<PathBuf> {
    let mut entries = match tokio::fs::read_dir(snapshot_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(prestate.to_path_buf()),
        Err(e) => return Err(e).context("listing snapshots"),
    };

    let mut best = None;
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(n) = name
            .to_str()
            .and_then(|n| n.strip_suffix(".json.gz"))
            .and_then(|n| n.parse::<u64>().ok())
        else {
            continue;
        };
        if n < step && best.map_or(true, |b| n > b) {
            best = Some(n);
        }
    }

    Ok(match best {
        Some(n) => snapshot_dir.join(format!("{n}.json.gz")),
        None => prestate.to_path_buf(),
    })
}

#[cfg(test)]
mod test {
    use super::*;

    fn inputs() -> LocalGameInputs {
        LocalGameInputs {
            l1_head: B256::repeat_byte(1),
            l2_head: B256::repeat_byte(2),
            l2_output_root: B256::repeat_byte(3),
            l2_claim: B256::repeat_byte(4),
            l2_block_number: 1234,
        }
    }

    fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
        args.iter()
            .position(|a| a == name)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }

    #[test]
    fn vm_arguments() {
        let config = VmConfig {
            network: Some("op-sepolia".to_string()),
            ..Default::default()
        };
        let executor = VmExecutor::new(config, "/prestate.json", inputs());
        let dir = Path::new("/game/ctx");
        let args = executor.args(dir, Path::new("/prestate.json"), 42);

        assert_eq!(args[0], "run");
        assert_eq!(flag(&args, "--input"), Some("/prestate.json"));
        assert_eq!(flag(&args, "--output"), Some("/game/ctx/final.json.gz"));
        assert_eq!(flag(&args, "--meta"), Some(""));
        assert_eq!(flag(&args, "--info-at"), Some("%10000000"));
        assert_eq!(flag(&args, "--proof-at"), Some("=42"));
        assert_eq!(flag(&args, "--stop-at"), Some("=43"));
        assert_eq!(flag(&args, "--proof-fmt"), Some("/game/ctx/proofs/%d.json.gz"));
        assert_eq!(flag(&args, "--snapshot-at"), Some("%1000000000"));
        assert_eq!(flag(&args, "--snapshot-fmt"), Some("/game/ctx/snapshots/%d.json.gz"));
        assert_eq!(flag(&args, "--datadir"), Some("/game/ctx/preimages"));
        assert_eq!(flag(&args, "--l2.blocknumber"), Some("1234"));
        assert_eq!(
            flag(&args, "--l2.claim"),
            Some(B256::repeat_byte(4).to_string().as_str())
        );
        assert_eq!(flag(&args, "--network"), Some("op-sepolia"));
        assert_eq!(flag(&args, "--rollup.config"), None);

        // The program server and its flags follow the separator.
        let separator = args.iter().position(|a| a == "--").unwrap();
        assert_eq!(args[separator + 2], "--server");
        assert!(args.iter().position(|a| a == "--l1.head").unwrap() > separator);
    }

    #[tokio::test]
    async fn snapshot_selection() {
        let dir = tempfile::tempdir().unwrap();
        let snapshots = dir.path().join(SNAPSHOTS_DIR);
        let prestate = dir.path().join("prestate.json");

        assert_eq!(
            find_starting_snapshot(&snapshots, &prestate, 100).await.unwrap(),
            prestate
        );

        std::fs::create_dir_all(&snapshots).unwrap();
        for name in ["10.json.gz", "50.json.gz", "100.json.gz", "junk.txt"] {
            std::fs::write(snapshots.join(name), b"").unwrap();
        }
        assert_eq!(
            find_starting_snapshot(&snapshots, &prestate, 100).await.unwrap(),
            snapshots.join("50.json.gz")
        );
        assert_eq!(
            find_starting_snapshot(&snapshots, &prestate, 101).await.unwrap(),
            snapshots.join("100.json.gz")
        );
        assert_eq!(
            find_starting_snapshot(&snapshots, &prestate, 10).await.unwrap(),
            prestate
        );
    }

    #[tokio::test]
    async fn failed_runs_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config = VmConfig {
            vm_bin: dir.path().join("missing-vm"),
            ..Default::default()
        };
        let executor = VmExecutor::new(config, dir.path().join("prestate.json"), inputs());
        assert!(executor.generate_proof(dir.path(), 0).await.is_err());
    }
}
