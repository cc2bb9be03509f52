//! This module contains the [FaultResponder], which sends the transactions for solver output.

use crate::{
    contracts::{FaultDisputeGameContract, TxSender},
    FaultAction, GameCaller, Gindex, PreimageUploader, Responder,
};
use anyhow::{Context, Result};
use challenger_primitives::GameStatus;
use std::sync::Arc;

/// The [FaultResponder] plays a single game: it resolves it through its [GameCaller] and
/// [TxSender] and turns each [FaultAction] into contract calls, uploading step preimages first.
pub struct FaultResponder {
    game: FaultDisputeGameContract,
    caller: Arc<dyn GameCaller>,
    sender: Arc<dyn TxSender>,
    uploader: Arc<dyn PreimageUploader>,
}

impl FaultResponder {
    pub fn new(
        game: FaultDisputeGameContract,
        caller: Arc<dyn GameCaller>,
        sender: Arc<dyn TxSender>,
        uploader: Arc<dyn PreimageUploader>,
    ) -> Self {
        Self {
            game,
            caller,
            sender,
            uploader,
        }
    }
}

#[async_trait::async_trait]
impl Responder for FaultResponder {
    async fn call_resolve(&self) -> Result<GameStatus> {
        self.caller.call_resolve().await
    }

    async fn resolve(&self) -> Result<()> {
        tracing::info!(target: "responder", game = %self.game.address, "resolving game");
        self.sender
            .send_and_wait("resolve", self.game.resolve_tx())
            .await
    }

    async fn perform_action(&self, action: FaultAction) -> Result<()> {
        match action {
            FaultAction::Move {
                parent_index,
                parent_position,
                is_attack,
                value,
            } => {
                let position = parent_position.make_move(is_attack);
                let bond = self
                    .caller
                    .required_bond(position)
                    .await
                    .with_context(|| format!("failed to fetch bond for {position:?}"))?;
                let tx = if is_attack {
                    self.game.attack_tx(parent_index, value, bond)
                } else {
                    self.game.defend_tx(parent_index, value, bond)
                };
                tracing::info!(
                    target: "responder",
                    parent_index,
                    is_attack,
                    value = %value,
                    "posting claim"
                );
                self.sender.send_and_wait("move", tx).await
            }
            FaultAction::Step {
                parent_index,
                is_attack,
                pre_state,
                proof,
                oracle,
                ..
            } => {
                if let Some(oracle) = oracle {
                    self.uploader
                        .upload_preimage(parent_index as u64, &oracle)
                        .await
                        .with_context(|| {
                            format!("failed to upload preimage for step on claim {parent_index}")
                        })?;
                }
                tracing::info!(target: "responder", parent_index, is_attack, "stepping");
                let tx = self.game.step_tx(parent_index, is_attack, pre_state, proof);
                self.sender.send_and_wait("step", tx).await
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{test_utils::RecordingSender, Position, PreimageOracleData};
    use alloy_primitives::{Address, Bytes, B256, U256};
    use anyhow::anyhow;
    use std::sync::Mutex;

    struct FixedCaller;

    #[async_trait::async_trait]
    impl GameCaller for FixedCaller {
        async fn call_resolve(&self) -> Result<GameStatus> {
            Ok(GameStatus::ChallengerWins)
        }

        async fn required_bond(&self, position: Position) -> Result<U256> {
            Ok(U256::from(position.depth()) * U256::from(1_000))
        }
    }

    /// Logs every upload, or fails all of them.
    struct LoggingUploader {
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl PreimageUploader for LoggingUploader {
        async fn upload_preimage(&self, claim_index: u64, _: &PreimageOracleData) -> Result<()> {
            if self.fail {
                return Err(anyhow!("oracle unavailable"));
            }
            self.log.lock().unwrap().push(format!("upload {claim_index}"));
            Ok(())
        }
    }

    fn responder(
        fail_upload: bool,
    ) -> (FaultResponder, Arc<RecordingSender>, Arc<Mutex<Vec<String>>>) {
        let sender = Arc::new(RecordingSender::default());
        let log = Arc::new(Mutex::new(Vec::new()));
        let uploader = LoggingUploader {
            log: log.clone(),
            fail: fail_upload,
        };
        let responder = FaultResponder::new(
            FaultDisputeGameContract::new(Address::repeat_byte(7)),
            Arc::new(FixedCaller),
            sender.clone(),
            Arc::new(uploader),
        );
        (responder, sender, log)
    }

    fn step(oracle: Option<PreimageOracleData>) -> FaultAction {
        FaultAction::Step {
            parent_index: 4,
            parent_position: Position::new(4, U256::ZERO),
            is_attack: true,
            pre_state: Bytes::from_static(b"pre"),
            proof: Bytes::new(),
            oracle,
        }
    }

    #[tokio::test]
    async fn moves_carry_the_bond() {
        let (responder, sender, _) = responder(false);
        let game = FaultDisputeGameContract::new(Address::repeat_byte(7));
        let value = B256::repeat_byte(3);
        responder
            .perform_action(FaultAction::Move {
                parent_index: 1,
                parent_position: Position::root().attack(),
                is_attack: false,
                value,
            })
            .await
            .unwrap();
        assert_eq!(sender.sent(), vec![game.defend_tx(1, value, U256::from(2_000))]);
        assert_eq!(sender.purposes(), vec!["move".to_string()]);
    }

    #[tokio::test]
    async fn steps_after_preimage_upload() {
        let (responder, sender, log) = responder(false);
        let oracle = PreimageOracleData::Keccak256 {
            key: B256::ZERO,
            data: Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 1, 0xff]),
            offset: 0,
        };
        responder.perform_action(step(Some(oracle))).await.unwrap();
        assert_eq!(log.lock().unwrap().as_slice(), &["upload 4".to_string()]);

        let game = FaultDisputeGameContract::new(Address::repeat_byte(7));
        assert_eq!(
            sender.sent(),
            vec![game.step_tx(4, true, Bytes::from_static(b"pre"), Bytes::new())]
        );
    }

    #[tokio::test]
    async fn failed_upload_skips_the_step() {
        let (responder, sender, _) = responder(true);
        let oracle = PreimageOracleData::Keccak256 {
            key: B256::ZERO,
            data: Bytes::from_static(&[0, 0, 0, 0, 0, 0, 0, 1, 0xff]),
            offset: 0,
        };
        assert!(responder.perform_action(step(Some(oracle))).await.is_err());
        assert!(sender.sent().is_empty());

        responder.perform_action(step(None)).await.unwrap();
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn resolves_through_the_game() {
        let (responder, sender, _) = responder(false);
        assert_eq!(
            responder.call_resolve().await.unwrap(),
            GameStatus::ChallengerWins
        );
        responder.resolve().await.unwrap();
        assert_eq!(sender.purposes(), vec!["resolve".to_string()]);
    }
}
