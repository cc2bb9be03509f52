//! Types related to the [crate::DisputeGame] trait.

use alloy_primitives::B256;
use anyhow::{bail, Error};
use std::convert::TryFrom;

/// A 32 byte commitment posted to a dispute game.
pub type Claim = B256;

/// The [GameStatus] enum mirrors the `GameStatus` stored by the dispute game contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Not resolved yet.
    InProgress = 0,
    /// The root claim was countered.
    ChallengerWins = 1,
    /// The root claim stands.
    DefenderWins = 2,
}

impl TryFrom<u8> for GameStatus {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameStatus::InProgress),
            1 => Ok(GameStatus::ChallengerWins),
            2 => Ok(GameStatus::DefenderWins),
            _ => bail!("Invalid game status: {value}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn game_status_from_contract_value() {
        assert_eq!(GameStatus::try_from(0).unwrap(), GameStatus::InProgress);
        assert_eq!(GameStatus::try_from(1).unwrap(), GameStatus::ChallengerWins);
        assert_eq!(GameStatus::try_from(2).unwrap(), GameStatus::DefenderWins);
        assert!(GameStatus::try_from(3).is_err());
    }
}
