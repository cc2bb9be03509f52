#![doc = include_str!("../README.md")]

//! Primitives for the challenger, a library for building agents that play the OP Stack's
//! dispute protocol.

mod dispute_game;
pub use dispute_game::{Claim, GameStatus};

mod traits;
pub use traits::{DisputeGame, DisputeSolver};

pub mod rule;
pub use rule::Rule;
