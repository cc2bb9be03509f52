#![doc = include_str!("../README.md")]

//! The fault module contains types and traits related to the FaultDisputeGame.

extern crate challenger_primitives;

mod error;
pub use error::FaultError;

mod position;
pub use position::{compute_gindex, Position};

mod clock;
pub use clock::Clock;

mod types;
pub use types::*;

mod traits;
pub use traits::*;

mod state;
pub use state::{ClaimData, ClaimId, FaultDisputeState};

mod honest;
pub use honest::HonestClaimTracker;

mod accessor;
pub use accessor::TraceAccessor;

mod solver;
pub use solver::FaultDisputeSolver;

pub mod solvers;

pub mod rules;

pub mod providers;

pub mod proofs;

pub mod preimage;

pub mod contracts;

mod responder;
pub use responder::FaultResponder;

mod agent;
pub use agent::{validate_prestate, Agent};

pub mod config;

#[cfg(test)]
pub(crate) mod test_utils;

pub mod prelude {
    pub use super::{
        accessor::*, agent::*, clock::*, error::*, honest::*, position::*, responder::*,
        solver::*, state::*, traits::*, types::*,
    };
}
