//! This module contains implementations of the [crate::FaultClaimSolver] trait.

mod claim;
pub use self::claim::ClaimSolver;
