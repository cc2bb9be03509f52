//! The clock module holds the [Clock] type, the packed chess clock stored alongside every claim.

use crate::ChessClock;

/// A [Clock] packs the seconds a claim's side has spent (upper 64 bits) with the timestamp at which
/// the clock was last stopped (lower 64 bits), as laid out by the dispute game contract.
pub type Clock = u128;

impl ChessClock for Clock {
    fn new_clock(duration: u64, timestamp: u64) -> Self {
        ((duration as u128) << 64) | timestamp as u128
    }

    fn duration(&self) -> u64 {
        (self >> 64) as u64
    }

    fn timestamp(&self) -> u64 {
        (self & u64::MAX as u128) as u64
    }
}
