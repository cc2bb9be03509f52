//! The position module holds the [Position] type, a coordinate within the game's bisection tree.

use crate::{FaultError, Gindex};
use alloy_primitives::U256;

/// A [Position] is a node of the complete binary tree the game is played over. It is identified
/// by its depth and its index at that depth, or equivalently by its generalized index
/// `2^{depth} + index_at_depth`.
///
/// The index is held as a [U256] so that trace indices of deep games never overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    depth: u8,
    index_at_depth: U256,
}

/// Computes a generalized index from a depth and index at depth.
///
/// ### Takes
/// - `depth`: The depth of the generalized index.
/// - `index_at_depth`: The index at depth of the generalized index.
///
/// ### Returns
/// - `U256`: The generalized index: `2^{depth} | index_at_depth`.
pub fn compute_gindex(depth: u8, index_at_depth: U256) -> U256 {
    (U256::from(1u8) << depth as usize) | index_at_depth
}

impl Position {
    /// Creates a new [Position] from its depth and index at depth.
    pub fn new(depth: u8, index_at_depth: U256) -> Self {
        Self {
            depth,
            index_at_depth,
        }
    }

    /// The root of the tree.
    pub fn root() -> Self {
        Self::default()
    }

    /// Decodes a generalized index. The depth is the index of the most significant set bit and the
    /// index at depth is the remainder once that bit is cleared. A zero gindex decodes to the root.
    pub fn from_gindex(gindex: U256) -> Self {
        let depth = gindex.bit_len().saturating_sub(1);
        if gindex.is_zero() {
            return Self::root();
        }
        Self {
            depth: depth as u8,
            index_at_depth: gindex ^ (U256::from(1u8) << depth),
        }
    }

    /// Returns true if this is the root position.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// The attack move against this position: its left child.
    pub fn attack(&self) -> Self {
        self.left()
    }

    /// The defend move against this position: the left child of the parent's right child.
    ///
    /// Defending the root is meaningless. The result is still computed, but the game rejects it.
    pub fn defend(&self) -> Self {
        self.parent().right().left()
    }

    /// The position one step to the right at the same depth.
    pub fn move_right(&self) -> Self {
        Self {
            depth: self.depth,
            index_at_depth: self.index_at_depth + U256::from(1u8),
        }
    }

    /// Re-roots this position as if the ancestor at depth `ancestor_depth` were the root of the tree.
    pub fn relative_to_ancestor_at_depth(&self, ancestor_depth: u8) -> Result<Self, FaultError> {
        if ancestor_depth > self.depth {
            return Err(FaultError::PositionDepthTooSmall {
                depth: self.depth,
                ancestor: ancestor_depth,
            });
        }
        let depth = self.depth - ancestor_depth;
        let mask = (U256::from(1u8) << depth as usize) - U256::from(1u8);
        Ok(Self {
            depth,
            index_at_depth: self.index_at_depth & mask,
        })
    }

    /// Returns true if this position is the defend move against `parent` rather than its attack.
    pub fn defends(&self, parent: &Position) -> bool {
        *self != parent.attack() && *self == parent.defend()
    }
}

impl Gindex for Position {
    fn depth(&self) -> u8 {
        self.depth
    }

    fn index_at_depth(&self) -> U256 {
        self.index_at_depth
    }

    fn to_gindex(&self) -> U256 {
        compute_gindex(self.depth, self.index_at_depth)
    }

    fn left(&self) -> Self {
        Self {
            depth: self.depth + 1,
            index_at_depth: self.index_at_depth << 1usize,
        }
    }

    fn right(&self) -> Self {
        Self {
            depth: self.depth + 1,
            index_at_depth: (self.index_at_depth << 1usize) | U256::from(1u8),
        }
    }

    fn parent(&self) -> Self {
        if self.is_root() {
            return *self;
        }
        Self {
            depth: self.depth - 1,
            index_at_depth: self.index_at_depth >> 1usize,
        }
    }

    fn right_index(&self, max_depth: u8) -> Self {
        Self {
            depth: max_depth,
            index_at_depth: self.trace_index(max_depth),
        }
    }

    fn trace_index(&self, max_depth: u8) -> U256 {
        debug_assert!(
            self.depth <= max_depth,
            "position at depth {} is below max depth {max_depth}",
            self.depth
        );
        let remaining = max_depth.saturating_sub(self.depth) as usize;
        ((self.index_at_depth + U256::from(1u8)) << remaining) - U256::from(1u8)
    }

    fn make_move(&self, is_attack: bool) -> Self {
        if is_attack {
            self.attack()
        } else {
            self.defend()
        }
    }
}
