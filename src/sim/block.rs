//! Block entity shared by the falling pool and the lane arrays
//!
//! A block is owned by exactly one container at a time: the physics engine's
//! falling pool, or a single lane on the board. The pool-to-lane transfer
//! happens exactly once, when the block settles.

use serde::{Deserialize, Serialize};

/// Opaque palette token. The theme layer decides what a value looks like;
/// the simulation only ever compares for equality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockColor(pub u8);

/// Lifecycle of a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockState {
    /// Moving toward the hub (in the pool, or in a lane above a fresh gap)
    Falling,
    /// Resting in a lane at a fixed distance
    Settled,
    /// Cleared, fading out; purged when the countdown reaches zero
    Deleting { ticks_left: u32 },
    /// Fully removed; purged from its lane at the end of the tick
    Deleted,
}

/// A single block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub id: u32,
    /// Spawn lane while falling; rewritten to the physical lane on settle
    pub lane: usize,
    pub color: BlockColor,
    /// Distance from the hub surface along the lane's radial axis
    pub distance: f32,
    /// Radial velocity, distance units per frame
    pub speed: f32,
    pub state: BlockState,
    /// Cannot be cleared until the block beneath it is gone
    pub indestructible: bool,
    /// Sticky: set the first tick the beneath-neighbor is gone
    pub support_cleared: bool,
}

impl Block {
    pub fn new(id: u32, lane: usize, color: BlockColor, distance: f32, speed: f32) -> Self {
        Self {
            id,
            lane,
            color,
            distance,
            speed,
            state: BlockState::Falling,
            indestructible: false,
            support_cleared: false,
        }
    }

    /// Indestructible variant; starts supported (unclearable)
    pub fn new_indestructible(
        id: u32,
        lane: usize,
        color: BlockColor,
        distance: f32,
        speed: f32,
    ) -> Self {
        Self {
            indestructible: true,
            ..Self::new(id, lane, color, distance, speed)
        }
    }

    /// Still occupies space in its lane (counts toward overflow, acts as a
    /// floor for blocks above)
    #[inline]
    pub fn is_present(&self) -> bool {
        self.state != BlockState::Deleted
    }

    /// Cleared out of play: no longer supports blocks marked after it and
    /// never joins a flood fill
    #[inline]
    pub fn is_gone(&self) -> bool {
        matches!(
            self.state,
            BlockState::Deleting { .. } | BlockState::Deleted
        )
    }

    /// Eligible to join a connected group this scan
    #[inline]
    pub fn matchable(&self) -> bool {
        self.state == BlockState::Settled && !(self.indestructible && !self.support_cleared)
    }
}
