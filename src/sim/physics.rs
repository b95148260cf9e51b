//! Falling-block physics: advance, collide, settle
//!
//! Collision is predictive: a block settles on the tick whose movement would
//! reach or pass the target surface (`<= 0`, not `< 0`), and snaps exactly
//! onto it. Resolving one frame late changes the combo feel and is a bug.

use serde::{Deserialize, Serialize};

use super::block::{Block, BlockState};
use super::board::HexBoard;
use crate::consts::*;

/// Owns the pool of blocks that are still falling toward the hub
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicsEngine {
    falling: Vec<Block>,
}

impl PhysicsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly spawned block into the falling pool
    pub fn add_falling(&mut self, block: Block) {
        self.falling.push(block);
    }

    /// Blocks currently in flight
    pub fn falling(&self) -> &[Block] {
        &self.falling
    }

    pub fn falling_count(&self) -> usize {
        self.falling.len()
    }

    /// Drop every in-flight block (restart / life loss)
    pub fn clear(&mut self) {
        self.falling.clear();
    }

    /// Advance every falling block by `speed * dt * scale` and settle those
    /// that reach the hub or the top of their mapped lane.
    ///
    /// The spawn-lane-to-physical-lane mapping is evaluated here with the
    /// rotation offset as of this tick, so rotating mid-flight redirects a
    /// block that has not yet landed.
    pub fn update(&mut self, board: &mut HexBoard, dt: f32, scale: f32) {
        let mut idx = 0;
        while idx < self.falling.len() {
            let step = self.falling[idx].speed * dt * scale;
            let physical = board.map_spawn_lane(self.falling[idx].lane);
            let target = lane_surface(board, physical);

            if self.falling[idx].distance - step - target <= 0.0 {
                // Ownership transfer: pool -> lane, exactly once
                let mut block = self.falling.remove(idx);
                block.distance = target;
                block.lane = physical;
                block.state = BlockState::Settled;
                board.lanes[physical].push(block);
            } else {
                self.falling[idx].distance -= step;
                idx += 1;
            }
        }
    }

    /// Re-evaluate every lane-held block against the surface beneath it.
    ///
    /// A clear can open a gap under previously settled blocks; those are
    /// marked Falling by the cleanup pass and slide inward here until they
    /// hit the same predictive settle rule. Blocks already resting snap in
    /// place (a no-op). Fading blocks hold position and still act as floors.
    pub fn settle_lanes(&self, board: &mut HexBoard, dt: f32, scale: f32) {
        for lane in &mut board.lanes {
            for i in 0..lane.len() {
                if lane[i].is_gone() {
                    continue;
                }
                // Bottom-up: index i-1 has already been updated this pass
                let target = if i == 0 {
                    HUB_RADIUS
                } else {
                    lane[i - 1].distance + BLOCK_HEIGHT
                };
                let step = lane[i].speed * dt * scale;
                if lane[i].distance - step - target <= 0.0 {
                    lane[i].distance = target;
                    lane[i].state = BlockState::Settled;
                } else {
                    lane[i].distance -= step;
                    lane[i].state = BlockState::Falling;
                }
            }
        }
    }
}

/// Distance at which the next block in `lane` comes to rest: the hub surface
/// for an empty lane, otherwise one block height above the current top block
#[inline]
fn lane_surface(board: &HexBoard, lane: usize) -> f32 {
    match board.lanes[lane].last() {
        Some(top) => top.distance + BLOCK_HEIGHT,
        None => HUB_RADIUS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::block::BlockColor;
    use crate::sim::board::RotateDir;

    fn falling(id: u32, lane: usize, distance: f32, speed: f32) -> Block {
        Block::new(id, lane, BlockColor(0), distance, speed)
    }

    #[test]
    fn test_settles_on_hub_in_empty_lane() {
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        physics.add_falling(falling(1, 0, HUB_RADIUS + 10.0, 4.0));

        for _ in 0..10 {
            physics.update(&mut board, 1.0, 1.0);
        }
        assert_eq!(physics.falling_count(), 0);
        assert_eq!(board.lanes[0].len(), 1);
        assert_eq!(board.lanes[0][0].distance, HUB_RADIUS);
        assert_eq!(board.lanes[0][0].state, BlockState::Settled);
    }

    #[test]
    fn test_snap_is_exact_at_boundary() {
        // Projected movement exactly equals the remaining gap: must settle
        // this tick with no overshoot and no residual gap.
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        physics.add_falling(falling(1, 0, HUB_RADIUS + 5.0, 5.0));

        physics.update(&mut board, 1.0, 1.0);
        assert_eq!(physics.falling_count(), 0);
        assert_eq!(board.lanes[0][0].distance, HUB_RADIUS);
    }

    #[test]
    fn test_stacks_on_top_block() {
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        physics.add_falling(falling(1, 0, HUB_RADIUS + 2.0, 3.0));
        physics.update(&mut board, 1.0, 1.0);

        physics.add_falling(falling(2, 0, HUB_RADIUS + 50.0, 6.0));
        for _ in 0..20 {
            physics.update(&mut board, 1.0, 1.0);
        }
        assert_eq!(board.lanes[0].len(), 2);
        assert_eq!(board.lanes[0][1].distance, HUB_RADIUS + BLOCK_HEIGHT);
    }

    #[test]
    fn test_settles_into_mapped_lane() {
        let mut board = HexBoard::new(6);
        board.rotate(RotateDir::Clockwise, 0);
        let mut physics = PhysicsEngine::new();
        physics.add_falling(falling(1, 2, HUB_RADIUS + 1.0, 5.0));
        physics.update(&mut board, 1.0, 1.0);

        // (6 - 2 + 1) % 6 = 5
        assert_eq!(board.lanes[5].len(), 1);
        assert_eq!(board.lanes[5][0].lane, 5);
    }

    #[test]
    fn test_midflight_rotation_redirects_block() {
        // The mapping is re-evaluated at settle time with the then-current
        // offset; a rotation during the fall changes the landing lane.
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        physics.add_falling(falling(1, 0, HUB_RADIUS + 100.0, 10.0));

        physics.update(&mut board, 1.0, 1.0);
        board.rotate(RotateDir::Clockwise, 1);
        for _ in 0..20 {
            physics.update(&mut board, 1.0, 1.0);
        }
        assert!(board.lanes[0].is_empty());
        assert_eq!(board.lanes[1].len(), 1);
    }

    #[test]
    fn test_resettle_closes_gap_after_clear() {
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        for id in 0..3 {
            physics.add_falling(falling(id, 0, HUB_RADIUS + 1.0, 5.0));
            for _ in 0..30 {
                physics.update(&mut board, 1.0, 1.0);
            }
        }
        assert_eq!(board.lanes[0].len(), 3);

        // Simulate a purge of the bottom block: remove it and expose the rest
        board.lanes[0].remove(0);
        for b in &mut board.lanes[0] {
            b.state = BlockState::Falling;
        }

        for _ in 0..30 {
            physics.settle_lanes(&mut board, 1.0, 1.0);
        }
        assert_eq!(board.lanes[0][0].distance, HUB_RADIUS);
        assert_eq!(board.lanes[0][1].distance, HUB_RADIUS + BLOCK_HEIGHT);
        assert!(board.lanes[0].iter().all(|b| b.state == BlockState::Settled));
    }

    #[test]
    fn test_settle_lanes_is_noop_for_resting_blocks() {
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        physics.add_falling(falling(1, 0, HUB_RADIUS + 1.0, 5.0));
        physics.update(&mut board, 1.0, 1.0);

        let before = board.lanes[0][0].distance;
        physics.settle_lanes(&mut board, 1.0, 1.0);
        assert_eq!(board.lanes[0][0].distance, before);
        assert_eq!(board.lanes[0][0].state, BlockState::Settled);
    }

    #[test]
    fn test_block_count_conserved_across_settle() {
        let mut board = HexBoard::new(6);
        let mut physics = PhysicsEngine::new();
        for id in 0..12 {
            physics.add_falling(falling(id, id as usize % 6, HUB_RADIUS + 40.0, 3.0));
        }
        for _ in 0..60 {
            physics.update(&mut board, 1.0, 1.0);
            assert_eq!(physics.falling_count() + board.block_count(), 12);
        }
        assert_eq!(physics.falling_count(), 0);
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Over randomized rotate/spawn sequences, every block lands in
            /// the lane the mapping names under the offset at settle time.
            #[test]
            fn lane_mapping_consistent(
                ops in prop::collection::vec((0usize..6, -1i32..=1), 1..100)
            ) {
                let mut board = HexBoard::new(6);
                let mut physics = PhysicsEngine::new();
                let mut tick: u64 = 0;

                for (i, (spawn_lane, rot)) in ops.into_iter().enumerate() {
                    let id = i as u32;
                    physics.add_falling(falling(id, spawn_lane, HUB_RADIUS + 30.0, 2.0));
                    // Rotate while the block is in flight
                    if rot != 0 {
                        tick += ROTATE_THROTTLE_TICKS;
                        let dir = if rot > 0 {
                            RotateDir::Clockwise
                        } else {
                            RotateDir::CounterClockwise
                        };
                        board.rotate(dir, tick);
                    }
                    let expected = board.map_spawn_lane(spawn_lane);
                    while physics.falling_count() > 0 {
                        physics.update(&mut board, 1.0, 1.0);
                    }
                    let found = board
                        .lanes
                        .iter()
                        .position(|lane| lane.iter().any(|b| b.id == id));
                    prop_assert_eq!(found, Some(expected));
                }
            }

            /// No block is ever duplicated or lost while settling.
            #[test]
            fn conservation(
                spawns in prop::collection::vec((0usize..6, 1.0f32..8.0), 1..40)
            ) {
                let mut board = HexBoard::new(6);
                let mut physics = PhysicsEngine::new();
                let total = spawns.len();
                for (i, (lane, speed)) in spawns.into_iter().enumerate() {
                    physics.add_falling(falling(i as u32, lane, HUB_RADIUS + 80.0, speed));
                }
                for _ in 0..200 {
                    physics.update(&mut board, 1.0, 1.0);
                    prop_assert_eq!(physics.falling_count() + board.block_count(), total);
                }
                prop_assert_eq!(physics.falling_count(), 0);
            }
        }
    }
}
