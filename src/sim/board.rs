//! Hexagonal board: lane storage and the rotation-to-lane mapping
//!
//! The board owns every settled block, grouped into radial lanes. Index 0 in
//! a lane is the block closest to the hub; indices increase outward. Lanes
//! stay gap-free while collision and resettling run; temporary gaps exist
//! only between a clear and the next settle pass.

use serde::{Deserialize, Serialize};

use super::block::Block;
use crate::consts::*;
use crate::{lane_angle, normalize_angle};

/// Discrete rotation input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RotateDir {
    /// Offset +1
    Clockwise,
    /// Offset -1
    CounterClockwise,
}

impl RotateDir {
    #[inline]
    pub fn step(self) -> i32 {
        match self {
            RotateDir::Clockwise => 1,
            RotateDir::CounterClockwise => -1,
        }
    }
}

/// The rotating hub and its six lanes of settled blocks
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HexBoard {
    /// Lane count (fixed at creation)
    pub sides: usize,
    /// Discrete rotation applied when mapping spawn lane to physical lane
    pub rotation_offset: usize,
    /// Continuous rotation animation state (cosmetic; physics never reads it)
    pub angle: f32,
    pub target_angle: f32,
    /// Settled blocks, index 0 nearest the hub
    pub lanes: Vec<Vec<Block>>,
    /// Tick of the last accepted rotation, for throttling
    last_rotation_tick: Option<u64>,
    /// Minimum ticks between accepted rotations
    rotate_throttle: u64,
}

impl Default for HexBoard {
    fn default() -> Self {
        Self::new(SIDES)
    }
}

impl HexBoard {
    pub fn new(sides: usize) -> Self {
        debug_assert!(sides >= 3);
        Self {
            sides,
            rotation_offset: 0,
            angle: 0.0,
            target_angle: 0.0,
            lanes: vec![Vec::new(); sides],
            last_rotation_tick: None,
            rotate_throttle: ROTATE_THROTTLE_TICKS,
        }
    }

    /// Touch-primary devices get a shorter rotation throttle window
    pub fn set_touch_primary(&mut self, touch: bool) {
        self.rotate_throttle = if touch {
            ROTATE_THROTTLE_TICKS_TOUCH
        } else {
            ROTATE_THROTTLE_TICKS
        };
    }

    /// Apply a rotation input. Calls inside the throttle window are silently
    /// ignored (rate limit, not a failure). Returns whether it was accepted.
    pub fn rotate(&mut self, dir: RotateDir, now_tick: u64) -> bool {
        if let Some(last) = self.last_rotation_tick
            && now_tick.saturating_sub(last) < self.rotate_throttle
        {
            return false;
        }
        self.last_rotation_tick = Some(now_tick);

        let sides = self.sides as i32;
        self.rotation_offset =
            (self.rotation_offset as i32 + dir.step()).rem_euclid(sides) as usize;
        // One lane step of visual rotation; animate() eases toward it
        self.target_angle += dir.step() as f32 * std::f32::consts::TAU / self.sides as f32;
        true
    }

    /// Map a block's spawn lane to the physical lane it occupies under the
    /// current rotation. The falling-collision path and the settle path must
    /// both go through here; a divergence is the classic "block vanished" bug.
    #[inline]
    pub fn map_spawn_lane(&self, spawn_lane: usize) -> usize {
        debug_assert!(spawn_lane < self.sides);
        (self.sides - spawn_lane + self.rotation_offset) % self.sides
    }

    /// Angle of a physical lane's radial axis, ignoring the cosmetic easing
    #[inline]
    pub fn lane_angle(&self, lane: usize) -> f32 {
        debug_assert!(lane < self.sides);
        lane_angle(lane, self.sides)
    }

    /// Ease the visual angle toward the target. Cosmetic only.
    pub fn animate(&mut self, dt: f32) {
        let delta = self.target_angle - self.angle;
        if delta.abs() < 1e-4 {
            self.angle = normalize_angle(self.target_angle);
            self.target_angle = self.angle;
        } else {
            self.angle += delta * (0.25 * dt).min(1.0);
        }
    }

    /// Terminal condition: any lane holds more than `max_rows` blocks that
    /// are still present (Deleting counts, Deleted does not)
    pub fn is_overflowing(&self, max_rows: usize) -> bool {
        self.lanes
            .iter()
            .any(|lane| lane.iter().filter(|b| b.is_present()).count() > max_rows)
    }

    /// Empty all lanes (restart / life loss)
    pub fn clear(&mut self) {
        for lane in &mut self.lanes {
            lane.clear();
        }
    }

    /// Total present blocks across all lanes
    pub fn block_count(&self) -> usize {
        self.lanes
            .iter()
            .map(|lane| lane.iter().filter(|b| b.is_present()).count())
            .sum()
    }
}
