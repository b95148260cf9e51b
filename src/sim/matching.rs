//! Connected-group matching, clearing, and combo accounting
//!
//! Each scan runs a 4-neighbor flood fill over the settled blocks (same lane
//! one index up or down, adjacent lane at the same index; never diagonals).
//! Groups of three or more same-color blocks are marked Deleting and scored;
//! the orchestrator's cleanup pass fades and purges them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::block::{BlockColor, BlockState};
use super::board::HexBoard;
use crate::consts::*;
use crate::polar_to_cartesian;

/// One cleared group, reported to consumers each tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub group_size: usize,
    /// `group_size² * combo` - squared on purpose, so one large clear beats
    /// several small ones
    pub score: u64,
    /// Combo multiplier in effect for this scan. Consumers award bonus
    /// currency proportional to `combo - 1`.
    pub combo: u32,
    pub color: BlockColor,
    /// Mean position of the group's members, for presentation feedback
    pub centroid: Vec2,
}

/// Finds and clears groups; owns the combo multiplier and its deadline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEngine {
    /// Current multiplier, >= 1
    pub combo: u32,
    /// Frame before which the next clear must land to keep the combo alive
    pub combo_deadline: u64,
    /// Active spawn-speed modifier; faster games get shorter combo windows
    creation_speed_modifier: f32,
}

impl Default for MatchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchEngine {
    pub fn new() -> Self {
        Self {
            combo: 1,
            combo_deadline: 0,
            creation_speed_modifier: 1.0,
        }
    }

    pub fn reset(&mut self) {
        self.combo = 1;
        self.combo_deadline = 0;
    }

    /// Wire in the wave generator's current speed multiplier before a scan
    pub fn set_creation_speed_modifier(&mut self, modifier: f32) {
        self.creation_speed_modifier = modifier.max(0.05);
    }

    /// Frames the combo stays alive after a clear
    fn combo_window(&self) -> u64 {
        let window = (1.0 / self.creation_speed_modifier)
            * (COMBO_WINDOW_MS / TARGET_FRAME_MS)
            * COMBO_WINDOW_SCALE;
        window.round() as u64
    }

    /// Scan the whole board, mark matched groups Deleting, and return the
    /// results. The combo advances at most one step per scan, no matter how
    /// many groups clear simultaneously.
    pub fn check_all_matches(&mut self, board: &mut HexBoard, frame: u64) -> Vec<MatchResult> {
        let groups = collect_groups(board);

        if groups.is_empty() {
            // Lazy expiry so consumers reading `combo` between clears see 1
            if self.combo > 1 && frame > self.combo_deadline {
                self.combo = 1;
            }
            return Vec::new();
        }

        if frame <= self.combo_deadline {
            self.combo += 1;
        } else {
            self.combo = 1;
        }
        self.combo_deadline = frame + self.combo_window();

        let mut touched = vec![false; board.sides];
        let mut results = Vec::with_capacity(groups.len());
        for group in groups {
            let color = board.lanes[group[0].0][group[0].1].color;
            let mut centroid = Vec2::ZERO;
            for &(lane, idx) in &group {
                let angle = board.lane_angle(lane);
                let block = &mut board.lanes[lane][idx];
                block.state = BlockState::Deleting {
                    ticks_left: FADE_TICKS,
                };
                centroid += polar_to_cartesian(block.distance + BLOCK_HEIGHT / 2.0, angle);
                touched[lane] = true;
            }
            centroid /= group.len() as f32;

            results.push(MatchResult {
                group_size: group.len(),
                score: (group.len() * group.len()) as u64 * self.combo as u64,
                combo: self.combo,
                color,
                centroid,
            });
        }

        // Only lanes hit by this clear need a support pass
        for (lane, hit) in touched.into_iter().enumerate() {
            if hit {
                recompute_support(board, lane);
            }
        }

        results
    }
}

/// Flood-fill every unvisited settled block; return the connected same-color
/// components of clearable size. The visited marker is scoped to this scan
/// and never stored on the blocks.
fn collect_groups(board: &HexBoard) -> Vec<Vec<(usize, usize)>> {
    let sides = board.sides;
    let mut visited: Vec<Vec<bool>> = board.lanes.iter().map(|l| vec![false; l.len()]).collect();
    let mut groups = Vec::new();

    for lane in 0..sides {
        for idx in 0..board.lanes[lane].len() {
            if visited[lane][idx] || !board.lanes[lane][idx].matchable() {
                continue;
            }
            let color = board.lanes[lane][idx].color;
            let mut group = Vec::new();
            let mut stack = vec![(lane, idx)];
            visited[lane][idx] = true;

            while let Some((l, i)) = stack.pop() {
                group.push((l, i));
                for (nl, ni) in neighbors(sides, l, i) {
                    if ni < board.lanes[nl].len()
                        && !visited[nl][ni]
                        && board.lanes[nl][ni].matchable()
                        && board.lanes[nl][ni].color == color
                    {
                        visited[nl][ni] = true;
                        stack.push((nl, ni));
                    }
                }
            }

            if group.len() >= MATCH_MIN_SIZE {
                groups.push(group);
            }
        }
    }
    groups
}

/// The four non-diagonal neighbors of a lane cell. Index -1 is skipped by
/// wrapping to usize::MAX, which can never be a valid lane index.
fn neighbors(sides: usize, lane: usize, idx: usize) -> [(usize, usize); 4] {
    [
        (lane, idx.wrapping_sub(1)),
        (lane, idx + 1),
        ((lane + 1) % sides, idx),
        ((lane + sides - 1) % sides, idx),
    ]
}

/// Bottom-up support pass for one lane: an indestructible block becomes
/// clearable the first tick the block beneath it is gone. Index 0 rests on
/// the hub itself and never auto-clears; `support_cleared` is sticky so a
/// block keeps its clearance when compaction shifts it down.
fn recompute_support(board: &mut HexBoard, lane: usize) {
    let lane = &mut board.lanes[lane];
    for i in 1..lane.len() {
        if lane[i].indestructible && !lane[i].support_cleared && lane[i - 1].is_gone() {
            lane[i].support_cleared = true;
        }
    }
}
