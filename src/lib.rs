//! Hexfall Core - simulation engine for a hexagonal falling-block puzzle
//!
//! A six-sided hub sits at the center of the arena. Colored blocks fall
//! inward along six radial lanes, settle against the hub or earlier blocks,
//! and connected same-color groups of three or more clear for score with a
//! combo multiplier. The player rotates the hub, which remaps which physical
//! lane an incoming block lands in.
//!
//! All gameplay logic lives in [`sim`]. The crate performs no rendering,
//! audio, or I/O; consumers drive it one tick per frame and drain the event
//! queue.

pub mod sim;

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Number of lanes around the hub
    pub const SIDES: usize = 6;

    /// Radius of the central hub surface (blocks rest against it)
    pub const HUB_RADIUS: f32 = 60.0;
    /// Radial extent of one block
    pub const BLOCK_HEIGHT: f32 = 20.0;
    /// Distance from the hub at which new blocks spawn
    pub const SPAWN_DISTANCE: f32 = 340.0;
    /// Default lane depth limit before the session ends
    pub const MAX_ROWS: usize = 8;
    /// Number of colors in the palette
    pub const COLOR_COUNT: u8 = 4;

    /// Target frame duration in milliseconds (dt of 1.0 = one such frame)
    pub const TARGET_FRAME_MS: f32 = 16.667;

    /// Base radial fall speed, distance units per frame
    pub const BASE_FALL_SPEED: f32 = 1.5;

    /// Minimum ticks between accepted rotations
    pub const ROTATE_THROTTLE_TICKS: u64 = 5;
    /// Shorter throttle window for touch-primary devices
    pub const ROTATE_THROTTLE_TICKS_TOUCH: u64 = 2;

    /// Smallest connected group that clears
    pub const MATCH_MIN_SIZE: usize = 3;
    /// Combo window base in milliseconds.
    /// TODO: confirm with design; 2700 is an empirical tuning value.
    pub const COMBO_WINDOW_MS: f32 = 2700.0;
    /// Scale applied on top of the base combo window
    pub const COMBO_WINDOW_SCALE: f32 = 3.0;

    /// Ticks a cleared block spends fading before it is purged
    pub const FADE_TICKS: u32 = 18;
    /// Overflow grace window after a life is lost
    pub const INVULN_TICKS: u64 = 120;

    /// Spawn cadence at difficulty zero, in frames
    pub const BASE_SPAWN_DELAY: f32 = 80.0;
    /// Spawn delay floor; the ramp and multipliers never go below this
    pub const MIN_SPAWN_DELAY: f32 = 18.0;
    /// Difficulty gained per elapsed frame
    pub const DIFFICULTY_TIME_RAMP: f32 = 1.0 / 3600.0;
    /// Difficulty gained per clear event
    pub const DIFFICULTY_CLEAR_RAMP: f32 = 0.02;

    /// Frames between surge windows
    pub const SURGE_INTERVAL_TICKS: u64 = 1800;
    /// Surge window length in frames
    pub const SURGE_DURATION_TICKS: u64 = 360;
    /// Fall-speed multiplier while a surge is active
    pub const SURGE_SPEED_MULT: f32 = 1.35;
    /// Spawn-rate multiplier while a surge is active
    pub const SURGE_SPAWN_MULT: f32 = 1.6;
}

/// Normalized angle to [-π, π)
#[inline]
pub fn normalize_angle(mut angle: f32) -> f32 {
    use std::f32::consts::PI;
    while angle >= PI {
        angle -= 2.0 * PI;
    }
    while angle < -PI {
        angle += 2.0 * PI;
    }
    angle
}

/// Convert polar (r, theta) to cartesian (x, y)
#[inline]
pub fn polar_to_cartesian(r: f32, theta: f32) -> Vec2 {
    Vec2::new(r * theta.cos(), r * theta.sin())
}

/// Angle of a lane's radial axis (lane 0 points along +x)
#[inline]
pub fn lane_angle(lane: usize, sides: usize) -> f32 {
    normalize_angle(std::f32::consts::TAU * lane as f32 / sides as f32)
}
