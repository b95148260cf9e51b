//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Frame-driven only, one tick per rendered frame
//! - Seeded RNG only
//! - Stable iteration order (by lane, then by lane index)
//! - No rendering or platform dependencies

pub mod block;
pub mod board;
pub mod matching;
pub mod physics;
pub mod tick;
pub mod wave;

pub use block::{Block, BlockColor, BlockState};
pub use board::{HexBoard, RotateDir};
pub use matching::{MatchEngine, MatchResult};
pub use physics::PhysicsEngine;
pub use tick::{Game, GameConfig, GameEvent, GamePhase, Snapshot};
pub use wave::{SpawnRequest, WaveGenerator, WaveUpdate};
