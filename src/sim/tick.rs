//! Per-frame orchestration and the session phase machine
//!
//! The tick order is a frozen contract, not a style choice:
//! wave -> spawn -> physics -> matching -> cleanup -> resettle -> overflow.
//! Checking matches before settling would miss blocks that land this frame;
//! purging before matching would drop fading blocks out of the support rule.

use serde::{Deserialize, Serialize};

use super::block::{Block, BlockState};
use super::board::{HexBoard, RotateDir};
use super::matching::{MatchEngine, MatchResult};
use super::physics::PhysicsEngine;
use super::wave::{SpawnRequest, WaveGenerator};
use crate::consts::*;

/// Session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Created, not yet started
    Idle,
    /// Active gameplay
    Playing,
    /// Suspended; ticks are no-ops and nothing mutates
    Paused,
    /// Terminal; the final score has been emitted
    GameOver,
}

/// Typed event queue drained by the consumer once per tick. Replaces the
/// kind of ambient event bus that would couple the core to presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum GameEvent {
    Match(MatchResult),
    SurgeStarted,
    SurgeEnded,
    LifeLost { lives_left: u8 },
    GameOver { score: u64 },
}

/// Session parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameConfig {
    pub sides: usize,
    pub max_rows: usize,
    pub lives: u8,
    pub seed: u64,
    pub touch_primary: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            sides: SIDES,
            max_rows: MAX_ROWS,
            lives: 3,
            seed: 0,
            touch_primary: false,
        }
    }
}

/// Serializable summary of the session, for consumers and the demo driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: GamePhase,
    pub frame: u64,
    pub score: u64,
    pub lives: u8,
    pub combo: u32,
    pub difficulty: f32,
    pub surge_active: bool,
    pub falling: usize,
    pub lane_depths: Vec<usize>,
}

/// The whole simulation: board, falling pool, matcher, generator, and the
/// session state machine. Consumers construct one per session, call
/// [`Game::start`], then [`Game::tick`] once per frame and drain the events.
#[derive(Debug, Clone)]
pub struct Game {
    pub board: HexBoard,
    pub physics: PhysicsEngine,
    pub matching: MatchEngine,
    pub wave: WaveGenerator,
    pub phase: GamePhase,
    pub score: u64,
    pub lives: u8,
    /// Frame counter; all gameplay timers compare against this
    pub frame: u64,
    config: GameConfig,
    /// Overflow checks are suppressed until this frame (post-life-loss grace)
    invuln_until: u64,
    next_id: u32,
    events: Vec<GameEvent>,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        let mut board = HexBoard::new(config.sides);
        board.set_touch_primary(config.touch_primary);
        Self {
            board,
            physics: PhysicsEngine::new(),
            matching: MatchEngine::new(),
            wave: WaveGenerator::new(config.sides, config.seed),
            phase: GamePhase::Idle,
            score: 0,
            lives: config.lives,
            frame: 0,
            config,
            invuln_until: 0,
            next_id: 1,
            events: Vec::new(),
        }
    }

    /// Begin (or restart) a session: everything resets, phase -> Playing
    pub fn start(&mut self) {
        self.board = HexBoard::new(self.config.sides);
        self.board.set_touch_primary(self.config.touch_primary);
        self.physics.clear();
        self.matching.reset();
        self.wave.reset(self.config.seed);
        self.score = 0;
        self.lives = self.config.lives;
        self.frame = 0;
        self.invuln_until = 0;
        self.events.clear();
        self.phase = GamePhase::Playing;
    }

    pub fn pause(&mut self) {
        if self.phase == GamePhase::Playing {
            self.phase = GamePhase::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.phase == GamePhase::Paused {
            self.phase = GamePhase::Playing;
        }
    }

    /// Rotation input; throttling happens inside the board
    pub fn rotate(&mut self, dir: RotateDir) {
        if self.phase == GamePhase::Playing {
            self.board.rotate(dir, self.frame);
        }
    }

    /// Events accumulated since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Turn a spawn request into a falling block. Also the injection point
    /// for scripted spawns (challenges, tests).
    pub fn spawn_block(&mut self, req: &SpawnRequest) {
        let id = self.next_entity_id();
        let block = if req.indestructible {
            Block::new_indestructible(id, req.lane, req.color, SPAWN_DISTANCE, req.speed)
        } else {
            Block::new(id, req.lane, req.color, SPAWN_DISTANCE, req.speed)
        };
        self.physics.add_falling(block);
    }

    /// Advance one frame. `dt` is frame-normalized (1.0 at the target rate).
    pub fn tick(&mut self, dt: f32) {
        if self.phase != GamePhase::Playing {
            return;
        }
        self.frame += 1;
        self.board.animate(dt);

        // 1. Wave generator
        let wave_update = self.wave.update(dt, self.frame);
        if wave_update.surge_started {
            self.events.push(GameEvent::SurgeStarted);
        }
        if wave_update.surge_ended {
            self.events.push(GameEvent::SurgeEnded);
        }
        for req in &wave_update.spawns {
            self.spawn_block(req);
        }

        // 2. Move and settle falling blocks
        let scale = self.wave.speed_multiplier();
        self.physics.update(&mut self.board, dt, scale);

        // 3. Match and clear
        self.matching.set_creation_speed_modifier(scale);
        let results = self.matching.check_all_matches(&mut self.board, self.frame);
        if !results.is_empty() {
            self.wave.on_blocks_destroyed();
        }
        for result in results {
            self.score += result.score;
            self.events.push(GameEvent::Match(result));
        }

        // 4. Fade countdown, purge, expose
        self.cleanup();

        // 5. Re-settle blocks above freshly vacated space
        self.physics.settle_lanes(&mut self.board, dt, scale);

        // 6. Terminal check, suppressed during the post-life-loss grace
        if self.frame >= self.invuln_until && self.board.is_overflowing(self.config.max_rows) {
            self.lose_life();
        }
    }

    /// Promote Deleting to Deleted once the fade elapses, purge Deleted
    /// blocks, and mark everything above a removal as unsettled so the next
    /// settle pass drops it into the gap.
    fn cleanup(&mut self) {
        for lane in &mut self.board.lanes {
            for block in lane.iter_mut() {
                if let BlockState::Deleting { ticks_left } = block.state {
                    block.state = if ticks_left <= 1 {
                        BlockState::Deleted
                    } else {
                        BlockState::Deleting {
                            ticks_left: ticks_left - 1,
                        }
                    };
                }
            }

            let first_removed = lane.iter().position(|b| !b.is_present());
            if let Some(first) = first_removed {
                lane.retain(|b| b.is_present());
                for block in lane.iter_mut().skip(first) {
                    if block.state == BlockState::Settled {
                        block.state = BlockState::Falling;
                    }
                }
            }
        }
    }

    fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        if self.lives == 0 {
            log::info!("game over at frame {} with score {}", self.frame, self.score);
            self.phase = GamePhase::GameOver;
            self.events.push(GameEvent::GameOver { score: self.score });
            return;
        }

        log::info!("life lost at frame {}, {} remaining", self.frame, self.lives);
        self.board.clear();
        self.physics.clear();
        self.matching.reset();
        self.wave.reset_surge(self.frame);
        self.invuln_until = self.frame + INVULN_TICKS;
        self.events.push(GameEvent::LifeLost {
            lives_left: self.lives,
        });
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            frame: self.frame,
            score: self.score,
            lives: self.lives,
            combo: self.matching.combo,
            difficulty: self.wave.difficulty(),
            surge_active: self.wave.surge_active,
            falling: self.physics.falling_count(),
            lane_depths: self
                .board
                .lanes
                .iter()
                .map(|lane| lane.iter().filter(|b| b.is_present()).count())
                .collect(),
        }
    }
}
