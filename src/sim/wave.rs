//! Procedural spawn generator and difficulty ramp
//!
//! Decides when and what to spawn. The ramp is monotonic, driven by elapsed
//! time and by clear events; external collaborators (difficulty phases,
//! timed modes, catch-up assist) stack named multipliers on top, composed by
//! product and recombined on every change. A periodic surge sub-state
//! briefly elevates both speed and spawn rate.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::block::BlockColor;
use crate::consts::*;

/// One spawn decision, handed to the orchestrator to turn into a block
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnRequest {
    /// Spawn lane; rotation maps it to a physical lane at settle time
    pub lane: usize,
    pub color: BlockColor,
    /// Radial fall speed, distance units per frame
    pub speed: f32,
    /// Rare special block that needs its support cleared before matching
    pub indestructible: bool,
}

/// Result of one generator step
#[derive(Debug, Clone, Default)]
pub struct WaveUpdate {
    pub spawns: Vec<SpawnRequest>,
    pub surge_started: bool,
    pub surge_ended: bool,
}

/// A named external multiplier source (speed factor, spawn-rate factor)
#[derive(Debug, Clone)]
struct MultiplierSource {
    name: String,
    speed: f32,
    spawn: f32,
}

/// Procedural wave generator
#[derive(Debug, Clone)]
pub struct WaveGenerator {
    sides: usize,
    rng: Pcg32,
    /// Frames accumulated toward the next spawn
    accumulator: f32,
    /// Frames elapsed since session start (drives the time ramp)
    elapsed: f32,
    /// Clear events seen so far (drives the destruction ramp)
    clears: u32,
    /// External multiplier sources; current policy allows up to four
    sources: Vec<MultiplierSource>,
    /// Cached products, recombined whenever a source changes
    source_speed: f32,
    source_spawn: f32,
    pub surge_active: bool,
    next_surge_tick: u64,
    surge_end_tick: u64,
}

impl WaveGenerator {
    pub fn new(sides: usize, seed: u64) -> Self {
        Self {
            sides,
            rng: Pcg32::seed_from_u64(seed),
            accumulator: 0.0,
            elapsed: 0.0,
            clears: 0,
            sources: Vec::new(),
            source_speed: 1.0,
            source_spawn: 1.0,
            surge_active: false,
            next_surge_tick: SURGE_INTERVAL_TICKS,
            surge_end_tick: 0,
        }
    }

    /// Full reset for a new session; external sources stay registered
    pub fn reset(&mut self, seed: u64) {
        self.rng = Pcg32::seed_from_u64(seed);
        self.accumulator = 0.0;
        self.elapsed = 0.0;
        self.clears = 0;
        self.surge_active = false;
        self.next_surge_tick = SURGE_INTERVAL_TICKS;
        self.surge_end_tick = 0;
    }

    /// Drop out of a surge without finishing it (life loss, restart); the
    /// next one is rescheduled on the normal cadence
    pub fn reset_surge(&mut self, frame: u64) {
        self.surge_active = false;
        self.next_surge_tick = frame + SURGE_INTERVAL_TICKS;
    }

    /// Called once per clear event; more clears mean a faster ramp
    pub fn on_blocks_destroyed(&mut self) {
        self.clears += 1;
    }

    /// Register or update a named multiplier source
    pub fn set_source(&mut self, name: &str, speed: f32, spawn: f32) {
        let speed = speed.max(0.01);
        let spawn = spawn.max(0.01);
        match self.sources.iter_mut().find(|s| s.name == name) {
            Some(src) => {
                src.speed = speed;
                src.spawn = spawn;
            }
            None => self.sources.push(MultiplierSource {
                name: name.to_string(),
                speed,
                spawn,
            }),
        }
        self.recombine();
    }

    /// Remove a named multiplier source
    pub fn clear_source(&mut self, name: &str) {
        self.sources.retain(|s| s.name != name);
        self.recombine();
    }

    fn recombine(&mut self) {
        self.source_speed = self.sources.iter().map(|s| s.speed).product();
        self.source_spawn = self.sources.iter().map(|s| s.spawn).product();
    }

    /// Monotonic difficulty ramp
    pub fn difficulty(&self) -> f32 {
        self.elapsed * DIFFICULTY_TIME_RAMP + self.clears as f32 * DIFFICULTY_CLEAR_RAMP
    }

    /// Combined fall-speed multiplier (external sources plus surge); also
    /// feeds the combo window as the creation-speed modifier
    pub fn speed_multiplier(&self) -> f32 {
        let surge = if self.surge_active {
            SURGE_SPEED_MULT
        } else {
            1.0
        };
        self.source_speed * surge
    }

    /// Combined spawn-rate multiplier (external sources plus surge)
    pub fn spawn_multiplier(&self) -> f32 {
        let surge = if self.surge_active {
            SURGE_SPAWN_MULT
        } else {
            1.0
        };
        self.source_spawn * surge
    }

    /// Frames between spawns at the current ramp, clamped to the floor
    pub fn spawn_delay(&self) -> f32 {
        let delay = BASE_SPAWN_DELAY / ((1.0 + self.difficulty()) * self.spawn_multiplier());
        delay.max(MIN_SPAWN_DELAY)
    }

    /// Fall speed assigned to the next spawn
    fn spawn_speed(&self) -> f32 {
        BASE_FALL_SPEED * (1.0 + 0.5 * self.difficulty()) * self.speed_multiplier()
    }

    /// Advance the generator by one tick. Emits at most one spawn request
    /// and reports surge transitions.
    pub fn update(&mut self, dt: f32, frame: u64) -> WaveUpdate {
        let mut out = WaveUpdate::default();

        if !self.surge_active && frame >= self.next_surge_tick {
            self.surge_active = true;
            self.surge_end_tick = frame + SURGE_DURATION_TICKS;
            out.surge_started = true;
            log::info!("surge started at frame {frame}");
        } else if self.surge_active && frame >= self.surge_end_tick {
            self.surge_active = false;
            self.next_surge_tick = frame + SURGE_INTERVAL_TICKS;
            out.surge_ended = true;
            log::info!("surge ended at frame {frame}");
        }

        self.elapsed += dt;
        self.accumulator += dt;
        if self.accumulator >= self.spawn_delay() {
            self.accumulator = 0.0;
            out.spawns.push(self.roll_spawn());
        }

        out
    }

    fn roll_spawn(&mut self) -> SpawnRequest {
        let lane = self.rng.random_range(0..self.sides);
        let color = BlockColor(self.rng.random_range(0..COLOR_COUNT));
        // Indestructible blocks enter the mix once the ramp warms up
        let indestructible = self.difficulty() > 0.5 && self.rng.random_range(0..100) < 5;
        SpawnRequest {
            lane,
            color,
            speed: self.spawn_speed(),
            indestructible,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_cadence() {
        let mut wave = WaveGenerator::new(6, 42);
        let mut first_spawn_tick = None;
        for frame in 1..=(BASE_SPAWN_DELAY as u64 + 2) {
            let update = wave.update(1.0, frame);
            if !update.spawns.is_empty() {
                first_spawn_tick = Some(frame);
                break;
            }
        }
        // Fresh ramp: first spawn lands right around the base delay
        let tick = first_spawn_tick.expect("no spawn within the base delay");
        assert!(tick >= MIN_SPAWN_DELAY as u64);
        assert!(tick <= BASE_SPAWN_DELAY as u64 + 1);
    }

    #[test]
    fn test_spawn_fields_in_range() {
        let mut wave = WaveGenerator::new(6, 7);
        for _ in 0..50 {
            let req = wave.roll_spawn();
            assert!(req.lane < 6);
            assert!(req.color.0 < COLOR_COUNT);
            assert!(req.speed > 0.0);
        }
    }

    #[test]
    fn test_multipliers_compose_by_product() {
        let mut wave = WaveGenerator::new(6, 0);
        wave.set_source("phase", 2.0, 2.0);
        wave.set_source("assist", 1.5, 0.5);
        assert!((wave.speed_multiplier() - 3.0).abs() < 1e-6);
        assert!((wave.spawn_multiplier() - 1.0).abs() < 1e-6);

        wave.clear_source("assist");
        assert!((wave.speed_multiplier() - 2.0).abs() < 1e-6);

        // Same name replaces, never stacks
        wave.set_source("phase", 1.25, 1.0);
        assert!((wave.speed_multiplier() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn test_spawn_delay_floor() {
        let mut wave = WaveGenerator::new(6, 0);
        wave.set_source("burst", 1.0, 100.0);
        assert_eq!(wave.spawn_delay(), MIN_SPAWN_DELAY);
    }

    #[test]
    fn test_difficulty_ramps_with_clears_and_time() {
        let mut wave = WaveGenerator::new(6, 0);
        let d0 = wave.difficulty();
        wave.update(1.0, 1);
        let d1 = wave.difficulty();
        assert!(d1 > d0);

        wave.on_blocks_destroyed();
        assert!(wave.difficulty() > d1);
        assert!(wave.spawn_delay() < BASE_SPAWN_DELAY);
    }

    #[test]
    fn test_surge_cadence_and_duration() {
        let mut wave = WaveGenerator::new(6, 0);
        let base_speed = wave.speed_multiplier();

        let start = wave.update(1.0, SURGE_INTERVAL_TICKS);
        assert!(start.surge_started);
        assert!(wave.surge_active);
        assert!(wave.speed_multiplier() > base_speed);
        assert!(wave.spawn_multiplier() > 1.0);

        let end = wave.update(1.0, SURGE_INTERVAL_TICKS + SURGE_DURATION_TICKS);
        assert!(end.surge_ended);
        assert!(!wave.surge_active);
        assert!((wave.speed_multiplier() - base_speed).abs() < 1e-6);
    }

    #[test]
    fn test_surge_reset_on_interruption() {
        let mut wave = WaveGenerator::new(6, 0);
        wave.update(1.0, SURGE_INTERVAL_TICKS);
        assert!(wave.surge_active);

        wave.reset_surge(SURGE_INTERVAL_TICKS + 10);
        assert!(!wave.surge_active);
        // Rescheduled, not resumed
        let update = wave.update(1.0, SURGE_INTERVAL_TICKS + 11);
        assert!(!update.surge_started);
    }

    #[test]
    fn test_same_seed_same_spawns() {
        let mut a = WaveGenerator::new(6, 1234);
        let mut b = WaveGenerator::new(6, 1234);
        for frame in 1..500u64 {
            assert_eq!(a.update(1.0, frame).spawns, b.update(1.0, frame).spawns);
        }
    }
}
