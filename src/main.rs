//! Headless demo driver: runs the simulation for a fixed number of frames
//! with a trivial rotation script and prints a JSON summary.
//!
//! Usage: `hexfall-demo [seed] [frames]`, e.g. `RUST_LOG=info hexfall-demo 42 7200`

use hexfall_core::sim::{Game, GameConfig, GameEvent, RotateDir};

fn main() {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let seed: u64 = args
        .next()
        .and_then(|s| s.parse().ok())
        .unwrap_or_else(|| {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        });
    let frames: u64 = args.next().and_then(|s| s.parse().ok()).unwrap_or(7200);

    let mut game = Game::new(GameConfig {
        seed,
        ..Default::default()
    });
    game.start();
    log::info!("running {frames} frames with seed {seed}");

    for frame in 0..frames {
        // Rotate on a dull fixed cadence; enough to exercise the lane mapping
        if frame % 180 == 0 {
            game.rotate(RotateDir::Clockwise);
        } else if frame % 450 == 0 {
            game.rotate(RotateDir::CounterClockwise);
        }

        game.tick(1.0);

        for event in game.drain_events() {
            match event {
                GameEvent::Match(m) => log::debug!(
                    "cleared {} blocks for {} (combo x{})",
                    m.group_size,
                    m.score,
                    m.combo
                ),
                GameEvent::SurgeStarted => log::info!("surge started"),
                GameEvent::SurgeEnded => log::info!("surge ended"),
                GameEvent::LifeLost { lives_left } => {
                    log::info!("life lost, {lives_left} remaining")
                }
                GameEvent::GameOver { score } => log::info!("game over, final score {score}"),
            }
        }
    }

    match serde_json::to_string_pretty(&game.snapshot()) {
        Ok(json) => println!("{json}"),
        Err(err) => eprintln!("failed to serialize snapshot: {err}"),
    }
}
