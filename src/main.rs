//! Asteroids Sim headless runner
//!
//! Drives a session with a scripted autopilot for a fixed number of ticks
//! and prints a JSON summary. Useful for soak testing and for checking that
//! a seed replays identically.
//!
//! Usage: `asteroids-headless [--ticks N] [--seed N] [--classic] [settings.json]`

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use asteroids_sim::audio::LogAudio;
use asteroids_sim::sim::{GameEvent, GameSession, TickInput, run_frame};
use asteroids_sim::{GameVariant, HudState, Settings};

#[derive(Parser, Debug)]
#[command(name = "asteroids-headless")]
#[command(about = "Drive a deterministic Asteroids session with a scripted autopilot")]
struct Cli {
    /// Number of ticks to simulate
    #[arg(long, default_value_t = 10_000)]
    ticks: u64,
    /// Override the RNG seed from the settings
    #[arg(long)]
    seed: Option<u64>,
    /// Play the classic rules instead of the enhanced ones
    #[arg(long)]
    classic: bool,
    /// Settings JSON file (missing fields take defaults)
    settings: Option<PathBuf>,
}

fn load_settings(path: &Path) -> Result<Settings> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Settings::from_json(&json).with_context(|| format!("invalid settings in {}", path.display()))
}

fn settings_for(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.settings {
        Some(path) => load_settings(path)?,
        None => Settings::default(),
    };
    if let Some(seed) = cli.seed {
        settings.seed = seed;
    }
    if cli.classic {
        settings.variant = GameVariant::Classic;
    }
    Ok(settings)
}

/// Spin, shoot and give it some gas now and then
fn autopilot(frame: u64) -> TickInput {
    TickInput {
        turn_left: frame % 90 < 30,
        turn_right: (45..60).contains(&(frame % 90)),
        thrust: frame % 120 < 8,
        fire: frame % 6 == 0,
        start: frame == 0,
    }
}

#[derive(Debug, Serialize)]
struct Summary {
    variant: &'static str,
    seed: u64,
    ticks: u64,
    sim_ms: u64,
    phase: &'static str,
    level: u32,
    score: u64,
    high_score: u64,
    lives: u32,
    live_entities: usize,
    timers_fired: u64,
    timers_dropped: u64,
    hud: HudState,
    events: BTreeMap<&'static str, u64>,
}

fn event_name(event: &GameEvent) -> &'static str {
    match event {
        GameEvent::Sound(_) => "sound",
        GameEvent::Score(_) => "score",
        GameEvent::Lives(_) => "lives",
        GameEvent::Level(_) => "level",
        GameEvent::Legend(_) => "legend",
        GameEvent::PhaseChanged { .. } => "phase_changed",
        GameEvent::AsteroidDestroyed { .. } => "asteroid_destroyed",
        GameEvent::AlienSpawned { .. } => "alien_spawned",
        GameEvent::AlienDestroyed { .. } => "alien_destroyed",
        GameEvent::ShipDestroyed { .. } => "ship_destroyed",
        GameEvent::PickupCollected { .. } => "pickup_collected",
        GameEvent::BonusLife => "bonus_life",
        GameEvent::HighScore(_) => "high_score",
    }
}

fn main() -> Result<()> {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let cli = Cli::parse();
    let settings = settings_for(&cli)?;
    let ticks = cli.ticks;

    log::info!(
        "Asteroids Sim (headless) starting: variant={} seed={} ticks={}",
        settings.variant.as_str(),
        settings.seed,
        ticks
    );

    let mut session = GameSession::new(settings);
    let mut audio = LogAudio;
    let mut hud = HudState::default();
    let mut counts: BTreeMap<&'static str, u64> = BTreeMap::new();

    for frame in 0..ticks {
        let input = autopilot(frame);
        for event in run_frame(&mut session, &input, &mut audio, &mut hud) {
            *counts.entry(event_name(&event)).or_default() += 1;
        }
    }

    let summary = Summary {
        variant: session.settings.variant.as_str(),
        seed: session.settings.seed,
        ticks,
        sim_ms: session.now_ms,
        phase: session.phase.as_str(),
        level: session.level,
        score: session.score,
        high_score: session.high_score,
        lives: session.lives,
        live_entities: session.registry.len(),
        timers_fired: session.stats.fired,
        timers_dropped: session.stats.dropped,
        hud,
        events: counts,
    };

    let json = serde_json::to_string_pretty(&summary).context("failed to serialize summary")?;
    println!("{json}");
    Ok(())
}
