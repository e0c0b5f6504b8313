//! Bouncer Headless
//!
//! Runs the simulation without a display, replaying a scripted drag and
//! logging frame summaries.
//!
//! Usage: `bouncer-headless [config.json] [ticks]`

use std::path::Path;

use anyhow::Context;
use bouncer_core::{DEFAULT_DT, InputEvent, InputQueue, SimConfig, Simulation};
use glam::Vec2;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::sink::LogSink;

mod sink;

const DEFAULT_TICKS: u64 = 600;
const GRAB_AT: u64 = 30;
const PULL_FRAMES: u64 = 45;
const PULL_DISTANCE: f32 = 240.0;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => load_config(Path::new(&path))?,
        None => SimConfig::default(),
    };
    let ticks = match args.next() {
        Some(raw) => raw.parse::<u64>().with_context(|| format!("invalid tick count {raw:?}"))?,
        None => DEFAULT_TICKS,
    };

    let mut sim = Simulation::new(config).context("invalid simulation config")?;
    sim.start().context("failed to spawn the first block")?;
    let origin = sim.config().initial_center();
    let input = sim.input();
    let mut sink = LogSink::new(60);

    tracing::info!("[headless] running {} ticks", ticks);
    let mut splits = 0;
    let mut spawned = 0;
    for frame in 0..ticks {
        script(&input, frame, origin);
        let report = sim.tick(DEFAULT_DT);
        splits += report.collisions.splits.len();
        spawned += report.spawned.len();
        sim.present(&mut sink);
    }

    tracing::info!(
        "[headless] done: {} frames, {} bodies (peak {}), {} spawned, {} splits, phase {:?}",
        sink.presented(),
        sim.world().len(),
        sink.peak_bodies(),
        spawned,
        splits,
        sim.phase()
    );
    Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<SimConfig> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let config = SimConfig::from_json(&raw).with_context(|| format!("failed to parse {}", path.display()))?;
    tracing::info!("[headless] loaded config from {}", path.display());
    Ok(config)
}

/// Grab the first block, pull it down and to the right, then let go.
fn script(input: &InputQueue, frame: u64, origin: Vec2) {
    let Some(step) = frame.checked_sub(GRAB_AT) else {
        return;
    };
    if step == 0 {
        input.push(InputEvent::ContactBegan(origin));
    } else if step <= PULL_FRAMES {
        #[allow(clippy::cast_precision_loss)]
        let t = step as f32 / PULL_FRAMES as f32;
        input.push(InputEvent::ContactMoved(origin + Vec2::new(0.5, 1.0) * PULL_DISTANCE * t));
    } else if step == PULL_FRAMES + 1 {
        input.push(InputEvent::ContactEnded);
    }
}
