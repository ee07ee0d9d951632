//! main.rs — TDOA station-event simulator entry point
//!
//! Stands in for the real receiving stations: moves a synthetic emitter
//! through the station grid, derives each station's arrival timestamp from
//! true propagation delays (plus optional jitter), and pushes the resulting
//! arrival events to the engine over UDP — one complete measurement cycle
//! per tick.

mod emitter;
mod timing;
mod udp_tx;

use std::time::{Duration, Instant};

use clap::Parser;
use tokio::time::interval;
use tracing::info;

use tdoa_core::{Station, StationSet};

use emitter::EmitterSim;
use timing::TimingModel;
use udp_tx::EventTransmitter;

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "tdoa-sim", about = "Synthetic station-event source for the TDOA engine")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,
    /// Engine event-channel address
    #[arg(long, default_value = "127.0.0.1:4002")]
    engine_addr: String,
    /// Simulation speed multiplier (1.0 = real-time)
    #[arg(long, default_value = "1.0")]
    speed: f64,
    /// Override the configured arrival-time jitter sigma (ms)
    #[arg(long)]
    jitter_ms: Option<f64>,
}

// ── Config structs ────────────────────────────────────────────────────────────

#[derive(Debug, serde::Deserialize)]
struct FullConfig {
    grid: GridConfig,
    emitter: emitter::EmitterConfig,
    timing: TimingConfig,
}

#[derive(Debug, serde::Deserialize)]
struct GridConfig {
    stations: Vec<Station>,
}

#[derive(Debug, serde::Deserialize)]
struct TimingConfig {
    cycle_rate_hz: f64,
    jitter_ms: f64,
}

// ── Main ──────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tdoa_simulator=info".into()),
        )
        .init();

    let args = Args::parse();

    // Load config
    let config_str = std::fs::read_to_string(&args.config)
        .unwrap_or_else(|_| include_str!("../config.toml").to_string());
    let cfg: FullConfig = toml::from_str(&config_str).expect("Invalid config.toml");

    let stations =
        StationSet::with_default_speed(cfg.grid.stations).expect("invalid station grid");
    let jitter_ms = args.jitter_ms.unwrap_or(cfg.timing.jitter_ms);

    info!(
        "🛰  TDOA Simulator starting — {} stations, orbit r={}, {} Hz cycles, jitter σ={}ms",
        stations.len(),
        cfg.emitter.radius,
        cfg.timing.cycle_rate_hz,
        jitter_ms
    );

    let mut sim = EmitterSim::new(cfg.emitter);
    let timing = TimingModel::new(jitter_ms);
    let tx = EventTransmitter::new(&args.engine_addr).expect("Failed to bind UDP socket");

    let cycle_ms = ((1000.0 / cfg.timing.cycle_rate_hz) as u64).max(1);
    let mut ticker = interval(Duration::from_millis(cycle_ms));
    let mut cycle_counter = 0u64;
    let started = Instant::now();

    info!("⚓ Emitting one measurement cycle every {cycle_ms}ms to {}", args.engine_addr);

    loop {
        ticker.tick().await;

        // dt = real cycle time × speed multiplier
        let dt = (cycle_ms as f64 / 1000.0) * args.speed;
        let position = sim.tick(dt);

        let emit_ms = started.elapsed().as_secs_f64() * 1000.0;
        let events = timing.arrival_events(position, &stations, emit_ms);
        tx.send_cycle(&events);

        cycle_counter += 1;
        if cycle_counter % 10 == 0 {
            info!(
                "⏱ cycle={} | emitter=({:.0}, {:.0}) | {} events sent",
                cycle_counter,
                position[0],
                position[1],
                events.len()
            );
        }
    }
}
