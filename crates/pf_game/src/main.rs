//! Playforge headless host.
//!
//! Loads and repairs a game specification, runs the engine for a number of
//! fixed ticks (optionally driven by a replay trace), can write a PNG snapshot
//! of the last frame and prints a JSON summary to stdout.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use clap::Parser;
use pf_game::{
    load_config_from_path, load_replay_from_path, open_audio, AssetRegistry, Engine,
    EngineConfig, GameEvent, GameStatus, ImageRenderer,
};
use pf_spec::load_spec_from_path;
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_TICKS: usize = 600;

/// Run a generated game headlessly
#[derive(Parser, Debug)]
#[command(name = "playforge")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Game specification JSON (repaired before use)
    spec: PathBuf,

    /// Input trace to replay
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Number of ticks to run (default: trace length, or 600)
    #[arg(short, long)]
    ticks: Option<usize>,

    /// Seconds per tick (default: trace or config fixed_dt)
    #[arg(long)]
    dt: Option<f64>,

    /// Directory with `<asset-id>.png` textures
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Write the final frame as PNG
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Engine configuration JSON
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the repaired specification and exit
    #[arg(long)]
    print_spec: bool,
}

#[derive(Debug, Serialize)]
struct Summary {
    title: String,
    template: &'static str,
    theme: &'static str,
    status: GameStatus,
    score: u32,
    health: u32,
    elapsed: f32,
    laps: u32,
    ticks: usize,
    collected: usize,
    hits: usize,
    player: Option<[f32; 2]>,
    fingerprint: String,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("playforge: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), String> {
    let config = match &args.config {
        Some(path) => load_config_from_path(path)?,
        None => EngineConfig::default(),
    };
    let spec = load_spec_from_path(&args.spec).map_err(|e| e.to_string())?;
    if args.print_spec {
        let json = serde_json::to_string_pretty(&spec)
            .map_err(|e| format!("Failed to serialize specification: {e}"))?;
        println!("{json}");
        return Ok(());
    }

    let replay = args
        .replay
        .as_deref()
        .map(load_replay_from_path)
        .transpose()?;
    let batches = replay
        .as_ref()
        .map(|r| r.expanded_events())
        .unwrap_or_default();
    let dt = args
        .dt
        .or(replay.as_ref().map(|r| r.fixed_dt as f64))
        .unwrap_or(config.fixed_dt as f64);
    let ticks = args.ticks.unwrap_or(if batches.is_empty() {
        DEFAULT_TICKS
    } else {
        batches.len()
    });

    let renderer = ImageRenderer::new(config.width as u32, config.height as u32);
    let audio = open_audio(&config).map_err(|e| e.to_string())?;
    let mut assets = AssetRegistry::new(&spec.palette);
    if let Some(dir) = &args.assets {
        assets = assets.with_asset_dir(dir);
    }
    let mut engine =
        Engine::new(spec, config, renderer, assets, audio).map_err(|e| e.to_string())?;

    engine.start();
    let mut ran = 0;
    let mut collected = 0;
    let mut hits = 0;
    for tick in 0..ticks {
        if let Some(batch) = batches.get(tick) {
            for event in batch {
                engine.push_input(*event);
            }
        }
        for event in engine.tick(dt) {
            match event {
                GameEvent::Collected { .. } => collected += 1,
                GameEvent::Hurt { .. } => hits += 1,
                _ => {}
            }
        }
        ran += 1;
        if engine.status().is_terminal() {
            log::info!("Stopping after {ran} ticks: {:?}", engine.status());
            break;
        }
    }

    engine.render();
    if let Some(path) = &args.snapshot {
        engine.renderer().save_png(path)?;
        log::info!("Wrote snapshot {}", path.display());
    }

    let state = *engine.state();
    let summary = Summary {
        title: engine.spec().title.clone(),
        template: engine.spec().template.as_str(),
        theme: engine.spec().theme_pack.as_str(),
        status: state.status,
        score: state.score,
        health: state.health,
        elapsed: state.elapsed,
        laps: state.laps,
        ticks: ran,
        collected,
        hits,
        player: engine.simulation().player_position().map(|p| [p.x, p.y]),
        fingerprint: engine.fingerprint().to_string(),
    };
    let json = serde_json::to_string_pretty(&summary)
        .map_err(|e| format!("Failed to serialize summary: {e}"))?;
    println!("{json}");
    engine.destroy();
    Ok(())
}
