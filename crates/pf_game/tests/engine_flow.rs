use pf_core::{AudioEngine, EmitterKind, InputEvent, Key, MemorySink, SoundBank};
use pf_game::{
    load_replay_from_path, CommandRecorder, Engine, EngineConfig, GameEvent, GameStatus,
    ImageRenderer, ReplaySequence,
};
use pf_spec::{load_spec_from_path, Template};
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_file_path(name_hint: &str, ext: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before unix epoch")
        .as_nanos();
    std::env::temp_dir().join(format!(
        "pf_engine_flow_{}_{}_{}.{}",
        name_hint,
        std::process::id(),
        nanos,
        ext
    ))
}

fn recorder_engine(raw: serde_json::Value) -> Engine<CommandRecorder> {
    Engine::from_raw(
        &raw,
        EngineConfig::default(),
        CommandRecorder::new(800.0, 600.0),
        AudioEngine::headless(),
        None,
    )
    .expect("engine should build")
}

fn run_trace(engine: &mut Engine<CommandRecorder>, replay: &ReplaySequence) -> Vec<GameEvent> {
    let mut all = Vec::new();
    engine.start();
    for batch in replay.expanded_events() {
        for event in batch {
            engine.push_input(event);
        }
        all.extend(engine.tick(replay.fixed_dt as f64));
    }
    all
}

fn move_then_jump() -> ReplaySequence {
    serde_json::from_value(json!({
        "fixed_dt": 1.0 / 60.0,
        "frames": [
            { "held": ["Right"], "repeat": 45 },
            { "held": ["Right", "Space"], "repeat": 1 },
            { "held": ["Right"], "repeat": 90 }
        ]
    }))
    .expect("replay json")
}

#[test]
fn fixed_trace_gives_identical_runs() {
    let raw = json!({"title": "Forest Hop", "template": "platformer", "enemies": []});
    let replay = move_then_jump();

    let mut a = recorder_engine(raw.clone());
    let mut b = recorder_engine(raw);
    let events_a = run_trace(&mut a, &replay);
    let events_b = run_trace(&mut b, &replay);

    assert_eq!(events_a, events_b);
    assert!(events_a.contains(&GameEvent::Jumped));
    let pos_a = a.simulation().player_position().expect("player");
    let pos_b = b.simulation().player_position().expect("player");
    assert_eq!(pos_a, pos_b);
    assert!(pos_a.x > 200.0);
    assert_eq!(a.particles().particle_count(), b.particles().particle_count());
    assert_eq!(a.score(), b.score());
    assert_eq!(a.fingerprint(), b.fingerprint());
}

#[test]
fn replay_file_drives_engine() {
    let path = temp_file_path("trace", "json");
    fs::write(
        &path,
        r#"{ "frames": [
            { "held": ["D"], "repeat": 30 },
            { "held": ["D", "W"] },
            { "repeat": 20 }
        ] }"#,
    )
    .expect("write replay file");
    let replay = load_replay_from_path(&path).expect("replay should load");
    let mut engine = recorder_engine(json!({"template": "platformer", "enemies": []}));
    let start = engine.simulation().player_position().expect("player");
    let events = run_trace(&mut engine, &replay);
    assert!(events.contains(&GameEvent::Jumped));
    assert!(engine.simulation().player_position().expect("player").x > start.x);
    let _ = fs::remove_file(path);
}

#[test]
fn young_easy_prompt_builds_a_gentle_game() {
    let mut engine = recorder_engine(json!({"ageGroup": "4-6", "difficulty": "easy"}));
    let spec = engine.spec();
    assert_eq!(spec.template, Template::TopDownCollector);
    assert!(spec.level.win_target <= 8);
    assert!(spec.enemies.len() <= 1);
    engine.start();
    for _ in 0..120 {
        engine.tick(1.0 / 60.0);
    }
    assert_eq!(engine.status(), GameStatus::Running);
}

#[test]
fn weather_adds_ambient_particles() {
    let mut engine = recorder_engine(json!({"theme": "snow", "template": "platformer"}));
    engine.start();
    engine.tick(1.0 / 60.0);
    assert!(engine.particles().has_kind(EmitterKind::Snow));
    assert!(engine.particles().particle_count() > 0);
}

#[test]
fn terminal_state_keeps_particles_but_freezes_entities() {
    let mut engine = recorder_engine(json!({
        "template": "top-down-collector",
        "enemies": [],
        "collectibles": [{"value": 3}],
        "level": {"winCondition": "collect-target", "winTarget": 3}
    }));
    engine.start();
    engine.push_input(InputEvent::KeyDown(Key::Right));
    let mut won = false;
    for _ in 0..600 {
        if engine.tick(1.0 / 60.0).contains(&GameEvent::Won) {
            won = true;
            break;
        }
    }
    assert!(won);
    assert_eq!(engine.score(), 3);
    assert!(engine.particles().has_kind(EmitterKind::Confetti));

    let frozen = engine.simulation().player_position();
    let before = engine.particles().particle_count();
    engine.tick(1.0 / 60.0);
    assert_eq!(engine.simulation().player_position(), frozen);
    assert!(before > 0);
    assert_eq!(engine.status(), GameStatus::Won);

    engine.render();
    let win = engine.spec().messages.win.clone();
    let first_word = win.split_whitespace().next().unwrap_or("").to_string();
    assert!(engine.renderer().texts().iter().any(|t| t.contains(&first_word)));
}

#[test]
fn bad_deltas_never_advance_time() {
    let mut engine = recorder_engine(json!({}));
    engine.start();
    for delta in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.0, -1.0] {
        assert!(engine.tick(delta).is_empty());
    }
    assert_eq!(engine.state().elapsed, 0.0);
    engine.tick(5.0);
    assert!((engine.state().elapsed - 0.1).abs() < 1e-6);
}

#[test]
fn destroy_before_start_and_twice_is_safe() {
    let sink = MemorySink::new();
    let audio = AudioEngine::new(SoundBank::builtin(), Box::new(sink.clone()));
    let mut engine = Engine::from_raw(
        &json!({}),
        EngineConfig::default(),
        CommandRecorder::new(800.0, 600.0),
        audio,
        None,
    )
    .expect("engine should build");
    engine.destroy();
    engine.destroy();
    engine.start();
    engine.pause();
    engine.resume();
    engine.restart();
    engine.push_input(InputEvent::KeyDown(Key::Space));
    assert!(engine.tick(1.0 / 60.0).is_empty());
    engine.render();
    assert!(!engine.is_running());
    assert_eq!(engine.status(), GameStatus::Ready);
    assert_eq!(engine.renderer().frames(), 0);
}

#[test]
fn messy_spec_file_loads_and_snapshots() {
    let spec_path = temp_file_path("spec", "txt");
    fs::write(
        &spec_path,
        "Sure! Here is your game:\n```json\n\
         {\"title\": \"Rocket Star Adventure\", \"template\": \"runner\"}\n```",
    )
    .expect("write spec file");
    let spec = load_spec_from_path(&spec_path).expect("spec should load");
    assert_eq!(spec.template, Template::EndlessRunner);

    let background = pf_game::Rgba::from_hex(&spec.palette.background).expect("hex background");
    let assets = pf_game::AssetRegistry::new(&spec.palette);
    let mut engine = Engine::new(
        spec,
        EngineConfig::default(),
        ImageRenderer::new(800, 600),
        assets,
        AudioEngine::headless(),
    )
    .expect("engine should build");
    engine.start();
    for _ in 0..30 {
        engine.tick(1.0 / 60.0);
    }
    engine.render();

    let png = temp_file_path("snapshot", "png");
    engine.renderer().save_png(&png).expect("snapshot should save");
    let image = image::open(&png).expect("snapshot should load").to_rgba8();
    assert_eq!(image.dimensions(), (800, 600));
    let matching = image
        .pixels()
        .filter(|p| p.0[..3] == [background.r, background.g, background.b])
        .count();
    assert!(matching > (800 * 600) / 2);

    let _ = fs::remove_file(spec_path);
    let _ = fs::remove_file(png);
}
