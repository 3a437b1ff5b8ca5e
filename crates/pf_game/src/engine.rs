//! Session scheduler.
//!
//! The engine owns one [`Simulation`] and everything around it: input routing,
//! frame timing, particles, audio and the render surface. The host calls
//! [`Engine::push_input`] from its event callbacks and [`Engine::tick`] plus
//! [`Engine::render`] once per frame.

use glam::Vec2;
use pf_core::{
    AudioEngine, ControlMask, EmitterKind, InputEvent, InputRouter, Key, ParticleSystem, Rgb,
    SoundBank, TimeState,
};
use pf_spec::{fingerprint, fingerprint_seed, repair, GameSpecification, SpecError, Weather};
use std::path::PathBuf;
use thiserror::Error;

use crate::assets::AssetRegistry;
use crate::config::{validate_config, EngineConfig};
use crate::entity::{EntityKind, EntityState};
use crate::render::{text_width, RenderAdapter, Rgba, Shape};
use crate::simulation::{GameEvent, GameStatus, RuntimeState, Simulation};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("render surface has zero logical size ({width} x {height})")]
    ZeroSurface { width: f32, height: f32 },
    #[error("audio backend unavailable: {0}")]
    Audio(String),
    #[error("invalid engine config: {0}")]
    Config(String),
    #[error(transparent)]
    Spec(#[from] SpecError),
}

/// Opens the audio output described by `config`. Without a device the engine
/// runs silent unless `require_audio` is set.
pub fn open_audio(config: &EngineConfig) -> Result<AudioEngine, EngineError> {
    #[cfg(feature = "kira")]
    {
        match pf_core::KiraSink::new() {
            Ok(sink) => return Ok(AudioEngine::new(SoundBank::builtin(), Box::new(sink))),
            Err(err) if config.require_audio => return Err(EngineError::Audio(err)),
            Err(err) => log::warn!("Audio device unavailable, running silent: {err}"),
        }
    }
    #[cfg(not(feature = "kira"))]
    if config.require_audio {
        return Err(EngineError::Audio("built without the kira feature".to_string()));
    }
    Ok(AudioEngine::new(SoundBank::builtin(), Box::new(pf_core::NullSink)))
}

const HUD_TEXT: f32 = 15.0;
const OVERLAY_TEXT: f32 = 20.0;
const HUD_MARGIN: f32 = 12.0;
/// Hurt flash toggles visibility at this rate while invulnerable.
const FLASH_HZ: f32 = 10.0;

pub struct Engine<R: RenderAdapter> {
    spec: GameSpecification,
    config: EngineConfig,
    fingerprint: String,
    seed: u64,
    sim: Simulation,
    particles: ParticleSystem,
    input: InputRouter,
    time: TimeState,
    audio: AudioEngine,
    assets: AssetRegistry,
    renderer: R,
    destroyed: bool,
}

impl<R: RenderAdapter> Engine<R> {
    pub fn new(
        spec: GameSpecification,
        config: EngineConfig,
        renderer: R,
        assets: AssetRegistry,
        audio: AudioEngine,
    ) -> Result<Self, EngineError> {
        validate_config(&config).map_err(EngineError::Config)?;
        let size = renderer.logical_size();
        if !(size.x >= 1.0 && size.y >= 1.0) {
            return Err(EngineError::ZeroSurface {
                width: size.x,
                height: size.y,
            });
        }
        let mut config = config;
        if config.width != size.x || config.height != size.y {
            log::debug!(
                "Using surface size {}x{} instead of configured {}x{}",
                size.x,
                size.y,
                config.width,
                config.height
            );
            config.width = size.x;
            config.height = size.y;
        }

        let fingerprint = fingerprint(&spec)?;
        let seed = fingerprint_seed(&spec);
        let sim = Simulation::new(&spec, &config);
        let particles = ambient_particles(&spec, &config, seed);
        let input = InputRouter::new(ControlMask {
            keyboard: spec.controls.keyboard,
            touch: spec.controls.touch,
            gamepad: spec.controls.gamepad,
        });
        let time = TimeState::new(config.max_delta as f64, config.fps_window);

        let mut renderer = renderer;
        renderer.set_filters(&spec.effects.filters);

        log::info!(
            "Engine ready: '{}' ({} / {}), {} entities, fingerprint {}",
            spec.title,
            spec.template.as_str(),
            spec.theme_pack.as_str(),
            sim.world().entities.len(),
            &fingerprint[..12.min(fingerprint.len())]
        );

        Ok(Self {
            spec,
            config,
            fingerprint,
            seed,
            sim,
            particles,
            input,
            time,
            audio,
            assets,
            renderer,
            destroyed: false,
        })
    }

    /// Repairs `raw` and builds an engine for it with palette-tinted assets.
    pub fn from_raw(
        raw: &serde_json::Value,
        config: EngineConfig,
        renderer: R,
        audio: AudioEngine,
        asset_dir: Option<PathBuf>,
    ) -> Result<Self, EngineError> {
        let spec = repair(raw);
        let mut assets = AssetRegistry::new(&spec.palette);
        if let Some(dir) = asset_dir {
            assets = assets.with_asset_dir(dir);
        }
        Self::new(spec, config, renderer, assets, audio)
    }

    pub fn spec(&self) -> &GameSpecification {
        &self.spec
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn audio(&self) -> &AudioEngine {
        &self.audio
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    pub fn state(&self) -> &RuntimeState {
        self.sim.state()
    }

    pub fn score(&self) -> u32 {
        self.sim.state().score
    }

    pub fn fps(&self) -> f32 {
        self.sim.state().fps
    }

    pub fn status(&self) -> GameStatus {
        self.sim.state().status
    }

    pub fn is_running(&self) -> bool {
        !self.destroyed && self.status() == GameStatus::Running
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub fn start(&mut self) {
        if self.destroyed {
            return;
        }
        if self.sim.start() {
            log::info!("Game started: {}", self.spec.title);
            self.audio.play_music(&self.spec.audio.music);
        }
    }

    pub fn pause(&mut self) {
        if !self.destroyed && self.sim.pause() {
            log::info!("Game paused");
        }
    }

    pub fn resume(&mut self) {
        if !self.destroyed && self.sim.resume() {
            log::info!("Game resumed");
        }
    }

    /// Rebuilds the session from the same specification and starts it.
    pub fn restart(&mut self) {
        if self.destroyed {
            return;
        }
        self.sim = Simulation::new(&self.spec, &self.config);
        self.particles = ambient_particles(&self.spec, &self.config, self.seed);
        self.input.clear();
        self.time.reset();
        log::info!("Game restarted: {}", self.spec.title);
        if self.sim.start() {
            self.audio.play_music(&self.spec.audio.music);
        }
    }

    /// Stops ticking, drops queued input, releases audio and detaches the
    /// surface. Safe to call at any time and more than once.
    pub fn destroy(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;
        self.input.clear();
        self.particles.clear();
        self.audio.destroy();
        self.renderer.detach();
        log::info!("Engine destroyed");
    }

    pub fn push_input(&mut self, event: InputEvent) {
        if !self.destroyed {
            self.input.push(event);
        }
    }

    /// Advances the session by `delta` seconds of wall time. Invalid deltas
    /// are dropped; oversized ones are clamped.
    pub fn tick(&mut self, delta: f64) -> Vec<GameEvent> {
        if self.destroyed {
            return Vec::new();
        }
        self.input.begin_tick();
        if self.input.take_first_gesture() && self.audio.unlock() {
            log::info!("Audio unlocked by first gesture");
        }
        let Some(dt) = self.time.advance(delta) else {
            return Vec::new();
        };
        let dt = dt as f32;
        self.sim.record_fps(self.time.smoothed_fps as f32);

        if self.input.is_just_pressed(Key::P) || self.input.is_just_pressed(Key::Escape) {
            match self.status() {
                GameStatus::Running => self.pause(),
                GameStatus::Paused => self.resume(),
                _ => {}
            }
        }

        let intent = self.input.intent();
        let events = self.sim.step(&intent, dt);
        for event in &events {
            self.react(event);
        }

        self.particles.maintain();
        self.particles.update(dt);
        events
    }

    fn react(&mut self, event: &GameEvent) {
        let sfx = &self.spec.audio;
        match event {
            GameEvent::Collected { at, particle, .. } => {
                let color = particle_color(particle, &self.spec);
                self.particles.burst(*at, color);
                self.audio.play_sound(sfx.sfx_for("collect"));
            }
            GameEvent::Hurt { .. } => {
                self.audio.play_sound(sfx.sfx_for("hurt"));
            }
            GameEvent::Jumped => {
                self.audio.play_sound(sfx.sfx_for("jump"));
            }
            GameEvent::Dashed => {
                self.audio.play_sound(sfx.sfx_for("dash"));
            }
            GameEvent::Landed | GameEvent::LapCompleted { .. } => {}
            GameEvent::Won => {
                let palette = &self.spec.palette;
                let colors: Vec<Rgb> = [&palette.primary, &palette.secondary, &palette.accent]
                    .into_iter()
                    .filter_map(|hex| Rgba::from_hex(hex).map(Rgba::rgb_array))
                    .collect();
                self.particles.confetti(&colors);
                self.audio.stop_music();
                self.audio.play_sound(sfx.sfx_for("win"));
            }
            GameEvent::Lost => {
                self.audio.stop_music();
                self.audio.play_sound(sfx.sfx_for("lose"));
            }
        }
    }

    /// Draws the world relative to the camera, particles, the HUD and any
    /// status overlay.
    pub fn render(&mut self) {
        if self.destroyed {
            return;
        }
        let size = self.renderer.logical_size();
        let background = Rgba::from_hex(&self.spec.palette.background).unwrap_or(Rgba::BLACK);
        self.renderer.begin_frame(background);
        self.draw_world(size);
        self.draw_particles(size);
        self.draw_hud(size);
        self.draw_overlay(size);
        self.renderer.end_frame();
    }

    fn draw_world(&mut self, size: Vec2) {
        let camera = *self.sim.camera();
        let flash_hidden = {
            let t = self.sim.player_invulnerability();
            t > 0.0 && ((t * FLASH_HZ) as i32) % 2 == 0
        };
        let ground_top = self.sim.world().ground_top;
        if ground_top > 0.0 {
            let ground = Rgba::from_hex(&self.spec.palette.secondary).unwrap_or(Rgba::BLACK);
            self.renderer.draw_shape(
                Shape::Rect {
                    x: 0.0,
                    y: size.y - ground_top,
                    w: size.x,
                    h: ground_top,
                },
                ground,
            );
        }

        let mut order: Vec<usize> = (0..self.sim.world().entities.len()).collect();
        order.sort_by_key(|&i| draw_rank(self.sim.world().entities[i].kind()));

        for i in order {
            let entity = &self.sim.world().entities[i];
            if !entity.is_active() {
                continue;
            }
            let screen = camera.world_to_screen(entity.position());
            let extent = entity.aabb.size();
            if screen.x + extent.x < 0.0 || screen.x - extent.x > size.x {
                continue;
            }
            let mirrored = match &entity.state {
                EntityState::Player(s) => s.facing < 0.0,
                EntityState::Enemy(s) => s.direction < 0.0,
                _ => false,
            };
            let alpha = if entity.kind() == EntityKind::Player && flash_hidden {
                0.35
            } else {
                1.0
            };
            let texture = self
                .assets
                .texture(&entity.visual.texture_key, entity.visual.category);
            let mut scale = extent / texture.size();
            if mirrored {
                scale.x = -scale.x;
            }
            self.renderer
                .draw_sprite(&texture, screen.x, screen.y, scale, alpha);
        }
    }

    fn draw_particles(&mut self, size: Vec2) {
        let camera = *self.sim.camera();
        for emitter in self.particles.emitters() {
            for p in &emitter.particles {
                let screen = if emitter.screen_space {
                    Vec2::new(p.position.x, size.y - p.position.y)
                } else {
                    camera.world_to_screen(p.position)
                };
                let [r, g, b] = p.color;
                let alpha = (p.alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
                let color = Rgba::rgb(r, g, b).with_alpha(alpha);
                let shape = match emitter.kind {
                    EmitterKind::Bubbles | EmitterKind::Snow | EmitterKind::Sparkle => {
                        Shape::Circle {
                            x: screen.x,
                            y: screen.y,
                            radius: p.size * 0.5,
                        }
                    }
                    _ => Shape::Rect {
                        x: screen.x - p.size * 0.5,
                        y: screen.y - p.size * 0.5,
                        w: p.size,
                        h: p.size,
                    },
                };
                self.renderer.draw_shape(shape, color);
            }
        }
    }

    fn draw_hud(&mut self, size: Vec2) {
        let ui = self.spec.ui;
        let state = *self.sim.state();
        let ink = Rgba::from_hex(&self.spec.palette.accent).unwrap_or(Rgba::WHITE);
        let mut y = HUD_MARGIN;
        if ui.show_score {
            self.renderer
                .draw_text(&format!("SCORE {}", state.score), HUD_MARGIN, y, HUD_TEXT, ink);
            y += HUD_TEXT + 6.0;
        }
        if ui.show_health {
            self.renderer
                .draw_text("HP", HUD_MARGIN, y, HUD_TEXT, ink);
            let heart = Rgba::from_hex(&self.spec.palette.secondary).unwrap_or(Rgba::WHITE);
            for i in 0..state.max_health {
                let x = HUD_MARGIN + text_width("HP ", HUD_TEXT) + i as f32 * (HUD_TEXT + 4.0);
                let color = if i < state.health { heart } else { heart.with_alpha(70) };
                self.renderer.draw_shape(
                    Shape::Rect {
                        x,
                        y,
                        w: HUD_TEXT,
                        h: HUD_TEXT,
                    },
                    color,
                );
            }
        }
        if ui.show_timer {
            let text = format!("TIME {}", state.elapsed.floor() as u32);
            let x = size.x - HUD_MARGIN - text_width(&text, HUD_TEXT);
            self.renderer.draw_text(&text, x, HUD_MARGIN, HUD_TEXT, ink);
        }
    }

    fn draw_overlay(&mut self, size: Vec2) {
        let message = match self.status() {
            GameStatus::Running => return,
            GameStatus::Ready => self.spec.messages.intro.clone(),
            GameStatus::Paused => "Paused".to_string(),
            GameStatus::Won => self.spec.messages.win.clone(),
            GameStatus::Lost => self.spec.messages.lose.clone(),
        };
        self.renderer.draw_shape(
            Shape::Rect {
                x: 0.0,
                y: 0.0,
                w: size.x,
                h: size.y,
            },
            Rgba::BLACK.with_alpha(150),
        );
        let max_width = size.x - HUD_MARGIN * 4.0;
        let lines = wrap_text(&message, max_width, OVERLAY_TEXT);
        let line_height = OVERLAY_TEXT + 8.0;
        let mut y = (size.y - lines.len() as f32 * line_height) * 0.5;
        for line in &lines {
            let x = (size.x - text_width(line, OVERLAY_TEXT)) * 0.5;
            self.renderer.draw_text(line, x, y, OVERLAY_TEXT, Rgba::WHITE);
            y += line_height;
        }
    }
}

fn ambient_particles(spec: &GameSpecification, config: &EngineConfig, seed: u64) -> ParticleSystem {
    let mut particles = ParticleSystem::new(seed, Vec2::new(config.width, config.height));
    let weather = match spec.effects.weather {
        Weather::None => None,
        Weather::Snow => Some(EmitterKind::Snow),
        Weather::Leaves => Some(EmitterKind::Leaves),
        Weather::Bubbles => Some(EmitterKind::Bubbles),
    };
    if let Some(kind) = weather {
        particles.add_ambient(kind, config.weather_particles);
    }
    for id in &spec.effects.particles {
        match EmitterKind::from_id(id) {
            Some(kind) if Some(kind) != weather && !particles.has_kind(kind) => {
                particles.add_ambient(kind, config.weather_particles / 3);
            }
            Some(_) => {}
            None => log::debug!("Unknown particle effect '{id}' ignored"),
        }
    }
    particles
}

/// Burst color for a collectible's particle id.
fn particle_color(particle: &str, spec: &GameSpecification) -> Rgb {
    let fallback = Rgba::from_hex(&spec.palette.accent).unwrap_or(Rgba::WHITE);
    match EmitterKind::from_id(particle) {
        Some(EmitterKind::Bubbles) => [202, 240, 248],
        Some(EmitterKind::Leaves) => [233, 196, 106],
        Some(EmitterKind::Snow) => [255, 255, 255],
        _ => fallback.rgb_array(),
    }
}

fn draw_rank(kind: EntityKind) -> u8 {
    match kind {
        EntityKind::Platform => 0,
        EntityKind::Goal => 1,
        EntityKind::Collectible => 2,
        EntityKind::Enemy => 3,
        EntityKind::Player => 4,
    }
}

/// Greedy word wrap to `max_width` pixels at glyph height `size`.
fn wrap_text(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if text_width(&candidate, size) <= max_width || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
