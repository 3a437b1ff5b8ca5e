//! Game specification schema and strict validation.
//!
//! `GameSpecification` is the only shape the runtime ever sees. Validation is
//! strict: every field must be present, every enum must be one of the closed
//! variants, colors must be `#RRGGBB` and numbers must sit inside the ranges in
//! [`limits`]. Anything looser goes through `repair` first.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric bounds shared by validation and repair so both agree on "in range".
pub mod limits {
    pub const PLAYER_SPEED: (f32, f32) = (40.0, 600.0);
    pub const PLAYER_HEALTH: (u32, u32) = (1, 10);
    pub const HITBOX: (f32, f32) = (8.0, 128.0);
    pub const ENEMY_SPEED: (f32, f32) = (0.0, 400.0);
    pub const ENEMY_HP: (u32, u32) = (1, 10);
    pub const COLLECTIBLE_VALUE: (u32, u32) = (1, 100);
    pub const SEGMENTS: (u32, u32) = (1, 20);
    pub const LEVEL_LENGTH: (f32, f32) = (400.0, 20_000.0);
    pub const WIN_TARGET: (u32, u32) = (1, 10_000);
    pub const SURVIVE_SECONDS: (u32, u32) = (5, 600);
    pub const GRAVITY: (f32, f32) = (0.0, 4000.0);
    pub const FRICTION: (f32, f32) = (0.0, 10_000.0);
    pub const JUMP_VELOCITY: (f32, f32) = (0.0, 2000.0);
    pub const MAX_FALL_SPEED: (f32, f32) = (50.0, 4000.0);
    pub const CAMERA_SMOOTHING: (f32, f32) = (0.1, 30.0);

    pub const MAX_ENEMIES: usize = 12;
    pub const MAX_COLLECTIBLES: usize = 40;
    pub const MAX_OBSTACLES: usize = 40;
    pub const MAX_EFFECT_IDS: usize = 8;
    pub const MAX_CONCEPTS: usize = 8;

    pub const TITLE_CHARS: usize = 80;
    pub const DESCRIPTION_CHARS: usize = 280;
    pub const NAME_CHARS: usize = 40;
    pub const MESSAGE_CHARS: usize = 200;
    pub const ID_CHARS: usize = 48;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgeGroup {
    #[serde(rename = "4-6")]
    Young,
    #[serde(rename = "7-9")]
    Middle,
    #[serde(rename = "10-12")]
    Older,
}

impl AgeGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Young => "4-6",
            Self::Middle => "7-9",
            Self::Older => "10-12",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Template {
    Platformer,
    EndlessRunner,
    TopDownCollector,
}

impl Template {
    pub const ALL: &'static [Template] = &[
        Template::Platformer,
        Template::EndlessRunner,
        Template::TopDownCollector,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Platformer => "platformer",
            Self::EndlessRunner => "endless-runner",
            Self::TopDownCollector => "top-down-collector",
        }
    }

    /// Side-view templates scroll horizontally and apply gravity.
    pub fn is_side_view(self) -> bool {
        !matches!(self, Self::TopDownCollector)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePack {
    Space,
    Ocean,
    Forest,
}

impl ThemePack {
    pub const ALL: &'static [ThemePack] = &[ThemePack::Space, ThemePack::Ocean, ThemePack::Forest];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Space => "space",
            Self::Ocean => "ocean",
            Self::Forest => "forest",
        }
    }
}

impl fmt::Display for ThemePack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WinCondition {
    /// Win once the score reaches `winTarget`.
    CollectTarget,
    /// Win when the player touches the goal flag.
    ReachGoal,
    /// Win after staying alive for `winTarget` seconds.
    Survive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyBehavior {
    Patrol,
    Chase,
    Static,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Jump,
    Dash,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    None,
    Snow,
    Leaves,
    Bubbles,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraMode {
    Follow,
    Fixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Circle,
    Square,
    Triangle,
    Star,
    Diamond,
}

impl ShapeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Circle => "circle",
            Self::Square => "square",
            Self::Triangle => "triangle",
            Self::Star => "star",
            Self::Diamond => "diamond",
        }
    }
}

/// How an entity is drawn. Either a named asset (resolved by the asset
/// registry, with a placeholder fallback) or an explicit procedural shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SpriteDescriptor {
    Asset { id: String },
    Shape { shape: ShapeKind, color: String },
}

impl SpriteDescriptor {
    pub fn asset(id: &str) -> Self {
        Self::Asset { id: id.to_string() }
    }

    /// Stable key used for texture caching.
    pub fn key(&self) -> String {
        match self {
            Self::Asset { id } => id.clone(),
            Self::Shape { shape, color } => {
                format!("shape:{}:{}", shape.as_str(), color.to_ascii_lowercase())
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub accent: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnimationNames {
    pub idle: String,
    #[serde(rename = "move")]
    pub moving: String,
    pub jump: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerConfig {
    pub name: String,
    pub sprite: SpriteDescriptor,
    pub hitbox: Hitbox,
    pub speed: f32,
    pub health: u32,
    pub abilities: Vec<Ability>,
    pub animations: AnimationNames,
}

impl PlayerConfig {
    pub fn can(&self, ability: Ability) -> bool {
        self.abilities.contains(&ability)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyConfig {
    pub name: String,
    pub sprite: SpriteDescriptor,
    pub behavior: EnemyBehavior,
    pub speed: f32,
    pub hp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectibleConfig {
    pub name: String,
    pub sprite: SpriteDescriptor,
    pub value: u32,
    pub particle: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelConfig {
    pub segments: u32,
    pub length: f32,
    pub obstacles: Vec<String>,
    pub win_condition: WinCondition,
    pub win_target: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub friction: f32,
    pub jump_velocity: f32,
    pub max_fall_speed: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub mode: CameraMode,
    pub smoothing: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectsConfig {
    pub particles: Vec<String>,
    pub filters: Vec<String>,
    pub weather: Weather,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    pub music: String,
    /// Game event (`collect`, `hurt`, ...) to sound id.
    pub sfx: BTreeMap<String, String>,
}

impl AudioConfig {
    /// Sound id for a game event, falling back to the event name itself.
    pub fn sfx_for<'a>(&'a self, event: &'a str) -> &'a str {
        self.sfx.get(event).map(String::as_str).unwrap_or(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsConfig {
    pub keyboard: bool,
    pub touch: bool,
    pub gamepad: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiConfig {
    pub show_score: bool,
    pub show_health: bool,
    pub show_timer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NarratorMessages {
    pub intro: String,
    pub collect: String,
    pub hurt: String,
    pub win: String,
    pub lose: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSpecification {
    pub id: String,
    pub title: String,
    pub description: String,
    pub age_group: AgeGroup,
    pub difficulty: Difficulty,
    pub template: Template,
    pub theme_pack: ThemePack,
    pub palette: Palette,
    pub player: PlayerConfig,
    pub enemies: Vec<EnemyConfig>,
    pub collectibles: Vec<CollectibleConfig>,
    pub level: LevelConfig,
    pub physics: PhysicsConfig,
    pub camera: CameraConfig,
    pub effects: EffectsConfig,
    pub audio: AudioConfig,
    pub controls: ControlsConfig,
    pub ui: UiConfig,
    pub concepts: Vec<String>,
    pub messages: NarratorMessages,
}

impl GameSpecification {
    /// Sum of every collectible's value; the highest reachable score.
    pub fn total_collectible_value(&self) -> u32 {
        self.collectibles.iter().map(|c| c.value).sum()
    }

    /// Hard-coded known-good specification, returned by repair when its own
    /// output somehow fails validation.
    pub fn minimal() -> Self {
        let sfx = [
            ("collect", "collect-chime"),
            ("hurt", "hurt-buzz"),
            ("jump", "jump-boing"),
            ("win", "win-fanfare"),
            ("lose", "lose-womp"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            id: "minimal-game".to_string(),
            title: "Forest Adventure".to_string(),
            description: "Run and jump to the flag.".to_string(),
            age_group: AgeGroup::Middle,
            difficulty: Difficulty::Easy,
            template: Template::Platformer,
            theme_pack: ThemePack::Forest,
            palette: Palette {
                primary: "#2D6A4F".to_string(),
                secondary: "#95D5B2".to_string(),
                background: "#D8F3DC".to_string(),
                accent: "#F4A261".to_string(),
            },
            player: PlayerConfig {
                name: "Pip".to_string(),
                sprite: SpriteDescriptor::asset("fox"),
                hitbox: Hitbox {
                    width: 20.0,
                    height: 28.0,
                },
                speed: 180.0,
                health: 3,
                abilities: vec![Ability::Jump],
                animations: AnimationNames {
                    idle: "idle".to_string(),
                    moving: "walk".to_string(),
                    jump: "jump".to_string(),
                },
            },
            enemies: Vec::new(),
            collectibles: vec![CollectibleConfig {
                name: "Acorn".to_string(),
                sprite: SpriteDescriptor::asset("acorn"),
                value: 1,
                particle: "sparkle".to_string(),
            }],
            level: LevelConfig {
                segments: 1,
                length: 1600.0,
                obstacles: Vec::new(),
                win_condition: WinCondition::ReachGoal,
                win_target: 1,
            },
            physics: PhysicsConfig {
                gravity: 1800.0,
                friction: 2000.0,
                jump_velocity: 620.0,
                max_fall_speed: 900.0,
            },
            camera: CameraConfig {
                mode: CameraMode::Follow,
                smoothing: 6.0,
            },
            effects: EffectsConfig {
                particles: vec!["sparkle".to_string()],
                filters: Vec::new(),
                weather: Weather::None,
            },
            audio: AudioConfig {
                music: "forest-theme".to_string(),
                sfx,
            },
            controls: ControlsConfig {
                keyboard: true,
                touch: true,
                gamepad: false,
            },
            ui: UiConfig {
                show_score: true,
                show_health: true,
                show_timer: false,
            },
            concepts: vec!["loops".to_string()],
            messages: NarratorMessages {
                intro: "Guide Pip to the finish flag!".to_string(),
                collect: "Nice! Another Acorn!".to_string(),
                hurt: "Ouch! Be careful!".to_string(),
                win: "You did it, Pip!".to_string(),
                lose: "Don't give up, Pip! Try again!".to_string(),
            },
        }
    }
}

/// One failed check, addressed by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub path: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Strict validation. Returns `None` for anything that is not a complete,
/// in-range specification; never panics.
pub fn validate(raw: &serde_json::Value) -> Option<GameSpecification> {
    match validate_detailed(raw) {
        Ok(spec) => Some(spec),
        Err(issues) => {
            for issue in &issues {
                log::debug!("Spec validation: {issue}");
            }
            None
        }
    }
}

pub fn validate_detailed(
    raw: &serde_json::Value,
) -> Result<GameSpecification, Vec<ValidationIssue>> {
    let spec: GameSpecification = serde_json::from_value(raw.clone()).map_err(|e| {
        vec![ValidationIssue {
            path: "$".to_string(),
            message: e.to_string(),
        }]
    })?;
    let issues = check_spec(&spec);
    if issues.is_empty() {
        Ok(spec)
    } else {
        Err(issues)
    }
}

pub fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 7 && bytes[0] == b'#' && bytes[1..].iter().all(u8::is_ascii_hexdigit)
}

/// Ids are short lowercase slugs: `[a-z0-9_-]{1,48}`.
pub fn is_valid_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= limits::ID_CHARS
        && value
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-' || b == b'_')
}

#[derive(Default)]
struct Checker {
    issues: Vec<ValidationIssue>,
}

impl Checker {
    fn fail(&mut self, path: &str, message: String) {
        self.issues.push(ValidationIssue {
            path: path.to_string(),
            message,
        });
    }

    fn range_f32(&mut self, path: &str, value: f32, (min, max): (f32, f32)) {
        // Written so NaN fails as well.
        if !(value >= min && value <= max) {
            self.fail(path, format!("{value} outside [{min}, {max}]"));
        }
    }

    fn range_u32(&mut self, path: &str, value: u32, (min, max): (u32, u32)) {
        if value < min || value > max {
            self.fail(path, format!("{value} outside [{min}, {max}]"));
        }
    }

    fn text(&mut self, path: &str, value: &str, max_chars: usize) {
        if value.trim().is_empty() {
            self.fail(path, "must not be empty".to_string());
        } else if value.chars().count() > max_chars {
            self.fail(path, format!("longer than {max_chars} characters"));
        }
    }

    fn id(&mut self, path: &str, value: &str) {
        if !is_valid_id(value) {
            self.fail(path, format!("'{value}' is not a valid id"));
        }
    }

    fn color(&mut self, path: &str, value: &str) {
        if !is_hex_color(value) {
            self.fail(path, format!("'{value}' is not a #RRGGBB color"));
        }
    }

    fn sprite(&mut self, path: &str, sprite: &SpriteDescriptor) {
        match sprite {
            SpriteDescriptor::Asset { id } => self.id(&format!("{path}.id"), id),
            SpriteDescriptor::Shape { color, .. } => self.color(&format!("{path}.color"), color),
        }
    }

    fn max_len(&mut self, path: &str, len: usize, max: usize) {
        if len > max {
            self.fail(path, format!("{len} entries, at most {max} allowed"));
        }
    }
}

fn check_spec(spec: &GameSpecification) -> Vec<ValidationIssue> {
    let mut c = Checker::default();

    c.id("id", &spec.id);
    c.text("title", &spec.title, limits::TITLE_CHARS);
    c.text("description", &spec.description, limits::DESCRIPTION_CHARS);

    c.color("palette.primary", &spec.palette.primary);
    c.color("palette.secondary", &spec.palette.secondary);
    c.color("palette.background", &spec.palette.background);
    c.color("palette.accent", &spec.palette.accent);

    let player = &spec.player;
    c.text("player.name", &player.name, limits::NAME_CHARS);
    c.sprite("player.sprite", &player.sprite);
    c.range_f32("player.hitbox.width", player.hitbox.width, limits::HITBOX);
    c.range_f32("player.hitbox.height", player.hitbox.height, limits::HITBOX);
    c.range_f32("player.speed", player.speed, limits::PLAYER_SPEED);
    c.range_u32("player.health", player.health, limits::PLAYER_HEALTH);
    c.id("player.animations.idle", &player.animations.idle);
    c.id("player.animations.move", &player.animations.moving);
    c.id("player.animations.jump", &player.animations.jump);

    c.max_len("enemies", spec.enemies.len(), limits::MAX_ENEMIES);
    for (i, enemy) in spec.enemies.iter().enumerate() {
        let path = format!("enemies[{i}]");
        c.text(&format!("{path}.name"), &enemy.name, limits::NAME_CHARS);
        c.sprite(&format!("{path}.sprite"), &enemy.sprite);
        c.range_f32(&format!("{path}.speed"), enemy.speed, limits::ENEMY_SPEED);
        c.range_u32(&format!("{path}.hp"), enemy.hp, limits::ENEMY_HP);
    }

    if spec.collectibles.is_empty() {
        c.fail("collectibles", "at least one collectible is required".to_string());
    }
    c.max_len("collectibles", spec.collectibles.len(), limits::MAX_COLLECTIBLES);
    for (i, item) in spec.collectibles.iter().enumerate() {
        let path = format!("collectibles[{i}]");
        c.text(&format!("{path}.name"), &item.name, limits::NAME_CHARS);
        c.sprite(&format!("{path}.sprite"), &item.sprite);
        c.range_u32(&format!("{path}.value"), item.value, limits::COLLECTIBLE_VALUE);
        c.id(&format!("{path}.particle"), &item.particle);
    }

    let level = &spec.level;
    c.range_u32("level.segments", level.segments, limits::SEGMENTS);
    c.range_f32("level.length", level.length, limits::LEVEL_LENGTH);
    c.range_u32("level.winTarget", level.win_target, limits::WIN_TARGET);
    c.max_len("level.obstacles", level.obstacles.len(), limits::MAX_OBSTACLES);
    for (i, obstacle) in level.obstacles.iter().enumerate() {
        c.id(&format!("level.obstacles[{i}]"), obstacle);
    }

    c.range_f32("physics.gravity", spec.physics.gravity, limits::GRAVITY);
    c.range_f32("physics.friction", spec.physics.friction, limits::FRICTION);
    c.range_f32("physics.jumpVelocity", spec.physics.jump_velocity, limits::JUMP_VELOCITY);
    c.range_f32("physics.maxFallSpeed", spec.physics.max_fall_speed, limits::MAX_FALL_SPEED);
    c.range_f32("camera.smoothing", spec.camera.smoothing, limits::CAMERA_SMOOTHING);

    c.max_len("effects.particles", spec.effects.particles.len(), limits::MAX_EFFECT_IDS);
    for (i, id) in spec.effects.particles.iter().enumerate() {
        c.id(&format!("effects.particles[{i}]"), id);
    }
    c.max_len("effects.filters", spec.effects.filters.len(), limits::MAX_EFFECT_IDS);
    for (i, id) in spec.effects.filters.iter().enumerate() {
        c.id(&format!("effects.filters[{i}]"), id);
    }

    c.id("audio.music", &spec.audio.music);
    for (event, sound) in &spec.audio.sfx {
        c.id(&format!("audio.sfx.{event}"), event);
        c.id(&format!("audio.sfx.{event}"), sound);
    }

    c.max_len("concepts", spec.concepts.len(), limits::MAX_CONCEPTS);
    for (i, concept) in spec.concepts.iter().enumerate() {
        c.id(&format!("concepts[{i}]"), concept);
    }

    let m = &spec.messages;
    c.text("messages.intro", &m.intro, limits::MESSAGE_CHARS);
    c.text("messages.collect", &m.collect, limits::MESSAGE_CHARS);
    c.text("messages.hurt", &m.hurt, limits::MESSAGE_CHARS);
    c.text("messages.win", &m.win, limits::MESSAGE_CHARS);
    c.text("messages.lose", &m.lose, limits::MESSAGE_CHARS);

    c.issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn minimal_value() -> serde_json::Value {
        serde_json::to_value(GameSpecification::minimal()).expect("minimal spec serializes")
    }

    #[test]
    fn minimal_spec_is_valid() {
        let spec = validate(&minimal_value()).expect("minimal spec must validate");
        assert_eq!(spec, GameSpecification::minimal());
    }

    #[test]
    fn validate_accepts_hex_palette() {
        let mut raw = minimal_value();
        raw["palette"] = json!({
            "primary": "#112233",
            "secondary": "#aabbcc",
            "background": "#FFFFFF",
            "accent": "#0a0B0c"
        });
        assert!(validate(&raw).is_some());
    }

    #[test]
    fn validate_rejects_non_hex_palette_color() {
        let mut raw = minimal_value();
        raw["palette"]["accent"] = json!("orange");
        let issues = validate_detailed(&raw).expect_err("named color should fail");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].path, "palette.accent");
        assert!(validate(&raw).is_none());
    }

    #[test]
    fn validate_rejects_short_hex() {
        let mut raw = minimal_value();
        raw["palette"]["primary"] = json!("#abc");
        assert!(validate(&raw).is_none());
    }

    #[test]
    fn validate_rejects_unknown_template() {
        let mut raw = minimal_value();
        raw["template"] = json!("custom");
        assert!(validate(&raw).is_none());
    }

    #[test]
    fn validate_rejects_zero_win_target() {
        let mut raw = minimal_value();
        raw["level"]["winTarget"] = json!(0);
        let issues = validate_detailed(&raw).expect_err("winTarget 0 should fail");
        assert!(issues.iter().any(|i| i.path == "level.winTarget"));
    }

    #[test]
    fn validate_rejects_missing_fields() {
        assert!(validate(&json!({})).is_none());
        assert!(validate(&json!(null)).is_none());
        assert!(validate(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn validate_ignores_unknown_fields() {
        let mut raw = minimal_value();
        raw["somethingElse"] = json!({"nested": true});
        assert!(validate(&raw).is_some());
    }

    #[test]
    fn validate_reports_every_out_of_range_field() {
        let mut raw = minimal_value();
        raw["player"]["speed"] = json!(9000.0);
        raw["physics"]["gravity"] = json!(-5.0);
        raw["collectibles"] = json!([]);
        let issues = validate_detailed(&raw).expect_err("should fail");
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert!(paths.contains(&"player.speed"));
        assert!(paths.contains(&"physics.gravity"));
        assert!(paths.contains(&"collectibles"));
    }

    #[test]
    fn shape_sprites_round_trip_through_tagged_form() {
        let raw = json!({"kind": "shape", "shape": "star", "color": "#FFD166"});
        let sprite: SpriteDescriptor = serde_json::from_value(raw).expect("tagged shape parses");
        assert_eq!(
            sprite,
            SpriteDescriptor::Shape {
                shape: ShapeKind::Star,
                color: "#FFD166".to_string()
            }
        );
        assert_eq!(sprite.key(), "shape:star:#ffd166");
    }

    #[test]
    fn id_rules() {
        assert!(is_valid_id("collect-chime"));
        assert!(is_valid_id("a_1"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("Has Space"));
        assert!(!is_valid_id(&"x".repeat(limits::ID_CHARS + 1)));
    }

    #[test]
    fn sfx_lookup_falls_back_to_event_name() {
        let spec = GameSpecification::minimal();
        assert_eq!(spec.audio.sfx_for("collect"), "collect-chime");
        assert_eq!(spec.audio.sfx_for("dash"), "dash");
    }
}
