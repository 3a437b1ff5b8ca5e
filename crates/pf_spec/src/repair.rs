//! Total, deterministic repair of arbitrary JSON into a valid specification.
//!
//! Pipeline:
//!
//!   1. resolve template (supplied value or rule-based selection)
//!   2. resolve theme pack (supplied value, alias table, or keyword scan)
//!   3. layer template defaults, then theme defaults, then explicit input
//!      fields (each coerced leniently; uncoercible values keep the default)
//!   4. consistency pass (age caps, win target vs. reachable score, ...)
//!   5. generated placeholders for text that is still missing
//!   6. strict validation; the hard-coded minimal spec if that ever fails
//!
//! Every coercion maps a valid value to itself, which is what makes
//! `repair(repair(x)) == repair(x)` hold.

use crate::registry::{max_enemies_for, ThemeRegistry};
use crate::schema::{
    is_hex_color, limits, validate, Ability, AgeGroup, CameraMode, CollectibleConfig, Difficulty,
    EnemyBehavior, EnemyConfig, GameSpecification, ShapeKind, SpriteDescriptor, Template, Weather,
    WinCondition,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Repair with the built-in theme registry.
pub fn repair(raw: &Value) -> GameSpecification {
    repair_with(&ThemeRegistry::builtin(), raw)
}

pub fn repair_with(registry: &ThemeRegistry, raw: &Value) -> GameSpecification {
    let empty = Map::new();
    let input = raw.as_object().unwrap_or_else(|| {
        if !raw.is_null() {
            log::debug!("Repair: top-level value is not an object, using defaults only");
        }
        &empty
    });

    let age = field(input, &["ageGroup", "age_group", "age"])
        .and_then(coerce_age)
        .unwrap_or(AgeGroup::Middle);
    let difficulty = field(input, &["difficulty", "level_difficulty"])
        .and_then(coerce_difficulty)
        .unwrap_or(Difficulty::Medium);
    let prompt = prompt_text(input);

    let template = field(input, &["template", "gameType", "game_type"])
        .and_then(Value::as_str)
        .and_then(|s| registry.template_alias(s))
        .unwrap_or_else(|| {
            let selected = registry.select_template(&prompt, age, difficulty);
            log::debug!("Repair: selected template '{selected}' from age/difficulty/prompt");
            selected
        });

    let alias = field(input, &["themePack", "theme_pack", "theme"])
        .and_then(Value::as_str)
        .and_then(|s| registry.theme_alias(s));
    let theme = alias.map(|a| a.pack).unwrap_or_else(|| {
        let selected = registry.select_theme(&prompt);
        log::debug!("Repair: selected theme '{selected}' from prompt keywords");
        selected
    });

    let mut spec = registry.merged_defaults(template, theme, age, difficulty);
    if let Some(weather) = alias.and_then(|a| a.weather) {
        spec.effects.weather = weather;
    }

    apply_overrides(&mut spec, input, registry);
    enforce_consistency(&mut spec);
    fill_placeholders(&mut spec, registry);

    match serde_json::to_value(&spec).ok().and_then(|v| validate(&v)) {
        Some(valid) => valid,
        None => {
            log::warn!("Repair produced an invalid specification; using the minimal fallback");
            GameSpecification::minimal()
        }
    }
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn prompt_text(input: &Map<String, Value>) -> String {
    let title = input.get("title").and_then(Value::as_str).unwrap_or("");
    let description = input.get("description").and_then(Value::as_str).unwrap_or("");
    format!("{title} {description}")
}

// --- Scalar coercions ---------------------------------------------------------

fn truncate_chars(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect::<String>().trim_end().to_string()
}

fn coerce_text(v: &Value, max_chars: usize) -> Option<String> {
    let s = v.as_str()?.trim();
    if s.is_empty() {
        return None;
    }
    Some(truncate_chars(s, max_chars))
}

/// Lowercase slug: spaces and dots become dashes, anything else outside
/// `[a-z0-9_-]` is dropped.
pub fn slugify(s: &str) -> Option<String> {
    let mut out = String::new();
    for c in s.trim().chars() {
        let c = c.to_ascii_lowercase();
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
            out.push(c);
        } else if c == ' ' || c == '.' {
            out.push('-');
        }
        if out.len() >= limits::ID_CHARS {
            break;
        }
    }
    let out = out.trim_matches('-').to_string();
    (!out.is_empty()).then_some(out)
}

fn coerce_id(v: &Value) -> Option<String> {
    slugify(v.as_str()?)
}

fn as_number(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|n| n.is_finite())
}

fn coerce_f32(v: &Value, (min, max): (f32, f32)) -> Option<f32> {
    as_number(v).map(|n| (n as f32).clamp(min, max))
}

fn coerce_u32(v: &Value, (min, max): (u32, u32)) -> Option<u32> {
    as_number(v).map(|n| n.round().clamp(min as f64, max as f64) as u32)
}

fn coerce_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|n| n != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

const NAMED_COLORS: &[(&str, &str)] = &[
    ("black", "#000000"),
    ("white", "#FFFFFF"),
    ("red", "#E63946"),
    ("orange", "#F4A261"),
    ("yellow", "#FFD166"),
    ("green", "#2A9D8F"),
    ("blue", "#1D7BFF"),
    ("purple", "#7B5CFF"),
    ("pink", "#FF8FAB"),
    ("brown", "#8D5524"),
    ("gray", "#8D99AE"),
    ("grey", "#8D99AE"),
];

pub fn coerce_color(v: &Value) -> Option<String> {
    let s = v.as_str()?.trim();
    if is_hex_color(s) {
        return Some(s.to_string());
    }
    let hex = s.strip_prefix('#').unwrap_or(s);
    if hex.len() == 3 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        let expanded: String = hex.chars().flat_map(|c| [c, c]).collect();
        return Some(format!("#{}", expanded.to_ascii_uppercase()));
    }
    if hex.len() == 6 && hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Some(format!("#{hex}"));
    }
    let lower = s.to_ascii_lowercase();
    NAMED_COLORS
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, hex)| hex.to_string())
}

fn coerce_enum<T: DeserializeOwned + Copy>(v: &Value, aliases: &[(&str, T)]) -> Option<T> {
    let s = v.as_str()?.trim().to_ascii_lowercase().replace([' ', '_'], "-");
    if let Ok(value) = serde_json::from_value::<T>(Value::String(s.clone())) {
        return Some(value);
    }
    aliases.iter().find(|(alias, _)| *alias == s).map(|(_, value)| *value)
}

fn age_from_years(years: f64) -> AgeGroup {
    if years < 7.0 {
        AgeGroup::Young
    } else if years < 10.0 {
        AgeGroup::Middle
    } else {
        AgeGroup::Older
    }
}

fn coerce_age(v: &Value) -> Option<AgeGroup> {
    if let Value::Number(n) = v {
        return n.as_f64().map(age_from_years);
    }
    let s = v.as_str()?.trim().to_ascii_lowercase();
    match s.as_str() {
        "4-6" => return Some(AgeGroup::Young),
        "7-9" => return Some(AgeGroup::Middle),
        "10-12" => return Some(AgeGroup::Older),
        "young" | "little" | "preschool" | "toddler" | "kindergarten" => {
            return Some(AgeGroup::Young);
        }
        "kid" | "kids" | "child" | "children" => return Some(AgeGroup::Middle),
        "older" | "tween" | "teen" | "teens" => return Some(AgeGroup::Older),
        _ => {}
    }
    let digits: String = s
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse::<f64>().ok().map(age_from_years)
}

fn coerce_difficulty(v: &Value) -> Option<Difficulty> {
    if let Value::Number(n) = v {
        return n.as_f64().map(|n| {
            if n <= 1.0 {
                Difficulty::Easy
            } else if n < 3.0 {
                Difficulty::Medium
            } else {
                Difficulty::Hard
            }
        });
    }
    coerce_enum(
        v,
        &[
            ("beginner", Difficulty::Easy),
            ("simple", Difficulty::Easy),
            ("normal", Difficulty::Medium),
            ("moderate", Difficulty::Medium),
            ("intermediate", Difficulty::Medium),
            ("expert", Difficulty::Hard),
            ("difficult", Difficulty::Hard),
            ("challenging", Difficulty::Hard),
            ("advanced", Difficulty::Hard),
        ],
    )
}

fn coerce_behavior(v: &Value) -> Option<EnemyBehavior> {
    coerce_enum(
        v,
        &[
            ("follow", EnemyBehavior::Chase),
            ("chasing", EnemyBehavior::Chase),
            ("hunt", EnemyBehavior::Chase),
            ("walk", EnemyBehavior::Patrol),
            ("wander", EnemyBehavior::Patrol),
            ("move", EnemyBehavior::Patrol),
            ("patrolling", EnemyBehavior::Patrol),
            ("still", EnemyBehavior::Static),
            ("idle", EnemyBehavior::Static),
            ("none", EnemyBehavior::Static),
        ],
    )
}

fn coerce_win_condition(v: &Value) -> Option<WinCondition> {
    coerce_enum(
        v,
        &[
            ("collect-all", WinCondition::CollectTarget),
            ("collect-n", WinCondition::CollectTarget),
            ("collect", WinCondition::CollectTarget),
            ("score", WinCondition::CollectTarget),
            ("goal", WinCondition::ReachGoal),
            ("reach", WinCondition::ReachGoal),
            ("finish", WinCondition::ReachGoal),
            ("reach-end", WinCondition::ReachGoal),
            ("survival", WinCondition::Survive),
            ("time", WinCondition::Survive),
            ("timer", WinCondition::Survive),
        ],
    )
}

fn coerce_weather(v: &Value) -> Option<Weather> {
    coerce_enum(
        v,
        &[
            ("clear", Weather::None),
            ("off", Weather::None),
            ("snowfall", Weather::Snow),
            ("snowing", Weather::Snow),
            ("leaf", Weather::Leaves),
            ("falling-leaves", Weather::Leaves),
            ("bubble", Weather::Bubbles),
        ],
    )
}

fn coerce_ability(v: &Value) -> Option<Ability> {
    coerce_enum(
        v,
        &[
            ("double-jump", Ability::Jump),
            ("hop", Ability::Jump),
            ("sprint", Ability::Dash),
            ("boost", Ability::Dash),
        ],
    )
}

fn coerce_camera_mode(v: &Value) -> Option<CameraMode> {
    coerce_enum(
        v,
        &[
            ("scroll", CameraMode::Follow),
            ("side-scroll", CameraMode::Follow),
            ("static", CameraMode::Fixed),
            ("none", CameraMode::Fixed),
        ],
    )
}

fn coerce_shape(v: &Value) -> Option<ShapeKind> {
    coerce_enum(
        v,
        &[
            ("rect", ShapeKind::Square),
            ("rectangle", ShapeKind::Square),
            ("box", ShapeKind::Square),
            ("ball", ShapeKind::Circle),
            ("dot", ShapeKind::Circle),
            ("gem", ShapeKind::Diamond),
        ],
    )
}

/// Sprite descriptors: the tagged form, a bare asset id string, or an untagged
/// object that names either an asset id or a shape. The `fallback` supplies
/// the color when a shape arrives without a usable one.
fn coerce_sprite(v: &Value, fallback: &SpriteDescriptor) -> Option<SpriteDescriptor> {
    if let Some(s) = v.as_str() {
        return slugify(s).map(|id| SpriteDescriptor::Asset { id });
    }
    let obj = v.as_object()?;
    let kind = obj.get("kind").and_then(Value::as_str).map(str::to_ascii_lowercase);
    let asset_id = ["id", "asset", "spriteId", "sprite_id", "key"]
        .iter()
        .find_map(|k| obj.get(*k))
        .and_then(coerce_id);
    let shape = obj.get("shape").and_then(coerce_shape);

    let wants_shape = match kind.as_deref() {
        Some("shape") => true,
        Some("asset") => false,
        _ => shape.is_some() && asset_id.is_none(),
    };

    if wants_shape {
        let fallback_color = match fallback {
            SpriteDescriptor::Shape { color, .. } => color.clone(),
            SpriteDescriptor::Asset { .. } => "#FFFFFF".to_string(),
        };
        let color = ["color", "fill", "colour"]
            .iter()
            .find_map(|k| obj.get(*k))
            .and_then(coerce_color)
            .unwrap_or(fallback_color);
        return Some(SpriteDescriptor::Shape {
            shape: shape.unwrap_or(ShapeKind::Square),
            color,
        });
    }
    asset_id.map(|id| SpriteDescriptor::Asset { id })
}

fn coerce_id_list(v: &Value, max: usize) -> Option<Vec<String>> {
    let items = v.as_array()?;
    let mut out: Vec<String> = Vec::new();
    for id in items.iter().filter_map(coerce_id) {
        if !out.contains(&id) {
            out.push(id);
        }
        if out.len() == max {
            break;
        }
    }
    Some(out)
}

// --- Field application --------------------------------------------------------

fn apply_overrides(
    spec: &mut GameSpecification,
    input: &Map<String, Value>,
    registry: &ThemeRegistry,
) {
    if let Some(id) = input.get("id").and_then(coerce_id) {
        spec.id = id;
    }
    if let Some(title) = input.get("title").and_then(|v| coerce_text(v, limits::TITLE_CHARS)) {
        spec.title = title;
    }
    if let Some(description) = input
        .get("description")
        .and_then(|v| coerce_text(v, limits::DESCRIPTION_CHARS))
    {
        spec.description = description;
    }

    if let Some(palette) = field(input, &["palette", "colors"]).and_then(Value::as_object) {
        let slots = [
            ("primary", &mut spec.palette.primary),
            ("secondary", &mut spec.palette.secondary),
            ("background", &mut spec.palette.background),
            ("accent", &mut spec.palette.accent),
        ];
        for (key, slot) in slots {
            if let Some(color) = palette.get(key).and_then(coerce_color) {
                *slot = color;
            }
        }
    }

    if let Some(player) = input.get("player").and_then(Value::as_object) {
        apply_player(spec, player);
    }

    if let Some(enemies) = input.get("enemies").and_then(Value::as_array) {
        let base = registry.default_enemy(spec.template, spec.theme_pack, spec.difficulty);
        spec.enemies = enemies
            .iter()
            .filter_map(|v| repair_enemy(v, &base))
            .take(limits::MAX_ENEMIES)
            .collect();
    }

    if let Some(items) = input.get("collectibles").and_then(Value::as_array) {
        let base = registry.default_collectible(spec.theme_pack);
        let repaired: Vec<CollectibleConfig> = items
            .iter()
            .filter_map(|v| repair_collectible(v, &base))
            .take(limits::MAX_COLLECTIBLES)
            .collect();
        if repaired.is_empty() {
            log::debug!("Repair: no usable collectibles in input, keeping defaults");
        } else {
            spec.collectibles = repaired;
        }
    }

    if let Some(level) = input.get("level").and_then(Value::as_object) {
        if let Some(v) = level.get("segments").and_then(|v| coerce_u32(v, limits::SEGMENTS)) {
            spec.level.segments = v;
        }
        if let Some(v) = level.get("length").and_then(|v| coerce_f32(v, limits::LEVEL_LENGTH)) {
            spec.level.length = v;
        }
        if let Some(v) = level
            .get("obstacles")
            .and_then(|v| coerce_id_list(v, limits::MAX_OBSTACLES))
        {
            spec.level.obstacles = v;
        }
        if let Some(v) = field(level, &["winCondition", "win_condition", "goal"])
            .and_then(coerce_win_condition)
        {
            spec.level.win_condition = v;
        }
        if let Some(v) = field(level, &["winTarget", "win_target", "target"])
            .and_then(|v| coerce_u32(v, limits::WIN_TARGET))
        {
            spec.level.win_target = v;
        }
    }

    if let Some(physics) = input.get("physics").and_then(Value::as_object) {
        let p = &mut spec.physics;
        if let Some(v) = physics.get("gravity").and_then(|v| coerce_f32(v, limits::GRAVITY)) {
            p.gravity = v;
        }
        if let Some(v) = physics.get("friction").and_then(|v| coerce_f32(v, limits::FRICTION)) {
            p.friction = v;
        }
        if let Some(v) = field(physics, &["jumpVelocity", "jump_velocity", "jump"])
            .and_then(|v| coerce_f32(v, limits::JUMP_VELOCITY))
        {
            p.jump_velocity = v;
        }
        if let Some(v) = field(physics, &["maxFallSpeed", "max_fall_speed"])
            .and_then(|v| coerce_f32(v, limits::MAX_FALL_SPEED))
        {
            p.max_fall_speed = v;
        }
    }

    if let Some(camera) = input.get("camera").and_then(Value::as_object) {
        if let Some(v) = camera.get("mode").and_then(coerce_camera_mode) {
            spec.camera.mode = v;
        }
        if let Some(v) = camera
            .get("smoothing")
            .and_then(|v| coerce_f32(v, limits::CAMERA_SMOOTHING))
        {
            spec.camera.smoothing = v;
        }
    }

    if let Some(effects) = input.get("effects").and_then(Value::as_object) {
        if let Some(v) = effects
            .get("particles")
            .and_then(|v| coerce_id_list(v, limits::MAX_EFFECT_IDS))
        {
            spec.effects.particles = v;
        }
        if let Some(v) = effects
            .get("filters")
            .and_then(|v| coerce_id_list(v, limits::MAX_EFFECT_IDS))
        {
            spec.effects.filters = v;
        }
        if let Some(v) = effects.get("weather").and_then(coerce_weather) {
            spec.effects.weather = v;
        }
    }

    if let Some(audio) = input.get("audio").and_then(Value::as_object) {
        if let Some(v) = audio.get("music").and_then(coerce_id) {
            spec.audio.music = v;
        }
        if let Some(sfx) = audio.get("sfx").and_then(Value::as_object) {
            for (event, sound) in sfx {
                if let (Some(event), Some(sound)) = (slugify(event), coerce_id(sound)) {
                    spec.audio.sfx.insert(event, sound);
                }
            }
        }
    }

    if let Some(controls) = input.get("controls").and_then(Value::as_object) {
        let c = &mut spec.controls;
        for (key, slot) in [
            ("keyboard", &mut c.keyboard),
            ("touch", &mut c.touch),
            ("gamepad", &mut c.gamepad),
        ] {
            if let Some(v) = controls.get(key).and_then(coerce_bool) {
                *slot = v;
            }
        }
    }

    if let Some(ui) = input.get("ui").and_then(Value::as_object) {
        let u = &mut spec.ui;
        for (key, slot) in [
            ("showScore", &mut u.show_score),
            ("showHealth", &mut u.show_health),
            ("showTimer", &mut u.show_timer),
        ] {
            if let Some(v) = ui.get(key).and_then(coerce_bool) {
                *slot = v;
            }
        }
    }

    if let Some(v) = field(input, &["concepts", "codingConcepts"])
        .and_then(|v| coerce_id_list(v, limits::MAX_CONCEPTS))
    {
        spec.concepts = v;
    }

    if let Some(messages) = field(input, &["messages", "narrator"]).and_then(Value::as_object) {
        let m = &mut spec.messages;
        for (key, slot) in [
            ("intro", &mut m.intro),
            ("collect", &mut m.collect),
            ("hurt", &mut m.hurt),
            ("win", &mut m.win),
            ("lose", &mut m.lose),
        ] {
            if let Some(v) = messages.get(key).and_then(|v| coerce_text(v, limits::MESSAGE_CHARS)) {
                *slot = v;
            }
        }
    }
}

fn apply_player(spec: &mut GameSpecification, player: &Map<String, Value>) {
    let p = &mut spec.player;
    if let Some(v) = player.get("name").and_then(|v| coerce_text(v, limits::NAME_CHARS)) {
        p.name = v;
    }
    if let Some(v) = player.get("sprite").and_then(|v| coerce_sprite(v, &p.sprite)) {
        p.sprite = v;
    }
    if let Some(hitbox) = player.get("hitbox").and_then(Value::as_object) {
        if let Some(v) = hitbox.get("width").and_then(|v| coerce_f32(v, limits::HITBOX)) {
            p.hitbox.width = v;
        }
        if let Some(v) = hitbox.get("height").and_then(|v| coerce_f32(v, limits::HITBOX)) {
            p.hitbox.height = v;
        }
    }
    if let Some(v) = player.get("speed").and_then(|v| coerce_f32(v, limits::PLAYER_SPEED)) {
        p.speed = v;
    }
    if let Some(v) =
        field(player, &["health", "lives"]).and_then(|v| coerce_u32(v, limits::PLAYER_HEALTH))
    {
        p.health = v;
    }
    if let Some(list) = player.get("abilities").and_then(Value::as_array) {
        let mut abilities = Vec::new();
        for ability in list.iter().filter_map(coerce_ability) {
            if !abilities.contains(&ability) {
                abilities.push(ability);
            }
        }
        p.abilities = abilities;
    }
    if let Some(animations) = player.get("animations").and_then(Value::as_object) {
        let a = &mut p.animations;
        for (key, slot) in [
            ("idle", &mut a.idle),
            ("move", &mut a.moving),
            ("jump", &mut a.jump),
        ] {
            if let Some(v) = animations.get(key).and_then(coerce_id) {
                *slot = v;
            }
        }
    }
}

fn repair_enemy(v: &Value, base: &EnemyConfig) -> Option<EnemyConfig> {
    if let Some(name) = coerce_text(v, limits::NAME_CHARS) {
        return Some(EnemyConfig {
            name,
            ..base.clone()
        });
    }
    let obj = v.as_object()?;
    let mut enemy = base.clone();
    if let Some(name) = obj.get("name").and_then(|v| coerce_text(v, limits::NAME_CHARS)) {
        enemy.name = name;
    }
    if let Some(sprite) = obj.get("sprite").and_then(|v| coerce_sprite(v, &base.sprite)) {
        enemy.sprite = sprite;
    }
    if let Some(behavior) = obj.get("behavior").and_then(coerce_behavior) {
        enemy.behavior = behavior;
    }
    if let Some(speed) = obj.get("speed").and_then(|v| coerce_f32(v, limits::ENEMY_SPEED)) {
        enemy.speed = speed;
    }
    if let Some(hp) = field(obj, &["hp", "health"]).and_then(|v| coerce_u32(v, limits::ENEMY_HP)) {
        enemy.hp = hp;
    }
    Some(enemy)
}

fn repair_collectible(v: &Value, base: &CollectibleConfig) -> Option<CollectibleConfig> {
    if let Some(name) = coerce_text(v, limits::NAME_CHARS) {
        return Some(CollectibleConfig {
            name,
            ..base.clone()
        });
    }
    let obj = v.as_object()?;
    let mut item = base.clone();
    if let Some(name) = obj.get("name").and_then(|v| coerce_text(v, limits::NAME_CHARS)) {
        item.name = name;
    }
    if let Some(sprite) = obj.get("sprite").and_then(|v| coerce_sprite(v, &base.sprite)) {
        item.sprite = sprite;
    }
    if let Some(value) = field(obj, &["value", "points"])
        .and_then(|v| coerce_u32(v, limits::COLLECTIBLE_VALUE))
    {
        item.value = value;
    }
    if let Some(particle) = obj.get("particle").and_then(coerce_id) {
        item.particle = particle;
    }
    Some(item)
}

// --- Cross-field rules --------------------------------------------------------

fn enforce_consistency(spec: &mut GameSpecification) {
    let cap = max_enemies_for(spec.age_group, spec.difficulty);
    if spec.enemies.len() > cap {
        log::debug!(
            "Repair: trimming {} enemies to {} for age group {}",
            spec.enemies.len(),
            cap,
            spec.age_group.as_str()
        );
        spec.enemies.truncate(cap);
    }

    if spec.template == Template::TopDownCollector {
        spec.player.abilities.retain(|a| *a != Ability::Jump);
    }

    let total = spec.total_collectible_value().max(1);
    spec.level.win_target = match spec.level.win_condition {
        WinCondition::CollectTarget => spec.level.win_target.clamp(1, total),
        WinCondition::ReachGoal => 1,
        WinCondition::Survive => spec
            .level
            .win_target
            .clamp(limits::SURVIVE_SECONDS.0, limits::SURVIVE_SECONDS.1),
    };
}

fn fill_placeholders(spec: &mut GameSpecification, registry: &ThemeRegistry) {
    if spec.title.is_empty() {
        spec.title = truncate_chars(&registry.placeholder_title(spec), limits::TITLE_CHARS);
    }
    if spec.description.is_empty() {
        spec.description = truncate_chars(
            &registry.placeholder_description(spec),
            limits::DESCRIPTION_CHARS,
        );
    }

    let generated = registry.placeholder_messages(spec);
    let m = &mut spec.messages;
    for (slot, text) in [
        (&mut m.intro, generated.intro),
        (&mut m.collect, generated.collect),
        (&mut m.hurt, generated.hurt),
        (&mut m.win, generated.win),
        (&mut m.lose, generated.lose),
    ] {
        if slot.is_empty() {
            *slot = truncate_chars(&text, limits::MESSAGE_CHARS);
        }
    }

    if spec.id.is_empty() {
        let name = format!("{}/{}/{}", spec.template, spec.theme_pack, spec.title);
        spec.id = Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string();
    }
}
