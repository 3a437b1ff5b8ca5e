//! Template & theme tables and the rule-based selectors over them.
//!
//! Everything here is a lookup table: keyword lists, alias lists and
//! age/difficulty thresholds are plain data so that a selection can be traced
//! back to the row that produced it. The registry is constructed explicitly
//! and handed to repair, which keeps tests free to swap in their own tables.

use crate::schema::{
    Ability, AgeGroup, AnimationNames, AudioConfig, CameraConfig, CameraMode, CollectibleConfig,
    ControlsConfig, Difficulty, EffectsConfig, EnemyBehavior, EnemyConfig, GameSpecification,
    Hitbox, LevelConfig, NarratorMessages, Palette, PhysicsConfig, PlayerConfig,
    SpriteDescriptor, Template, ThemePack, UiConfig, Weather, WinCondition, limits,
};
use std::collections::BTreeMap;

/// Structural defaults owned by a template.
#[derive(Debug, Clone)]
pub struct TemplateDefaults {
    pub template: Template,
    /// Short noun used in generated titles ("Adventure").
    pub label: &'static str,
    /// Phrase used in generated descriptions.
    pub blurb: &'static str,
    pub camera: CameraConfig,
    pub physics: PhysicsConfig,
    pub player_speed: f32,
    pub hitbox: Hitbox,
    pub abilities: Vec<Ability>,
    pub segments: u32,
    pub length: f32,
    pub obstacles_per_segment: u32,
    pub win_condition: WinCondition,
    pub win_target: u32,
    pub collectible_count: usize,
    pub enemy_behavior: EnemyBehavior,
    pub enemy_speed: f32,
    pub controls: ControlsConfig,
    pub ui: UiConfig,
    pub particles: Vec<String>,
    pub weather: Weather,
    pub music: String,
    pub concepts: Vec<String>,
}

/// Visual and audio defaults owned by a theme pack.
#[derive(Debug, Clone)]
pub struct ThemeDefaults {
    pub theme: ThemePack,
    pub label: &'static str,
    /// Where the game takes place ("in outer space").
    pub setting: &'static str,
    pub palette: Palette,
    pub hero_name: String,
    pub hero_sprite: SpriteDescriptor,
    pub enemy_name: String,
    pub enemy_sprite: SpriteDescriptor,
    pub collectible_name: String,
    pub collectible_sprite: SpriteDescriptor,
    pub collect_particle: String,
    pub obstacle: String,
    pub particles: Vec<String>,
    pub filters: Vec<String>,
    /// `None` keeps the template's weather.
    pub weather: Option<Weather>,
    pub music: String,
    pub sfx: BTreeMap<String, String>,
}

/// A legacy or informal theme name and the curated pack it maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemeAlias {
    pub pack: ThemePack,
    pub weather: Option<Weather>,
}

#[derive(Debug, Clone)]
pub struct ThemeRegistry {
    templates: [TemplateDefaults; 3],
    themes: [ThemeDefaults; 3],
    template_keywords: Vec<(Template, Vec<&'static str>)>,
    theme_keywords: Vec<(ThemePack, Vec<&'static str>)>,
    template_aliases: Vec<(&'static str, Template)>,
    theme_aliases: Vec<(&'static str, Option<ThemeAlias>)>,
    default_theme: ThemePack,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn template_index(template: Template) -> usize {
    match template {
        Template::Platformer => 0,
        Template::EndlessRunner => 1,
        Template::TopDownCollector => 2,
    }
}

fn theme_index(theme: ThemePack) -> usize {
    match theme {
        ThemePack::Space => 0,
        ThemePack::Ocean => 1,
        ThemePack::Forest => 2,
    }
}

fn builtin_templates() -> [TemplateDefaults; 3] {
    let side_controls = ControlsConfig {
        keyboard: true,
        touch: true,
        gamepad: true,
    };
    [
        TemplateDefaults {
            template: Template::Platformer,
            label: "Adventure",
            blurb: "jump-and-run adventure",
            camera: CameraConfig {
                mode: CameraMode::Follow,
                smoothing: 6.0,
            },
            physics: PhysicsConfig {
                gravity: 1800.0,
                friction: 2000.0,
                jump_velocity: 620.0,
                max_fall_speed: 900.0,
            },
            player_speed: 180.0,
            hitbox: Hitbox {
                width: 20.0,
                height: 28.0,
            },
            abilities: vec![Ability::Jump],
            segments: 4,
            length: 3200.0,
            obstacles_per_segment: 2,
            win_condition: WinCondition::ReachGoal,
            win_target: 1,
            collectible_count: 10,
            enemy_behavior: EnemyBehavior::Patrol,
            enemy_speed: 60.0,
            controls: side_controls,
            ui: UiConfig {
                show_score: true,
                show_health: true,
                show_timer: false,
            },
            particles: strings(&["sparkle"]),
            weather: Weather::None,
            music: "adventure-loop".to_string(),
            concepts: strings(&["loops", "conditionals", "events"]),
        },
        TemplateDefaults {
            template: Template::EndlessRunner,
            label: "Dash",
            blurb: "fast endless runner",
            camera: CameraConfig {
                mode: CameraMode::Follow,
                smoothing: 10.0,
            },
            physics: PhysicsConfig {
                gravity: 2000.0,
                friction: 1500.0,
                jump_velocity: 700.0,
                max_fall_speed: 1000.0,
            },
            player_speed: 240.0,
            hitbox: Hitbox {
                width: 20.0,
                height: 28.0,
            },
            abilities: vec![Ability::Jump],
            segments: 6,
            length: 4800.0,
            obstacles_per_segment: 1,
            win_condition: WinCondition::CollectTarget,
            win_target: 15,
            collectible_count: 20,
            enemy_behavior: EnemyBehavior::Static,
            enemy_speed: 0.0,
            controls: side_controls,
            ui: UiConfig {
                show_score: true,
                show_health: true,
                show_timer: true,
            },
            particles: strings(&["dust", "sparkle"]),
            weather: Weather::None,
            music: "runner-loop".to_string(),
            concepts: strings(&["loops", "variables", "events"]),
        },
        TemplateDefaults {
            template: Template::TopDownCollector,
            label: "Treasure Hunt",
            blurb: "calm treasure hunt",
            camera: CameraConfig {
                mode: CameraMode::Fixed,
                smoothing: 6.0,
            },
            physics: PhysicsConfig {
                gravity: 0.0,
                friction: 2400.0,
                jump_velocity: 0.0,
                max_fall_speed: 900.0,
            },
            player_speed: 160.0,
            hitbox: Hitbox {
                width: 24.0,
                height: 24.0,
            },
            abilities: Vec::new(),
            segments: 1,
            length: 800.0,
            obstacles_per_segment: 0,
            win_condition: WinCondition::CollectTarget,
            win_target: 8,
            collectible_count: 8,
            enemy_behavior: EnemyBehavior::Chase,
            enemy_speed: 40.0,
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
            particles: strings(&["sparkle"]),
            weather: Weather::None,
            music: "gentle-loop".to_string(),
            concepts: strings(&["variables", "coordinates", "conditionals"]),
        },
    ]
}

fn sfx_table(collect: &str) -> BTreeMap<String, String> {
    [
        ("collect", collect),
        ("hurt", "hurt-buzz"),
        ("jump", "jump-boing"),
        ("dash", "dash-whoosh"),
        ("win", "win-fanfare"),
        ("lose", "lose-womp"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn palette(primary: &str, secondary: &str, background: &str, accent: &str) -> Palette {
    Palette {
        primary: primary.to_string(),
        secondary: secondary.to_string(),
        background: background.to_string(),
        accent: accent.to_string(),
    }
}

fn builtin_themes() -> [ThemeDefaults; 3] {
    [
        ThemeDefaults {
            theme: ThemePack::Space,
            label: "Space",
            setting: "among the stars",
            palette: palette("#7B5CFF", "#FFD166", "#0B1026", "#4CC9F0"),
            hero_name: "Astro".to_string(),
            hero_sprite: SpriteDescriptor::asset("astronaut"),
            enemy_name: "Space Blob".to_string(),
            enemy_sprite: SpriteDescriptor::asset("alien-blob"),
            collectible_name: "Star".to_string(),
            collectible_sprite: SpriteDescriptor::asset("star"),
            collect_particle: "stardust".to_string(),
            obstacle: "asteroid".to_string(),
            particles: strings(&["stardust", "sparkle"]),
            filters: strings(&["glow"]),
            weather: None,
            music: "space-theme".to_string(),
            sfx: sfx_table("collect-chime"),
        },
        ThemeDefaults {
            theme: ThemePack::Ocean,
            label: "Ocean",
            setting: "deep under the sea",
            palette: palette("#0077B6", "#90E0EF", "#023E8A", "#FFB703"),
            hero_name: "Finn".to_string(),
            hero_sprite: SpriteDescriptor::asset("diver"),
            enemy_name: "Grumpy Crab".to_string(),
            enemy_sprite: SpriteDescriptor::asset("crab"),
            collectible_name: "Pearl".to_string(),
            collectible_sprite: SpriteDescriptor::asset("pearl"),
            collect_particle: "bubble-pop".to_string(),
            obstacle: "coral".to_string(),
            particles: strings(&["bubbles", "sparkle"]),
            filters: strings(&["wave"]),
            weather: Some(Weather::Bubbles),
            music: "ocean-theme".to_string(),
            sfx: sfx_table("collect-bubble"),
        },
        ThemeDefaults {
            theme: ThemePack::Forest,
            label: "Forest",
            setting: "in a sunny forest",
            palette: palette("#2D6A4F", "#95D5B2", "#D8F3DC", "#F4A261"),
            hero_name: "Pip".to_string(),
            hero_sprite: SpriteDescriptor::asset("fox"),
            enemy_name: "Hedgehog".to_string(),
            enemy_sprite: SpriteDescriptor::asset("hedgehog"),
            collectible_name: "Acorn".to_string(),
            collectible_sprite: SpriteDescriptor::asset("acorn"),
            collect_particle: "leaf-burst".to_string(),
            obstacle: "log".to_string(),
            particles: strings(&["leaves", "sparkle"]),
            filters: strings(&["soft-light"]),
            weather: Some(Weather::Leaves),
            music: "forest-theme".to_string(),
            sfx: sfx_table("collect-chime"),
        },
    ]
}

/// Lowercased alphanumeric tokens of a free-text prompt.
pub fn tokenize(prompt: &str) -> Vec<String> {
    prompt
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn token_matches(token: &str, keyword: &str) -> bool {
    token == keyword
        || (token.len() == keyword.len() + 1
            && token.starts_with(keyword)
            && token.ends_with('s'))
}

fn first_match<T: Copy>(tokens: &[String], table: &[(T, Vec<&'static str>)]) -> Option<T> {
    // Table order is priority order.
    table.iter().find_map(|(value, keywords)| {
        tokens
            .iter()
            .any(|t| keywords.iter().any(|k| token_matches(t, k)))
            .then_some(*value)
    })
}

impl ThemeRegistry {
    pub fn builtin() -> Self {
        Self {
            templates: builtin_templates(),
            themes: builtin_themes(),
            template_keywords: vec![
                (
                    Template::EndlessRunner,
                    vec!["run", "runner", "running", "race", "racing", "endless", "dash"],
                ),
                (
                    Template::Platformer,
                    vec!["jump", "jumping", "platform", "platformer", "climb", "climbing"],
                ),
                (
                    Template::TopDownCollector,
                    vec!["collect", "collecting", "maze", "garden", "treasure", "explore"],
                ),
            ],
            theme_keywords: vec![
                (
                    ThemePack::Space,
                    vec![
                        "space", "rocket", "star", "planet", "alien", "astronaut", "galaxy",
                        "moon", "orbit", "comet", "spaceship", "ufo",
                    ],
                ),
                (
                    ThemePack::Ocean,
                    vec![
                        "ocean", "sea", "fish", "underwater", "whale", "shark", "coral",
                        "submarine", "mermaid", "beach", "wave", "dolphin", "octopus", "turtle",
                    ],
                ),
            ],
            template_aliases: vec![
                ("platformer", Template::Platformer),
                ("platform", Template::Platformer),
                ("side-scroller", Template::Platformer),
                ("sidescroller", Template::Platformer),
                ("side_scroller", Template::Platformer),
                ("endless-runner", Template::EndlessRunner),
                ("endless_runner", Template::EndlessRunner),
                ("runner", Template::EndlessRunner),
                ("endless", Template::EndlessRunner),
                ("top-down-collector", Template::TopDownCollector),
                ("top_down_collector", Template::TopDownCollector),
                ("top-down", Template::TopDownCollector),
                ("topdown", Template::TopDownCollector),
                ("collector", Template::TopDownCollector),
            ],
            theme_aliases: vec![
                ("space", Some(ThemeAlias { pack: ThemePack::Space, weather: None })),
                ("galaxy", Some(ThemeAlias { pack: ThemePack::Space, weather: None })),
                ("ocean", Some(ThemeAlias { pack: ThemePack::Ocean, weather: None })),
                ("underwater", Some(ThemeAlias { pack: ThemePack::Ocean, weather: None })),
                ("sea", Some(ThemeAlias { pack: ThemePack::Ocean, weather: None })),
                ("forest", Some(ThemeAlias { pack: ThemePack::Forest, weather: None })),
                (
                    "snow",
                    Some(ThemeAlias {
                        pack: ThemePack::Forest,
                        weather: Some(Weather::Snow),
                    }),
                ),
                ("candy", Some(ThemeAlias { pack: ThemePack::Forest, weather: None })),
                ("city", Some(ThemeAlias { pack: ThemePack::Forest, weather: None })),
                ("desert", Some(ThemeAlias { pack: ThemePack::Forest, weather: None })),
                ("farm", Some(ThemeAlias { pack: ThemePack::Forest, weather: None })),
                ("castle", Some(ThemeAlias { pack: ThemePack::Forest, weather: None })),
                // "custom" is an explicit request for inference from the prompt.
                ("custom", None),
            ],
            default_theme: ThemePack::Forest,
        }
    }

    /// Replace the theme keyword table, e.g. with a single-entry table in tests.
    pub fn with_theme_keywords(mut self, table: Vec<(ThemePack, Vec<&'static str>)>) -> Self {
        self.theme_keywords = table;
        self
    }

    pub fn with_default_theme(mut self, theme: ThemePack) -> Self {
        self.default_theme = theme;
        self
    }

    pub fn template_defaults(&self, template: Template) -> &TemplateDefaults {
        &self.templates[template_index(template)]
    }

    pub fn theme_defaults(&self, theme: ThemePack) -> &ThemeDefaults {
        &self.themes[theme_index(theme)]
    }

    /// Age safety first, then the challenge rule. Template words in the prompt
    /// only choose within the balanced band.
    pub fn select_template(&self, prompt: &str, age: AgeGroup, difficulty: Difficulty) -> Template {
        if age == AgeGroup::Young || difficulty == Difficulty::Easy {
            return Template::TopDownCollector;
        }
        if difficulty == Difficulty::Hard || age == AgeGroup::Older {
            return Template::EndlessRunner;
        }
        first_match(&tokenize(prompt), &self.template_keywords).unwrap_or(Template::Platformer)
    }

    pub fn select_theme(&self, prompt: &str) -> ThemePack {
        first_match(&tokenize(prompt), &self.theme_keywords).unwrap_or(self.default_theme)
    }

    pub fn template_alias(&self, name: &str) -> Option<Template> {
        let name = name.trim().to_ascii_lowercase();
        self.template_aliases
            .iter()
            .find(|(alias, _)| *alias == name)
            .map(|(_, template)| *template)
    }

    pub fn theme_alias(&self, name: &str) -> Option<ThemeAlias> {
        let name = name.trim().to_ascii_lowercase();
        self.theme_aliases
            .iter()
            .find(|(alias, _)| *alias == name)
            .and_then(|(_, alias)| *alias)
    }

    pub fn enemy_count(&self, age: AgeGroup, difficulty: Difficulty) -> usize {
        let base = match difficulty {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        };
        let count = if age == AgeGroup::Older { base + 1 } else { base };
        count.min(max_enemies_for(age, difficulty))
    }

    pub fn collectible_count(&self, template: Template, age: AgeGroup) -> usize {
        let count = self.template_defaults(template).collectible_count;
        if age == AgeGroup::Young {
            count.min(6)
        } else {
            count
        }
    }

    pub fn player_health(&self, age: AgeGroup, difficulty: Difficulty) -> u32 {
        if age == AgeGroup::Young {
            return 5;
        }
        match difficulty {
            Difficulty::Easy => 4,
            Difficulty::Medium => 3,
            Difficulty::Hard => 2,
        }
    }

    pub fn default_enemy(
        &self,
        template: Template,
        theme: ThemePack,
        difficulty: Difficulty,
    ) -> EnemyConfig {
        let t = self.template_defaults(template);
        let th = self.theme_defaults(theme);
        let factor = match difficulty {
            Difficulty::Easy => 0.75,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.3,
        };
        EnemyConfig {
            name: th.enemy_name.clone(),
            sprite: th.enemy_sprite.clone(),
            behavior: t.enemy_behavior,
            speed: (t.enemy_speed * factor).clamp(limits::ENEMY_SPEED.0, limits::ENEMY_SPEED.1),
            hp: 1,
        }
    }

    pub fn default_collectible(&self, theme: ThemePack) -> CollectibleConfig {
        let th = self.theme_defaults(theme);
        CollectibleConfig {
            name: th.collectible_name.clone(),
            sprite: th.collectible_sprite.clone(),
            value: 1,
            particle: th.collect_particle.clone(),
        }
    }

    /// Template defaults overlaid with theme defaults (theme wins where both
    /// speak, e.g. particle set, music and weather). Text fields that depend on
    /// final names (title, description, messages, id) are left empty for the
    /// placeholder pass.
    pub fn merged_defaults(
        &self,
        template: Template,
        theme: ThemePack,
        age: AgeGroup,
        difficulty: Difficulty,
    ) -> GameSpecification {
        let t = self.template_defaults(template);
        let th = self.theme_defaults(theme);

        let collectibles = vec![
            self.default_collectible(theme);
            self.collectible_count(template, age)
        ];
        let enemies = vec![
            self.default_enemy(template, theme, difficulty);
            self.enemy_count(age, difficulty)
        ];
        let obstacles = vec![th.obstacle.clone(); (t.segments * t.obstacles_per_segment) as usize];
        let total_value: u32 = collectibles.iter().map(|c| c.value).sum();
        let win_target = match t.win_condition {
            WinCondition::CollectTarget => t.win_target.min(total_value).max(1),
            _ => t.win_target,
        };

        GameSpecification {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            age_group: age,
            difficulty,
            template,
            theme_pack: theme,
            palette: th.palette.clone(),
            player: PlayerConfig {
                name: th.hero_name.clone(),
                sprite: th.hero_sprite.clone(),
                hitbox: t.hitbox,
                speed: t.player_speed,
                health: self.player_health(age, difficulty),
                abilities: t.abilities.clone(),
                animations: AnimationNames {
                    idle: "idle".to_string(),
                    moving: if template.is_side_view() { "run" } else { "walk" }.to_string(),
                    jump: "jump".to_string(),
                },
            },
            enemies,
            collectibles,
            level: LevelConfig {
                segments: t.segments,
                length: t.length,
                obstacles,
                win_condition: t.win_condition,
                win_target,
            },
            physics: t.physics,
            camera: t.camera,
            effects: EffectsConfig {
                particles: th.particles.clone(),
                filters: th.filters.clone(),
                weather: th.weather.unwrap_or(t.weather),
            },
            audio: AudioConfig {
                music: th.music.clone(),
                sfx: th.sfx.clone(),
            },
            controls: t.controls,
            ui: t.ui,
            concepts: t.concepts.clone(),
            messages: NarratorMessages {
                intro: String::new(),
                collect: String::new(),
                hurt: String::new(),
                win: String::new(),
                lose: String::new(),
            },
        }
    }

    pub fn placeholder_title(&self, spec: &GameSpecification) -> String {
        format!(
            "{}'s {} {}",
            spec.player.name,
            self.theme_defaults(spec.theme_pack).label,
            self.template_defaults(spec.template).label
        )
    }

    pub fn placeholder_description(&self, spec: &GameSpecification) -> String {
        let item = spec
            .collectibles
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("treasure");
        format!(
            "A {} {} where {} gathers {}s.",
            self.template_defaults(spec.template).blurb,
            self.theme_defaults(spec.theme_pack).setting,
            spec.player.name,
            item
        )
    }

    /// Narrator lines built from the final hero, item and enemy names.
    pub fn placeholder_messages(&self, spec: &GameSpecification) -> NarratorMessages {
        let hero = &spec.player.name;
        let item = spec
            .collectibles
            .first()
            .map(|c| c.name.as_str())
            .unwrap_or("treasure");
        let target = spec.level.win_target;
        let intro = match spec.level.win_condition {
            WinCondition::CollectTarget => {
                format!("Help {hero} collect {target} points of {item}s!")
            }
            WinCondition::ReachGoal => format!("Guide {hero} to the finish flag!"),
            WinCondition::Survive => format!("Keep {hero} going for {target} seconds!"),
        };
        let hurt = match spec.enemies.first() {
            Some(enemy) => format!("Ouch! Watch out for the {}!", enemy.name),
            None => "Ouch! Be careful!".to_string(),
        };
        NarratorMessages {
            intro,
            collect: format!("Nice! Another {item}!"),
            hurt,
            win: format!("You did it, {hero}!"),
            lose: format!("Don't give up, {hero}! Try again!"),
        }
    }
}

/// Upper bound on enemies for an age band; the youngest players get at most
/// one, and none at all on easy.
pub fn max_enemies_for(age: AgeGroup, difficulty: Difficulty) -> usize {
    match (age, difficulty) {
        (AgeGroup::Young, Difficulty::Easy) => 0,
        (AgeGroup::Young, _) => 1,
        _ => limits::MAX_ENEMIES,
    }
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
