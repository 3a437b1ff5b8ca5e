pub mod loader;
pub mod registry;
pub mod repair;
pub mod schema;

pub use loader::{fingerprint, fingerprint_seed, load_spec_from_path, parse_spec_text, SpecError};
pub use registry::{max_enemies_for, TemplateDefaults, ThemeAlias, ThemeDefaults, ThemeRegistry};
pub use repair::{repair, repair_with};
pub use schema::{
    is_hex_color, validate, validate_detailed, Ability, AgeGroup, AudioConfig, CameraConfig,
    CameraMode, CollectibleConfig, ControlsConfig, Difficulty, EffectsConfig, EnemyBehavior,
    EnemyConfig, GameSpecification, LevelConfig, NarratorMessages, Palette, PhysicsConfig,
    PlayerConfig, ShapeKind, SpriteDescriptor, Template, ThemePack, UiConfig, ValidationIssue,
    Weather, WinCondition,
};
