pub mod assets;
pub mod camera;
pub mod collision;
pub mod config;
pub mod enemy;
pub mod engine;
pub mod entity;
pub mod factory;
pub mod physics;
pub mod render;
pub mod replay;
pub mod simulation;

pub use assets::{AssetRegistry, TextureHandle};
pub use camera::CameraRig;
pub use collision::{collides, Aabb};
pub use config::{load_config_from_path, validate_config, EngineConfig};
pub use engine::{open_audio, Engine, EngineError};
pub use entity::{Entity, EntityKind, EntityState, MotionState};
pub use factory::{build_world, World, GROUND_TOP};
pub use physics::PhysicsWorld;
pub use render::{CommandRecorder, DrawCommand, ImageRenderer, RenderAdapter, Rgba, Shape};
pub use replay::{load_replay_from_path, ReplaySequence};
pub use simulation::{GameEvent, GameStatus, RuntimeState, Simulation};
