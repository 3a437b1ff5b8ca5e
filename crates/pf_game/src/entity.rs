use glam::Vec2;
use pf_spec::EnemyBehavior;

use crate::collision::Aabb;

pub type EntityId = u32;

/// Entity family; doubles as the texture placeholder category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Player,
    Enemy,
    Collectible,
    Platform,
    Goal,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Player => "player",
            EntityKind::Enemy => "enemy",
            EntityKind::Collectible => "collectible",
            EntityKind::Platform => "platform",
            EntityKind::Goal => "goal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visual {
    /// Asset id or shape key (`shape:star:#FFD166`).
    pub texture_key: String,
    pub category: EntityKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionState {
    Idle,
    Moving,
    Airborne,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerState {
    pub motion: MotionState,
    pub grounded: bool,
    pub invulnerable: f32,
    pub dash_timer: f32,
    pub dash_cooldown: f32,
    /// -1 or 1.
    pub facing: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyState {
    pub behavior: EnemyBehavior,
    pub direction: f32,
    pub patrol_min: f32,
    pub patrol_max: f32,
    pub speed: f32,
    pub hp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectibleState {
    pub value: u32,
    pub collected: bool,
    pub particle: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityState {
    Player(PlayerState),
    Enemy(EnemyState),
    Collectible(CollectibleState),
    Platform,
    Goal { reached: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub id: EntityId,
    pub aabb: Aabb,
    pub velocity: Vec2,
    pub visual: Visual,
    pub state: EntityState,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self.state {
            EntityState::Player(_) => EntityKind::Player,
            EntityState::Enemy(_) => EntityKind::Enemy,
            EntityState::Collectible(_) => EntityKind::Collectible,
            EntityState::Platform => EntityKind::Platform,
            EntityState::Goal { .. } => EntityKind::Goal,
        }
    }

    pub fn position(&self) -> Vec2 {
        self.aabb.center()
    }

    /// Hidden entities are skipped by rendering and collision.
    pub fn is_active(&self) -> bool {
        !matches!(&self.state, EntityState::Collectible(c) if c.collected)
    }
}
