//! Deterministic entity layout for each template.
//!
//! World space is y-up. Side views scroll horizontally over `level.length`;
//! the top-down collector fits the logical screen.

use glam::Vec2;
use pf_spec::{GameSpecification, Template, WinCondition};

use crate::collision::Aabb;
use crate::entity::{
    CollectibleState, EnemyState, Entity, EntityId, EntityKind, EntityState, MotionState,
    PlayerState, Visual,
};

pub const GROUND_TOP: f32 = 64.0;

const SPAWN_MARGIN: f32 = 64.0;
const ENEMY_SIZE: Vec2 = Vec2::new(28.0, 28.0);
const COLLECTIBLE_SIZE: Vec2 = Vec2::new(20.0, 20.0);
const PLATFORM_SIZE: Vec2 = Vec2::new(120.0, 16.0);
const GOAL_SIZE: Vec2 = Vec2::new(32.0, 64.0);
const COLLECTIBLE_STRIDE: f32 = 160.0;
const PLATFORM_STRIDE: f32 = 360.0;
/// Enemies never spawn closer than this to the left edge.
const ENEMY_SAFE_X: f32 = 480.0;

#[derive(Debug, Clone, PartialEq)]
pub struct World {
    pub entities: Vec<Entity>,
    pub width: f32,
    pub height: f32,
    /// Ground surface; zero for the top-down template.
    pub ground_top: f32,
}

impl World {
    pub fn player(&self) -> Option<&Entity> {
        self.entities.iter().find(|e| e.kind() == EntityKind::Player)
    }

    pub fn player_mut(&mut self) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.kind() == EntityKind::Player)
    }

    pub fn platforms(&self) -> Vec<Aabb> {
        self.entities
            .iter()
            .filter(|e| e.kind() == EntityKind::Platform)
            .map(|e| e.aabb)
            .collect()
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.entities.iter().filter(|e| e.kind() == kind).count()
    }

    /// Starts another lap of a looping track: the player returns to
    /// `spawn_x` and every collectible and goal is live again.
    pub fn restart_lap(&mut self, spawn_x: f32) {
        for entity in &mut self.entities {
            match &mut entity.state {
                EntityState::Player(_) => entity.aabb.center_x = spawn_x,
                EntityState::Collectible(c) => c.collected = false,
                EntityState::Goal { reached } => *reached = false,
                EntityState::Enemy(_) | EntityState::Platform => {}
            }
        }
    }
}

struct Builder {
    next_id: EntityId,
    entities: Vec<Entity>,
}

impl Builder {
    fn push(&mut self, aabb: Aabb, texture_key: String, state: EntityState) {
        let mut entity = Entity {
            id: self.next_id,
            aabb,
            velocity: Vec2::ZERO,
            visual: Visual {
                texture_key,
                category: EntityKind::Player,
            },
            state,
        };
        entity.visual.category = entity.kind();
        self.entities.push(entity);
        self.next_id += 1;
    }
}

/// Build every entity for `spec` on a screen of `view` logical pixels.
pub fn build_world(spec: &GameSpecification, view: Vec2, patrol_range: f32) -> World {
    let side_view = spec.template.is_side_view();
    let width = if side_view {
        spec.level.length.max(view.x)
    } else {
        view.x
    };
    let height = view.y;
    let ground_top = if side_view { GROUND_TOP } else { 0.0 };

    let mut b = Builder {
        next_id: 1,
        entities: Vec::new(),
    };

    let hitbox = Vec2::new(spec.player.hitbox.width, spec.player.hitbox.height);
    let spawn = if side_view {
        Aabb::standing_on(SPAWN_MARGIN + hitbox.x * 0.5, ground_top, hitbox)
    } else {
        Aabb::new(Vec2::new(width * 0.12, height * 0.5), hitbox)
    };
    b.push(
        spawn,
        spec.player.sprite.key(),
        EntityState::Player(PlayerState {
            motion: MotionState::Idle,
            grounded: side_view,
            invulnerable: 0.0,
            dash_timer: 0.0,
            dash_cooldown: 0.0,
            facing: 1.0,
        }),
    );

    match spec.template {
        Template::Platformer => layout_platformer(&mut b, spec, width),
        Template::EndlessRunner => layout_runner(&mut b, spec, width),
        Template::TopDownCollector => layout_top_down(&mut b, spec, width, height),
    }

    let needs_goal = side_view || spec.level.win_condition == WinCondition::ReachGoal;
    if needs_goal {
        let goal = if side_view {
            Aabb::standing_on(width - 80.0, ground_top, GOAL_SIZE)
        } else {
            Aabb::new(Vec2::new(width - GOAL_SIZE.x, height * 0.5), GOAL_SIZE)
        };
        b.push(goal, "goal-flag".to_string(), EntityState::Goal { reached: false });
    }

    place_enemies(&mut b, spec, width, height, patrol_range);

    log::debug!(
        "Built {} entities for '{}' ({} x {})",
        b.entities.len(),
        spec.title,
        width,
        height
    );

    World {
        entities: b.entities,
        width,
        height,
        ground_top,
    }
}

fn stride_for(count: usize, span: f32, max: f32) -> f32 {
    if count == 0 {
        return 0.0;
    }
    (span / count as f32).min(max).max(1.0)
}

fn push_collectibles(
    b: &mut Builder,
    spec: &GameSpecification,
    positions: impl Iterator<Item = Vec2>,
) {
    for (item, pos) in spec.collectibles.iter().zip(positions) {
        b.push(
            Aabb::new(pos, COLLECTIBLE_SIZE),
            item.sprite.key(),
            EntityState::Collectible(CollectibleState {
                value: item.value,
                collected: false,
                particle: item.particle.clone(),
            }),
        );
    }
}

fn push_platforms(
    b: &mut Builder,
    spec: &GameSpecification,
    positions: impl Iterator<Item = Vec2>,
) {
    for (obstacle, pos) in spec.level.obstacles.iter().zip(positions) {
        b.push(
            Aabb::standing_on(pos.x, pos.y, PLATFORM_SIZE),
            obstacle.clone(),
            EntityState::Platform,
        );
    }
}

fn layout_platformer(b: &mut Builder, spec: &GameSpecification, width: f32) {
    let n = spec.collectibles.len();
    let start = 240.0;
    let stride = stride_for(n, width - start - 160.0, COLLECTIBLE_STRIDE);
    push_collectibles(
        b,
        spec,
        (0..n).map(|i| {
            let lift = if i % 2 == 0 { 20.0 } else { 90.0 };
            Vec2::new(start + i as f32 * stride, GROUND_TOP + lift)
        }),
    );

    let m = spec.level.obstacles.len();
    let stride = stride_for(m, width - 400.0, PLATFORM_STRIDE);
    push_platforms(
        b,
        spec,
        (0..m).map(|i| {
            let bottom = if i % 2 == 0 { 64.0 } else { 84.0 };
            Vec2::new(320.0 + (i as f32 + 0.5) * stride, GROUND_TOP + bottom)
        }),
    );
}

fn layout_runner(b: &mut Builder, spec: &GameSpecification, width: f32) {
    const STEPS: [f32; 3] = [0.0, 45.0, 90.0];
    // Step-zero items touch the ground so every lap scores without jumping.
    let base = COLLECTIBLE_SIZE.y * 0.5 + 2.0;
    let n = spec.collectibles.len();
    let start = 360.0;
    let stride = stride_for(n, width - start - 200.0, COLLECTIBLE_STRIDE);
    push_collectibles(
        b,
        spec,
        (0..n).map(|i| Vec2::new(start + i as f32 * stride, GROUND_TOP + base + STEPS[i % 3])),
    );

    let m = spec.level.obstacles.len();
    let stride = stride_for(m, width - start - 200.0, PLATFORM_STRIDE);
    push_platforms(
        b,
        spec,
        (0..m).map(|i| {
            Vec2::new(
                start + (i as f32 + 0.5) * stride,
                GROUND_TOP + 48.0 + STEPS[i % 3] * 0.5,
            )
        }),
    );
}

fn layout_top_down(b: &mut Builder, spec: &GameSpecification, width: f32, height: f32) {
    let n = spec.collectibles.len();
    if n == 0 {
        return;
    }
    let cols = (n as f32).sqrt().ceil().max(1.0) as usize;
    let rows = n.div_ceil(cols);
    let (x0, x1) = (width * 0.3, width * 0.92);
    let (y_top, y_bottom) = (height * 0.85, height * 0.15);
    let cell_w = (x1 - x0) / cols as f32;
    let cell_h = (y_top - y_bottom) / rows as f32;
    push_collectibles(
        b,
        spec,
        (0..n).map(|i| {
            let (row, col) = (i / cols, i % cols);
            Vec2::new(
                x0 + (col as f32 + 0.5) * cell_w,
                y_top - (row as f32 + 0.5) * cell_h,
            )
        }),
    );
}

fn place_enemies(
    b: &mut Builder,
    spec: &GameSpecification,
    width: f32,
    height: f32,
    patrol_range: f32,
) {
    let k = spec.enemies.len();
    let side_view = spec.template.is_side_view();
    for (i, enemy) in spec.enemies.iter().enumerate() {
        let t = (i + 1) as f32 / (k + 1) as f32;
        let aabb = if side_view {
            let x = (width * t).max(ENEMY_SAFE_X.min(width - ENEMY_SIZE.x));
            Aabb::standing_on(x, GROUND_TOP, ENEMY_SIZE)
        } else {
            let x = width * if i % 2 == 0 { 0.68 } else { 0.84 };
            Aabb::new(Vec2::new(x, height * t), ENEMY_SIZE)
        };
        let (lo, hi) = if side_view {
            (aabb.half_w, width - aabb.half_w)
        } else {
            (width * 0.5 + aabb.half_w, width - aabb.half_w)
        };
        let patrol_min = (aabb.center_x - patrol_range).max(lo);
        let patrol_max = (aabb.center_x + patrol_range).min(hi).max(patrol_min);
        b.push(
            aabb,
            enemy.sprite.key(),
            EntityState::Enemy(EnemyState {
                behavior: enemy.behavior,
                direction: -1.0,
                patrol_min,
                patrol_max,
                speed: enemy.speed,
                hp: enemy.hp,
            }),
        );
    }
}
