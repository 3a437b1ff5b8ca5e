//! Player movement for all three templates.
//!
//! - **Platformer / runner:** horizontal acceleration toward the input target,
//!   gravity, edge-triggered jump from grounded state, one-way platforms.
//! - **Top-down:** free 8-way movement, optionally toward the pointer.
//!
//! World coordinates are y-up; every step ends clamped to the world bounds.

use glam::Vec2;
use pf_core::Intent;
use pf_spec::{Ability, GameSpecification, PhysicsConfig, Template};

use crate::collision::{clamp_to_bounds, land_on_platforms, resolve_ground, Aabb};
use crate::config::EngineConfig;
use crate::entity::{Entity, EntityState, MotionState};
use crate::factory::World;

/// Pointer steering ignores targets closer than this on an axis.
const STEER_DEADZONE: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerTuning {
    pub speed: f32,
    pub can_jump: bool,
    pub can_dash: bool,
    pub dash_multiplier: f32,
    pub dash_secs: f32,
    pub dash_cooldown_secs: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    pub jumped: bool,
    pub dashed: bool,
    pub landed: bool,
}

/// Player motion for one template: intent to velocity, gravity, then ground,
/// platform and world-edge resolution.
#[derive(Debug, Clone)]
pub struct PhysicsWorld {
    pub physics: PhysicsConfig,
    pub template: Template,
    pub tuning: PlayerTuning,
    pub ground_top: f32,
    pub bounds_min: Vec2,
    pub bounds_max: Vec2,
    platforms: Vec<Aabb>,
}

impl PhysicsWorld {
    pub fn new(spec: &GameSpecification, world: &World, config: &EngineConfig) -> Self {
        Self {
            physics: spec.physics,
            template: spec.template,
            tuning: PlayerTuning {
                speed: spec.player.speed,
                can_jump: spec.player.can(Ability::Jump) && spec.template.is_side_view(),
                can_dash: spec.player.can(Ability::Dash),
                dash_multiplier: config.dash_multiplier,
                dash_secs: config.dash_secs,
                dash_cooldown_secs: config.dash_cooldown_secs,
            },
            ground_top: world.ground_top,
            bounds_min: Vec2::ZERO,
            bounds_max: Vec2::new(world.width, world.height),
            platforms: world.platforms(),
        }
    }

    fn side_view(&self) -> bool {
        self.template.is_side_view()
    }

    /// Movement direction from the intent; pointer steering applies only when
    /// no directional input is held.
    pub fn direction(&self, position: Vec2, intent: &Intent, pointer_world: Option<Vec2>) -> Vec2 {
        let mut dir = Vec2::new(intent.move_x, intent.move_y);
        if dir == Vec2::ZERO && intent.pointer_held {
            if let Some(target) = pointer_world {
                let delta = target - position;
                if delta.x.abs() > STEER_DEADZONE {
                    dir.x = delta.x.signum();
                }
                if !self.side_view() && delta.y.abs() > STEER_DEADZONE {
                    dir.y = delta.y.signum();
                }
            }
        }
        if self.side_view() {
            dir.y = 0.0;
        }
        if self.template == Template::EndlessRunner {
            dir.x = 1.0;
        }
        if dir.length_squared() > 1.0 {
            dir = dir.normalize();
        }
        dir
    }

    pub fn step_player(
        &self,
        player: &mut Entity,
        intent: &Intent,
        pointer_world: Option<Vec2>,
        dt: f32,
    ) -> StepEvents {
        let mut events = StepEvents::default();
        let dir = self.direction(player.aabb.center(), intent, pointer_world);
        let Entity {
            aabb,
            velocity,
            state,
            ..
        } = player;
        let EntityState::Player(s) = state else {
            return events;
        };

        s.invulnerable = (s.invulnerable - dt).max(0.0);
        s.dash_timer = (s.dash_timer - dt).max(0.0);
        s.dash_cooldown = (s.dash_cooldown - dt).max(0.0);

        if intent.action && self.tuning.can_dash && s.dash_cooldown <= 0.0 {
            s.dash_timer = self.tuning.dash_secs;
            s.dash_cooldown = self.tuning.dash_cooldown_secs;
            events.dashed = true;
        }
        let dashing = s.dash_timer > 0.0;
        let boost = if dashing { self.tuning.dash_multiplier } else { 1.0 };
        if dir.x != 0.0 {
            s.facing = dir.x.signum();
        }
        let friction_step = self.physics.friction * dt;

        if self.side_view() {
            // Horizontal control: direct speed while steering, friction when idle.
            if dir.x != 0.0 || dashing {
                let heading = if dir.x != 0.0 { dir.x } else { s.facing };
                velocity.x = self.tuning.speed * heading * boost;
            } else {
                velocity.x = move_towards(velocity.x, 0.0, friction_step);
            }

            // Jump is edge-triggered and only legal from grounded state.
            if intent.jump
                && s.grounded
                && self.tuning.can_jump
                && self.physics.jump_velocity > 0.0
            {
                velocity.y = self.physics.jump_velocity;
                s.grounded = false;
                events.jumped = true;
            }

            velocity.y = (velocity.y - self.physics.gravity * dt).max(-self.physics.max_fall_speed);

            let was_grounded = s.grounded;
            let previous_bottom = aabb.bottom();
            aabb.translate(*velocity * dt);

            // Grounded is driven from contact, not from y-position heuristics.
            if resolve_ground(aabb, self.ground_top) {
                velocity.y = velocity.y.max(0.0);
                s.grounded = true;
            } else if land_on_platforms(aabb, previous_bottom, velocity.y, &self.platforms) {
                velocity.y = 0.0;
                s.grounded = true;
            } else {
                s.grounded = false;
            }

            let contacts = clamp_to_bounds(aabb, self.bounds_min, self.bounds_max, false);
            if (contacts.left && velocity.x < 0.0) || (contacts.right && velocity.x > 0.0) {
                velocity.x = 0.0;
            }
            if contacts.up && velocity.y > 0.0 {
                velocity.y = 0.0;
            }

            events.landed = s.grounded && !was_grounded;
            s.motion = if !s.grounded {
                MotionState::Airborne
            } else if velocity.x.abs() > 1.0 {
                MotionState::Moving
            } else {
                MotionState::Idle
            };
        } else {
            if dir != Vec2::ZERO {
                *velocity = dir * self.tuning.speed * boost;
            } else if dashing {
                *velocity = Vec2::new(s.facing, 0.0) * self.tuning.speed * boost;
            } else {
                let speed = velocity.length();
                let slowed = move_towards(speed, 0.0, friction_step);
                *velocity = if speed > 0.0 {
                    *velocity * (slowed / speed)
                } else {
                    Vec2::ZERO
                };
            }
            aabb.translate(*velocity * dt);

            let contacts = clamp_to_bounds(aabb, self.bounds_min, self.bounds_max, true);
            if contacts.left || contacts.right {
                velocity.x = 0.0;
            }
            if contacts.up || contacts.down {
                velocity.y = 0.0;
            }
            s.grounded = false;
            s.motion = if velocity.length_squared() > 1.0 {
                MotionState::Moving
            } else {
                MotionState::Idle
            };
        }

        events
    }
}

pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else if target > current {
        current + max_delta
    } else {
        current - max_delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::{build_world, GROUND_TOP};
    use pf_spec::repair;
    use serde_json::json;

    const DT: f32 = 1.0 / 60.0;

    fn setup(raw: serde_json::Value) -> (PhysicsWorld, Entity) {
        let spec = repair(&raw);
        let world = build_world(&spec, Vec2::new(800.0, 600.0), 160.0);
        let physics = PhysicsWorld::new(&spec, &world, &EngineConfig::default());
        let player = world.player().expect("player").clone();
        (physics, player)
    }

    fn motion(player: &Entity) -> PlayerStateView {
        match &player.state {
            EntityState::Player(s) => PlayerStateView {
                grounded: s.grounded,
                motion: s.motion,
            },
            _ => panic!("not a player"),
        }
    }

    struct PlayerStateView {
        grounded: bool,
        motion: MotionState,
    }

    fn right() -> Intent {
        Intent {
            move_x: 1.0,
            ..Intent::default()
        }
    }

    #[test]
    fn idle_player_rests_on_ground() {
        let (physics, mut player) = setup(json!({"template": "platformer"}));
        for _ in 0..30 {
            physics.step_player(&mut player, &Intent::default(), None, DT);
        }
        assert_eq!(player.aabb.bottom(), GROUND_TOP);
        let view = motion(&player);
        assert!(view.grounded);
        assert_eq!(view.motion, MotionState::Idle);
    }

    #[test]
    fn moving_right_uses_spec_speed() {
        let (physics, mut player) =
            setup(json!({"template": "platformer", "player": {"speed": 200}}));
        let x0 = player.aabb.center_x;
        physics.step_player(&mut player, &right(), None, DT);
        assert!((player.velocity.x - 200.0).abs() < 1e-4);
        assert!((player.aabb.center_x - (x0 + 200.0 * DT)).abs() < 1e-3);
        assert_eq!(motion(&player).motion, MotionState::Moving);
    }

    #[test]
    fn friction_brings_player_to_rest() {
        let (physics, mut player) = setup(json!({"template": "platformer"}));
        for _ in 0..10 {
            physics.step_player(&mut player, &right(), None, DT);
        }
        for _ in 0..120 {
            physics.step_player(&mut player, &Intent::default(), None, DT);
        }
        assert_eq!(player.velocity.x, 0.0);
    }

    #[test]
    fn jump_only_activates_when_grounded() {
        let (physics, mut player) = setup(json!({"template": "platformer"}));
        let jump = Intent {
            jump: true,
            ..Intent::default()
        };
        let events = physics.step_player(&mut player, &jump, None, DT);
        assert!(events.jumped);
        assert!(player.velocity.y > 0.0);
        assert_eq!(motion(&player).motion, MotionState::Airborne);

        // A second press in the air does nothing.
        let vy = player.velocity.y;
        let events = physics.step_player(&mut player, &jump, None, DT);
        assert!(!events.jumped);
        assert!(player.velocity.y < vy);

        let mut landed = false;
        for _ in 0..240 {
            landed |= physics.step_player(&mut player, &Intent::default(), None, DT).landed;
        }
        assert!(landed);
        assert!(motion(&player).grounded);
    }

    #[test]
    fn top_down_ignores_jump_and_moves_on_both_axes() {
        let (physics, mut player) = setup(json!({"template": "top-down-collector"}));
        let start = player.position();
        let intent = Intent {
            move_x: 1.0,
            move_y: 1.0,
            jump: true,
            ..Intent::default()
        };
        let events = physics.step_player(&mut player, &intent, None, DT);
        assert!(!events.jumped);
        let moved = player.position() - start;
        assert!(moved.x > 0.0 && moved.y > 0.0);
        // Diagonal speed is not faster than straight movement.
        assert!((player.velocity.length() - physics.tuning.speed).abs() < 1e-3);
    }

    #[test]
    fn runner_moves_forward_without_input() {
        let (physics, mut player) = setup(json!({"template": "runner"}));
        let x0 = player.aabb.center_x;
        for _ in 0..10 {
            physics.step_player(&mut player, &Intent::default(), None, DT);
        }
        assert!(player.aabb.center_x > x0);
    }

    #[test]
    fn world_edges_stop_the_player() {
        let (physics, mut player) = setup(json!({"template": "platformer"}));
        let left = Intent {
            move_x: -1.0,
            ..Intent::default()
        };
        for _ in 0..120 {
            physics.step_player(&mut player, &left, None, DT);
        }
        assert_eq!(player.aabb.left(), 0.0);
        assert_eq!(player.velocity.x, 0.0);
    }

    #[test]
    fn pointer_steers_when_no_keys_are_held() {
        let (physics, player) = setup(json!({"template": "top-down-collector"}));
        let held = Intent {
            pointer_held: true,
            ..Intent::default()
        };
        let pos = player.position();
        let dir = physics.direction(pos, &held, Some(pos + Vec2::new(100.0, -100.0)));
        assert!(dir.x > 0.0 && dir.y < 0.0);
        let near = physics.direction(pos, &held, Some(pos + Vec2::new(2.0, 2.0)));
        assert_eq!(near, Vec2::ZERO);
    }

    #[test]
    fn dash_boosts_then_cools_down() {
        let (physics, mut player) = setup(json!({
            "template": "platformer",
            "player": {"abilities": ["jump", "dash"]}
        }));
        let dash = Intent {
            move_x: 1.0,
            action: true,
            ..Intent::default()
        };
        let events = physics.step_player(&mut player, &dash, None, DT);
        assert!(events.dashed);
        assert!(player.velocity.x > physics.tuning.speed);
        let events = physics.step_player(&mut player, &dash, None, DT);
        assert!(!events.dashed);
    }

    #[test]
    fn move_towards_does_not_overshoot() {
        assert_eq!(move_towards(5.0, 0.0, 10.0), 0.0);
        assert_eq!(move_towards(-5.0, 0.0, 2.0), -3.0);
        assert_eq!(move_towards(0.0, 4.0, 1.0), 1.0);
    }
}
