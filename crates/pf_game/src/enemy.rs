use glam::Vec2;
use pf_spec::EnemyBehavior;

use crate::entity::{Entity, EntityState};

/// Per-template enemy movement rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnemyAi {
    pub side_view: bool,
    pub deadzone: f32,
    pub world_width: f32,
    pub world_height: f32,
}

impl EnemyAi {
    /// Advance one enemy by `dt`; `target` is the player centre.
    pub fn step(&self, enemy: &mut Entity, target: Vec2, dt: f32) {
        let Entity {
            aabb,
            velocity,
            state,
            ..
        } = enemy;
        let EntityState::Enemy(e) = state else {
            return;
        };

        let start = aabb.center();
        match e.behavior {
            EnemyBehavior::Static => {}
            EnemyBehavior::Patrol => {
                let next = aabb.center_x + e.direction * e.speed * dt;
                aabb.center_x = if next >= e.patrol_max {
                    e.direction = -1.0;
                    e.patrol_max
                } else if next <= e.patrol_min {
                    e.direction = 1.0;
                    e.patrol_min
                } else {
                    next
                };
            }
            EnemyBehavior::Chase => {
                let reach = e.speed * dt;
                let to_target = target - start;
                if to_target.x.abs() > self.deadzone {
                    aabb.center_x += to_target.x.signum() * reach.min(to_target.x.abs());
                    e.direction = to_target.x.signum();
                }
                if !self.side_view && to_target.y.abs() > self.deadzone {
                    aabb.center_y += to_target.y.signum() * reach.min(to_target.y.abs());
                }
            }
        }

        aabb.center_x = aabb
            .center_x
            .clamp(aabb.half_w, (self.world_width - aabb.half_w).max(aabb.half_w));
        if !self.side_view {
            aabb.center_y = aabb
                .center_y
                .clamp(aabb.half_h, (self.world_height - aabb.half_h).max(aabb.half_h));
        }
        let delta = aabb.center() - start;
        *velocity = if dt > 0.0 { delta / dt } else { Vec2::ZERO };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::Aabb;
    use crate::entity::{EnemyState, EntityKind, Visual};

    fn enemy(behavior: EnemyBehavior, x: f32, y: f32) -> Entity {
        Entity {
            id: 7,
            aabb: Aabb::new(Vec2::new(x, y), Vec2::new(28.0, 28.0)),
            velocity: Vec2::ZERO,
            visual: Visual {
                texture_key: "slime".to_string(),
                category: EntityKind::Enemy,
            },
            state: EntityState::Enemy(EnemyState {
                behavior,
                direction: 1.0,
                patrol_min: x - 50.0,
                patrol_max: x + 50.0,
                speed: 100.0,
                hp: 1,
            }),
        }
    }

    fn side() -> EnemyAi {
        EnemyAi {
            side_view: true,
            deadzone: 8.0,
            world_width: 2000.0,
            world_height: 600.0,
        }
    }

    fn direction(e: &Entity) -> f32 {
        match &e.state {
            EntityState::Enemy(s) => s.direction,
            _ => panic!("not an enemy"),
        }
    }

    #[test]
    fn patrol_reflects_at_bounds() {
        let ai = side();
        let mut e = enemy(EnemyBehavior::Patrol, 500.0, 78.0);
        let mut min_x = f32::MAX;
        let mut max_x = f32::MIN;
        for _ in 0..240 {
            ai.step(&mut e, Vec2::ZERO, 1.0 / 60.0);
            min_x = min_x.min(e.aabb.center_x);
            max_x = max_x.max(e.aabb.center_x);
        }
        assert_eq!(max_x, 550.0);
        assert_eq!(min_x, 450.0);
    }

    #[test]
    fn patrol_turns_around_at_max() {
        let ai = side();
        let mut e = enemy(EnemyBehavior::Patrol, 545.0, 78.0);
        if let EntityState::Enemy(s) = &mut e.state {
            s.patrol_min = 495.0;
            s.patrol_max = 550.0;
        }
        ai.step(&mut e, Vec2::ZERO, 0.1);
        assert_eq!(e.aabb.center_x, 550.0);
        assert_eq!(direction(&e), -1.0);
    }

    #[test]
    fn static_never_moves() {
        let ai = side();
        let mut e = enemy(EnemyBehavior::Static, 500.0, 78.0);
        ai.step(&mut e, Vec2::new(100.0, 78.0), 1.0);
        assert_eq!(e.position(), Vec2::new(500.0, 78.0));
        assert_eq!(e.velocity, Vec2::ZERO);
    }

    #[test]
    fn side_view_chase_is_horizontal_only() {
        let ai = side();
        let mut e = enemy(EnemyBehavior::Chase, 500.0, 78.0);
        ai.step(&mut e, Vec2::new(300.0, 300.0), 0.5);
        assert_eq!(e.position(), Vec2::new(450.0, 78.0));
        assert_eq!(direction(&e), -1.0);
    }

    #[test]
    fn chase_respects_deadzone_and_does_not_overshoot() {
        let ai = side();
        let mut near = enemy(EnemyBehavior::Chase, 500.0, 78.0);
        ai.step(&mut near, Vec2::new(505.0, 78.0), 1.0);
        assert_eq!(near.aabb.center_x, 500.0);

        let mut close = enemy(EnemyBehavior::Chase, 500.0, 78.0);
        ai.step(&mut close, Vec2::new(520.0, 78.0), 1.0);
        assert_eq!(close.aabb.center_x, 520.0);
    }

    #[test]
    fn top_down_chase_uses_both_axes() {
        let ai = EnemyAi {
            side_view: false,
            ..side()
        };
        let mut e = enemy(EnemyBehavior::Chase, 500.0, 300.0);
        ai.step(&mut e, Vec2::new(400.0, 400.0), 0.1);
        assert_eq!(e.position(), Vec2::new(490.0, 310.0));
    }
}
