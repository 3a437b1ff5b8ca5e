//! One game session: entities, runtime counters and the per-tick update.
//!
//! A tick moves the player, then enemies, then resolves overlaps and finally
//! evaluates the win and lose rules. Terminal states freeze every entity.
//! The runner track loops: reaching its end starts a new lap with every
//! collectible respawned, so score keeps growing until the run is decided.

use glam::Vec2;
use pf_core::Intent;
use pf_spec::{GameSpecification, Template, WinCondition};
use serde::Serialize;

use crate::camera::CameraRig;
use crate::collision::collides;
use crate::config::EngineConfig;
use crate::enemy::EnemyAi;
use crate::entity::{EntityKind, EntityState};
use crate::factory::{build_world, World};
use crate::physics::PhysicsWorld;

/// Distance from the right world edge that counts as the end of a lap.
const LAP_EDGE: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Ready,
    Running,
    Paused,
    Won,
    Lost,
}

impl GameStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, GameStatus::Won | GameStatus::Lost)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuntimeState {
    pub score: u32,
    pub health: u32,
    pub max_health: u32,
    pub elapsed: f32,
    pub status: GameStatus,
    pub fps: f32,
    /// Completed laps of a looping track.
    pub laps: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Collected {
        value: u32,
        at: Vec2,
        particle: String,
    },
    Hurt {
        health: u32,
    },
    Jumped,
    Dashed,
    Landed,
    LapCompleted {
        lap: u32,
    },
    Won,
    Lost,
}

#[derive(Debug, Clone)]
pub struct Simulation {
    world: World,
    physics: PhysicsWorld,
    enemy_ai: EnemyAi,
    camera: CameraRig,
    state: RuntimeState,
    win_condition: WinCondition,
    win_target: u32,
    invulnerability_secs: f32,
    damage_per_hit: u32,
    /// Player spawn x when the track loops.
    lap_spawn_x: Option<f32>,
}

impl Simulation {
    pub fn new(spec: &GameSpecification, config: &EngineConfig) -> Self {
        let view = Vec2::new(config.width, config.height);
        let world = build_world(spec, view, config.patrol_range);
        let physics = PhysicsWorld::new(spec, &world, config);
        let enemy_ai = EnemyAi {
            side_view: spec.template.is_side_view(),
            deadzone: config.chase_deadzone,
            world_width: world.width,
            world_height: world.height,
        };
        let mut camera = CameraRig::new(spec.camera, view, world.width);
        let spawn_x = world.player().map(|p| p.aabb.center_x);
        if let Some(x) = spawn_x {
            camera.snap(x);
        }
        let lap_spawn_x = spawn_x.filter(|_| spec.template == Template::EndlessRunner);
        Self {
            world,
            physics,
            enemy_ai,
            camera,
            state: RuntimeState {
                score: 0,
                health: spec.player.health,
                max_health: spec.player.health,
                elapsed: 0.0,
                status: GameStatus::Ready,
                fps: 0.0,
                laps: 0,
            },
            win_condition: spec.level.win_condition,
            win_target: spec.level.win_target,
            invulnerability_secs: config.invulnerability_secs,
            damage_per_hit: config.damage_per_hit,
            lap_spawn_x,
        }
    }

    pub fn state(&self) -> &RuntimeState {
        &self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn player_position(&self) -> Option<Vec2> {
        self.world.player().map(|p| p.position())
    }

    /// Remaining invulnerability; drives the hurt flash.
    pub fn player_invulnerability(&self) -> f32 {
        match self.world.player().map(|p| &p.state) {
            Some(EntityState::Player(s)) => s.invulnerable,
            _ => 0.0,
        }
    }

    pub fn record_fps(&mut self, fps: f32) {
        self.state.fps = fps;
    }

    pub fn start(&mut self) -> bool {
        self.transition(GameStatus::Ready, GameStatus::Running)
    }

    pub fn pause(&mut self) -> bool {
        self.transition(GameStatus::Running, GameStatus::Paused)
    }

    pub fn resume(&mut self) -> bool {
        self.transition(GameStatus::Paused, GameStatus::Running)
    }

    fn transition(&mut self, from: GameStatus, to: GameStatus) -> bool {
        if self.state.status == from {
            log::debug!("Game status {:?} -> {:?}", from, to);
            self.state.status = to;
            true
        } else {
            false
        }
    }

    /// Advance one tick. Does nothing unless the game is running and `dt` is
    /// a positive finite number.
    pub fn step(&mut self, intent: &Intent, dt: f32) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.state.status != GameStatus::Running || !(dt.is_finite() && dt > 0.0) {
            return events;
        }
        self.state.elapsed += dt;

        let pointer_world = intent.pointer.map(|p| self.camera.screen_to_world(p));
        let Some(player) = self.world.player_mut() else {
            return events;
        };
        let moved = self.physics.step_player(player, intent, pointer_world, dt);
        let player_box = player.aabb;
        let mut invulnerable = match &player.state {
            EntityState::Player(s) => s.invulnerable > 0.0,
            _ => false,
        };
        if moved.jumped {
            events.push(GameEvent::Jumped);
        }
        if moved.dashed {
            events.push(GameEvent::Dashed);
        }
        if moved.landed {
            events.push(GameEvent::Landed);
        }

        let target = player_box.center();
        let mut goal_reached = false;
        let mut hit = false;
        for entity in &mut self.world.entities {
            match entity.kind() {
                EntityKind::Enemy => {
                    self.enemy_ai.step(entity, target, dt);
                    if !invulnerable && collides(&player_box, &entity.aabb) {
                        hit = true;
                        invulnerable = true;
                    }
                }
                EntityKind::Collectible => {
                    let at = entity.position();
                    if let EntityState::Collectible(c) = &mut entity.state {
                        if !c.collected && collides(&player_box, &entity.aabb) {
                            c.collected = true;
                            self.state.score = self.state.score.saturating_add(c.value);
                            log::debug!(
                                "Collected {} (+{}) score={}",
                                entity.id,
                                c.value,
                                self.state.score
                            );
                            events.push(GameEvent::Collected {
                                value: c.value,
                                at,
                                particle: c.particle.clone(),
                            });
                        }
                    }
                }
                EntityKind::Goal => {
                    if let EntityState::Goal { reached } = &mut entity.state {
                        if collides(&player_box, &entity.aabb) {
                            *reached = true;
                        }
                        goal_reached |= *reached;
                    }
                }
                EntityKind::Player | EntityKind::Platform => {}
            }
        }

        if hit {
            self.state.health = self.state.health.saturating_sub(self.damage_per_hit);
            if let Some(EntityState::Player(s)) = self.world.player_mut().map(|p| &mut p.state) {
                s.invulnerable = self.invulnerability_secs;
            }
            log::debug!("Player hurt, health={}", self.state.health);
            events.push(GameEvent::Hurt {
                health: self.state.health,
            });
        }

        let won = match self.win_condition {
            WinCondition::CollectTarget => self.state.score >= self.win_target,
            WinCondition::ReachGoal => goal_reached,
            WinCondition::Survive => self.state.elapsed >= self.win_target as f32,
        };
        if won {
            self.state.status = GameStatus::Won;
            log::info!("Game won: score={} elapsed={:.2}s", self.state.score, self.state.elapsed);
            events.push(GameEvent::Won);
        } else if self.state.health == 0 {
            self.state.status = GameStatus::Lost;
            log::info!("Game lost: score={} elapsed={:.2}s", self.state.score, self.state.elapsed);
            events.push(GameEvent::Lost);
        } else if let Some(spawn_x) = self.lap_spawn_x {
            if player_box.right() >= self.world.width - LAP_EDGE {
                self.world.restart_lap(spawn_x);
                self.state.laps += 1;
                self.camera.snap(spawn_x);
                log::debug!("Lap {} done, score={}", self.state.laps, self.state.score);
                events.push(GameEvent::LapCompleted {
                    lap: self.state.laps,
                });
                return events;
            }
        }

        self.camera.follow(target.x, dt);
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_spec::repair;
    use serde_json::json;

    const DT: f32 = 1.0 / 60.0;

    fn running(raw: serde_json::Value) -> Simulation {
        let spec = repair(&raw);
        let mut sim = Simulation::new(&spec, &EngineConfig::default());
        assert!(sim.start());
        sim
    }

    fn move_player_to(sim: &mut Simulation, at: Vec2) {
        let player = sim.world_mut().player_mut().expect("player");
        player.aabb.center_x = at.x;
        player.aabb.center_y = at.y;
    }

    /// Drop everything except the player and enemies so overlaps are isolated.
    fn only_player_and_enemies(sim: &mut Simulation) {
        sim.world_mut()
            .entities
            .retain(|e| matches!(e.kind(), EntityKind::Player | EntityKind::Enemy));
    }

    fn first_of(sim: &Simulation, kind: EntityKind) -> Vec2 {
        sim.world()
            .entities
            .iter()
            .find(|e| e.kind() == kind)
            .expect("entity of kind")
            .position()
    }

    #[test]
    fn ready_game_does_not_advance() {
        let spec = repair(&json!({}));
        let mut sim = Simulation::new(&spec, &EngineConfig::default());
        let before = sim.player_position();
        let events = sim.step(&Intent { move_x: 1.0, ..Intent::default() }, DT);
        assert!(events.is_empty());
        assert_eq!(sim.player_position(), before);
        assert_eq!(sim.state().elapsed, 0.0);
    }

    #[test]
    fn bad_deltas_are_ignored() {
        let mut sim = running(json!({}));
        for dt in [f32::NAN, f32::INFINITY, 0.0, -0.5] {
            assert!(sim.step(&Intent::default(), dt).is_empty());
        }
        assert_eq!(sim.state().elapsed, 0.0);
    }

    #[test]
    fn collectible_scores_exactly_once() {
        let mut sim = running(json!({
            "template": "top-down-collector",
            "difficulty": "easy",
            "ageGroup": "4-6"
        }));
        let item = first_of(&sim, EntityKind::Collectible);
        let value = sim
            .world()
            .entities
            .iter()
            .find_map(|e| match &e.state {
                EntityState::Collectible(c) => Some(c.value),
                _ => None,
            })
            .expect("collectible value");

        move_player_to(&mut sim, item);
        let events = sim.step(&Intent::default(), DT);
        assert!(events.iter().any(|e| matches!(e, GameEvent::Collected { .. })));
        assert_eq!(sim.state().score, value);

        move_player_to(&mut sim, item);
        sim.step(&Intent::default(), DT);
        assert_eq!(sim.state().score, value);
    }

    #[test]
    fn enemy_hit_costs_one_health_then_grants_invulnerability() {
        let mut sim = running(json!({
            "template": "platformer",
            "ageGroup": "10-12",
            "difficulty": "hard",
            "player": {"health": 3},
            "enemies": [{"behavior": "static"}]
        }));
        only_player_and_enemies(&mut sim);
        let enemy = first_of(&sim, EntityKind::Enemy);
        move_player_to(&mut sim, enemy);
        let events = sim.step(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::Hurt { health: 2 }));
        assert!(sim.player_invulnerability() > 0.0);

        move_player_to(&mut sim, enemy);
        sim.step(&Intent::default(), DT);
        assert_eq!(sim.state().health, 2);
    }

    #[test]
    fn health_reaching_zero_loses_and_freezes() {
        let mut sim = running(json!({
            "template": "platformer",
            "ageGroup": "10-12",
            "player": {"health": 1},
            "enemies": [{"behavior": "static"}]
        }));
        only_player_and_enemies(&mut sim);
        let enemy = first_of(&sim, EntityKind::Enemy);
        move_player_to(&mut sim, enemy);
        let events = sim.step(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::Lost));
        assert_eq!(sim.state().health, 0);
        assert_eq!(sim.state().status, GameStatus::Lost);

        let frozen = sim.player_position();
        assert!(sim.step(&Intent { move_x: 1.0, ..Intent::default() }, DT).is_empty());
        assert_eq!(sim.player_position(), frozen);
        assert_eq!(sim.state().health, 0);
    }

    #[test]
    fn collect_target_wins_when_score_reaches_target() {
        let mut sim = running(json!({
            "template": "top-down-collector",
            "level": {"winCondition": "collect-target", "winTarget": 1}
        }));
        let item = first_of(&sim, EntityKind::Collectible);
        move_player_to(&mut sim, item);
        let events = sim.step(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::Won));
        assert_eq!(sim.state().status, GameStatus::Won);
    }

    #[test]
    fn survive_wins_after_target_seconds() {
        let mut sim = running(json!({
            "template": "top-down-collector",
            "enemies": [],
            "level": {"winCondition": "survive", "winTarget": 5}
        }));
        only_player_and_enemies(&mut sim);
        let mut won_at = None;
        for tick in 0..400 {
            if sim.step(&Intent::default(), DT).contains(&GameEvent::Won) {
                won_at = Some(tick);
                break;
            }
        }
        let tick = won_at.expect("survive should win");
        assert!((299..=300).contains(&tick));
    }

    #[test]
    fn reaching_goal_wins() {
        let mut sim = running(json!({
            "template": "platformer",
            "level": {"winCondition": "reach-goal"}
        }));
        let goal = first_of(&sim, EntityKind::Goal);
        move_player_to(&mut sim, goal);
        let events = sim.step(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::Won));
    }

    fn run_until_terminal(
        sim: &mut Simulation,
        jump_every: Option<usize>,
        max_ticks: usize,
    ) -> usize {
        for tick in 0..max_ticks {
            let intent = Intent {
                jump: jump_every.is_some_and(|n| tick % n == 0),
                ..Intent::default()
            };
            sim.step(&intent, DT);
            if sim.state().status.is_terminal() {
                return tick;
            }
        }
        max_ticks
    }

    #[test]
    fn runner_track_loops_and_respawns_items() {
        let mut sim = running(json!({"template": "runner", "enemies": []}));
        let spawn = sim.player_position().expect("player");
        let end = sim.world().width;
        move_player_to(&mut sim, Vec2::new(end, spawn.y));
        let events = sim.step(&Intent::default(), DT);
        assert!(events.contains(&GameEvent::LapCompleted { lap: 1 }));
        assert_eq!(sim.state().laps, 1);
        let player = sim.player_position().expect("player");
        assert_eq!(player.x, spawn.x);
        assert!(sim.world().entities.iter().all(|e| e.is_active()));
        assert_eq!(sim.state().status, GameStatus::Running);
    }

    #[test]
    fn runner_sessions_always_reach_a_terminal_status() {
        let cases = [
            (json!({"template": "runner", "enemies": []}), None),
            (json!({"template": "runner", "enemies": []}), Some(20)),
            (json!({"template": "runner", "enemies": [], "player": {"abilities": []}}), None),
            (
                json!({
                    "template": "runner",
                    "enemies": [],
                    "player": {"abilities": [], "hitbox": {"width": 8, "height": 8}}
                }),
                None,
            ),
        ];
        for (raw, jump_every) in cases {
            let mut sim = running(raw.clone());
            let ticks = run_until_terminal(&mut sim, jump_every, 60 * 60 * 20);
            assert_eq!(sim.state().status, GameStatus::Won, "{raw} after {ticks} ticks");
            assert!(sim.state().score >= sim.win_target);
        }
    }

    #[test]
    fn pause_and_resume_gate_the_loop() {
        let mut sim = running(json!({}));
        assert!(sim.pause());
        assert!(sim.step(&Intent::default(), DT).is_empty());
        assert!(!sim.pause());
        assert!(sim.resume());
        sim.step(&Intent::default(), DT);
        assert!(sim.state().elapsed > 0.0);
    }
}
