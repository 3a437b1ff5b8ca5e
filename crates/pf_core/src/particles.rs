//! Particle emitters for ambient weather and one-shot bursts.
//!
//! All randomness is drawn from one seeded `StdRng` owned by the
//! [`ParticleSystem`], so a run with the same seed and the same sequence of
//! calls produces the same particles.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmitterKind {
    Snow,
    Leaves,
    Bubbles,
    Sparkle,
    Burst,
    Confetti,
}

impl EmitterKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id {
            "snow" => Some(Self::Snow),
            "leaves" | "leaf-burst" => Some(Self::Leaves),
            "bubbles" | "bubble-pop" => Some(Self::Bubbles),
            "sparkle" | "stardust" | "dust" => Some(Self::Sparkle),
            "burst" => Some(Self::Burst),
            "confetti" => Some(Self::Confetti),
            _ => None,
        }
    }

    pub fn is_one_shot(self) -> bool {
        matches!(self, Self::Burst | Self::Confetti)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub life: f32,
    pub max_life: f32,
    pub size: f32,
    pub color: Rgb,
    pub alpha: f32,
    pub rotation: f32,
    pub spin: f32,
}

impl Particle {
    pub fn new(position: Vec2, velocity: Vec2, life: f32, size: f32, color: Rgb) -> Self {
        Self {
            position,
            velocity,
            life,
            max_life: life,
            size,
            color,
            alpha: 1.0,
            rotation: 0.0,
            spin: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Emitter {
    pub kind: EmitterKind,
    pub one_shot: bool,
    /// Screen-space emitters ignore the camera.
    pub screen_space: bool,
    /// Continuous emitters are topped up to this count by `ParticleSystem::maintain`.
    pub target: usize,
    pub particles: Vec<Particle>,
    acceleration: Vec2,
    /// Particles outside this box (min, max) are removed.
    bounds: Option<(Vec2, Vec2)>,
    primed: bool,
}

impl Emitter {
    pub fn new(kind: EmitterKind) -> Self {
        Self {
            kind,
            one_shot: kind.is_one_shot(),
            screen_space: !kind.is_one_shot(),
            target: 0,
            particles: Vec::new(),
            acceleration: Vec2::ZERO,
            bounds: None,
            primed: false,
        }
    }

    pub fn with_acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_bounds(mut self, min: Vec2, max: Vec2) -> Self {
        self.bounds = Some((min, max));
        self
    }

    pub fn spawn(&mut self, count: usize, mut factory: impl FnMut(usize) -> Particle) {
        self.particles.reserve(count);
        for i in 0..count {
            self.particles.push(factory(i));
        }
    }

    /// Integrate, decay life, fade alpha with remaining life and drop dead or
    /// out-of-bounds particles.
    pub fn update(&mut self, dt: f32) {
        let acceleration = self.acceleration;
        let bounds = self.bounds;
        for p in &mut self.particles {
            p.velocity += acceleration * dt;
            p.position += p.velocity * dt;
            p.rotation += p.spin * dt;
            p.life -= dt;
            p.alpha = if p.max_life > 0.0 {
                (p.life / p.max_life).clamp(0.0, 1.0)
            } else {
                0.0
            };
        }
        self.particles.retain(|p| {
            p.life > 0.0
                && bounds.map_or(true, |(min, max)| {
                    p.position.cmpge(min).all() && p.position.cmple(max).all()
                })
        });
    }

    pub fn is_finished(&self) -> bool {
        self.one_shot && self.particles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}

const SNOW: Rgb = [255, 255, 255];
const LEAF_COLORS: [Rgb; 3] = [[233, 196, 106], [244, 162, 97], [42, 157, 143]];
const BUBBLE: Rgb = [202, 240, 248];
const SPARKLE: Rgb = [255, 209, 102];

const BURST_COUNT: usize = 16;
const CONFETTI_COUNT: usize = 60;
const MARGIN: f32 = 24.0;

pub struct ParticleSystem {
    rng: StdRng,
    view: Vec2,
    emitters: Vec<Emitter>,
}

impl ParticleSystem {
    /// `view` is the logical screen size, used by screen-space emitters.
    pub fn new(seed: u64, view: Vec2) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            view,
            emitters: Vec::new(),
        }
    }

    /// Add a continuous screen-space emitter (weather or ambient sparkle).
    /// One-shot kinds are ignored here; use [`Self::burst`] or [`Self::confetti`].
    pub fn add_ambient(&mut self, kind: EmitterKind, target: usize) {
        if kind.is_one_shot() || target == 0 {
            return;
        }
        let min = Vec2::splat(-MARGIN * 2.0);
        let max = self.view + Vec2::splat(MARGIN * 2.0);
        let acceleration = match kind {
            EmitterKind::Bubbles => Vec2::new(0.0, 12.0),
            _ => Vec2::ZERO,
        };
        let mut emitter = Emitter::new(kind)
            .with_acceleration(acceleration)
            .with_bounds(min, max);
        emitter.target = target;
        log::debug!("Adding {kind:?} emitter with {target} particles");
        self.emitters.push(emitter);
    }

    /// One-shot radial burst at a world position.
    pub fn burst(&mut self, origin: Vec2, color: Rgb) {
        let mut emitter =
            Emitter::new(EmitterKind::Burst).with_acceleration(Vec2::new(0.0, -400.0));
        let rng = &mut self.rng;
        emitter.spawn(BURST_COUNT, |i| {
            let angle = i as f32 / BURST_COUNT as f32 * std::f32::consts::TAU
                + rng.gen_range(-0.2..0.2);
            let speed: f32 = rng.gen_range(90.0..180.0);
            let mut p = Particle::new(
                origin,
                Vec2::new(angle.cos(), angle.sin()) * speed,
                rng.gen_range(0.35..0.6),
                rng.gen_range(2.0..4.0),
                color,
            );
            p.spin = rng.gen_range(-6.0..6.0);
            p
        });
        self.emitters.push(emitter);
    }

    /// Victory confetti raining from the top of the screen.
    pub fn confetti(&mut self, colors: &[Rgb]) {
        let colors: Vec<Rgb> = if colors.is_empty() {
            vec![SPARKLE]
        } else {
            colors.to_vec()
        };
        let mut emitter =
            Emitter::new(EmitterKind::Confetti).with_acceleration(Vec2::new(0.0, -160.0));
        emitter.screen_space = true;
        let view = self.view;
        let rng = &mut self.rng;
        emitter.spawn(CONFETTI_COUNT, |i| {
            let mut p = Particle::new(
                Vec2::new(rng.gen_range(0.0..view.x.max(1.0)), view.y + rng.gen_range(0.0..MARGIN)),
                Vec2::new(rng.gen_range(-60.0..60.0), rng.gen_range(-40.0..80.0)),
                rng.gen_range(1.5..2.5),
                rng.gen_range(3.0..6.0),
                colors[i % colors.len()],
            );
            p.spin = rng.gen_range(-8.0..8.0);
            p
        });
        self.emitters.push(emitter);
    }

    /// Top continuous emitters up to their target counts. The first call
    /// spreads particles over the whole screen; later ones spawn at the edge
    /// the preset flows in from.
    pub fn maintain(&mut self) {
        let view = self.view;
        for emitter in self.emitters.iter_mut().filter(|e| !e.one_shot) {
            let missing = emitter.target.saturating_sub(emitter.len());
            if missing == 0 {
                emitter.primed = true;
                continue;
            }
            let spread = !emitter.primed;
            let kind = emitter.kind;
            let rng = &mut self.rng;
            emitter.spawn(missing, |_| ambient_particle(rng, kind, view, spread));
            emitter.primed = true;
        }
    }

    pub fn update(&mut self, dt: f32) {
        if !dt.is_finite() || dt <= 0.0 {
            return;
        }
        for emitter in &mut self.emitters {
            emitter.update(dt);
        }
        self.emitters.retain(|e| !e.is_finished());
    }

    pub fn emitters(&self) -> &[Emitter] {
        &self.emitters
    }

    pub fn particle_count(&self) -> usize {
        self.emitters.iter().map(Emitter::len).sum()
    }

    pub fn has_kind(&self, kind: EmitterKind) -> bool {
        self.emitters.iter().any(|e| e.kind == kind)
    }

    pub fn clear(&mut self) {
        self.emitters.clear();
    }
}

fn ambient_particle(rng: &mut StdRng, kind: EmitterKind, view: Vec2, spread: bool) -> Particle {
    let w = view.x.max(1.0);
    let h = view.y.max(1.0);
    let x = rng.gen_range(0.0..w);
    let y_anywhere = rng.gen_range(0.0..h);
    match kind {
        EmitterKind::Snow => {
            let y = if spread { y_anywhere } else { h + rng.gen_range(0.0..MARGIN) };
            let mut p = Particle::new(
                Vec2::new(x, y),
                Vec2::new(rng.gen_range(-15.0..15.0), rng.gen_range(-70.0..-35.0)),
                rng.gen_range(8.0..14.0),
                rng.gen_range(1.5..3.5),
                SNOW,
            );
            p.spin = rng.gen_range(-1.0..1.0);
            p
        }
        EmitterKind::Leaves => {
            let y = if spread { y_anywhere } else { h + rng.gen_range(0.0..MARGIN) };
            let color = LEAF_COLORS[rng.gen_range(0..LEAF_COLORS.len())];
            let mut p = Particle::new(
                Vec2::new(x, y),
                Vec2::new(rng.gen_range(10.0..40.0), rng.gen_range(-55.0..-25.0)),
                rng.gen_range(10.0..16.0),
                rng.gen_range(3.0..5.0),
                color,
            );
            p.spin = rng.gen_range(-3.0..3.0);
            p
        }
        EmitterKind::Bubbles => {
            let y = if spread { y_anywhere } else { -rng.gen_range(0.0..MARGIN) };
            Particle::new(
                Vec2::new(x, y),
                Vec2::new(rng.gen_range(-8.0..8.0), rng.gen_range(20.0..45.0)),
                rng.gen_range(8.0..14.0),
                rng.gen_range(2.0..5.0),
                BUBBLE,
            )
        }
        EmitterKind::Sparkle | EmitterKind::Burst | EmitterKind::Confetti => {
            let mut p = Particle::new(
                Vec2::new(x, y_anywhere),
                Vec2::ZERO,
                rng.gen_range(0.6..1.6),
                rng.gen_range(1.0..2.5),
                SPARKLE,
            );
            p.spin = rng.gen_range(-4.0..4.0);
            p
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Vec2 = Vec2::new(800.0, 600.0);

    #[test]
    fn emitter_update_fades_and_removes_dead() {
        let mut emitter = Emitter::new(EmitterKind::Burst);
        emitter.spawn(3, |i| Particle::new(Vec2::ZERO, Vec2::X * 10.0, 0.5 + i as f32, 2.0, SNOW));
        emitter.update(0.25);
        assert_eq!(emitter.len(), 3);
        assert!((emitter.particles[0].alpha - 0.5).abs() < 1e-6);
        assert!((emitter.particles[0].position.x - 2.5).abs() < 1e-6);

        emitter.update(0.3);
        assert_eq!(emitter.len(), 2);
        emitter.update(5.0);
        assert!(emitter.is_finished());
    }

    #[test]
    fn continuous_emitter_is_never_finished() {
        let emitter = Emitter::new(EmitterKind::Snow);
        assert!(!emitter.one_shot);
        assert!(emitter.is_empty());
        assert!(!emitter.is_finished());
    }

    #[test]
    fn burst_is_removed_after_it_dies() {
        let mut system = ParticleSystem::new(7, VIEW);
        system.burst(Vec2::new(100.0, 100.0), [255, 0, 0]);
        assert_eq!(system.particle_count(), BURST_COUNT);
        for _ in 0..60 {
            system.update(1.0 / 60.0);
        }
        assert!(!system.has_kind(EmitterKind::Burst));
    }

    #[test]
    fn maintain_tops_up_to_target() {
        let mut system = ParticleSystem::new(1, VIEW);
        system.add_ambient(EmitterKind::Snow, 40);
        system.maintain();
        assert_eq!(system.particle_count(), 40);

        for _ in 0..600 {
            system.update(1.0 / 30.0);
        }
        assert!(system.particle_count() < 40);
        system.maintain();
        assert_eq!(system.particle_count(), 40);
    }

    #[test]
    fn first_fill_spreads_then_respawns_at_edge() {
        let mut system = ParticleSystem::new(3, VIEW);
        system.add_ambient(EmitterKind::Bubbles, 20);
        system.maintain();
        system.emitters[0].particles.clear();
        system.maintain();
        assert!(system.emitters()[0].particles.iter().all(|p| p.position.y <= 0.0));
    }

    #[test]
    fn same_seed_same_particles() {
        let run = |seed| {
            let mut system = ParticleSystem::new(seed, VIEW);
            system.add_ambient(EmitterKind::Leaves, 10);
            system.maintain();
            system.burst(Vec2::new(50.0, 50.0), SPARKLE);
            system.update(0.1);
            system.emitters()[0].particles.clone()
        };
        assert_eq!(run(99), run(99));
        assert_ne!(run(99), run(100));
    }

    #[test]
    fn invalid_dt_is_ignored() {
        let mut system = ParticleSystem::new(0, VIEW);
        system.burst(Vec2::ZERO, SNOW);
        let before = system.emitters()[0].particles.clone();
        system.update(f32::NAN);
        system.update(-1.0);
        assert_eq!(system.emitters()[0].particles, before);
    }

    #[test]
    fn one_shot_kinds_cannot_be_ambient() {
        let mut system = ParticleSystem::new(0, VIEW);
        system.add_ambient(EmitterKind::Confetti, 10);
        system.add_ambient(EmitterKind::Snow, 0);
        assert!(system.emitters().is_empty());
    }

    #[test]
    fn preset_ids_resolve() {
        assert_eq!(EmitterKind::from_id("snow"), Some(EmitterKind::Snow));
        assert_eq!(EmitterKind::from_id("stardust"), Some(EmitterKind::Sparkle));
        assert_eq!(EmitterKind::from_id("fireworks"), None);
    }
}
