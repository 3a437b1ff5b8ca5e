//! Axis-aligned box tests for gameplay entities.
//!
//! World space is y-up with the ground surface at `GROUND_TOP`. Only the
//! ground and the world edges are solid; platforms are one-way and can only be
//! landed on from above while falling.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center_x: f32,
    pub center_y: f32,
    pub half_w: f32,
    pub half_h: f32,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center_x: center.x,
            center_y: center.y,
            half_w: size.x * 0.5,
            half_h: size.y * 0.5,
        }
    }

    /// Box whose bottom edge sits at `bottom`.
    pub fn standing_on(x: f32, bottom: f32, size: Vec2) -> Self {
        Self::new(Vec2::new(x, bottom + size.y * 0.5), size)
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.center_x, self.center_y)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.half_w * 2.0, self.half_h * 2.0)
    }

    pub fn left(&self) -> f32 {
        self.center_x - self.half_w
    }

    pub fn right(&self) -> f32 {
        self.center_x + self.half_w
    }

    pub fn bottom(&self) -> f32 {
        self.center_y - self.half_h
    }

    pub fn top(&self) -> f32 {
        self.center_y + self.half_h
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.center_x += delta.x;
        self.center_y += delta.y;
    }

    pub fn overlaps_x(&self, other: &Aabb) -> bool {
        self.left() < other.right() && other.left() < self.right()
    }
}

/// Strict overlap; boxes that only touch do not collide.
pub fn collides(a: &Aabb, b: &Aabb) -> bool {
    (a.center_x - b.center_x).abs() < a.half_w + b.half_w
        && (a.center_y - b.center_y).abs() < a.half_h + b.half_h
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContactState {
    pub left: bool,
    pub right: bool,
    pub down: bool,
    pub up: bool,
}

/// Snap onto the ground when the box has sunk through it.
pub fn resolve_ground(aabb: &mut Aabb, ground_top: f32) -> bool {
    if aabb.bottom() <= ground_top {
        aabb.center_y = ground_top + aabb.half_h;
        true
    } else {
        false
    }
}

/// Land on the first platform whose top the box crossed this step while
/// moving down. `previous_bottom` is the bottom edge before integration.
pub fn land_on_platforms(
    aabb: &mut Aabb,
    previous_bottom: f32,
    velocity_y: f32,
    platforms: &[Aabb],
) -> bool {
    const EPS: f32 = 0.001;
    if velocity_y > 0.0 {
        return false;
    }
    let landing = platforms
        .iter()
        .filter(|p| {
            aabb.overlaps_x(p) && previous_bottom >= p.top() - EPS && aabb.bottom() <= p.top()
        })
        .map(Aabb::top)
        .fold(None, |best: Option<f32>, top| Some(best.map_or(top, |b| b.max(top))));
    match landing {
        Some(top) => {
            aabb.center_y = top + aabb.half_h;
            true
        }
        None => false,
    }
}

/// Keep the box inside `[min, max]` on the requested axes.
pub fn clamp_to_bounds(aabb: &mut Aabb, min: Vec2, max: Vec2, vertical: bool) -> ContactState {
    let mut contacts = ContactState::default();
    let lo_x = min.x + aabb.half_w;
    let hi_x = (max.x - aabb.half_w).max(lo_x);
    if aabb.center_x < lo_x {
        aabb.center_x = lo_x;
        contacts.left = true;
    } else if aabb.center_x > hi_x {
        aabb.center_x = hi_x;
        contacts.right = true;
    }
    let lo_y = min.y + aabb.half_h;
    let hi_y = (max.y - aabb.half_h).max(lo_y);
    if aabb.center_y > hi_y {
        aabb.center_y = hi_y;
        contacts.up = true;
    } else if vertical && aabb.center_y < lo_y {
        aabb.center_y = lo_y;
        contacts.down = true;
    }
    contacts
}
