//! Side-scrolling camera with follow smoothing.

use glam::Vec2;
use pf_spec::{CameraConfig, CameraMode};

/// Horizontal scroll camera. `offset` is the world x shown at the left edge of
/// the viewport; the vertical axis never scrolls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub mode: CameraMode,
    pub smoothing: f32,
    pub offset: f32,
    pub viewport: Vec2,
    pub level_width: f32,
}

impl CameraRig {
    pub fn new(config: CameraConfig, viewport: Vec2, level_width: f32) -> Self {
        Self {
            mode: config.mode,
            smoothing: config.smoothing,
            offset: 0.0,
            viewport,
            level_width,
        }
    }

    fn max_offset(&self) -> f32 {
        (self.level_width - self.viewport.x).max(0.0)
    }

    /// Offset that centres `target_x`, clamped to the level.
    pub fn desired_offset(&self, target_x: f32) -> f32 {
        (target_x - self.viewport.x * 0.5).clamp(0.0, self.max_offset())
    }

    /// Exponential ease toward the desired offset. Fixed cameras stay put.
    pub fn follow(&mut self, target_x: f32, dt: f32) {
        if self.mode == CameraMode::Fixed || !(dt.is_finite() && dt > 0.0) {
            return;
        }
        let blend = 1.0 - (-self.smoothing * dt).exp();
        let desired = self.desired_offset(target_x);
        self.offset = (self.offset + (desired - self.offset) * blend).clamp(0.0, self.max_offset());
    }

    pub fn snap(&mut self, target_x: f32) {
        self.offset = match self.mode {
            CameraMode::Follow => self.desired_offset(target_x),
            CameraMode::Fixed => 0.0,
        };
    }

    /// World (y-up) to screen (y-down, origin top-left).
    pub fn world_to_screen(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.x - self.offset, self.viewport.y - world.y)
    }

    pub fn screen_to_world(&self, screen: Vec2) -> Vec2 {
        Vec2::new(screen.x + self.offset, self.viewport.y - screen.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rig(mode: CameraMode) -> CameraRig {
        CameraRig::new(
            CameraConfig {
                mode,
                smoothing: 6.0,
            },
            Vec2::new(800.0, 600.0),
            3000.0,
        )
    }

    #[test]
    fn follow_eases_toward_player() {
        let mut cam = rig(CameraMode::Follow);
        cam.follow(1400.0, 1.0 / 60.0);
        assert!(cam.offset > 0.0 && cam.offset < 1000.0);
        for _ in 0..600 {
            cam.follow(1400.0, 1.0 / 60.0);
        }
        assert!((cam.offset - 1000.0).abs() < 0.01);
    }

    #[test]
    fn follow_is_clamped_to_level() {
        let mut cam = rig(CameraMode::Follow);
        cam.snap(10.0);
        assert_eq!(cam.offset, 0.0);
        cam.snap(2990.0);
        assert_eq!(cam.offset, 2200.0);
    }

    #[test]
    fn fixed_camera_never_moves() {
        let mut cam = rig(CameraMode::Fixed);
        cam.follow(1400.0, 1.0);
        assert_eq!(cam.offset, 0.0);
    }

    #[test]
    fn screen_world_conversion_inverts() {
        let mut cam = rig(CameraMode::Follow);
        cam.snap(1400.0);
        let world = Vec2::new(1234.0, 88.0);
        let screen = cam.world_to_screen(world);
        assert_eq!(screen, Vec2::new(234.0, 512.0));
        assert_eq!(cam.screen_to_world(screen), world);
    }

    #[test]
    fn bad_delta_is_ignored() {
        let mut cam = rig(CameraMode::Follow);
        cam.follow(1400.0, f32::NAN);
        cam.follow(1400.0, -1.0);
        assert_eq!(cam.offset, 0.0);
    }
}
