use std::collections::VecDeque;

pub const DEFAULT_MAX_DELTA: f64 = 0.1;
pub const DEFAULT_FPS_WINDOW: usize = 60;

/// Host-driven variable-delta clock. The host reports how long the last frame
/// took; the clock rejects unusable deltas, caps long frames and keeps a
/// smoothed frame rate.
#[derive(Debug, Clone)]
pub struct TimeState {
    pub max_delta: f64,
    pub elapsed: f64,
    pub tick_count: u64,
    pub skipped_deltas: u64,
    pub last_dt: f64,

    fps_window: usize,
    fps_samples: VecDeque<f64>,
    fps_sum: f64,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl TimeState {
    pub fn new(max_delta: f64, fps_window: usize) -> Self {
        Self {
            max_delta: if max_delta > 0.0 { max_delta } else { DEFAULT_MAX_DELTA },
            elapsed: 0.0,
            tick_count: 0,
            skipped_deltas: 0,
            last_dt: 0.0,
            fps_window: fps_window.max(1),
            fps_samples: VecDeque::new(),
            fps_sum: 0.0,
            smoothed_fps: 0.0,
            smoothed_frame_time_ms: 0.0,
        }
    }

    /// `None` for NaN, infinite, zero or negative deltas; otherwise the delta
    /// capped at `max_delta`.
    pub fn sanitize(&self, delta: f64) -> Option<f64> {
        if !delta.is_finite() || delta <= 0.0 {
            return None;
        }
        Some(delta.min(self.max_delta))
    }

    /// Accept one frame's delta. Returns the step the simulation should use.
    pub fn advance(&mut self, delta: f64) -> Option<f64> {
        let Some(dt) = self.sanitize(delta) else {
            self.skipped_deltas += 1;
            log::trace!("Ignoring unusable frame delta {delta}");
            return None;
        };
        if delta > self.max_delta {
            log::debug!(
                "Frame took {:.1}ms, capping step to {:.1}ms",
                delta * 1000.0,
                self.max_delta * 1000.0
            );
        }

        // FPS smoothing uses the real frame time, not the capped step.
        self.fps_samples.push_back(delta);
        self.fps_sum += delta;
        if self.fps_samples.len() > self.fps_window {
            if let Some(old) = self.fps_samples.pop_front() {
                self.fps_sum -= old;
            }
        }
        let avg = self.fps_sum / self.fps_samples.len() as f64;
        self.smoothed_frame_time_ms = avg * 1000.0;
        self.smoothed_fps = if avg > 0.0 { 1.0 / avg } else { 0.0 };

        self.elapsed += dt;
        self.tick_count += 1;
        self.last_dt = dt;
        Some(dt)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.max_delta, self.fps_window);
    }
}

impl Default for TimeState {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELTA, DEFAULT_FPS_WINDOW)
    }
}
