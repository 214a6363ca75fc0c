//! Frame timing

use std::time::Instant;

/// Smallest delta handed to the toolkit; a zero delta breaks drag and repeat timing
pub const MIN_DELTA_TIME: f32 = 1.0 / 10_000.0;

/// Largest delta handed to the toolkit, so a debugger pause does not fast-forward state
pub const MAX_DELTA_TIME: f32 = 0.25;

/// Frame timer producing the per-frame delta captured in an input snapshot
pub struct FrameTimer {
    last_frame: Instant,
    total_time: f64,
    frame_count: u64,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTimer {
    /// Create a new timer starting now
    pub fn new() -> Self {
        Self {
            last_frame: Instant::now(),
            total_time: 0.0,
            frame_count: 0,
        }
    }

    /// Advance one frame and return the clamped delta in seconds
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;
        self.frame_count += 1;

        let delta = clamp_delta(elapsed);
        self.total_time += f64::from(delta);
        delta
    }

    /// Accumulated (clamped) time since creation
    pub fn total_time(&self) -> f64 {
        self.total_time
    }

    /// Number of ticks so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

/// Clamp a raw frame delta into the range the toolkit accepts
pub fn clamp_delta(delta: f32) -> f32 {
    if delta.is_nan() {
        return MIN_DELTA_TIME;
    }
    delta.clamp(MIN_DELTA_TIME, MAX_DELTA_TIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_delta_bounds() {
        assert_eq!(clamp_delta(0.0), MIN_DELTA_TIME);
        assert_eq!(clamp_delta(-1.0), MIN_DELTA_TIME);
        assert_eq!(clamp_delta(10.0), MAX_DELTA_TIME);
        assert_eq!(clamp_delta(f32::NAN), MIN_DELTA_TIME);
        assert_eq!(clamp_delta(0.016), 0.016);
    }

    #[test]
    fn test_tick_counts_frames() {
        let mut timer = FrameTimer::new();
        let dt = timer.tick();
        timer.tick();

        assert!(dt >= MIN_DELTA_TIME);
        assert_eq!(timer.frame_count(), 2);
        assert!(timer.total_time() > 0.0);
    }
}
