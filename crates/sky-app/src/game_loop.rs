//! Variable-step frame clock.
//!
//! The sky animates from wall-clock deltas, so there is no fixed-rate
//! accumulator: each frame gets one `update(dt)` with the measured delta,
//! clamped so a stall (debugger, suspended window) does not make the view jump.

use std::time::Instant;
use tracing::warn;

/// Longest frame handed to the engine, in milliseconds.
pub const MAX_FRAME_MS: f32 = 250.0;

pub struct FrameClock {
    previous_time: Instant,
    frame_count: u64,
    total_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            previous_time: Instant::now(),
            frame_count: 0,
            total_ms: 0.0,
        }
    }

    /// Measure the time since the last tick and return the delta to simulate.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let elapsed = now.duration_since(self.previous_time).as_secs_f32() * 1000.0;
        self.previous_time = now;
        self.advance(elapsed)
    }

    /// Account for a frame of `elapsed_ms` and return the clamped delta.
    pub fn advance(&mut self, elapsed_ms: f32) -> f32 {
        let mut dt = if elapsed_ms.is_finite() {
            elapsed_ms.max(0.0)
        } else {
            0.0
        };
        if dt > MAX_FRAME_MS {
            warn!(
                "Frame time {:.1}ms exceeds maximum, clamping to {:.1}ms",
                dt, MAX_FRAME_MS
            );
            dt = MAX_FRAME_MS;
        }
        self.total_ms += dt as f64;
        self.frame_count += 1;
        dt
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Simulated time in milliseconds, after clamping.
    pub fn total_ms(&self) -> f64 {
        self.total_ms
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
