//! Fixed-step timing for the host loop.
//!
//! The simulation is defined in ticks, not seconds. [`TickClock`] turns wall
//! time into a whole number of ticks to run each frame, carrying the
//! remainder forward so the long-run rate matches `ticks_per_second` no matter
//! how fast frames are presented.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = TickClock::new(60.0);
//!
//! // In the redraw handler:
//! for _ in 0..clock.advance() {
//!     sim.tick();
//! }
//! println!("FPS: {:.1}", clock.fps());
//! ```

use std::time::{Duration, Instant};

/// Converts elapsed wall time into simulation ticks.
#[derive(Debug, Clone)]
pub struct TickClock {
    /// Wall time per tick.
    tick_duration: Duration,
    /// Wall time not yet converted into ticks.
    accumulator: Duration,
    /// When the clock was last advanced.
    last: Instant,
    /// Most ticks returned by one call, so a stall does not cause a spiral.
    max_catch_up: u32,
    /// Time scale multiplier (1.0 = normal speed).
    time_scale: f32,
    paused: bool,
    /// Total ticks handed out.
    ticks: u64,
    /// Frames (calls to advance) since start.
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
}

impl TickClock {
    /// Clock producing `ticks_per_second` ticks per second of wall time.
    pub fn new(ticks_per_second: f32) -> Self {
        Self::starting_at(ticks_per_second, Instant::now())
    }

    /// Clock whose first frame is measured from `start`.
    pub fn starting_at(ticks_per_second: f32, start: Instant) -> Self {
        let tps = ticks_per_second.max(1.0);
        Self {
            tick_duration: Duration::from_secs_f32(1.0 / tps),
            accumulator: Duration::ZERO,
            last: start,
            max_catch_up: 4,
            time_scale: 1.0,
            paused: false,
            ticks: 0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: start,
            fps_update_interval: Duration::from_millis(500),
        }
    }

    /// Limit how many ticks one frame may run.
    pub fn with_max_catch_up(mut self, ticks: u32) -> Self {
        self.max_catch_up = ticks.max(1);
        self
    }

    /// Ticks to run for a frame presented now.
    pub fn advance(&mut self) -> u32 {
        self.advance_to(Instant::now())
    }

    /// Ticks to run for a frame presented at `now`.
    pub fn advance_to(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        self.last = now;
        self.update_fps(now);

        if self.paused {
            return 0;
        }

        self.accumulator += elapsed.mul_f32(self.time_scale);
        let mut ticks = 0;
        while self.accumulator >= self.tick_duration && ticks < self.max_catch_up {
            self.accumulator -= self.tick_duration;
            ticks += 1;
        }
        // Drop time we could not catch up on.
        if ticks == self.max_catch_up {
            self.accumulator = self.accumulator.min(self.tick_duration);
        }

        self.ticks += u64::from(ticks);
        ticks
    }

    fn update_fps(&mut self, now: Instant) {
        self.frame_count += 1;
        let fps_elapsed = now.saturating_duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }
    }

    /// Total ticks handed out so far.
    #[inline]
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Calculated frames per second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    /// Whether time is currently paused.
    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop producing ticks. Wall time spent paused is discarded.
    pub fn pause(&mut self) {
        self.paused = true;
        self.accumulator = Duration::ZERO;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Toggle pause state.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Set time scale multiplier.
    ///
    /// - `1.0` = normal speed
    /// - `0.5` = half speed (slow motion)
    /// - `2.0` = double speed
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    /// Current time scale multiplier.
    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}
