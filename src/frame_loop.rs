//! Time-budgeted frame loop.

use std::time::{Duration, Instant};

use crate::foundation::error::BlitResult;

/// Monotonic time source.
pub trait Clock {
    /// Time since an arbitrary fixed origin. Never decreases.
    fn now(&mut self) -> Duration;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Start a clock at the current instant.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&mut self) -> Duration {
        self.origin.elapsed()
    }
}

/// Result of a timed run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Frames completed.
    pub frames: u64,
    /// Sum of the measured per-frame durations.
    pub elapsed: Duration,
}

impl FrameStats {
    /// Whole frames per second (truncated). Zero when nothing was measured.
    pub fn fps(&self) -> u64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.frames as f64 / secs) as u64
        } else {
            0
        }
    }
}

/// Call `frame` with increasing indices until the summed duration of the calls reaches
/// `budget`. Time spent outside `frame` is not counted.
///
/// The first error from `frame` ends the run and is returned.
pub fn run_timed<C, F>(clock: &mut C, budget: Duration, mut frame: F) -> BlitResult<FrameStats>
where
    C: Clock + ?Sized,
    F: FnMut(u64) -> BlitResult<()>,
{
    let mut stats = FrameStats::default();
    loop {
        let start = clock.now();
        frame(stats.frames)?;
        let end = clock.now();

        stats.frames += 1;
        stats.elapsed += end.saturating_sub(start);
        if stats.elapsed >= budget {
            return Ok(stats);
        }
    }
}

#[cfg(test)]
#[path = "../tests/unit/frame_loop.rs"]
mod tests;
