use std::time::Duration;

use crate::clock::Clock;
use crate::scheduler::FrameScheduler;
use crate::stats::FrameStatistics;

/// Headless pacing loop for calibration runs. Windowed builds take their
/// frames from the display instead.
#[derive(Debug, Clone)]
pub struct FrameLoop<C: Clock> {
    clock: C,
    interval_ms: f64,
}

impl<C: Clock> FrameLoop<C> {
    pub fn new(clock: C, hz: f64) -> Self {
        Self {
            clock,
            interval_ms: 1000.0 / hz.max(1.0),
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    /// Calls `frame` with one clock sample per frame until it returns `false`.
    /// Deadlines are absolute, so a slow frame does not push later ones back.
    /// Returns the number of frames run.
    pub fn run<F>(&self, mut frame: F) -> u64
    where
        F: FnMut(f64) -> bool,
    {
        let origin = self.clock.now();
        let mut frames = 0u64;
        loop {
            let now = self.clock.now();
            frames += 1;
            if !frame(now) {
                return frames;
            }
            let deadline = origin + frames as f64 * self.interval_ms;
            let remaining = deadline - self.clock.now();
            if remaining > 0.0 {
                self.clock.sleep(Duration::from_secs_f64(remaining / 1000.0));
            }
        }
    }

    /// Paces `frames` ticks through a [`FrameScheduler`] and reports how
    /// evenly the clock's sleep held the nominal rate.
    pub fn calibrate(&self, frames: u64) -> FrameStatistics {
        let mut scheduler = FrameScheduler::with_capacity(frames.max(1) as usize);
        scheduler.start(self.clock.now());
        self.run(|now| {
            scheduler.tick(now);
            scheduler.frame_count() < frames
        });
        scheduler.frame_stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    #[test]
    fn paces_frames_on_manual_clock() {
        let clock = ManualClock::new(0.0);
        let frame_loop = FrameLoop::new(clock.clone(), 50.0);
        let mut samples = Vec::new();
        let frames = frame_loop.run(|now| {
            samples.push(now);
            samples.len() < 4
        });
        assert_eq!(frames, 4);
        let expected = [0.0, 20.0, 40.0, 60.0];
        for (got, want) in samples.iter().zip(expected) {
            assert!((got - want).abs() < 1e-6, "{got} != {want}");
        }
    }

    #[test]
    fn calibration_on_a_perfect_clock_has_no_jitter() {
        let frame_loop = FrameLoop::new(ManualClock::new(0.0), 100.0);
        let stats = frame_loop.calibrate(31);
        assert_eq!(stats.samples, 30);
        assert!((stats.average_frame_ms - 10.0).abs() < 1e-3);
        assert!(stats.jitter_ms < 1e-3);
        assert!(stats.refresh_rate_hz().is_some());
    }
}
