//! Per-trial frame driver.
//!
//! The host owns the display loop and calls [`FrameScheduler::tick`] once per
//! refresh with a single clock sample. The scheduler decides whether a live
//! request is outstanding and reports real elapsed time, never a frame count
//! multiplied by a nominal rate. Ticking takes `&mut self`, so a callback can
//! never be re-entered while a previous tick is still running.

use std::collections::VecDeque;

use log::debug;

use crate::stats::FrameStatistics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    #[default]
    Idle,
    Live,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameTick {
    /// Clock sample for this frame. Every computation in the frame reuses it.
    pub now: f64,
    pub elapsed_ms: f64,
    pub delta_ms: f64,
    pub frame: u64,
}

#[derive(Debug, Clone)]
pub struct FrameScheduler {
    state: SchedulerState,
    started_at: f64,
    last_tick: f64,
    frame_count: u64,
    frame_intervals: VecDeque<f64>,
    max_intervals: usize,
}

impl Default for FrameScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::with_capacity(240)
    }

    pub fn with_capacity(max_intervals: usize) -> Self {
        Self {
            state: SchedulerState::Idle,
            started_at: 0.0,
            last_tick: 0.0,
            frame_count: 0,
            frame_intervals: VecDeque::new(),
            max_intervals: max_intervals.max(1),
        }
    }

    /// Opens the single live request. Returns `false` if one is already live.
    pub fn start(&mut self, now: f64) -> bool {
        if self.state == SchedulerState::Live {
            return false;
        }
        self.state = SchedulerState::Live;
        self.started_at = now;
        self.last_tick = now;
        self.frame_count = 0;
        self.frame_intervals.clear();
        true
    }

    /// Idempotent. Safe before `start`, after natural termination, or twice.
    pub fn cancel(&mut self) {
        if self.state == SchedulerState::Live {
            debug!("frame scheduler cancelled after {} frames", self.frame_count);
        }
        self.state = SchedulerState::Cancelled;
    }

    pub fn is_live(&self) -> bool {
        self.state == SchedulerState::Live
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Advances one frame. Yields nothing unless a request is live.
    pub fn tick(&mut self, now: f64) -> Option<FrameTick> {
        if !self.is_live() {
            return None;
        }
        let now = now.max(self.last_tick);
        let delta_ms = now - self.last_tick;
        if self.frame_count > 0 {
            self.record_interval(delta_ms);
        }
        self.last_tick = now;
        self.frame_count += 1;
        Some(FrameTick {
            now,
            elapsed_ms: now - self.started_at,
            delta_ms,
            frame: self.frame_count,
        })
    }

    pub fn frame_stats(&self) -> FrameStatistics {
        FrameStatistics::from_intervals(&self.frame_intervals)
    }

    fn record_interval(&mut self, interval: f64) {
        self.frame_intervals.push_back(interval);
        if self.frame_intervals.len() > self.max_intervals {
            self.frame_intervals.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_scheduler_does_not_tick() {
        let mut scheduler = FrameScheduler::new();
        assert_eq!(scheduler.tick(10.0), None);
        assert_eq!(scheduler.state(), SchedulerState::Idle);
    }

    #[test]
    fn reports_actual_elapsed_time() {
        let mut scheduler = FrameScheduler::new();
        assert!(scheduler.start(1000.0));
        assert!(!scheduler.start(1005.0));

        let first = scheduler.tick(1016.0).unwrap();
        assert_eq!(first.elapsed_ms, 16.0);
        assert_eq!(first.frame, 1);

        // A dropped frame shows up as a long delta, not a second frame.
        let second = scheduler.tick(1050.0).unwrap();
        assert_eq!(second.elapsed_ms, 50.0);
        assert_eq!(second.delta_ms, 34.0);
        assert_eq!(second.frame, 2);
    }

    #[test]
    fn no_ticks_after_cancel() {
        let mut scheduler = FrameScheduler::new();
        scheduler.start(0.0);
        scheduler.tick(16.0);
        scheduler.cancel();
        scheduler.cancel();
        assert!(!scheduler.is_live());
        assert_eq!(scheduler.tick(32.0), None);
        assert_eq!(scheduler.frame_count(), 1);
    }

    #[test]
    fn cancel_before_start_is_a_no_op() {
        let mut scheduler = FrameScheduler::new();
        scheduler.cancel();
        assert_eq!(scheduler.state(), SchedulerState::Cancelled);
        assert_eq!(scheduler.tick(5.0), None);
    }

    #[test]
    fn intervals_feed_statistics() {
        let mut scheduler = FrameScheduler::with_capacity(2);
        scheduler.start(0.0);
        for t in [10.0, 20.0, 40.0, 60.0] {
            scheduler.tick(t);
        }
        let stats = scheduler.frame_stats();
        assert_eq!(stats.samples, 2);
        assert_eq!(stats.average_frame_ms, 20.0);
    }
}
