use drivecheck_core::{
    Action, PerceptionParams, PerceptionPhase, PerceptionSnapshot, Snapshot, TaskKind, TrialPhase,
    TrialResult,
};
use drivecheck_timing::{Countdown, CountdownTick};
use log::debug;

use super::{Routing, Step, TimedTask};
use crate::latch::LatchedInput;
use crate::outcome::{self, PerceptionEnd};

/// Stop the car before it reaches the obstacle. The car disappears after
/// `visible_ms` and keeps moving at constant speed.
#[derive(Debug, Clone)]
pub struct PerceptionTask {
    params: PerceptionParams,
    phase: PerceptionPhase,
    countdown: Countdown,
    started_at: Option<f64>,
    hide_at: Option<f64>,
    end: Option<PerceptionEnd>,
}

impl PerceptionTask {
    pub fn new(params: PerceptionParams) -> Self {
        let countdown = Countdown::new(params.countdown.from, params.countdown.interval_ms);
        Self {
            params,
            phase: PerceptionPhase::Idle,
            countdown,
            started_at: None,
            hide_at: None,
            end: None,
        }
    }

    pub fn params(&self) -> &PerceptionParams {
        &self.params
    }

    pub fn started_at(&self) -> Option<f64> {
        self.started_at
    }

    pub fn hide_at(&self) -> Option<f64> {
        self.hide_at
    }

    fn hide_threshold(&self, start: f64) -> f64 {
        start + self.params.visible_ms as f64
    }

    fn collision_threshold(&self, start: f64) -> f64 {
        start + self.params.total_ms() as f64
    }

    fn finish(&mut self, end: PerceptionEnd) -> Step {
        self.end = Some(end);
        self.phase = PerceptionPhase::Finished;
        Step::Finish
    }

    /// Time the car is frozen at, if the trial has ended.
    fn end_time(&self) -> Option<f64> {
        self.end.map(|end| match end {
            PerceptionEnd::Stopped { at } | PerceptionEnd::Collided { at } => at,
        })
    }
}

impl TimedTask for PerceptionTask {
    type Phase = PerceptionPhase;

    fn kind(&self) -> TaskKind {
        TaskKind::Perception
    }

    fn phase(&self) -> PerceptionPhase {
        self.phase
    }

    fn begin(&mut self, now: f64) {
        if self.phase == PerceptionPhase::Idle {
            self.countdown.start(now);
            self.phase = PerceptionPhase::Countdown;
        }
    }

    fn route(&self, action: Action, _now: f64) -> Routing {
        match action {
            Action::Stop if self.phase.allows_input() => Routing::Latch,
            _ => Routing::Ignore,
        }
    }

    fn accepts_latch(&self) -> bool {
        self.phase.allows_input()
    }

    fn step(&mut self, now: f64, latched: Option<LatchedInput<Action>>) -> Step {
        match self.phase {
            PerceptionPhase::Idle | PerceptionPhase::Finished => Step::Continue,
            PerceptionPhase::Countdown => {
                if self.countdown.tick(now) == CountdownTick::Elapsed {
                    self.started_at = Some(now);
                    self.phase = PerceptionPhase::Running;
                    debug!(
                        "perception running at {now:.3} ms, speed {:.3} px/s",
                        self.params.speed_px_per_s()
                    );
                }
                Step::Continue
            }
            PerceptionPhase::Running | PerceptionPhase::Hidden => {
                let Some(start) = self.started_at else {
                    return Step::Continue;
                };
                let hide_at = self.hide_threshold(start);

                if let Some(input) = latched.filter(|l| l.action == Action::Stop) {
                    if self.hide_at.is_none() && input.at >= hide_at {
                        self.hide_at = Some(hide_at);
                    }
                    return self.finish(PerceptionEnd::Stopped { at: input.at });
                }

                if self.phase == PerceptionPhase::Running && now >= hide_at {
                    self.hide_at = Some(hide_at);
                    self.phase = PerceptionPhase::Hidden;
                }
                let collision_at = self.collision_threshold(start);
                if now >= collision_at {
                    self.hide_at.get_or_insert(hide_at);
                    return self.finish(PerceptionEnd::Collided { at: collision_at });
                }
                Step::Continue
            }
        }
    }

    fn snapshot(&self, now: f64) -> Snapshot {
        let at = self.end_time().unwrap_or(now);
        let elapsed_ms = self.started_at.map_or(0.0, |start| (at - start).max(0.0));
        let position_x = match self.started_at {
            Some(_) => self.params.position_at(elapsed_ms),
            None => self.params.geometry.start_x,
        };
        let countdown = match self.phase {
            PerceptionPhase::Countdown => self.countdown.digit_at(now),
            _ => None,
        };
        Snapshot::Perception(PerceptionSnapshot {
            phase: self.phase,
            elapsed_ms,
            position_x,
            // Once hidden the car stays hidden, including on the result frame.
            car_visible: self.hide_at.is_none(),
            countdown,
            collided: matches!(self.end, Some(PerceptionEnd::Collided { .. })),
        })
    }

    fn outcome(&self) -> Option<TrialResult> {
        let start = self.started_at?;
        let end = self.end?;
        Some(outcome::perception(&self.params, start, self.hide_at, end).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivecheck_core::{CountdownSpec, LaneGeometry};

    fn task() -> PerceptionTask {
        let params = PerceptionParams::new(
            5000,
            3500,
            LaneGeometry::default(),
            CountdownSpec {
                from: 3,
                interval_ms: 1000,
            },
        )
        .unwrap();
        PerceptionTask::new(params)
    }

    #[test]
    fn countdown_then_running_on_first_frame_after() {
        let mut task = task();
        task.begin(0.0);
        assert_eq!(task.phase(), PerceptionPhase::Countdown);
        task.step(2990.0, None);
        assert_eq!(task.phase(), PerceptionPhase::Countdown);
        task.step(3004.0, None);
        assert_eq!(task.phase(), PerceptionPhase::Running);
        assert_eq!(task.started_at(), Some(3004.0));
        assert_eq!(task.route(Action::Pump, 3004.0), Routing::Ignore);
        assert_eq!(task.route(Action::Stop, 3004.0), Routing::Latch);
    }

    #[test]
    fn hide_time_is_the_analytic_crossing() {
        let mut task = task();
        task.begin(0.0);
        task.step(3000.0, None);
        task.step(8016.0, None);
        assert_eq!(task.phase(), PerceptionPhase::Hidden);
        assert_eq!(task.hide_at(), Some(8000.0));
        let Snapshot::Perception(snap) = task.snapshot(8016.0) else {
            panic!("wrong snapshot variant");
        };
        assert!(!snap.car_visible);
    }

    #[test]
    fn late_observed_collision_is_stamped_at_threshold() {
        let mut task = task();
        task.begin(0.0);
        task.step(3000.0, None);
        assert_eq!(task.step(11_540.0, None), Step::Finish);
        let Some(TrialResult::Perception(result)) = task.outcome() else {
            panic!("no perception result");
        };
        assert_eq!(result.collision_at_ms, Some(11_500.0));
        assert!(result.distance_to_obstacle.abs() < 1e-9);
    }
}
