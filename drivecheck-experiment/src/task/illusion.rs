use drivecheck_core::{
    Action, ConfigError, DriveAction, IllusionParams, IllusionPhase, IllusionSnapshot, Snapshot,
    TaskKind, TrialPhase, TrialResult,
};
use log::debug;

use super::{Routing, Step, TimedTask};
use crate::latch::LatchedInput;
use crate::outcome;
use crate::scenario::Scenario;

/// Fixed-length driving scenario. The first drive action is recorded and
/// the scenario plays out to its end regardless.
#[derive(Debug, Clone)]
pub struct IllusionTask {
    scenario: Scenario,
    params: IllusionParams,
    phase: IllusionPhase,
    started_at: Option<f64>,
    ended_at: Option<f64>,
    action: Option<LatchedInput<DriveAction>>,
    lane: u8,
}

impl IllusionTask {
    pub fn new(scenario: Scenario, params: IllusionParams) -> Result<Self, ConfigError> {
        params.validate()?;
        if scenario.id != params.scenario_id {
            return Err(ConfigError::UnknownScenario(params.scenario_id));
        }
        let lane = params.centre_lane();
        Ok(Self {
            scenario,
            params,
            phase: IllusionPhase::Playing,
            started_at: None,
            ended_at: None,
            action: None,
            lane,
        })
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn action(&self) -> Option<LatchedInput<DriveAction>> {
        self.action
    }

    /// Whether `now` lies past the scenario's end instant. An action landing
    /// exactly on the end still counts.
    fn is_over(&self, now: f64) -> bool {
        self.started_at
            .is_some_and(|start| now > start + self.params.duration_ms as f64)
    }

    fn record(&mut self, input: LatchedInput<DriveAction>) {
        let last_lane = self.params.lane_count.saturating_sub(1);
        self.lane = match input.action {
            DriveAction::Left => self.lane.saturating_sub(1),
            DriveAction::Right => (self.lane + 1).min(last_lane),
            DriveAction::Accelerate | DriveAction::Brake => self.lane,
        };
        debug!("scenario {} action {} at {:.3} ms", self.scenario.id, input.action.as_str(), input.at);
        self.action = Some(input);
    }
}

impl TimedTask for IllusionTask {
    type Phase = IllusionPhase;

    fn kind(&self) -> TaskKind {
        TaskKind::Illusion
    }

    fn phase(&self) -> IllusionPhase {
        self.phase
    }

    fn begin(&mut self, now: f64) {
        if self.started_at.is_none() {
            self.started_at = Some(now);
        }
    }

    fn route(&self, action: Action, now: f64) -> Routing {
        match action {
            Action::Drive(_) if self.phase.allows_input() && !self.is_over(now) => Routing::Latch,
            _ => Routing::Ignore,
        }
    }

    fn accepts_latch(&self) -> bool {
        self.phase.allows_input() && self.started_at.is_some()
    }

    fn step(&mut self, now: f64, latched: Option<LatchedInput<Action>>) -> Step {
        if self.phase != IllusionPhase::Playing {
            return Step::Continue;
        }
        let Some(start) = self.started_at else {
            return Step::Continue;
        };
        let end_at = start + self.params.duration_ms as f64;

        if self.action.is_none() {
            if let Some(LatchedInput {
                action: Action::Drive(action),
                at,
            }) = latched
            {
                // Input after the scenario ended does not count as a reaction.
                if at <= end_at {
                    self.record(LatchedInput { action, at });
                }
            }
        }

        if now >= end_at {
            self.ended_at = Some(end_at);
            self.phase = IllusionPhase::Finished;
            return Step::Finish;
        }
        Step::Continue
    }

    fn snapshot(&self, now: f64) -> Snapshot {
        let at = self.ended_at.unwrap_or(now);
        let elapsed_ms = self.started_at.map_or(0.0, |start| (at - start).max(0.0));
        Snapshot::Illusion(IllusionSnapshot {
            phase: self.phase,
            elapsed_ms,
            scenario_id: self.scenario.id,
            mode: self.params.mode,
            hazard_x: self.params.hazard_position_at(elapsed_ms),
            lane: self.lane,
            action: self.action.map(|a| a.action),
        })
    }

    fn outcome(&self) -> Option<TrialResult> {
        let start = self.started_at?;
        let end = self.ended_at?;
        Some(outcome::illusion(&self.scenario, &self.params, start, self.action, end).into())
    }
}
