use drivecheck_core::{
    Action, PumpParams, PumpPhase, PumpSnapshot, Snapshot, TaskKind, TrialPhase, TrialResult,
};
use log::debug;

use super::{Routing, Step, TimedTask};
use crate::latch::LatchedInput;
use crate::outcome::{self, PumpEnd};

/// Pump fuel for points and stop before the hidden blast time.
/// The clock starts with the first pump, not when the trial opens.
#[derive(Debug, Clone)]
pub struct PumpTask {
    params: PumpParams,
    phase: PumpPhase,
    started_at: Option<f64>,
    pumps: u32,
    end: Option<PumpEnd>,
}

impl PumpTask {
    pub fn new(params: PumpParams) -> Self {
        Self {
            params,
            phase: PumpPhase::Ready,
            started_at: None,
            pumps: 0,
            end: None,
        }
    }

    pub fn params(&self) -> &PumpParams {
        &self.params
    }

    pub fn pumps(&self) -> u32 {
        self.pumps
    }

    pub fn blast_at(&self) -> Option<f64> {
        self.started_at.map(|start| start + self.params.blast_ms as f64)
    }

    fn finish(&mut self, end: PumpEnd) -> Step {
        self.phase = match end {
            PumpEnd::Stopped { .. } => PumpPhase::Stopped,
            PumpEnd::Exploded { .. } => PumpPhase::Exploded,
        };
        self.end = Some(end);
        Step::Finish
    }
}

impl TimedTask for PumpTask {
    type Phase = PumpPhase;

    fn kind(&self) -> TaskKind {
        TaskKind::FuelPump
    }

    fn phase(&self) -> PumpPhase {
        self.phase
    }

    fn begin(&mut self, _now: f64) {}

    fn route(&self, action: Action, _now: f64) -> Routing {
        match action {
            Action::Pump if self.phase.allows_input() => Routing::Repeat,
            Action::Stop if self.phase == PumpPhase::Pumping => Routing::Latch,
            _ => Routing::Ignore,
        }
    }

    fn repeat(&mut self, action: Action, now: f64) {
        if action != Action::Pump || !self.phase.allows_input() {
            return;
        }
        if self.phase == PumpPhase::Ready {
            self.phase = PumpPhase::Pumping;
            self.started_at = Some(now);
            debug!("pump clock started at {now:.3} ms, blast in {} ms", self.params.blast_ms);
        }
        self.pumps += 1;
    }

    fn accepts_latch(&self) -> bool {
        self.phase == PumpPhase::Pumping
    }

    fn step(&mut self, now: f64, latched: Option<LatchedInput<Action>>) -> Step {
        if self.phase != PumpPhase::Pumping {
            return Step::Continue;
        }
        let Some(blast_at) = self.blast_at() else {
            return Step::Continue;
        };
        if let Some(stop) = latched.filter(|l| l.action == Action::Stop) {
            // A stop at the blast instant wins. One after it arrived too late.
            if stop.at <= blast_at {
                return self.finish(PumpEnd::Stopped { at: stop.at });
            }
            return self.finish(PumpEnd::Exploded { at: blast_at });
        }
        if now >= blast_at {
            return self.finish(PumpEnd::Exploded { at: blast_at });
        }
        Step::Continue
    }

    fn snapshot(&self, now: f64) -> Snapshot {
        let at = match self.end {
            Some(PumpEnd::Stopped { at } | PumpEnd::Exploded { at }) => at,
            None => now,
        };
        let elapsed_ms = self.started_at.map_or(0.0, |start| (at - start).max(0.0));
        let trial_points = match self.phase {
            PumpPhase::Exploded => 0,
            _ => self.pumps.saturating_mul(self.params.points_per_pump),
        };
        Snapshot::FuelPump(PumpSnapshot {
            phase: self.phase,
            elapsed_ms,
            level_pct: self.params.level_at(elapsed_ms),
            pumps: self.pumps,
            trial_points,
        })
    }

    fn outcome(&self) -> Option<TrialResult> {
        let end = self.end?;
        Some(outcome::pump(&self.params, self.started_at, self.pumps, end).into())
    }
}
