//! Pure mappings from a finished trial's timestamps and parameters to its
//! result record. No clock, no randomness, no I/O.

use drivecheck_core::{
    DriveAction, IllusionParams, IllusionResult, PerceptionOutcome, PerceptionParams,
    PerceptionResult, PerceptionTermination, PumpOutcome, PumpParams, PumpResult,
};

use crate::latch::LatchedInput;
use crate::scenario::Scenario;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PerceptionEnd {
    Stopped { at: f64 },
    Collided { at: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PumpEnd {
    Stopped { at: f64 },
    Exploded { at: f64 },
}

/// Inclusive at zero: touching the obstacle still counts as stopping in time.
pub fn classify_stop(distance_to_obstacle: f64) -> PerceptionOutcome {
    if distance_to_obstacle >= 0.0 {
        PerceptionOutcome::Success
    } else {
        PerceptionOutcome::Fail
    }
}

pub fn perception(
    params: &PerceptionParams,
    started_at: f64,
    hide_at: Option<f64>,
    end: PerceptionEnd,
) -> PerceptionResult {
    let (termination, at) = match end {
        PerceptionEnd::Stopped { at } => (PerceptionTermination::Stopped, at),
        PerceptionEnd::Collided { at } => (PerceptionTermination::Collision, at),
    };
    let position = params.position_at(at - started_at);
    let distance = params.distance_to_obstacle(position);

    let (outcome, stop_at, collision_at, reaction_latency_ms) = match termination {
        PerceptionTermination::Stopped => (
            classify_stop(distance),
            Some(at),
            None,
            hide_at.filter(|hide| *hide <= at).map(|hide| at - hide),
        ),
        PerceptionTermination::Collision => (PerceptionOutcome::Fail, None, Some(at), None),
    };

    PerceptionResult {
        outcome,
        termination,
        visible_ms: params.visible_ms,
        hidden_ms: params.hidden_ms,
        speed_px_per_s: params.speed_px_per_s(),
        started_at_ms: started_at,
        hide_at_ms: hide_at,
        stop_at_ms: stop_at,
        collision_at_ms: collision_at,
        position_at_stop: position,
        distance_to_obstacle: distance,
        reaction_latency_ms,
    }
}

pub fn pump(params: &PumpParams, started_at: Option<f64>, pumps: u32, end: PumpEnd) -> PumpResult {
    let (outcome, at, points) = match end {
        PumpEnd::Stopped { at } => (
            PumpOutcome::Stopped,
            at,
            pumps.saturating_mul(params.points_per_pump),
        ),
        PumpEnd::Exploded { at } => (PumpOutcome::Exploded, at, 0),
    };
    PumpResult {
        outcome,
        pumps,
        points,
        elapsed_ms: started_at.map_or(0.0, |start| (at - start).max(0.0)),
        blast_ms: params.blast_ms,
        started_at_ms: started_at,
        ended_at_ms: at,
    }
}

pub fn illusion(
    scenario: &Scenario,
    params: &IllusionParams,
    started_at: f64,
    action: Option<LatchedInput<DriveAction>>,
    ended_at: f64,
) -> IllusionResult {
    let entry = scenario.outcome(params.mode, action.map(|a| a.action));
    IllusionResult {
        scenario_id: scenario.id,
        scenario_title: scenario.title.clone(),
        mode: params.mode,
        action: action.map(|a| a.action),
        reaction_ms: action.map(|a| a.at - started_at),
        outcome: entry.outcome,
        description: entry.description.clone(),
        system_attribution: entry.attribution.clone(),
        attribution_type: scenario.attribution_type,
        started_at_ms: started_at,
        ended_at_ms: ended_at,
    }
}
