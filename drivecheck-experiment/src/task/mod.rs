//! The three timed tasks, each a state machine the [`Trial`](crate::Trial)
//! engine drives with frame samples and latched input.

mod illusion;
mod perception;
mod pump;

pub use illusion::IllusionTask;
pub use perception::PerceptionTask;
pub use pump::PumpTask;

use drivecheck_core::{Action, Snapshot, TaskKind, TrialPhase, TrialResult};

use crate::latch::LatchedInput;

/// How the engine treats an action in the task's current phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Not qualifying right now. Dropped.
    Ignore,
    /// Goes through the single-shot latch.
    Latch,
    /// Repeatable input applied directly, like a pump press.
    Repeat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Finish,
}

pub trait TimedTask {
    type Phase: TrialPhase;

    fn kind(&self) -> TaskKind;

    fn phase(&self) -> Self::Phase;

    /// Leaves the initial phase.
    fn begin(&mut self, now: f64);

    /// Classifies `action` submitted at clock time `now`.
    fn route(&self, action: Action, now: f64) -> Routing;

    fn repeat(&mut self, _action: Action, _now: f64) {}

    /// Whether the single-shot window is open in the current phase.
    fn accepts_latch(&self) -> bool;

    /// Advances the state machine to `now`. Within one step a latched input
    /// is considered before any automatic threshold.
    fn step(&mut self, now: f64, latched: Option<LatchedInput<Action>>) -> Step;

    fn snapshot(&self, now: f64) -> Snapshot;

    /// Result of a finished trial; `None` before a terminal phase.
    fn outcome(&self) -> Option<TrialResult>;
}
