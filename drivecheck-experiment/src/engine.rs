//! Generic timed trial engine.
//!
//! A [`Trial`] owns one task's runtime state together with its frame
//! scheduler and input latch. Inputs are resolved synchronously when they are
//! submitted, against the clock sample taken at submission; frames run the
//! same step procedure with their own single sample.

use drivecheck_core::{Action, Snapshot, TrialPhase, TrialResult};
use drivecheck_timing::{Clock, FrameScheduler, FrameStatistics, SchedulerState};
use log::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use crate::latch::{InputLatch, LatchedInput};
use crate::task::{Routing, Step, TimedTask};

pub type CompletionHandler = Box<dyn FnMut(TrialResult)>;
pub type TickHandler = Box<dyn FnMut(&Snapshot)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Pending,
    Active,
    Finished,
    TornDown,
}

pub struct Trial<T: TimedTask, C: Clock> {
    task: T,
    clock: C,
    scheduler: FrameScheduler,
    latch: InputLatch<Action>,
    lifecycle: Lifecycle,
    last_sample: f64,
    result: Option<TrialResult>,
    on_complete: Option<CompletionHandler>,
    on_tick: Option<TickHandler>,
}

impl<T: TimedTask, C: Clock> Trial<T, C> {
    pub fn new(task: T, clock: C) -> Self {
        let last_sample = clock.now();
        Self {
            task,
            clock,
            scheduler: FrameScheduler::new(),
            latch: InputLatch::new(),
            lifecycle: Lifecycle::Pending,
            last_sample,
            result: None,
            on_complete: None,
            on_tick: None,
        }
    }

    pub fn set_completion_handler<F>(&mut self, handler: F)
    where
        F: FnMut(TrialResult) + 'static,
    {
        self.on_complete = Some(Box::new(handler));
    }

    pub fn set_tick_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&Snapshot) + 'static,
    {
        self.on_tick = Some(Box::new(handler));
    }

    pub fn start(&mut self) -> EngineResult<()> {
        match self.lifecycle {
            Lifecycle::Pending => {}
            Lifecycle::TornDown => return Err(EngineError::TornDown),
            Lifecycle::Active | Lifecycle::Finished => return Err(EngineError::AlreadyStarted),
        }
        let now = self.clock.now();
        self.last_sample = now;
        self.task.begin(now);
        self.lifecycle = Lifecycle::Active;
        self.sync_scheduler(now);
        self.sync_latch();
        info!("{} trial started at {now:.3} ms", self.task.kind().label());
        Ok(())
    }

    /// One display refresh. Returns the snapshot handed to the tick handler,
    /// or `None` when no frame request is live.
    pub fn frame(&mut self) -> EngineResult<Option<Snapshot>> {
        if self.lifecycle == Lifecycle::TornDown {
            return Err(EngineError::TornDown);
        }
        let Some(tick) = self.scheduler.tick(self.clock.now()) else {
            return Ok(None);
        };
        self.last_sample = tick.now;
        let step = self.task.step(tick.now, self.latch.accepted());
        let snapshot = self.task.snapshot(tick.now);
        if let Some(on_tick) = self.on_tick.as_mut() {
            on_tick(&snapshot);
        }
        self.settle(step, tick.now);
        Ok(Some(snapshot))
    }

    /// Delivers an action. `Ok(false)` means it was not qualifying and was
    /// dropped; that is a normal condition, not an error.
    pub fn submit(&mut self, action: Action) -> EngineResult<bool> {
        match self.lifecycle {
            Lifecycle::Active => {}
            Lifecycle::TornDown => return Err(EngineError::TornDown),
            Lifecycle::Pending | Lifecycle::Finished => {
                debug!("dropped {} outside an active trial", action.label());
                return Ok(false);
            }
        }
        let now = self.clock.now();
        self.last_sample = now;
        let accepted = match self.task.route(action, now) {
            Routing::Ignore => {
                debug!(
                    "dropped {} during {}",
                    action.label(),
                    self.task.phase().label()
                );
                false
            }
            Routing::Latch => self.latch.submit(action, now),
            Routing::Repeat => {
                self.task.repeat(action, now);
                true
            }
        };
        if accepted {
            let step = self.task.step(now, self.latch.accepted());
            self.settle(step, now);
        }
        Ok(accepted)
    }

    /// Tears the trial down. Idempotent. Leaves the phase as it was and never
    /// produces a result.
    pub fn abort(&mut self) {
        if matches!(self.lifecycle, Lifecycle::Pending | Lifecycle::Active) {
            info!(
                "{} trial aborted during {}",
                self.task.kind().label(),
                self.task.phase().label()
            );
        }
        self.scheduler.cancel();
        self.latch.disarm();
        if self.lifecycle != Lifecycle::Finished {
            self.lifecycle = Lifecycle::TornDown;
        }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.task.snapshot(self.last_sample)
    }

    pub fn result(&self) -> Option<&TrialResult> {
        self.result.as_ref()
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn phase(&self) -> T::Phase {
        self.task.phase()
    }

    pub fn is_finished(&self) -> bool {
        self.lifecycle == Lifecycle::Finished
    }

    pub fn is_scheduled(&self) -> bool {
        self.scheduler.is_live()
    }

    pub fn latched(&self) -> Option<LatchedInput<Action>> {
        self.latch.accepted()
    }

    pub fn frame_stats(&self) -> FrameStatistics {
        self.scheduler.frame_stats()
    }

    pub fn task(&self) -> &T {
        &self.task
    }

    fn settle(&mut self, step: Step, now: f64) {
        if step == Step::Finish || self.task.phase().is_terminal() {
            self.finish(now);
        } else {
            self.sync_scheduler(now);
            self.sync_latch();
        }
    }

    /// Frames are requested only once the task's phase is clock driven, so a
    /// pump trial waiting for its first pump produces no ticks.
    fn sync_scheduler(&mut self, now: f64) {
        if self.scheduler.state() == SchedulerState::Idle && self.task.phase().is_animating() {
            self.scheduler.start(now);
            debug!(
                "{} frames requested from {now:.3} ms",
                self.task.kind().label()
            );
        }
    }

    fn sync_latch(&mut self) {
        if self.task.accepts_latch() && !self.latch.is_armed() && self.latch.accepted().is_none() {
            self.latch.arm();
        }
    }

    fn finish(&mut self, now: f64) {
        self.scheduler.cancel();
        self.latch.disarm();
        self.lifecycle = Lifecycle::Finished;

        let Some(result) = self.task.outcome() else {
            warn!("{} trial finished without a result", self.task.kind().label());
            return;
        };
        info!(
            "{} trial finished during step at {now:.3} ms as {}",
            self.task.kind().label(),
            self.task.phase().label()
        );
        self.result = Some(result.clone());
        match self.on_complete.as_mut() {
            Some(on_complete) => on_complete(result),
            None => warn!("no completion handler registered; result discarded"),
        }
    }
}

impl<T: TimedTask + std::fmt::Debug, C: Clock + std::fmt::Debug> std::fmt::Debug for Trial<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Trial")
            .field("task", &self.task)
            .field("clock", &self.clock)
            .field("lifecycle", &self.lifecycle)
            .field("result", &self.result)
            .finish_non_exhaustive()
    }
}
