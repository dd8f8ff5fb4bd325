//! Runs the three stages in order over one session.

use std::cell::RefCell;
use std::rc::Rc;

use drivecheck_core::{
    Action, AssessmentStage, AttributionAnswer, ClientInfo, DriveMode, IllusionParams,
    IllusionResult, Participant, Phase, Session, Snapshot, TrialResult,
};
use drivecheck_timing::{Clock, FrameStatistics};
use log::{debug, info};
use rand::Rng;
use rand::rngs::StdRng;

use crate::config::AssessmentConfig;
use crate::engine::Trial;
use crate::error::{EngineError, EngineResult};
use crate::randomizer::Randomizer;
use crate::scenario::{OutcomeTable, Scenario};
use crate::task::{IllusionTask, PerceptionTask, PumpTask};

#[derive(Debug, Clone, PartialEq)]
pub enum AssessmentEvent {
    TrialCompleted(TrialResult),
    StageCompleted(AssessmentStage),
    AssessmentCompleted,
}

/// Where the illusion stage is between scenarios.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IllusionStep {
    ChooseMode,
    Running,
    Attribution,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub accepted: bool,
    pub events: Vec<AssessmentEvent>,
}

enum ActiveTrial<C: Clock> {
    Perception(Trial<PerceptionTask, C>),
    Pump(Trial<PumpTask, C>),
    Illusion(Trial<IllusionTask, C>),
}

macro_rules! each_trial {
    ($active:expr, $trial:ident => $body:expr) => {
        match $active {
            ActiveTrial::Perception($trial) => $body,
            ActiveTrial::Pump($trial) => $body,
            ActiveTrial::Illusion($trial) => $body,
        }
    };
}

impl<C: Clock> ActiveTrial<C> {
    fn frame(&mut self) -> EngineResult<Option<Snapshot>> {
        each_trial!(self, t => t.frame())
    }

    fn submit(&mut self, action: Action) -> EngineResult<bool> {
        each_trial!(self, t => t.submit(action))
    }

    fn abort(&mut self) {
        each_trial!(self, t => t.abort())
    }

    fn snapshot(&self) -> Snapshot {
        each_trial!(self, t => t.snapshot())
    }

    fn is_finished(&self) -> bool {
        each_trial!(self, t => t.is_finished())
    }

    fn frame_stats(&self) -> FrameStatistics {
        each_trial!(self, t => t.frame_stats())
    }
}

pub struct Assessment<C: Clock, R: Rng = StdRng> {
    config: AssessmentConfig,
    clock: C,
    randomizer: Randomizer<R>,
    table: OutcomeTable,
    session: Option<Session>,
    stage: AssessmentStage,
    completed_in_stage: usize,
    active: Option<ActiveTrial<C>>,
    outbox: Rc<RefCell<Vec<TrialResult>>>,
    illusion_step: IllusionStep,
    pending_outcome: Option<IllusionResult>,
    frame_stats: FrameStatistics,
}

impl<C: Clock> Assessment<C, StdRng> {
    /// Seeds from the config when it carries a seed, otherwise from the OS.
    pub fn from_config(config: AssessmentConfig, clock: C) -> EngineResult<Self> {
        let randomizer = match config.seed {
            Some(seed) => Randomizer::seeded(seed),
            None => Randomizer::from_os_rng(),
        };
        Self::new(config, clock, randomizer)
    }
}

impl<C: Clock, R: Rng> Assessment<C, R> {
    pub fn new(config: AssessmentConfig, clock: C, randomizer: Randomizer<R>) -> EngineResult<Self> {
        config.validate()?;
        let table = config.outcome_table()?;
        Ok(Self {
            config,
            clock,
            randomizer,
            table,
            session: None,
            stage: AssessmentStage::Intake,
            completed_in_stage: 0,
            active: None,
            outbox: Rc::new(RefCell::new(Vec::new())),
            illusion_step: IllusionStep::ChooseMode,
            pending_outcome: None,
            frame_stats: FrameStatistics::default(),
        })
    }

    pub fn begin(&mut self, participant: Participant, client: ClientInfo) -> EngineResult<()> {
        self.expect_stage("begin", AssessmentStage::Intake)?;
        let session = Session::new(participant, client);
        info!("session {} started", session.id);
        self.session = Some(session);
        self.enter_stage(AssessmentStage::Perception);
        Ok(())
    }

    /// Starts the next perception or fuel pump trial.
    pub fn start_trial(&mut self) -> EngineResult<()> {
        if !matches!(self.stage, AssessmentStage::Perception | AssessmentStage::FuelPump) {
            return Err(self.mismatch("start_trial"));
        }
        if self.active.as_ref().is_some_and(|t| !t.is_finished()) {
            return Err(EngineError::AlreadyStarted);
        }
        if self.stage_done() {
            return Err(self.mismatch("start_trial"));
        }
        self.launch()
    }

    /// Discards the running trial without a result and starts a fresh one
    /// with newly drawn parameters at the same position in the stage.
    pub fn retry_trial(&mut self) -> EngineResult<()> {
        let mode = self.current_mode();
        let Some(active) = self.active.as_mut() else {
            return Err(EngineError::NoActiveTrial);
        };
        if active.is_finished() {
            return Err(EngineError::NoActiveTrial);
        }
        active.abort();
        self.active = None;
        info!("retrying {} trial {}", self.stage.label(), self.completed_in_stage + 1);
        match self.stage {
            AssessmentStage::Illusion => {
                let mode = mode.ok_or(EngineError::NoActiveTrial)?;
                self.launch_scenario(mode)
            }
            _ => self.launch(),
        }
    }

    pub fn submit(&mut self, action: Action) -> EngineResult<Submission> {
        let accepted = match self.active.as_mut() {
            Some(active) => active.submit(action)?,
            None => {
                debug!("dropped {} with no active trial", action.label());
                false
            }
        };
        Ok(Submission {
            accepted,
            events: self.collect(),
        })
    }

    pub fn frame(&mut self) -> EngineResult<Vec<AssessmentEvent>> {
        if let Some(active) = self.active.as_mut() {
            active.frame()?;
            let stats = active.frame_stats();
            if stats.refresh_rate_hz().is_some() {
                self.frame_stats = stats;
            }
        }
        Ok(self.collect())
    }

    /// Moves past a completed stage. The illusion stage only completes once
    /// the last attribution question is answered.
    pub fn advance(&mut self) -> EngineResult<Vec<AssessmentEvent>> {
        let marked = self
            .session
            .as_ref()
            .is_some_and(|s| s.completed_stages.contains(&self.stage));
        if !self.stage.is_task() || !marked {
            return Err(self.mismatch("advance"));
        }
        let Some(next) = self.stage.next() else {
            return Err(self.mismatch("advance"));
        };
        self.enter_stage(next);
        let mut events = Vec::new();
        if next.is_complete() {
            if let Some(session) = self.session.as_mut() {
                session.mark_stage_complete(AssessmentStage::Complete);
                info!("session {} complete", session.id);
            }
            events.push(AssessmentEvent::AssessmentCompleted);
        }
        Ok(events)
    }

    pub fn choose_mode(&mut self, mode: DriveMode) -> EngineResult<()> {
        self.expect_stage("choose_mode", AssessmentStage::Illusion)?;
        if self.illusion_step != IllusionStep::ChooseMode || self.stage_done() {
            return Err(self.mismatch("choose_mode"));
        }
        self.launch_scenario(mode)
    }

    pub fn answer_attribution(&mut self, choice: usize) -> EngineResult<Vec<AssessmentEvent>> {
        self.expect_stage("answer_attribution", AssessmentStage::Illusion)?;
        if self.illusion_step != IllusionStep::Attribution {
            return Err(self.mismatch("answer_attribution"));
        }
        let Some(result) = self.pending_outcome.as_ref() else {
            return Err(EngineError::NoActiveTrial);
        };
        let scenario = self
            .table
            .scenario(result.scenario_id)
            .ok_or(EngineError::NoActiveTrial)?;
        let option = scenario
            .attribution_options
            .get(choice)
            .ok_or(EngineError::InvalidChoice(choice))?;
        let answer = AttributionAnswer {
            scenario_id: scenario.id,
            attribution_type: scenario.attribution_type,
            question: scenario.attribution_question.clone(),
            choice: option.clone(),
        };
        if let Some(session) = self.session.as_mut() {
            session.record_attribution(answer);
        }
        self.pending_outcome = None;
        self.active = None;
        self.illusion_step = IllusionStep::ChooseMode;

        let mut events = Vec::new();
        if self.completed_in_stage >= self.table.len() {
            self.complete_stage(&mut events);
        }
        Ok(events)
    }

    /// Tears down the active trial, if any. No result is recorded.
    pub fn abort(&mut self) {
        if let Some(active) = self.active.as_mut() {
            active.abort();
        }
        self.active = None;
        if self.stage == AssessmentStage::Illusion && self.illusion_step == IllusionStep::Running {
            self.illusion_step = IllusionStep::ChooseMode;
        }
    }

    pub fn stage(&self) -> AssessmentStage {
        self.stage
    }

    pub fn illusion_step(&self) -> IllusionStep {
        self.illusion_step
    }

    pub fn snapshot(&self) -> Option<Snapshot> {
        self.active.as_ref().map(ActiveTrial::snapshot)
    }

    pub fn trial_running(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Completed and total trials of the current stage.
    pub fn progress(&self) -> (usize, usize) {
        (self.completed_in_stage, self.stage_total())
    }

    pub fn stage_done(&self) -> bool {
        self.stage.is_task() && self.completed_in_stage >= self.stage_total()
    }

    pub fn banked_points(&self) -> u32 {
        self.session.as_ref().map_or(0, |s| s.banked_points)
    }

    /// Outcome of the last scenario, shown while the attribution question is open.
    pub fn pending_outcome(&self) -> Option<&IllusionResult> {
        self.pending_outcome.as_ref()
    }

    /// Scenario being played or about to be played.
    pub fn current_scenario(&self) -> Option<&Scenario> {
        if let Some(result) = &self.pending_outcome {
            return self.table.scenario(result.scenario_id);
        }
        if self.stage != AssessmentStage::Illusion {
            return None;
        }
        self.table.scenarios().get(self.completed_in_stage)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn outcome_table(&self) -> &OutcomeTable {
        &self.table
    }

    pub fn config(&self) -> &AssessmentConfig {
        &self.config
    }

    pub fn frame_stats(&self) -> FrameStatistics {
        self.frame_stats
    }

    fn stage_total(&self) -> usize {
        match self.stage {
            AssessmentStage::Perception => self.config.perception.trials,
            AssessmentStage::FuelPump => self.config.fuel_pump.trials,
            AssessmentStage::Illusion => self.table.len(),
            AssessmentStage::Intake | AssessmentStage::Complete => 0,
        }
    }

    fn current_mode(&self) -> Option<DriveMode> {
        match self.active.as_ref()? {
            ActiveTrial::Illusion(_) => {}
            _ => return None,
        }
        match self.snapshot()? {
            Snapshot::Illusion(snap) => Some(snap.mode),
            _ => None,
        }
    }

    fn enter_stage(&mut self, stage: AssessmentStage) {
        info!("entering {} stage", stage.label());
        self.stage = stage;
        self.completed_in_stage = 0;
        self.active = None;
        self.illusion_step = IllusionStep::ChooseMode;
        self.pending_outcome = None;
    }

    fn launch(&mut self) -> EngineResult<()> {
        let trial = match self.stage {
            AssessmentStage::Perception => {
                let params = self.randomizer.perception(&self.config.perception)?;
                info!(
                    "perception trial {}: visible {} ms, hidden {} ms, {:.3} px/s",
                    self.completed_in_stage + 1,
                    params.visible_ms,
                    params.hidden_ms,
                    params.speed_px_per_s()
                );
                let mut trial = Trial::new(PerceptionTask::new(params), self.clock.clone());
                self.wire(&mut trial);
                trial.start()?;
                ActiveTrial::Perception(trial)
            }
            AssessmentStage::FuelPump => {
                let params = self.randomizer.pump(&self.config.fuel_pump)?;
                debug!("fuel pump trial {}: blast at {} ms", self.completed_in_stage + 1, params.blast_ms);
                let mut trial = Trial::new(PumpTask::new(params), self.clock.clone());
                self.wire(&mut trial);
                trial.start()?;
                ActiveTrial::Pump(trial)
            }
            _ => return Err(self.mismatch("start_trial")),
        };
        self.active = Some(trial);
        Ok(())
    }

    fn launch_scenario(&mut self, mode: DriveMode) -> EngineResult<()> {
        let scenario = self
            .table
            .scenarios()
            .get(self.completed_in_stage)
            .cloned()
            .ok_or_else(|| self.mismatch("choose_mode"))?;
        let illusion = &self.config.illusion;
        let params = IllusionParams {
            scenario_id: scenario.id,
            mode,
            duration_ms: illusion.duration_ms,
            hazard_start_x: illusion.hazard_start_x,
            hazard_speed_px_per_s: illusion.hazard_speed_px_per_s,
            lane_count: illusion.lane_count,
        };
        info!("scenario {} ({}) in {} mode", scenario.id, scenario.title, mode.as_str());
        let mut trial = Trial::new(IllusionTask::new(scenario, params)?, self.clock.clone());
        self.wire(&mut trial);
        trial.start()?;
        self.active = Some(ActiveTrial::Illusion(trial));
        self.illusion_step = IllusionStep::Running;
        Ok(())
    }

    fn wire<T: crate::task::TimedTask>(&self, trial: &mut Trial<T, C>) {
        let outbox = Rc::clone(&self.outbox);
        trial.set_completion_handler(move |result| outbox.borrow_mut().push(result));
    }

    fn collect(&mut self) -> Vec<AssessmentEvent> {
        let results: Vec<TrialResult> = self.outbox.borrow_mut().drain(..).collect();
        let mut events = Vec::new();
        for result in results {
            if let Some(session) = self.session.as_mut() {
                session.append(result.clone());
            }
            self.completed_in_stage += 1;
            if let TrialResult::Illusion(illusion) = &result {
                self.pending_outcome = Some(illusion.clone());
                self.illusion_step = IllusionStep::Attribution;
            }
            events.push(AssessmentEvent::TrialCompleted(result));
            if self.stage != AssessmentStage::Illusion && self.stage_done() {
                self.complete_stage(&mut events);
            }
        }
        events
    }

    fn complete_stage(&mut self, events: &mut Vec<AssessmentEvent>) {
        if let Some(session) = self.session.as_mut() {
            session.mark_stage_complete(self.stage);
            if let Some(hz) = self.frame_stats.refresh_rate_hz() {
                session.client.refresh_rate_hz = Some(hz);
            }
        }
        info!("{} stage complete", self.stage.label());
        events.push(AssessmentEvent::StageCompleted(self.stage));
    }

    fn expect_stage(&self, operation: &'static str, stage: AssessmentStage) -> EngineResult<()> {
        if self.stage == stage {
            Ok(())
        } else {
            Err(self.mismatch(operation))
        }
    }

    fn mismatch(&self, operation: &'static str) -> EngineError {
        EngineError::StageMismatch {
            operation,
            stage: self.stage.label(),
        }
    }
}
