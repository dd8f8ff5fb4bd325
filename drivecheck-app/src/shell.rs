//! Window-independent driver that turns key intents into assessment calls
//! and persists the session at every trial and stage boundary.

use anyhow::Result;
use drivecheck_core::{AssessmentStage, ClientInfo, DriveMode, Participant, Phase, Snapshot};
use drivecheck_experiment::{Assessment, AssessmentEvent, EngineError, IllusionStep};
use drivecheck_render::Scene;
use drivecheck_store::SessionRepository;
use drivecheck_timing::Clock;
use log::{debug, info};

use crate::keys::Intent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Shell<C: Clock, S: SessionRepository> {
    assessment: Assessment<C>,
    repository: S,
    participant: Participant,
    client: ClientInfo,
}

impl<C: Clock, S: SessionRepository> Shell<C, S> {
    pub fn new(assessment: Assessment<C>, repository: S, participant: Participant) -> Self {
        Self {
            assessment,
            repository,
            participant,
            client: ClientInfo::capture(),
        }
    }

    /// Client metadata recorded when the session begins.
    pub fn set_client(&mut self, client: ClientInfo) {
        self.client = client;
    }

    pub fn assessment(&self) -> &Assessment<C> {
        &self.assessment
    }

    pub fn repository(&self) -> &S {
        &self.repository
    }

    pub fn handle(&mut self, intent: Intent) -> Result<Flow> {
        let was_intake = self.assessment.stage() == AssessmentStage::Intake;
        let outcome = match intent {
            Intent::Quit => return self.quit(),
            Intent::Continue => self.proceed(),
            Intent::Action(action) => self.assessment.submit(action).map(|s| s.events),
            Intent::Choose(index) => self.choose(index),
            Intent::Retry => self.assessment.retry_trial().map(|()| Vec::new()),
        };
        match outcome {
            Ok(events) => {
                if was_intake && self.assessment.session().is_some() {
                    self.save()?;
                }
                self.persist(&events)
            }
            // Keys pressed at the wrong moment are not errors for the candidate.
            Err(e) => {
                debug!("ignored {intent:?}: {e}");
                Ok(Flow::Continue)
            }
        }
    }

    /// Advances the running trial by one frame.
    pub fn tick(&mut self) -> Result<Flow> {
        let events = self.assessment.frame()?;
        self.persist(&events)
    }

    fn proceed(&mut self) -> Result<Vec<AssessmentEvent>, EngineError> {
        let stage = self.assessment.stage();
        match stage {
            AssessmentStage::Intake => {
                let client = self.client.clone();
                self.assessment.begin(self.participant.clone(), client)?;
                Ok(Vec::new())
            }
            AssessmentStage::Perception | AssessmentStage::FuelPump => {
                if self.assessment.stage_done() {
                    self.assessment.advance()
                } else {
                    self.assessment.start_trial().map(|()| Vec::new())
                }
            }
            AssessmentStage::Illusion => self.assessment.advance(),
            AssessmentStage::Complete => Ok(Vec::new()),
        }
    }

    fn choose(&mut self, index: usize) -> Result<Vec<AssessmentEvent>, EngineError> {
        match self.assessment.illusion_step() {
            IllusionStep::ChooseMode if self.assessment.stage() == AssessmentStage::Illusion => {
                let mode = DriveMode::ALL
                    .get(index)
                    .copied()
                    .ok_or(EngineError::InvalidChoice(index))?;
                self.assessment.choose_mode(mode).map(|()| Vec::new())
            }
            IllusionStep::Attribution => self.assessment.answer_attribution(index),
            _ => Ok(Vec::new()),
        }
    }

    fn quit(&mut self) -> Result<Flow> {
        self.assessment.abort();
        self.save()?;
        Ok(Flow::Exit)
    }

    fn persist(&mut self, events: &[AssessmentEvent]) -> Result<Flow> {
        if events.is_empty() {
            return Ok(Flow::Continue);
        }
        for event in events {
            match event {
                AssessmentEvent::TrialCompleted(result) => {
                    debug!("{} trial recorded", result.kind().label());
                }
                AssessmentEvent::StageCompleted(stage) => info!("{} stage done", stage.label()),
                AssessmentEvent::AssessmentCompleted => {
                    info!("assessment complete, {} points banked", self.assessment.banked_points());
                }
            }
        }
        self.save()?;
        Ok(Flow::Continue)
    }

    fn save(&mut self) -> Result<()> {
        if let Some(session) = self.assessment.session() {
            self.repository.save(session)?;
        }
        Ok(())
    }

    /// What to draw for `snapshot`, which the caller takes from the
    /// assessment once per frame.
    pub fn scene<'a>(&self, snapshot: Option<&'a Snapshot>) -> Scene<'a> {
        let stage = self.assessment.stage();
        let (completed, total) = self.assessment.progress();
        match stage {
            AssessmentStage::Intake => Scene::Stage {
                stage,
                completed: 0,
                total: 0,
            },
            AssessmentStage::Complete => Scene::Complete {
                banked_points: self.assessment.banked_points(),
            },
            AssessmentStage::Illusion => match (self.assessment.illusion_step(), snapshot) {
                (IllusionStep::Running, Some(snapshot)) => Scene::Trial {
                    snapshot,
                    completed,
                    total,
                },
                (IllusionStep::Attribution, _) => match self.assessment.pending_outcome() {
                    Some(result) => Scene::Attribution {
                        outcome: result.outcome,
                        options: self
                            .assessment
                            .current_scenario()
                            .map_or(0, |s| s.attribution_options.len()),
                    },
                    None => Scene::ModeChoice {
                        scenario: completed,
                        total,
                    },
                },
                _ if self.assessment.stage_done() => Scene::Stage {
                    stage,
                    completed,
                    total,
                },
                _ => Scene::ModeChoice {
                    scenario: completed,
                    total,
                },
            },
            AssessmentStage::Perception | AssessmentStage::FuelPump => match snapshot {
                Some(snapshot) => Scene::Trial {
                    snapshot,
                    completed,
                    total,
                },
                None => Scene::Stage {
                    stage,
                    completed,
                    total,
                },
            },
        }
    }

    /// Instructions for the window title. The renderer draws no text.
    pub fn title(&self) -> String {
        let (completed, total) = self.assessment.progress();
        let position = format!("{}/{}", (completed + 1).min(total.max(1)), total);
        let running = self.assessment.trial_running();
        match self.assessment.stage() {
            AssessmentStage::Intake => "Drivecheck: press Enter to begin".to_string(),
            AssessmentStage::Perception if running => format!(
                "Perception {position}: press Space when the car would reach the obstacle"
            ),
            AssessmentStage::FuelPump if running => format!(
                "Fuel pump {position}: Space to pump, S to stop and bank ({} banked)",
                self.assessment.banked_points()
            ),
            stage @ (AssessmentStage::Perception | AssessmentStage::FuelPump) => {
                if self.assessment.stage_done() {
                    format!("{} done: press Enter to continue", stage_name(stage))
                } else {
                    format!("{} {position}: press Enter to start", stage_name(stage))
                }
            }
            AssessmentStage::Illusion => match self.assessment.illusion_step() {
                IllusionStep::ChooseMode if self.assessment.stage_done() => {
                    "Driving done: press Enter to finish".to_string()
                }
                IllusionStep::ChooseMode => {
                    let title = self
                        .assessment
                        .current_scenario()
                        .map_or("Scenario", |s| s.title.as_str());
                    format!("{title} {position}: 1 assist, 2 manual")
                }
                IllusionStep::Running => "Arrows or WASD to react".to_string(),
                IllusionStep::Attribution => {
                    let scenario = self.assessment.current_scenario();
                    let question = scenario.map_or("", |s| s.attribution_question.as_str());
                    let options = scenario
                        .map(|s| {
                            s.attribution_options
                                .iter()
                                .enumerate()
                                .map(|(i, o)| format!("{} {o}", i + 1))
                                .collect::<Vec<_>>()
                                .join(" | ")
                        })
                        .unwrap_or_default();
                    format!("{question} {options}")
                }
            },
            AssessmentStage::Complete => format!(
                "Assessment complete ({} points). Press Esc to close",
                self.assessment.banked_points()
            ),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.assessment.stage().is_complete()
    }
}

fn stage_name(stage: AssessmentStage) -> &'static str {
    match stage {
        AssessmentStage::Perception => "Perception",
        AssessmentStage::FuelPump => "Fuel pump",
        AssessmentStage::Illusion => "Driving",
        AssessmentStage::Intake => "Intake",
        AssessmentStage::Complete => "Complete",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivecheck_core::{Action, CountdownSpec, DriveAction, DurationBounds};
    use drivecheck_experiment::AssessmentConfig;
    use drivecheck_store::MemoryRepository;
    use drivecheck_timing::ManualClock;

    fn shell(clock: &ManualClock) -> Shell<ManualClock, MemoryRepository> {
        let mut config = AssessmentConfig::default();
        config.seed = Some(3);
        config.perception.trials = 1;
        config.perception.visible_ms = DurationBounds::new(3000, 3000);
        config.perception.hidden_ms = DurationBounds::new(2000, 2000);
        config.perception.countdown = CountdownSpec {
            from: 1,
            interval_ms: 100,
        };
        config.fuel_pump.trials = 1;
        config.fuel_pump.blast_ms = DurationBounds::new(4000, 4000);
        let assessment = Assessment::from_config(config, clock.clone()).unwrap();
        Shell::new(
            assessment,
            MemoryRepository::new(),
            Participant {
                name: "Ada".into(),
                application_number: "A-1".into(),
            },
        )
    }

    fn press(shell: &mut Shell<ManualClock, MemoryRepository>, intent: Intent) {
        assert_eq!(shell.handle(intent).unwrap(), Flow::Continue);
    }

    fn stored_trials(shell: &Shell<ManualClock, MemoryRepository>) -> usize {
        let sessions = shell.repository().list_sessions().unwrap();
        sessions.first().map_or(0, |s| s.trial_count())
    }

    #[test]
    fn whole_assessment_by_keys_is_saved_as_it_goes() {
        let clock = ManualClock::new(0.0);
        let mut shell = shell(&clock);
        assert!(shell.title().contains("Enter"));

        press(&mut shell, Intent::Continue);
        assert_eq!(shell.assessment().stage(), AssessmentStage::Perception);
        assert_eq!(shell.repository().len(), 1);

        // Perception
        press(&mut shell, Intent::Continue);
        clock.advance(100.0);
        shell.tick().unwrap();
        clock.advance(4000.0);
        press(&mut shell, Intent::Action(Action::Stop));
        assert_eq!(stored_trials(&shell), 1);
        press(&mut shell, Intent::Continue);
        assert_eq!(shell.assessment().stage(), AssessmentStage::FuelPump);

        // Fuel pump
        press(&mut shell, Intent::Continue);
        for _ in 0..4 {
            press(&mut shell, Intent::Action(Action::Pump));
            clock.advance(100.0);
        }
        press(&mut shell, Intent::Action(Action::Stop));
        assert_eq!(stored_trials(&shell), 2);
        press(&mut shell, Intent::Continue);
        assert_eq!(shell.assessment().stage(), AssessmentStage::Illusion);

        // Driving scenarios
        let scenarios = shell.assessment().outcome_table().len();
        for i in 0..scenarios {
            let snapshot = shell.assessment().snapshot();
            assert!(matches!(shell.scene(snapshot.as_ref()), Scene::ModeChoice { .. }));
            press(&mut shell, Intent::Choose(i % 2));
            clock.advance(200.0);
            press(&mut shell, Intent::Action(Action::Drive(DriveAction::Left)));
            clock.advance(2000.0);
            shell.tick().unwrap();
            let snapshot = shell.assessment().snapshot();
            assert!(matches!(shell.scene(snapshot.as_ref()), Scene::Attribution { options: 3, .. }));
            press(&mut shell, Intent::Choose(0));
        }
        press(&mut shell, Intent::Continue);
        assert!(shell.is_complete());

        let stored = shell.repository().list_sessions().unwrap();
        assert_eq!(stored.len(), 1);
        assert!(stored[0].is_complete());
        assert_eq!(stored[0].illusion.len(), scenarios);
        assert_eq!(stored[0].attributions.len(), scenarios);
        assert_eq!(stored[0].banked_points, 4);
        assert_eq!(stored[0].participant.name, "Ada");
    }

    #[test]
    fn stray_keys_are_ignored() {
        let clock = ManualClock::new(0.0);
        let mut shell = shell(&clock);
        press(&mut shell, Intent::Retry);
        press(&mut shell, Intent::Action(Action::Stop));
        press(&mut shell, Intent::Choose(2));
        assert_eq!(shell.assessment().stage(), AssessmentStage::Intake);
        assert!(shell.repository().is_empty());

        press(&mut shell, Intent::Continue);
        press(&mut shell, Intent::Continue);
        press(&mut shell, Intent::Continue);
        assert!(shell.assessment().trial_running());
    }

    #[test]
    fn quitting_aborts_and_saves() {
        let clock = ManualClock::new(0.0);
        let mut shell = shell(&clock);
        press(&mut shell, Intent::Continue);
        press(&mut shell, Intent::Continue);
        assert_eq!(shell.handle(Intent::Quit).unwrap(), Flow::Exit);
        assert!(!shell.assessment().trial_running());
        let stored = shell.repository().list_sessions().unwrap();
        assert_eq!(stored[0].trial_count(), 0);
    }
}
