mod common;

use common::{collect_results, init_logger};
use drivecheck_core::{
    Action, ClientInfo, Participant, PumpOutcome, PumpParams, PumpPhase, PumpResult, Session,
    TrialResult,
};
use drivecheck_experiment::{PumpTask, Trial};
use drivecheck_timing::ManualClock;

fn pump_trial(blast_ms: u64) -> (Trial<PumpTask, ManualClock>, ManualClock) {
    let clock = ManualClock::new(1000.0);
    let mut trial = Trial::new(PumpTask::new(PumpParams::new(blast_ms, 1).unwrap()), clock.clone());
    trial.start().unwrap();
    (trial, clock)
}

fn pump_result(result: Option<&TrialResult>) -> PumpResult {
    match result {
        Some(TrialResult::FuelPump(r)) => r.clone(),
        other => panic!("expected a fuel pump result, got {other:?}"),
    }
}

#[test]
fn stop_at_seven_pumps_banks_seven() {
    init_logger();
    let (mut trial, clock) = pump_trial(5000);
    let results = collect_results(&mut trial);

    for _ in 0..7 {
        assert_eq!(trial.submit(Action::Pump), Ok(true));
        clock.advance(200.0);
        trial.frame().unwrap();
    }
    assert_eq!(trial.phase(), PumpPhase::Pumping);
    assert_eq!(trial.submit(Action::Stop), Ok(true));

    let result = pump_result(results.borrow().first());
    assert_eq!(result.outcome, PumpOutcome::Stopped);
    assert_eq!(result.pumps, 7);
    assert_eq!(result.points, 7);
    assert_eq!(result.elapsed_ms, 1400.0);

    let mut session = Session::new(Participant::default(), ClientInfo::capture());
    session.append(TrialResult::FuelPump(result));
    assert_eq!(session.banked_points, 7);
    assert_eq!(session.fuel_pump[0].pumps, 7);
}

#[test]
fn blast_zeroes_the_trial_but_not_the_bank() {
    let mut session = Session::new(Participant::default(), ClientInfo::capture());
    session.banked_points = 4;

    let (mut trial, clock) = pump_trial(2000);
    trial.submit(Action::Pump).unwrap();
    trial.submit(Action::Pump).unwrap();
    clock.advance(2500.0);
    trial.frame().unwrap();

    let result = pump_result(trial.result());
    assert_eq!(result.outcome, PumpOutcome::Exploded);
    assert_eq!(result.points, 0);
    assert_eq!(result.pumps, 2);
    assert_eq!(result.ended_at_ms, 3000.0);
    assert_eq!(result.elapsed_ms, 2000.0);

    session.append(TrialResult::FuelPump(result));
    assert_eq!(session.banked_points, 4);
}

#[test]
fn stop_before_first_pump_is_ignored() {
    let (mut trial, clock) = pump_trial(2000);
    assert_eq!(trial.submit(Action::Stop), Ok(false));
    clock.advance(10_000.0);
    trial.frame().unwrap();
    assert_eq!(trial.phase(), PumpPhase::Ready);
    assert!(trial.result().is_none());
}

#[test]
fn pump_landing_on_the_blast_is_counted_then_explodes() {
    let (mut trial, clock) = pump_trial(2000);
    trial.submit(Action::Pump).unwrap();
    clock.advance(2000.0);
    assert_eq!(trial.submit(Action::Pump), Ok(true));

    let result = pump_result(trial.result());
    assert_eq!(result.pumps, 2);
    assert_eq!(result.outcome, PumpOutcome::Exploded);
    assert_eq!(trial.submit(Action::Pump), Ok(false));
}

#[test]
fn stop_at_the_blast_instant_wins() {
    let (mut trial, clock) = pump_trial(2000);
    trial.submit(Action::Pump).unwrap();
    clock.advance(2000.0);
    assert_eq!(trial.submit(Action::Stop), Ok(true));
    let result = pump_result(trial.result());
    assert_eq!(result.outcome, PumpOutcome::Stopped);
    assert_eq!(result.points, 1);
}

#[test]
fn frames_wait_for_the_first_pump() {
    let (mut trial, clock) = pump_trial(4000);
    assert!(!trial.is_scheduled());
    clock.advance(500.0);
    assert_eq!(trial.frame(), Ok(None));

    assert_eq!(trial.submit(Action::Pump), Ok(true));
    assert!(trial.is_scheduled());
    for _ in 0..3 {
        clock.advance(16.0);
        assert!(trial.frame().unwrap().is_some());
    }
    let stats = trial.frame_stats();
    assert_eq!(stats.samples, 2);
    assert_eq!(stats.max_frame_ms, 16.0);
}
