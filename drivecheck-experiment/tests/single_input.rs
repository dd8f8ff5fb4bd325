mod common;

use common::perception_params;
use drivecheck_core::Action;
use drivecheck_experiment::{InputLatch, PerceptionTask, Trial};
use drivecheck_timing::ManualClock;
use proptest::prelude::*;

proptest! {
    #[test]
    fn latch_accepts_exactly_one_per_arm(
        rounds in prop::collection::vec(prop::collection::vec(0.0f64..10_000.0, 1..20), 1..5)
    ) {
        let mut latch = InputLatch::new();
        for (round, times) in rounds.iter().enumerate() {
            latch.arm();
            let accepted = times
                .iter()
                .filter(|at| latch.submit(round, **at))
                .count();
            prop_assert_eq!(accepted, 1);
            prop_assert_eq!(latch.accepted().map(|l| l.at), Some(times[0]));
        }
    }

    #[test]
    fn running_trial_accepts_one_stop(gaps in prop::collection::vec(0.0f64..50.0, 1..30)) {
        let clock = ManualClock::new(0.0);
        let mut trial = Trial::new(PerceptionTask::new(perception_params(4000, 2000)), clock.clone());
        trial.start().unwrap();
        clock.set(3000.0);
        trial.frame().unwrap();

        let mut accepted = 0;
        for gap in &gaps {
            clock.advance(*gap);
            if trial.submit(Action::Stop).unwrap() {
                accepted += 1;
            }
        }
        prop_assert_eq!(accepted, 1);
        prop_assert!(trial.is_finished());
    }
}
