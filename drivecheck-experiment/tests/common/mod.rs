#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use drivecheck_core::{CountdownSpec, LaneGeometry, PerceptionParams, TrialResult};
use drivecheck_experiment::{TimedTask, Trial};
use drivecheck_timing::Clock;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// 600 px of travel, so `visible + hidden = 6000` gives exactly 100 px/s.
pub fn round_geometry() -> LaneGeometry {
    LaneGeometry {
        start_x: 40.0,
        ..LaneGeometry::default()
    }
}

pub fn perception_params(visible_ms: u64, hidden_ms: u64) -> PerceptionParams {
    PerceptionParams::new(
        visible_ms,
        hidden_ms,
        round_geometry(),
        CountdownSpec {
            from: 3,
            interval_ms: 1000,
        },
    )
    .unwrap()
}

pub fn collect_results<T: TimedTask, C: Clock>(trial: &mut Trial<T, C>) -> Rc<RefCell<Vec<TrialResult>>> {
    let results = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&results);
    trial.set_completion_handler(move |result| sink.borrow_mut().push(result));
    results
}
