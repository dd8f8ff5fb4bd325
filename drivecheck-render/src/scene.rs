use drivecheck_core::{AssessmentStage, DriveOutcome, Snapshot};

/// What the shell wants on screen this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scene<'a> {
    /// Between trials of a stage, or the intake card.
    Stage {
        stage: AssessmentStage,
        completed: usize,
        total: usize,
    },
    Trial {
        snapshot: &'a Snapshot,
        completed: usize,
        total: usize,
    },
    ModeChoice {
        scenario: usize,
        total: usize,
    },
    /// Outcome of the last scenario plus one panel per answer option.
    Attribution {
        outcome: DriveOutcome,
        options: usize,
    },
    Complete {
        banked_points: u32,
    },
}
