//! Opaque RGBA colours. Opaque colours are identical premultiplied or not.

use drivecheck_core::{AssessmentStage, DriveAction, DriveMode, DriveOutcome};

pub const BACKGROUND: [u8; 4] = [24, 24, 28, 255];
pub const LANE: [u8; 4] = [60, 60, 66, 255];
pub const MARKING: [u8; 4] = [210, 210, 200, 255];
pub const OBSTACLE: [u8; 4] = [220, 60, 50, 255];
pub const CAR: [u8; 4] = [66, 133, 244, 255];
pub const WINDOW: [u8; 4] = [30, 50, 90, 255];
pub const PLAYER: [u8; 4] = [70, 190, 110, 255];
pub const HAZARD: [u8; 4] = [235, 90, 40, 255];
pub const BURST: [u8; 4] = [255, 170, 30, 255];
pub const TANK_FRAME: [u8; 4] = [150, 150, 160, 255];
pub const TANK_EMPTY: [u8; 4] = [40, 40, 46, 255];
pub const FUEL: [u8; 4] = [240, 200, 60, 255];
pub const DIGIT: [u8; 4] = [245, 245, 245, 255];
pub const POINTS: [u8; 4] = [250, 215, 90, 255];
pub const PIP_DONE: [u8; 4] = [120, 200, 140, 255];
pub const PIP_PENDING: [u8; 4] = [70, 70, 78, 255];
pub const SUCCESS: [u8; 4] = [60, 170, 90, 255];

pub fn stage(stage: AssessmentStage) -> [u8; 4] {
    match stage {
        AssessmentStage::Intake => [90, 90, 100, 255],
        AssessmentStage::Perception => [50, 110, 200, 255],
        AssessmentStage::FuelPump => [200, 140, 40, 255],
        AssessmentStage::Illusion => [140, 80, 190, 255],
        AssessmentStage::Complete => SUCCESS,
    }
}

pub fn mode(mode: DriveMode) -> [u8; 4] {
    match mode {
        DriveMode::Assist => [60, 140, 230, 255],
        DriveMode::Manual => [230, 160, 40, 255],
    }
}

pub fn action(action: DriveAction) -> [u8; 4] {
    match action {
        DriveAction::Left | DriveAction::Right => [180, 180, 240, 255],
        DriveAction::Accelerate => [120, 220, 120, 255],
        DriveAction::Brake => [230, 80, 80, 255],
    }
}

pub fn outcome(outcome: DriveOutcome) -> [u8; 4] {
    match outcome {
        DriveOutcome::Crash => OBSTACLE,
        DriveOutcome::NearMiss => [230, 180, 40, 255],
        DriveOutcome::SafePass => SUCCESS,
    }
}
