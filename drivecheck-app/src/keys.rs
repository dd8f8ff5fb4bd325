use drivecheck_core::{Action, AssessmentStage, DriveAction};
use winit::keyboard::KeyCode;

/// What a key press asks the shell to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Begin, start the next trial or move to the next stage.
    Continue,
    Action(Action),
    /// Zero-based pick from the options on screen.
    Choose(usize),
    Retry,
    Quit,
}

pub fn map_key(code: KeyCode, stage: AssessmentStage) -> Option<Intent> {
    use KeyCode::*;
    let intent = match code {
        Escape => Intent::Quit,
        Enter | NumpadEnter => Intent::Continue,
        KeyR => Intent::Retry,
        Digit1 | Numpad1 => Intent::Choose(0),
        Digit2 | Numpad2 => Intent::Choose(1),
        Digit3 | Numpad3 => Intent::Choose(2),
        Space => match stage {
            AssessmentStage::Perception => Intent::Action(Action::Stop),
            AssessmentStage::FuelPump => Intent::Action(Action::Pump),
            _ => return None,
        },
        KeyS if stage == AssessmentStage::FuelPump || stage == AssessmentStage::Perception => {
            Intent::Action(Action::Stop)
        }
        ArrowLeft | KeyA if stage == AssessmentStage::Illusion => drive(DriveAction::Left),
        ArrowRight | KeyD if stage == AssessmentStage::Illusion => drive(DriveAction::Right),
        ArrowUp | KeyW if stage == AssessmentStage::Illusion => drive(DriveAction::Accelerate),
        ArrowDown | KeyS if stage == AssessmentStage::Illusion => drive(DriveAction::Brake),
        _ => return None,
    };
    Some(intent)
}

fn drive(action: DriveAction) -> Intent {
    Intent::Action(Action::Drive(action))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn space_depends_on_the_stage() {
        assert_eq!(
            map_key(KeyCode::Space, AssessmentStage::Perception),
            Some(Intent::Action(Action::Stop))
        );
        assert_eq!(
            map_key(KeyCode::Space, AssessmentStage::FuelPump),
            Some(Intent::Action(Action::Pump))
        );
        assert_eq!(map_key(KeyCode::Space, AssessmentStage::Illusion), None);
    }

    #[test]
    fn s_stops_the_pump_but_brakes_when_driving() {
        assert_eq!(
            map_key(KeyCode::KeyS, AssessmentStage::FuelPump),
            Some(Intent::Action(Action::Stop))
        );
        assert_eq!(
            map_key(KeyCode::KeyS, AssessmentStage::Illusion),
            Some(drive(DriveAction::Brake))
        );
    }

    #[test]
    fn arrows_and_wasd_agree() {
        for (arrow, letter) in [
            (KeyCode::ArrowLeft, KeyCode::KeyA),
            (KeyCode::ArrowRight, KeyCode::KeyD),
            (KeyCode::ArrowUp, KeyCode::KeyW),
            (KeyCode::ArrowDown, KeyCode::KeyS),
        ] {
            let a = map_key(arrow, AssessmentStage::Illusion);
            assert!(a.is_some());
            assert_eq!(a, map_key(letter, AssessmentStage::Illusion));
        }
        assert_eq!(map_key(KeyCode::ArrowLeft, AssessmentStage::Perception), None);
    }

    #[test]
    fn digits_pick_options() {
        assert_eq!(map_key(KeyCode::Digit3, AssessmentStage::Illusion), Some(Intent::Choose(2)));
        assert_eq!(map_key(KeyCode::Numpad1, AssessmentStage::Intake), Some(Intent::Choose(0)));
        assert_eq!(map_key(KeyCode::Escape, AssessmentStage::Complete), Some(Intent::Quit));
    }
}
