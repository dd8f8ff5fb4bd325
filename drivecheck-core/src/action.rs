use serde::{Deserialize, Serialize};

/// Input delivered by the presentation layer. The engine never sees keys or buttons.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Stop,
    Pump,
    Drive(DriveAction),
}

impl Action {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Pump => "pump",
            Self::Drive(drive) => drive.as_str(),
        }
    }
}

impl From<DriveAction> for Action {
    fn from(action: DriveAction) -> Self {
        Self::Drive(action)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveAction {
    Left,
    Right,
    Accelerate,
    Brake,
}

impl DriveAction {
    pub const ALL: [DriveAction; 4] = [
        DriveAction::Left,
        DriveAction::Right,
        DriveAction::Accelerate,
        DriveAction::Brake,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Accelerate => "accelerate",
            Self::Brake => "brake",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveMode {
    Assist,
    Manual,
}

impl DriveMode {
    pub const ALL: [DriveMode; 2] = [DriveMode::Assist, DriveMode::Manual];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assist => "assist",
            Self::Manual => "manual",
        }
    }
}
