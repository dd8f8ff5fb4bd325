//! Driving scenarios and their static outcome table.
//!
//! The table maps `(scenario, mode, action or none)` to an outcome. It is
//! checked for completeness when loaded, so a lookup on a loaded table for a
//! known scenario cannot miss.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;

use drivecheck_core::{AttributionType, ConfigError, DriveAction, DriveMode, DriveOutcome};
use serde::Deserialize;

const EMBEDDED: &str = include_str!("../data/scenarios.json");

/// Key used in the table for "no input before the scenario ended".
pub const NO_ACTION: &str = "none";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutcomeEntry {
    pub outcome: DriveOutcome,
    pub description: String,
    /// Who the system holds responsible.
    pub attribution: String,
}

/// One entry per action slot: none, left, right, accelerate, brake.
#[derive(Debug, Clone, PartialEq)]
struct ModeOutcomes([OutcomeEntry; 5]);

fn slot(action: Option<DriveAction>) -> usize {
    match action {
        None => 0,
        Some(DriveAction::Left) => 1,
        Some(DriveAction::Right) => 2,
        Some(DriveAction::Accelerate) => 3,
        Some(DriveAction::Brake) => 4,
    }
}

fn action_key(action: Option<DriveAction>) -> &'static str {
    action.map_or(NO_ACTION, |a| a.as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub attribution_type: AttributionType,
    pub attribution_question: String,
    pub attribution_options: Vec<String>,
    assist: ModeOutcomes,
    manual: ModeOutcomes,
}

impl Scenario {
    pub fn outcome(&self, mode: DriveMode, action: Option<DriveAction>) -> &OutcomeEntry {
        let outcomes = match mode {
            DriveMode::Assist => &self.assist,
            DriveMode::Manual => &self.manual,
        };
        &outcomes.0[slot(action)]
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTable {
    scenarios: Vec<RawScenario>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawScenario {
    id: u32,
    title: String,
    description: String,
    attribution_type: AttributionType,
    attribution_question: String,
    attribution_options: Vec<String>,
    outcomes: BTreeMap<String, BTreeMap<String, OutcomeEntry>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutcomeTable {
    scenarios: Vec<Scenario>,
}

impl OutcomeTable {
    pub fn embedded() -> Result<Self, ConfigError> {
        Self::from_json_str(EMBEDDED)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let raw: RawTable = serde_json::from_str(json).map_err(|e| parse_error(e.to_string()))?;
        if raw.scenarios.is_empty() {
            return Err(parse_error("no scenarios defined".into()));
        }

        let mut seen = HashSet::new();
        let mut scenarios = Vec::with_capacity(raw.scenarios.len());
        for scenario in raw.scenarios {
            if !seen.insert(scenario.id) {
                return Err(parse_error(format!("scenario {} defined twice", scenario.id)));
            }
            scenarios.push(build_scenario(scenario)?);
        }
        Ok(Self { scenarios })
    }

    /// Scenarios in presentation order.
    pub fn scenarios(&self) -> &[Scenario] {
        &self.scenarios
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    pub fn scenario(&self, id: u32) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }

    pub fn lookup(
        &self,
        id: u32,
        mode: DriveMode,
        action: Option<DriveAction>,
    ) -> Result<&OutcomeEntry, ConfigError> {
        self.scenario(id)
            .map(|s| s.outcome(mode, action))
            .ok_or(ConfigError::UnknownScenario(id))
    }
}

fn parse_error(message: String) -> ConfigError {
    ConfigError::Parse {
        what: "outcome table",
        message,
    }
}

fn build_scenario(raw: RawScenario) -> Result<Scenario, ConfigError> {
    if raw.attribution_options.is_empty() {
        return Err(parse_error(format!(
            "scenario {} has no attribution options",
            raw.id
        )));
    }
    for key in raw.outcomes.keys() {
        if !DriveMode::ALL.iter().any(|m| m.as_str() == key) {
            return Err(parse_error(format!("scenario {}: unknown mode {key:?}", raw.id)));
        }
    }

    let mut outcomes = raw.outcomes;
    let assist = build_mode(raw.id, DriveMode::Assist, &mut outcomes)?;
    let manual = build_mode(raw.id, DriveMode::Manual, &mut outcomes)?;

    Ok(Scenario {
        id: raw.id,
        title: raw.title,
        description: raw.description,
        attribution_type: raw.attribution_type,
        attribution_question: raw.attribution_question,
        attribution_options: raw.attribution_options,
        assist,
        manual,
    })
}

fn build_mode(
    scenario: u32,
    mode: DriveMode,
    outcomes: &mut BTreeMap<String, BTreeMap<String, OutcomeEntry>>,
) -> Result<ModeOutcomes, ConfigError> {
    let missing = |action: Option<DriveAction>| ConfigError::MissingOutcome {
        scenario,
        mode: mode.as_str(),
        action: action_key(action),
    };

    let mut by_action = outcomes
        .remove(mode.as_str())
        .ok_or_else(|| missing(None))?;

    let mut take = |action: Option<DriveAction>| {
        by_action
            .remove(action_key(action))
            .ok_or_else(|| missing(action))
    };
    let entries = [
        take(None)?,
        take(Some(DriveAction::Left))?,
        take(Some(DriveAction::Right))?,
        take(Some(DriveAction::Accelerate))?,
        take(Some(DriveAction::Brake))?,
    ];

    if let Some(extra) = by_action.keys().next() {
        return Err(parse_error(format!(
            "scenario {scenario} {}: unknown action {extra:?}",
            mode.as_str()
        )));
    }
    Ok(ModeOutcomes(entries))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_table_is_complete() {
        let table = OutcomeTable::embedded().unwrap();
        assert_eq!(table.len(), 5);
        for scenario in table.scenarios() {
            assert_eq!(scenario.attribution_options.len(), 3);
            for mode in DriveMode::ALL {
                let actions = std::iter::once(None).chain(DriveAction::ALL.map(Some));
                for action in actions {
                    let entry = scenario.outcome(mode, action);
                    assert!(!entry.description.is_empty());
                }
            }
        }
    }

    #[test]
    fn no_input_in_manual_highway_merge_crashes() {
        let table = OutcomeTable::embedded().unwrap();
        let entry = table.lookup(1, DriveMode::Manual, None).unwrap();
        assert_eq!(entry.outcome, DriveOutcome::Crash);
        let entry = table
            .lookup(1, DriveMode::Assist, Some(DriveAction::Brake))
            .unwrap();
        assert_eq!(entry.outcome, DriveOutcome::Crash);
        assert_eq!(entry.attribution, "System Conflict");
    }

    #[test]
    fn unknown_scenario_is_reported() {
        let table = OutcomeTable::embedded().unwrap();
        assert_eq!(
            table.lookup(99, DriveMode::Assist, None),
            Err(ConfigError::UnknownScenario(99))
        );
    }

    #[test]
    fn missing_entry_fails_at_load() {
        let mut value: serde_json::Value = serde_json::from_str(EMBEDDED).unwrap();
        value["scenarios"][2]["outcomes"]["assist"]
            .as_object_mut()
            .unwrap()
            .remove("brake");
        let err = OutcomeTable::from_json_str(&value.to_string()).unwrap_err();
        assert_eq!(
            err,
            ConfigError::MissingOutcome {
                scenario: 3,
                mode: "assist",
                action: "brake"
            }
        );
    }

    #[test]
    fn unknown_action_key_fails_at_load() {
        let mut value: serde_json::Value = serde_json::from_str(EMBEDDED).unwrap();
        value["scenarios"][0]["outcomes"]["manual"]["honk"] =
            value["scenarios"][0]["outcomes"]["manual"]["brake"].clone();
        let err = OutcomeTable::from_json_str(&value.to_string()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
