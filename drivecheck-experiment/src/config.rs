use std::fs;
use std::path::{Path, PathBuf};

use drivecheck_core::{ConfigError, CountdownSpec, DurationBounds, LaneGeometry};
use serde::{Deserialize, Serialize};

use crate::scenario::OutcomeTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PerceptionConfig {
    pub visible_ms: DurationBounds,
    pub hidden_ms: DurationBounds,
    pub geometry: LaneGeometry,
    pub countdown: CountdownSpec,
    pub trials: usize,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            visible_ms: DurationBounds::new(3000, 7000),
            hidden_ms: DurationBounds::new(2000, 5000),
            geometry: LaneGeometry::default(),
            countdown: CountdownSpec::default(),
            trials: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PumpConfig {
    pub blast_ms: DurationBounds,
    pub points_per_pump: u32,
    pub trials: usize,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            blast_ms: DurationBounds::new(1000, 10_000),
            points_per_pump: 1,
            trials: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IllusionConfig {
    pub duration_ms: u64,
    pub hazard_start_x: f64,
    pub hazard_speed_px_per_s: f64,
    pub lane_count: u8,
    /// External outcome table. The embedded one is used when absent.
    pub outcome_table: Option<PathBuf>,
}

impl Default for IllusionConfig {
    fn default() -> Self {
        Self {
            duration_ms: 2000,
            hazard_start_x: 700.0,
            hazard_speed_px_per_s: 200.0,
            lane_count: 3,
            outcome_table: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssessmentConfig {
    pub perception: PerceptionConfig,
    pub fuel_pump: PumpConfig,
    pub illusion: IllusionConfig,
    /// Fixed seed for reproducible sessions.
    pub seed: Option<u64>,
}

impl AssessmentConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|e| ConfigError::Parse {
            what: "assessment config",
            message: e.to_string(),
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.perception;
        p.visible_ms.validate("perception.visible_ms")?;
        p.hidden_ms.validate("perception.hidden_ms")?;
        if p.visible_ms.min_ms == 0 {
            return Err(ConfigError::NonPositive("perception.visible_ms.min_ms"));
        }
        if p.visible_ms.max_ms.checked_add(p.hidden_ms.max_ms).is_none() {
            return Err(ConfigError::DurationOverflow {
                visible_ms: p.visible_ms.max_ms,
                hidden_ms: p.hidden_ms.max_ms,
            });
        }
        p.geometry.validate()?;
        if p.countdown.interval_ms == 0 {
            return Err(ConfigError::NonPositive("perception.countdown.interval_ms"));
        }
        if p.trials == 0 {
            return Err(ConfigError::NonPositive("perception.trials"));
        }

        let f = &self.fuel_pump;
        f.blast_ms.validate("fuel_pump.blast_ms")?;
        if f.blast_ms.min_ms == 0 {
            return Err(ConfigError::NonPositive("fuel_pump.blast_ms.min_ms"));
        }
        if f.points_per_pump == 0 {
            return Err(ConfigError::NonPositive("fuel_pump.points_per_pump"));
        }
        if f.trials == 0 {
            return Err(ConfigError::NonPositive("fuel_pump.trials"));
        }

        let i = &self.illusion;
        if i.duration_ms == 0 {
            return Err(ConfigError::NonPositive("illusion.duration_ms"));
        }
        if i.lane_count == 0 {
            return Err(ConfigError::NonPositive("illusion.lane_count"));
        }
        Ok(())
    }

    pub fn outcome_table(&self) -> Result<OutcomeTable, ConfigError> {
        match &self.illusion.outcome_table {
            Some(path) => OutcomeTable::from_json_file(path),
            None => OutcomeTable::embedded(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let config = AssessmentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.perception.trials, 5);
        assert_eq!(config.fuel_pump.blast_ms, DurationBounds::new(1000, 10_000));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = AssessmentConfig::from_json_str(
            r#"{ "fuel_pump": { "trials": 1 }, "seed": 9 }"#,
        )
        .unwrap();
        assert_eq!(config.fuel_pump.trials, 1);
        assert_eq!(config.fuel_pump.points_per_pump, 1);
        assert_eq!(config.seed, Some(9));
        assert_eq!(config.perception, PerceptionConfig::default());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = AssessmentConfig::from_json_str(r#"{ "perception": { "speed": 3 } }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let mut config = AssessmentConfig::default();
        config.perception.hidden_ms = DurationBounds::new(5000, 2000);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidBounds {
                name: "perception.hidden_ms",
                min: 5000,
                max: 2000
            })
        );
    }

    #[test]
    fn overflowing_duration_bounds_fail_validation() {
        let mut config = AssessmentConfig::default();
        config.perception.visible_ms = DurationBounds::new(3000, u64::MAX);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DurationOverflow {
                visible_ms: u64::MAX,
                hidden_ms: 5000
            })
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = AssessmentConfig::from_json_file("/nonexistent/drivecheck.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
