//! Per-trial parameters. Drawn once at trial start and immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::action::DriveMode;
use crate::error::ConfigError;

/// Inclusive millisecond range a randomized duration is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DurationBounds {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DurationBounds {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }

    pub fn validate(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min_ms > self.max_ms {
            return Err(ConfigError::InvalidBounds {
                name,
                min: self.min_ms,
                max: self.max_ms,
            });
        }
        if self.max_ms == 0 {
            return Err(ConfigError::NonPositive(name));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountdownSpec {
    pub from: u32,
    pub interval_ms: u64,
}

impl Default for CountdownSpec {
    fn default() -> Self {
        Self {
            from: 3,
            interval_ms: 1000,
        }
    }
}

/// Fixed lane layout of the perception task, in scene pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LaneGeometry {
    pub start_x: f64,
    pub obstacle_x: f64,
    pub car_width: f64,
    pub car_height: f64,
    pub lane_width: f64,
    pub lane_height: f64,
}

impl Default for LaneGeometry {
    fn default() -> Self {
        Self {
            start_x: 50.0,
            obstacle_x: 700.0,
            car_width: 60.0,
            car_height: 30.0,
            lane_width: 800.0,
            lane_height: 150.0,
        }
    }
}

impl LaneGeometry {
    /// Distance the car's front covers before touching the obstacle.
    pub fn travel_distance(&self) -> f64 {
        self.obstacle_x - self.start_x - self.car_width
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let travel = self.travel_distance();
        if !(travel.is_finite() && travel > 0.0) {
            return Err(ConfigError::Geometry(format!(
                "obstacle at {} with car of width {} starting at {}",
                self.obstacle_x, self.car_width, self.start_x
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerceptionParams {
    pub visible_ms: u64,
    pub hidden_ms: u64,
    pub geometry: LaneGeometry,
    pub countdown: CountdownSpec,
    speed_px_per_s: f64,
}

impl PerceptionParams {
    /// Speed is derived here, from this trial's durations, and never carried
    /// over from an earlier trial.
    pub fn new(
        visible_ms: u64,
        hidden_ms: u64,
        geometry: LaneGeometry,
        countdown: CountdownSpec,
    ) -> Result<Self, ConfigError> {
        if visible_ms == 0 {
            return Err(ConfigError::NonPositive("visible_ms"));
        }
        geometry.validate()?;
        let total = visible_ms
            .checked_add(hidden_ms)
            .ok_or(ConfigError::DurationOverflow {
                visible_ms,
                hidden_ms,
            })?;
        let speed_px_per_s = geometry.travel_distance() / total as f64 * 1000.0;
        Ok(Self {
            visible_ms,
            hidden_ms,
            geometry,
            countdown,
            speed_px_per_s,
        })
    }

    pub fn speed_px_per_s(&self) -> f64 {
        self.speed_px_per_s
    }

    pub fn total_ms(&self) -> u64 {
        self.visible_ms.saturating_add(self.hidden_ms)
    }

    /// Car position as a pure function of elapsed time since the trial started.
    pub fn position_at(&self, elapsed_ms: f64) -> f64 {
        self.geometry.start_x + self.speed_px_per_s * elapsed_ms.max(0.0) / 1000.0
    }

    pub fn distance_to_obstacle(&self, position: f64) -> f64 {
        self.geometry.obstacle_x - (position + self.geometry.car_width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpParams {
    pub blast_ms: u64,
    pub points_per_pump: u32,
}

impl PumpParams {
    pub fn new(blast_ms: u64, points_per_pump: u32) -> Result<Self, ConfigError> {
        if blast_ms == 0 {
            return Err(ConfigError::NonPositive("blast_ms"));
        }
        Ok(Self {
            blast_ms,
            points_per_pump,
        })
    }

    /// Fuel gauge in percent, saturating at the blast threshold.
    pub fn level_at(&self, elapsed_ms: f64) -> f64 {
        (elapsed_ms.max(0.0) / self.blast_ms as f64 * 100.0).min(100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IllusionParams {
    pub scenario_id: u32,
    pub mode: DriveMode,
    pub duration_ms: u64,
    pub hazard_start_x: f64,
    pub hazard_speed_px_per_s: f64,
    pub lane_count: u8,
}

impl IllusionParams {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.duration_ms == 0 {
            return Err(ConfigError::NonPositive("duration_ms"));
        }
        if self.lane_count == 0 {
            return Err(ConfigError::NonPositive("lane_count"));
        }
        Ok(())
    }

    pub fn hazard_position_at(&self, elapsed_ms: f64) -> f64 {
        self.hazard_start_x - self.hazard_speed_px_per_s * elapsed_ms.max(0.0) / 1000.0
    }

    pub fn centre_lane(&self) -> u8 {
        self.lane_count / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn speed_is_travel_over_total_duration() {
        let params =
            PerceptionParams::new(5000, 3500, LaneGeometry::default(), CountdownSpec::default())
                .unwrap();
        // (700 - 50 - 60) px over 8.5 s
        let expected = 590.0 / 8500.0 * 1000.0;
        assert!((params.speed_px_per_s() - expected).abs() < 1e-9);
        assert!((params.speed_px_per_s() - 69.4118).abs() < 1e-3);
    }

    #[test]
    fn car_front_meets_obstacle_at_total_duration() {
        let params =
            PerceptionParams::new(4000, 2000, LaneGeometry::default(), CountdownSpec::default())
                .unwrap();
        let at_end = params.position_at(params.total_ms() as f64);
        assert!(params.distance_to_obstacle(at_end).abs() < 1e-9);
        assert_eq!(params.position_at(-10.0), 50.0);
    }

    #[test]
    fn overflowing_durations_are_rejected() {
        let err = PerceptionParams::new(
            u64::MAX,
            1,
            LaneGeometry::default(),
            CountdownSpec::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DurationOverflow {
                visible_ms: u64::MAX,
                hidden_ms: 1
            }
        );
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let err = DurationBounds::new(7000, 3000).validate("visible_ms").unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBounds {
                name: "visible_ms",
                min: 7000,
                max: 3000
            }
        );
        assert!(DurationBounds::new(3000, 3000).validate("visible_ms").is_ok());
    }

    #[test]
    fn cramped_geometry_is_rejected() {
        let geometry = LaneGeometry {
            obstacle_x: 100.0,
            ..LaneGeometry::default()
        };
        assert!(matches!(geometry.validate(), Err(ConfigError::Geometry(_))));
    }

    #[test]
    fn fuel_level_saturates() {
        let params = PumpParams::new(2000, 1).unwrap();
        assert_eq!(params.level_at(1000.0), 50.0);
        assert_eq!(params.level_at(5000.0), 100.0);
    }
}
