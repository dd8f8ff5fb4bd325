//! Tabular and JSON exports for review tooling.

use std::fmt;
use std::str::FromStr;

use chrono::SecondsFormat;
use drivecheck_core::{DriveMode, DriveOutcome, PerceptionOutcome, PumpOutcome, Session};

use crate::StoreResult;

const SUMMARY_HEADER: [&str; 17] = [
    "Session ID",
    "Name",
    "App Number",
    "Timestamp",
    "Perception Trials",
    "Perception Success",
    "Perception Fails",
    "Avg Reaction Time",
    "Fuel Pump Points",
    "Fuel Pump Trials",
    "Explosions",
    "Illusion Scenarios",
    "Manual Mode",
    "Assist Mode",
    "Crashes",
    "Near-Miss",
    "Safe Pass",
];

const ATTEMPTS_HEADER: [&str; 15] = [
    "Session ID",
    "Trial",
    "Created At",
    "Visible Duration (ms)",
    "Hidden Duration (ms)",
    "Speed (px/s)",
    "Hide Time",
    "Stop Time",
    "Collision Time",
    "Position at Stop",
    "Distance to Obstacle",
    "Reaction Latency (ms)",
    "Outcome",
    "Platform",
    "Viewport",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// One row per session.
    Summary,
    /// One row per perception trial.
    Attempts,
    Json,
}

impl ExportFormat {
    pub fn render(&self, sessions: &[Session]) -> StoreResult<String> {
        match self {
            Self::Summary => Ok(summary_csv(sessions)),
            Self::Attempts => Ok(attempts_csv(sessions)),
            Self::Json => sessions_json(sessions),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Summary | Self::Attempts => "csv",
            Self::Json => "json",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "summary" => Ok(Self::Summary),
            "attempts" => Ok(Self::Attempts),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown export format: {other}")),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Summary => "summary",
            Self::Attempts => "attempts",
            Self::Json => "json",
        })
    }
}

pub fn summary_csv(sessions: &[Session]) -> String {
    let rows = sessions.iter().map(|session| {
        let perception_success = session
            .perception
            .iter()
            .filter(|r| r.outcome == PerceptionOutcome::Success)
            .count();
        let latencies: Vec<f64> = session
            .perception
            .iter()
            .filter_map(|r| r.reaction_latency_ms)
            .collect();
        let explosions = session
            .fuel_pump
            .iter()
            .filter(|r| r.outcome == PumpOutcome::Exploded)
            .count();
        let mode_count = |mode: DriveMode| session.illusion.iter().filter(|r| r.mode == mode).count();
        let outcome_count =
            |outcome: DriveOutcome| session.illusion.iter().filter(|r| r.outcome == outcome).count();

        vec![
            session.id.to_string(),
            session.participant.name.clone(),
            session.participant.application_number.clone(),
            session
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            session.perception.len().to_string(),
            perception_success.to_string(),
            (session.perception.len() - perception_success).to_string(),
            mean(&latencies).map(format_ms).unwrap_or_default(),
            session.banked_points.to_string(),
            session.fuel_pump.len().to_string(),
            explosions.to_string(),
            session.illusion.len().to_string(),
            mode_count(DriveMode::Manual).to_string(),
            mode_count(DriveMode::Assist).to_string(),
            outcome_count(DriveOutcome::Crash).to_string(),
            outcome_count(DriveOutcome::NearMiss).to_string(),
            outcome_count(DriveOutcome::SafePass).to_string(),
        ]
    });
    build_csv(&SUMMARY_HEADER, rows)
}

pub fn attempts_csv(sessions: &[Session]) -> String {
    let rows = sessions.iter().flat_map(|session| {
        session.perception.iter().enumerate().map(move |(i, r)| {
            vec![
                session.id.to_string(),
                (i + 1).to_string(),
                session
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
                r.visible_ms.to_string(),
                r.hidden_ms.to_string(),
                format!("{:.3}", r.speed_px_per_s),
                optional_ms(r.hide_at_ms),
                optional_ms(r.stop_at_ms),
                optional_ms(r.collision_at_ms),
                format!("{:.1}", r.position_at_stop),
                format!("{:.1}", r.distance_to_obstacle),
                optional_ms(r.reaction_latency_ms),
                match r.outcome {
                    PerceptionOutcome::Success => "success".to_string(),
                    PerceptionOutcome::Fail => "fail".to_string(),
                },
                session.client.platform.clone(),
                session.client.viewport.clone().unwrap_or_default(),
            ]
        })
    });
    build_csv(&ATTEMPTS_HEADER, rows)
}

pub fn sessions_json(sessions: &[Session]) -> StoreResult<String> {
    Ok(serde_json::to_string_pretty(sessions)?)
}

fn build_csv(header: &[&str], rows: impl Iterator<Item = Vec<String>>) -> String {
    let mut lines = vec![header.join(",")];
    lines.extend(rows.map(|row| {
        row.iter()
            .map(|value| escape_csv(value))
            .collect::<Vec<_>>()
            .join(",")
    }));
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

fn escape_csv(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn format_ms(ms: f64) -> String {
    format!("{ms:.0}")
}

fn optional_ms(ms: Option<f64>) -> String {
    ms.map(format_ms).unwrap_or_default()
}
