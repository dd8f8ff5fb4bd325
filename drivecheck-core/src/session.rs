use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::phase::AssessmentStage;
use crate::trial::{AttributionType, IllusionResult, PerceptionResult, PumpResult, TrialResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Candidate identity. Opaque to the engine.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    pub application_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub platform: String,
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewport: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_rate_hz: Option<f64>,
}

impl ClientInfo {
    pub fn capture() -> Self {
        Self {
            platform: format!("{}-{}", std::env::consts::OS, std::env::consts::ARCH),
            device_type: "desktop".to_string(),
            viewport: None,
            language: std::env::var("LANG").ok().filter(|lang| !lang.is_empty()),
            refresh_rate_hz: None,
        }
    }

    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Some(format!("{width}x{height}"));
        self
    }

    pub fn with_refresh_rate(mut self, hz: Option<f64>) -> Self {
        self.refresh_rate_hz = hz;
        self
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::capture()
    }
}

/// Answer to the question asked after a driving scenario.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributionAnswer {
    pub scenario_id: u32,
    pub attribution_type: AttributionType,
    pub question: String,
    pub choice: String,
}

/// Everything recorded for one candidate. Results are only ever appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub participant: Participant,
    pub client: ClientInfo,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub perception: Vec<PerceptionResult>,
    #[serde(default)]
    pub fuel_pump: Vec<PumpResult>,
    #[serde(default)]
    pub banked_points: u32,
    #[serde(default)]
    pub illusion: Vec<IllusionResult>,
    #[serde(default)]
    pub attributions: Vec<AttributionAnswer>,
    #[serde(default)]
    pub completed_stages: Vec<AssessmentStage>,
}

impl Session {
    pub fn new(participant: Participant, client: ClientInfo) -> Self {
        let now = Utc::now();
        Self {
            id: SessionId::generate(),
            participant,
            client,
            created_at: now,
            updated_at: now,
            perception: Vec::new(),
            fuel_pump: Vec::new(),
            banked_points: 0,
            illusion: Vec::new(),
            attributions: Vec::new(),
            completed_stages: Vec::new(),
        }
    }

    /// Appends in trial order. Fuel pump points are banked on the way in.
    pub fn append(&mut self, result: TrialResult) {
        match result {
            TrialResult::Perception(r) => self.perception.push(r),
            TrialResult::FuelPump(r) => {
                self.banked_points = self.banked_points.saturating_add(r.points);
                self.fuel_pump.push(r);
            }
            TrialResult::Illusion(r) => self.illusion.push(r),
        }
        self.touch();
    }

    pub fn record_attribution(&mut self, answer: AttributionAnswer) {
        self.attributions.push(answer);
        self.touch();
    }

    pub fn mark_stage_complete(&mut self, stage: AssessmentStage) {
        if !self.completed_stages.contains(&stage) {
            self.completed_stages.push(stage);
            self.touch();
        }
    }

    pub fn trial_count(&self) -> usize {
        self.perception.len() + self.fuel_pump.len() + self.illusion.len()
    }

    pub fn is_complete(&self) -> bool {
        self.completed_stages.contains(&AssessmentStage::Illusion)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trial::{PumpOutcome, PumpResult};

    fn pump(outcome: PumpOutcome, pumps: u32, points: u32) -> TrialResult {
        TrialResult::FuelPump(PumpResult {
            outcome,
            pumps,
            points,
            elapsed_ms: 900.0,
            blast_ms: 4000,
            started_at_ms: Some(0.0),
            ended_at_ms: 900.0,
        })
    }

    #[test]
    fn pump_points_bank_in_order() {
        let mut session = Session::new(Participant::default(), ClientInfo::capture());
        session.append(pump(PumpOutcome::Stopped, 7, 7));
        session.append(pump(PumpOutcome::Exploded, 12, 0));
        session.append(pump(PumpOutcome::Stopped, 3, 3));

        assert_eq!(session.banked_points, 10);
        let pumps: Vec<u32> = session.fuel_pump.iter().map(|r| r.pumps).collect();
        assert_eq!(pumps, vec![7, 12, 3]);
        assert_eq!(session.trial_count(), 3);
    }

    #[test]
    fn session_roundtrips_through_json() {
        let mut session = Session::new(
            Participant {
                name: "Ada".into(),
                application_number: "APP-1".into(),
            },
            ClientInfo::capture().with_viewport(1280, 720),
        );
        session.mark_stage_complete(AssessmentStage::Perception);
        session.mark_stage_complete(AssessmentStage::Perception);

        let json = serde_json::to_string(&session).unwrap();
        let back: Session = serde_json::from_str(&json).unwrap();
        assert_eq!(back, session);
        assert_eq!(back.completed_stages, vec![AssessmentStage::Perception]);
        assert_eq!(back.client.viewport.as_deref(), Some("1280x720"));
    }
}
