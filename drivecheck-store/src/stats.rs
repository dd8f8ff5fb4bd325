use std::fmt;

use drivecheck_core::{DriveMode, DriveOutcome, PerceptionOutcome, PumpOutcome, Session};
use serde::Serialize;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerceptionStats {
    pub trials: usize,
    pub successes: usize,
    pub failures: usize,
    /// Fraction in `0.0..=1.0`; zero when there are no trials.
    pub success_rate: f64,
    pub mean_reaction_latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PumpStats {
    pub trials: usize,
    pub explosions: usize,
    pub total_points: u64,
    pub mean_points_per_session: f64,
    pub mean_pumps_per_trial: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IllusionStats {
    pub scenarios: usize,
    pub manual: usize,
    pub assist: usize,
    pub crashes: usize,
    pub near_misses: usize,
    pub safe_passes: usize,
}

/// Totals across a set of sessions, as shown on the review dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateStats {
    pub sessions: usize,
    pub completed_sessions: usize,
    pub perception: PerceptionStats,
    pub fuel_pump: PumpStats,
    pub illusion: IllusionStats,
}

impl AggregateStats {
    pub fn from_sessions(sessions: &[Session]) -> Self {
        let mut stats = Self {
            sessions: sessions.len(),
            completed_sessions: sessions.iter().filter(|s| s.is_complete()).count(),
            ..Self::default()
        };

        let mut latency_sum = 0.0;
        let mut latency_count = 0usize;
        let mut pump_sum = 0u64;

        for session in sessions {
            for r in &session.perception {
                stats.perception.trials += 1;
                match r.outcome {
                    PerceptionOutcome::Success => stats.perception.successes += 1,
                    PerceptionOutcome::Fail => stats.perception.failures += 1,
                }
                if let Some(latency) = r.reaction_latency_ms {
                    latency_sum += latency;
                    latency_count += 1;
                }
            }

            stats.fuel_pump.total_points += u64::from(session.banked_points);
            for r in &session.fuel_pump {
                stats.fuel_pump.trials += 1;
                pump_sum += u64::from(r.pumps);
                if r.outcome == PumpOutcome::Exploded {
                    stats.fuel_pump.explosions += 1;
                }
            }

            for r in &session.illusion {
                stats.illusion.scenarios += 1;
                match r.mode {
                    DriveMode::Manual => stats.illusion.manual += 1,
                    DriveMode::Assist => stats.illusion.assist += 1,
                }
                match r.outcome {
                    DriveOutcome::Crash => stats.illusion.crashes += 1,
                    DriveOutcome::NearMiss => stats.illusion.near_misses += 1,
                    DriveOutcome::SafePass => stats.illusion.safe_passes += 1,
                }
            }
        }

        if stats.perception.trials > 0 {
            stats.perception.success_rate =
                stats.perception.successes as f64 / stats.perception.trials as f64;
        }
        if latency_count > 0 {
            stats.perception.mean_reaction_latency_ms = Some(latency_sum / latency_count as f64);
        }
        if stats.sessions > 0 {
            stats.fuel_pump.mean_points_per_session =
                stats.fuel_pump.total_points as f64 / stats.sessions as f64;
        }
        if stats.fuel_pump.trials > 0 {
            stats.fuel_pump.mean_pumps_per_trial = pump_sum as f64 / stats.fuel_pump.trials as f64;
        }

        stats
    }
}

impl fmt::Display for AggregateStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "sessions: {} ({} complete)",
            self.sessions, self.completed_sessions
        )?;
        let latency = self
            .perception
            .mean_reaction_latency_ms
            .map(|ms| format!("{ms:.0} ms"))
            .unwrap_or_else(|| "n/a".to_string());
        writeln!(
            f,
            "perception: {} trials, {} success, {} fail ({:.1}%), mean latency {latency}",
            self.perception.trials,
            self.perception.successes,
            self.perception.failures,
            self.perception.success_rate * 100.0,
        )?;
        writeln!(
            f,
            "fuel pump: {} trials, {} explosions, {} points ({:.1}/session, {:.1} pumps/trial)",
            self.fuel_pump.trials,
            self.fuel_pump.explosions,
            self.fuel_pump.total_points,
            self.fuel_pump.mean_points_per_session,
            self.fuel_pump.mean_pumps_per_trial,
        )?;
        write!(
            f,
            "illusion: {} scenarios ({} manual / {} assist): {} crash, {} near-miss, {} safe pass",
            self.illusion.scenarios,
            self.illusion.manual,
            self.illusion.assist,
            self.illusion.crashes,
            self.illusion.near_misses,
            self.illusion.safe_passes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivecheck_core::{
        AssessmentStage, ClientInfo, Participant, PerceptionResult, PerceptionTermination,
        PumpResult, TrialResult,
    };

    fn perception(outcome: PerceptionOutcome, latency: Option<f64>) -> TrialResult {
        TrialResult::Perception(PerceptionResult {
            outcome,
            termination: PerceptionTermination::Stopped,
            visible_ms: 3000,
            hidden_ms: 3000,
            speed_px_per_s: 100.0,
            started_at_ms: 0.0,
            hide_at_ms: Some(3000.0),
            stop_at_ms: Some(4000.0),
            collision_at_ms: None,
            position_at_stop: 440.0,
            distance_to_obstacle: 200.0,
            reaction_latency_ms: latency,
        })
    }

    fn pump(outcome: PumpOutcome, pumps: u32) -> TrialResult {
        let points = if outcome == PumpOutcome::Stopped { pumps } else { 0 };
        TrialResult::FuelPump(PumpResult {
            outcome,
            pumps,
            points,
            elapsed_ms: 1000.0,
            blast_ms: 4000,
            started_at_ms: Some(0.0),
            ended_at_ms: 1000.0,
        })
    }

    #[test]
    fn empty_input_has_no_rates() {
        let stats = AggregateStats::from_sessions(&[]);
        assert_eq!(stats, AggregateStats::default());
        assert_eq!(stats.perception.mean_reaction_latency_ms, None);
    }

    #[test]
    fn totals_span_sessions() {
        let mut a = Session::new(Participant::default(), ClientInfo::capture());
        a.append(perception(PerceptionOutcome::Success, Some(300.0)));
        a.append(perception(PerceptionOutcome::Fail, None));
        a.append(pump(PumpOutcome::Stopped, 6));
        a.mark_stage_complete(AssessmentStage::Illusion);

        let mut b = Session::new(Participant::default(), ClientInfo::capture());
        b.append(perception(PerceptionOutcome::Success, Some(500.0)));
        b.append(perception(PerceptionOutcome::Success, None));
        b.append(pump(PumpOutcome::Exploded, 10));
        b.append(pump(PumpOutcome::Stopped, 2));

        let stats = AggregateStats::from_sessions(&[a, b]);
        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.completed_sessions, 1);
        assert_eq!(stats.perception.trials, 4);
        assert_eq!(stats.perception.successes, 3);
        assert_eq!(stats.perception.success_rate, 0.75);
        assert_eq!(stats.perception.mean_reaction_latency_ms, Some(400.0));
        assert_eq!(stats.fuel_pump.trials, 3);
        assert_eq!(stats.fuel_pump.explosions, 1);
        assert_eq!(stats.fuel_pump.total_points, 8);
        assert_eq!(stats.fuel_pump.mean_points_per_session, 4.0);
        assert_eq!(stats.fuel_pump.mean_pumps_per_trial, 6.0);

        let text = stats.to_string();
        assert!(text.contains("4 trials, 3 success, 1 fail (75.0%)"));
    }
}
