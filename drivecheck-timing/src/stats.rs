use std::collections::VecDeque;

/// Summary of recorded inter-frame intervals, in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStatistics {
    pub samples: usize,
    pub average_frame_ms: f64,
    pub jitter_ms: f64,
    pub min_frame_ms: f64,
    pub max_frame_ms: f64,
    pub effective_fps: f64,
}

impl FrameStatistics {
    pub fn from_intervals(intervals: &VecDeque<f64>) -> Self {
        if intervals.is_empty() {
            return Self::default();
        }
        let n = intervals.len() as f64;
        let avg = intervals.iter().sum::<f64>() / n;
        let var = intervals.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / n;
        let min = intervals.iter().copied().fold(f64::INFINITY, f64::min);
        let max = intervals.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Self {
            samples: intervals.len(),
            average_frame_ms: avg,
            jitter_ms: var.sqrt(),
            min_frame_ms: min,
            max_frame_ms: max,
            effective_fps: if avg > 0.0 { 1000.0 / avg } else { 0.0 },
        }
    }

    /// Effective refresh rate, if enough frames were seen to trust it.
    pub fn refresh_rate_hz(&self) -> Option<f64> {
        (self.samples >= 30 && self.effective_fps > 0.0).then_some(self.effective_fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarises_intervals() {
        let intervals: VecDeque<f64> = [16.0, 17.0, 18.0].into_iter().collect();
        let stats = FrameStatistics::from_intervals(&intervals);
        assert_eq!(stats.samples, 3);
        assert_eq!(stats.average_frame_ms, 17.0);
        assert_eq!(stats.min_frame_ms, 16.0);
        assert_eq!(stats.max_frame_ms, 18.0);
        assert!((stats.jitter_ms - (2.0f64 / 3.0).sqrt()).abs() < 1e-12);
        assert!((stats.effective_fps - 1000.0 / 17.0).abs() < 1e-9);
        assert_eq!(stats.refresh_rate_hz(), None);
    }

    #[test]
    fn empty_is_zeroed() {
        assert_eq!(
            FrameStatistics::from_intervals(&VecDeque::new()),
            FrameStatistics::default()
        );
    }
}
