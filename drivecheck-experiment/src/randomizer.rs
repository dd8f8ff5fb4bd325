use drivecheck_core::{ConfigError, DurationBounds, PerceptionParams, PumpParams};
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{PerceptionConfig, PumpConfig};

/// Draws per-trial durations from an injected generator.
#[derive(Debug, Clone)]
pub struct Randomizer<R: Rng = StdRng> {
    rng: R,
}

impl Randomizer<StdRng> {
    pub fn from_os_rng() -> Self {
        Self::new(StdRng::from_os_rng())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> Randomizer<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Uniform over the inclusive range. Misconfigured bounds are an error,
    /// never clamped.
    pub fn draw(&mut self, name: &'static str, bounds: DurationBounds) -> Result<u64, ConfigError> {
        bounds.validate(name)?;
        let value = self.rng.random_range(bounds.min_ms..=bounds.max_ms);
        debug!("drew {name} = {value} ms from [{}, {}]", bounds.min_ms, bounds.max_ms);
        Ok(value)
    }

    pub fn perception(&mut self, config: &PerceptionConfig) -> Result<PerceptionParams, ConfigError> {
        let visible_ms = self.draw("visible_ms", config.visible_ms)?;
        let hidden_ms = self.draw("hidden_ms", config.hidden_ms)?;
        PerceptionParams::new(visible_ms, hidden_ms, config.geometry, config.countdown)
    }

    pub fn pump(&mut self, config: &PumpConfig) -> Result<PumpParams, ConfigError> {
        let blast_ms = self.draw("blast_ms", config.blast_ms)?;
        PumpParams::new(blast_ms, config.points_per_pump)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_draws() {
        let bounds = DurationBounds::new(3000, 7000);
        let mut a = Randomizer::seeded(42);
        let mut b = Randomizer::seeded(42);
        for _ in 0..20 {
            let x = a.draw("visible_ms", bounds).unwrap();
            assert_eq!(x, b.draw("visible_ms", bounds).unwrap());
            assert!((3000..=7000).contains(&x));
        }
    }

    #[test]
    fn degenerate_range_is_fixed() {
        let mut rng = Randomizer::seeded(1);
        assert_eq!(rng.draw("hidden_ms", DurationBounds::new(2500, 2500)), Ok(2500));
    }

    #[test]
    fn inverted_bounds_fail_fast() {
        let mut rng = Randomizer::seeded(1);
        let err = rng.draw("blast_ms", DurationBounds::new(10, 5)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBounds { name: "blast_ms", .. }));
    }

    #[test]
    fn perception_params_get_fresh_speed() {
        let mut rng = Randomizer::seeded(7);
        let config = PerceptionConfig::default();
        let first = rng.perception(&config).unwrap();
        let second = rng.perception(&config).unwrap();
        for params in [&first, &second] {
            let expected = params.geometry.travel_distance() / params.total_ms() as f64 * 1000.0;
            assert_eq!(params.speed_px_per_s(), expected);
        }
    }
}
