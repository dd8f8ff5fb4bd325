/// Fixed-interval 3-2-1 style countdown driven by frame samples.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CountdownTick {
    /// Digit to display.
    Pending(u32),
    /// Reported on exactly one tick, the first at or past the deadline.
    Elapsed,
    /// Not started, or already elapsed.
    Done,
}

#[derive(Debug, Clone)]
pub struct Countdown {
    from: u32,
    interval_ms: f64,
    started_at: Option<f64>,
    fired: bool,
}

impl Countdown {
    pub fn new(from: u32, interval_ms: u64) -> Self {
        Self {
            from,
            interval_ms: interval_ms as f64,
            started_at: None,
            fired: false,
        }
    }

    pub fn start(&mut self, now: f64) {
        self.started_at = Some(now);
        self.fired = false;
    }

    pub fn deadline(&self) -> Option<f64> {
        self.started_at
            .map(|start| start + self.from as f64 * self.interval_ms)
    }

    pub fn has_elapsed(&self) -> bool {
        self.fired
    }

    /// Digit that would show at `now`, without consuming the elapse transition.
    pub fn digit_at(&self, now: f64) -> Option<u32> {
        let start = self.started_at?;
        if self.fired || self.interval_ms <= 0.0 {
            return None;
        }
        let passed = ((now - start).max(0.0) / self.interval_ms).floor() as u32;
        self.from.checked_sub(passed).filter(|digit| *digit > 0)
    }

    pub fn tick(&mut self, now: f64) -> CountdownTick {
        let Some(deadline) = self.deadline() else {
            return CountdownTick::Done;
        };
        if self.fired {
            return CountdownTick::Done;
        }
        if now >= deadline {
            self.fired = true;
            return CountdownTick::Elapsed;
        }
        match self.digit_at(now) {
            Some(digit) => CountdownTick::Pending(digit),
            None => CountdownTick::Pending(1),
        }
    }
}
