use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic millisecond time source.
pub trait Clock: Clone + Send + Sync {
    /// Milliseconds since the clock's origin. Never decreases.
    fn now(&self) -> f64;

    fn elapsed(&self, since: f64) -> f64 {
        (self.now() - since).max(0.0)
    }

    fn sleep(&self, d: Duration);
}

/// Wall-clock independent time backed by `Instant`.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }

    fn sleep(&self, d: Duration) {
        precise_sleep(d)
    }
}

/// Settable clock shared between a test and the code under test. Cloning
/// shares the same underlying time. `sleep` advances time instead of blocking.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start_ms.max(0.0).to_bits())),
        }
    }

    /// Moves the clock to `ms`. Earlier values are ignored so time never runs backwards.
    pub fn set(&self, ms: f64) {
        let _ = self
            .bits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (ms > f64::from_bits(current)).then(|| ms.to_bits())
            });
    }

    pub fn advance(&self, ms: f64) {
        if ms > 0.0 {
            self.set(self.now() + ms);
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }

    fn sleep(&self, d: Duration) {
        self.advance(d.as_secs_f64() * 1000.0);
    }
}

pub fn precise_sleep(duration: Duration) {
    if duration.is_zero() {
        return;
    }
    #[cfg(target_os = "linux")]
    linux_sleep(duration);
    #[cfg(not(target_os = "linux"))]
    std::thread::sleep(duration);
}

#[cfg(target_os = "linux")]
fn linux_sleep(duration: Duration) {
    use libc::{CLOCK_MONOTONIC, EINTR, clock_nanosleep, timespec};

    let mut req = timespec {
        tv_sec: duration.as_secs() as libc::time_t,
        tv_nsec: duration.subsec_nanos() as libc::c_long,
    };
    let mut rem = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };

    // Resume with the remainder when a signal interrupts the sleep.
    loop {
        let rc = unsafe { clock_nanosleep(CLOCK_MONOTONIC, 0, &req, &mut rem) };
        if rc != EINTR {
            break;
        }
        req = rem;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_never_runs_backwards() {
        let clock = ManualClock::new(100.0);
        clock.set(250.0);
        clock.set(200.0);
        assert_eq!(clock.now(), 250.0);

        let shared = clock.clone();
        shared.advance(50.0);
        assert_eq!(clock.now(), 300.0);
        assert_eq!(clock.elapsed(280.0), 20.0);
        assert_eq!(clock.elapsed(400.0), 0.0);
    }

    #[test]
    fn manual_sleep_advances_time() {
        let clock = ManualClock::new(0.0);
        clock.sleep(Duration::from_micros(16_667));
        assert!((clock.now() - 16.667).abs() < 1e-9);
    }

    #[test]
    fn monotonic_clock_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now();
        clock.sleep(Duration::from_millis(2));
        let b = clock.now();
        assert!(b >= a + 1.0);
    }
}
