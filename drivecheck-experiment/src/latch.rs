use log::debug;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatchedInput<A> {
    pub action: A,
    /// Clock time at the moment of submission.
    pub at: f64,
}

/// Accepts the first submission after `arm` and nothing else until re-armed.
/// Submissions while unarmed are dropped, never buffered.
#[derive(Debug, Clone)]
pub struct InputLatch<A> {
    armed: bool,
    accepted: Option<LatchedInput<A>>,
}

impl<A> Default for InputLatch<A> {
    fn default() -> Self {
        Self {
            armed: false,
            accepted: None,
        }
    }
}

impl<A: Copy + std::fmt::Debug> InputLatch<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self) {
        self.armed = true;
        self.accepted = None;
    }

    pub fn disarm(&mut self) {
        self.armed = false;
    }

    /// Open and waiting for its one input.
    pub fn is_armed(&self) -> bool {
        self.armed && self.accepted.is_none()
    }

    pub fn submit(&mut self, action: A, at: f64) -> bool {
        if !self.armed {
            debug!("dropped {action:?} at {at:.3} ms: latch not armed");
            return false;
        }
        if let Some(first) = &self.accepted {
            debug!(
                "dropped {action:?} at {at:.3} ms: {:?} already latched at {:.3} ms",
                first.action, first.at
            );
            return false;
        }
        self.accepted = Some(LatchedInput { action, at });
        true
    }

    pub fn accepted(&self) -> Option<LatchedInput<A>> {
        self.accepted
    }
}
