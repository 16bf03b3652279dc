//! Idle activity tracking for auto-logout.
//!
//! The embedding UI forwards user activity (key presses, pointer events) via
//! `touch()`. A watcher task owned by the session manager sleeps until the
//! current deadline and re-checks: if activity arrived in the meantime the
//! deadline simply moves forward, otherwise the session is torn down.

use std::sync::Mutex;
use std::time::{Duration, Instant};

pub(crate) struct IdleTracker {
    last_activity: Mutex<Instant>,
}

impl IdleTracker {
    pub fn new() -> Self {
        Self {
            last_activity: Mutex::new(Instant::now()),
        }
    }

    /// Record user activity, pushing the idle deadline forward.
    pub fn touch(&self) {
        *self.last_activity.lock().expect("idle tracker lock poisoned") = Instant::now();
    }

    pub fn last_activity(&self) -> Instant {
        *self.last_activity.lock().expect("idle tracker lock poisoned")
    }

    /// Time left until the idle deadline, or `None` once it has passed.
    pub fn remaining(&self, window: Duration) -> Option<Duration> {
        let deadline = self.last_activity() + window;
        deadline.checked_duration_since(Instant::now())
    }
}
