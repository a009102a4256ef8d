//! Client-side request pacing for the HR platform.
//!
//! A single counter runs over a rolling 60 s window. Crossing the per-second
//! budget waits out the rest of the current second; every multiple of the
//! per-second budget (or reaching the per-minute budget) waits for the next
//! minute. Local and best-effort only.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::clock::Clock;

const WINDOW: Duration = Duration::from_secs(60);

pub struct RateLimiter {
    per_second: u32,
    per_minute: u32,
    clock: Arc<dyn Clock>,
    state: Mutex<WindowState>,
}

struct WindowState {
    counter: u32,
    window_start: Instant,
}

impl RateLimiter {
    /// Budgets of zero are treated as one.
    pub fn new(per_second: u32, per_minute: u32, clock: Arc<dyn Clock>) -> Self {
        let window_start = clock.now();
        Self {
            per_second: per_second.max(1),
            per_minute: per_minute.max(1),
            clock,
            state: Mutex::new(WindowState {
                counter: 0,
                window_start,
            }),
        }
    }

    /// Block until one more request fits the budget.
    pub fn wait_for_rate_limit(&self) {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.reset_if_elapsed(&mut state);
        state.counter += 1;

        if state.counter > self.per_second {
            let elapsed = self.clock.now().duration_since(state.window_start);
            let wait = Duration::from_secs(1).saturating_sub(elapsed);
            if !wait.is_zero() {
                tracing::debug!(wait_ms = wait.as_millis() as u64, "per-second budget reached");
                self.clock.sleep(wait);
            }
            self.reset_if_elapsed(&mut state);
            state.counter = 1;
        }

        if state.counter % self.per_second == 0 || state.counter >= self.per_minute {
            let elapsed = self.clock.now().duration_since(state.window_start);
            let into_minute = Duration::from_nanos((elapsed.as_nanos() % WINDOW.as_nanos()) as u64);
            let wait = WINDOW - into_minute + Duration::from_secs(1);
            tracing::debug!(
                counter = state.counter,
                wait_ms = wait.as_millis() as u64,
                "waiting for the next minute"
            );
            self.clock.sleep(wait);
            self.reset_if_elapsed(&mut state);
        }
    }

    fn reset_if_elapsed(&self, state: &mut WindowState) {
        let now = self.clock.now();
        if now.duration_since(state.window_start) >= WINDOW {
            state.counter = 0;
            state.window_start = now;
        }
    }
}
