//! # Rate Limiting
//!
//! Sliding window per source key, kept in process memory. Nothing is shared between
//! server instances and a restart forgets every window.
//!
//! - Window: 15 minutes
//! - Cap: 3 recorded attempts per key inside the window
//! - Expired timestamps are pruned on every check, empty keys are dropped
//! - Every record also sweeps keys whose newest attempt has left the window, so sources
//!   that never come back do not stay in memory
use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

pub const WINDOW_MINUTES: i64 = 15;
pub const MAX_ATTEMPTS: usize = 3;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct RateLimiter {
    window: Duration,
    max_attempts: usize,
    clock: Arc<dyn Clock>,
    attempts: Mutex<HashMap<String, VecDeque<DateTime<Utc>>>>,
}

impl RateLimiter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_limits(clock, Duration::minutes(WINDOW_MINUTES), MAX_ATTEMPTS)
    }

    pub fn with_limits(clock: Arc<dyn Clock>, window: Duration, max_attempts: usize) -> Self {
        Self {
            window,
            max_attempts,
            clock,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, key: &str) -> bool {
        let cutoff = self.clock.now() - self.window;
        let mut attempts = self.attempts.lock();

        let Some(times) = attempts.get_mut(key) else {
            return true;
        };

        // timestamps are pushed in order, so expired ones sit at the front
        while times.front().is_some_and(|t| *t <= cutoff) {
            times.pop_front();
        }

        if times.is_empty() {
            attempts.remove(key);
            return true;
        }

        times.len() < self.max_attempts
    }

    pub fn record(&self, key: &str) {
        let now = self.clock.now();
        let cutoff = now - self.window;
        let mut attempts = self.attempts.lock();

        attempts.retain(|_, times| times.back().is_some_and(|t| *t > cutoff));
        attempts.entry(key.to_string()).or_default().push_back(now);
    }

    #[cfg(test)]
    pub(crate) fn tracked_keys(&self) -> usize {
        self.attempts.lock().len()
    }
}
