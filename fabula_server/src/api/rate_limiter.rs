//! Rate limiting for WebSocket commands.
//!
//! Each socket gets a [`SocketThrottle`]: a short burst window and a longer
//! sustained window, both sliding.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding window over the timestamps of recent messages
#[derive(Debug)]
pub struct RateLimiter {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    /// Allow `max_requests` within any `window`.
    ///
    /// # Example
    ///
    /// ```
    /// use fabula_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// let mut limiter = RateLimiter::new(2, Duration::from_secs(1));
    /// assert!(limiter.check());
    /// assert!(limiter.check());
    /// assert!(!limiter.check());
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Record a message if the window has room for it.
    pub fn check(&mut self) -> bool {
        self.check_at(Instant::now())
    }

    fn check_at(&mut self, now: Instant) -> bool {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(now);
        true
    }
}

/// Which window a message overflowed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Throttled {
    Burst,
    Sustained,
}

impl Throttled {
    pub fn message(self) -> &'static str {
        match self {
            Throttled::Burst => "Rate limit exceeded. Please slow down.",
            Throttled::Sustained => "Too many messages. Please wait before sending more.",
        }
    }
}

/// Burst (10 per second) and sustained (100 per minute) limits for one socket
#[derive(Debug)]
pub struct SocketThrottle {
    burst: RateLimiter,
    sustained: RateLimiter,
}

impl Default for SocketThrottle {
    fn default() -> Self {
        Self {
            burst: RateLimiter::new(10, Duration::from_secs(1)),
            sustained: RateLimiter::new(100, Duration::from_secs(60)),
        }
    }
}

impl SocketThrottle {
    /// A message rejected by the burst window doesn't count against the
    /// sustained one.
    pub fn check(&mut self) -> Result<(), Throttled> {
        if !self.burst.check() {
            return Err(Throttled::Burst);
        }
        if !self.sustained.check() {
            return Err(Throttled::Sustained);
        }
        Ok(())
    }
}
