//! Fixed-window rate limiting
//!
//! Counters are keyed by opaque strings (`ip:<addr>` or `user:<id>`) and
//! consulted before any expensive work. Each check is an atomic
//! increment-or-reject under one lock; counters are monotonically
//! non-decreasing within a window, and a window boundary resets them.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Result of a rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    /// The request may proceed
    Allowed,
    /// The request is denied until the window resets
    Denied {
        /// Seconds until the current window resets (at least 1)
        retry_after_secs: u64,
    },
}

impl RateDecision {
    /// Returns true when the request may proceed
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

struct WindowCounter {
    count: u32,
    started: Instant,
}

/// Fixed-window rate limiter
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl RateLimiter {
    /// Creates a limiter allowing `max_requests` per `window`
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and counts one request for a key
    ///
    /// The counter is incremented even on denial, so a client hammering a
    /// denied key does not creep forward inside the window.
    pub fn check(&self, key: &str) -> RateDecision {
        let mut counters = self.counters.lock().unwrap();

        // Opportunistic cleanup to keep the map bounded
        if counters.len() > 4096 {
            let window = self.window;
            counters.retain(|_, counter| counter.started.elapsed() < window);
        }

        let now = Instant::now();
        let counter = counters.entry(key.to_string()).or_insert(WindowCounter {
            count: 0,
            started: now,
        });

        let elapsed = counter.started.elapsed();
        if elapsed >= self.window {
            counter.count = 0;
            counter.started = now;
        }

        counter.count += 1;
        if counter.count > self.max_requests {
            let remaining = self.window.saturating_sub(counter.started.elapsed());
            let retry_after_secs = remaining.as_secs().max(1);
            return RateDecision::Denied { retry_after_secs };
        }

        RateDecision::Allowed
    }
}

/// Builds the limiter key for a client IP
pub fn ip_key(addr: &str) -> String {
    format!("ip:{}", addr)
}

/// Builds the limiter key for a user id
pub fn user_key(user_id: &str) -> String {
    format!("user:{}", user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            assert!(limiter.check("user:u-1").is_allowed());
        }
    }

    #[test]
    fn test_denies_past_limit_with_retry_hint() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        for _ in 0..3 {
            limiter.check("user:u-1");
        }

        match limiter.check("user:u-1") {
            RateDecision::Denied { retry_after_secs } => {
                assert!(retry_after_secs >= 1);
                assert!(retry_after_secs <= 60);
            }
            RateDecision::Allowed => panic!("fourth request should be denied"),
        }
    }

    #[test]
    fn test_thirty_first_request_denied_with_default_user_limit() {
        let limiter = RateLimiter::new(30, Duration::from_secs(60));
        for i in 0..30 {
            assert!(limiter.check("user:u-1").is_allowed(), "request {} denied", i + 1);
        }
        assert!(!limiter.check("user:u-1").is_allowed());
    }

    #[test]
    fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        assert!(limiter.check("user:u-1").is_allowed());
        assert!(limiter.check("user:u-2").is_allowed());
        assert!(!limiter.check("user:u-1").is_allowed());
    }

    #[test]
    fn test_window_reset_allows_again() {
        let limiter = RateLimiter::new(1, Duration::from_millis(20));
        assert!(limiter.check("ip:1.2.3.4").is_allowed());
        assert!(!limiter.check("ip:1.2.3.4").is_allowed());

        std::thread::sleep(Duration::from_millis(30));
        assert!(limiter.check("ip:1.2.3.4").is_allowed());
    }

    #[test]
    fn test_key_builders() {
        assert_eq!(ip_key("10.0.0.1"), "ip:10.0.0.1");
        assert_eq!(user_key("u-1"), "user:u-1");
    }

    #[test]
    fn test_concurrent_checks_count_exactly() {
        use std::sync::Arc;

        let limiter = Arc::new(RateLimiter::new(50, Duration::from_secs(60)));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let limiter = limiter.clone();
            handles.push(std::thread::spawn(move || {
                let mut allowed = 0u32;
                for _ in 0..10 {
                    if limiter.check("user:shared").is_allowed() {
                        allowed += 1;
                    }
                }
                allowed
            }));
        }

        let total: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 80 checks against a limit of 50: exactly 50 may pass
        assert_eq!(total, 50);
    }
}
