use std::time::{Duration, Instant};

use dashmap::DashMap;
use uuid::Uuid;

/// Per-user limit on provisioning requests, sliding window over attempt
/// timestamps.
pub struct CreateRateLimiter {
    /// user_id -> attempt instants inside the current window
    entries: DashMap<Uuid, Vec<Instant>>,
    limit: usize,
    window: Duration,
}

impl CreateRateLimiter {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            limit: limit as usize,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Record an attempt if allowed. Returns Err with retry-after seconds.
    pub fn check(&self, user_id: Uuid) -> Result<(), u64> {
        self.check_at(user_id, Instant::now())
    }

    fn check_at(&self, user_id: Uuid, now: Instant) -> Result<(), u64> {
        let mut attempts = self.entries.entry(user_id).or_default();
        attempts.retain(|t| now.duration_since(*t) < self.window);

        if attempts.len() >= self.limit {
            let oldest = attempts.first().copied().unwrap_or(now);
            let wait = self.window.saturating_sub(now.duration_since(oldest));
            return Err(wait.as_secs().max(1));
        }

        attempts.push(now);
        Ok(())
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries.retain(|_, attempts| {
            attempts.retain(|t| now.duration_since(*t) < self.window);
            !attempts.is_empty()
        });
    }
}

/// Per-email login brute force limiter.
pub struct LoginRateLimiter {
    /// email -> (failed_count, window_start)
    entries: DashMap<String, (u32, Instant)>,
}

const LOGIN_WINDOW: Duration = Duration::from_secs(15 * 60);
const LOGIN_MAX_FAILURES: u32 = 5;

impl LoginRateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Check if login attempt is allowed. 5 failures per 15 minutes.
    /// Does NOT increment the counter; call `record_failure()` on invalid password.
    pub fn check(&self, email: &str) -> Result<(), u64> {
        let now = Instant::now();

        let Some(entry) = self.entries.get(&email.to_lowercase()) else {
            return Ok(());
        };

        let (count, start) = entry.value();

        if now.duration_since(*start) > LOGIN_WINDOW {
            return Ok(());
        }

        if *count >= LOGIN_MAX_FAILURES {
            let elapsed = now.duration_since(*start);
            return Err(LOGIN_WINDOW.saturating_sub(elapsed).as_secs());
        }

        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let now = Instant::now();

        let mut entry = self.entries.entry(email.to_lowercase()).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > LOGIN_WINDOW {
            *count = 1;
            *start = now;
        } else {
            *count += 1;
        }
    }

    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) < LOGIN_WINDOW);
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_limiter_blocks_after_limit_within_window() {
        let limiter = CreateRateLimiter::new(2, 60);
        let user = Uuid::now_v7();
        let t0 = Instant::now();

        assert!(limiter.check_at(user, t0).is_ok());
        assert!(limiter.check_at(user, t0 + Duration::from_secs(1)).is_ok());
        let retry = limiter.check_at(user, t0 + Duration::from_secs(10)).unwrap_err();
        assert_eq!(retry, 50);
    }

    #[test]
    fn create_limiter_slides_past_old_attempts() {
        let limiter = CreateRateLimiter::new(1, 60);
        let user = Uuid::now_v7();
        let t0 = Instant::now();

        assert!(limiter.check_at(user, t0).is_ok());
        assert!(limiter.check_at(user, t0 + Duration::from_secs(30)).is_err());
        assert!(limiter.check_at(user, t0 + Duration::from_secs(61)).is_ok());
    }

    #[test]
    fn create_limiter_is_per_user() {
        let limiter = CreateRateLimiter::new(1, 60);
        let t0 = Instant::now();
        assert!(limiter.check_at(Uuid::now_v7(), t0).is_ok());
        assert!(limiter.check_at(Uuid::now_v7(), t0).is_ok());
    }

    #[test]
    fn login_limiter_counts_failures_case_insensitively() {
        let limiter = LoginRateLimiter::new();
        for _ in 0..4 {
            limiter.record_failure("Dev@Example.com");
        }
        assert!(limiter.check("dev@example.com").is_ok());
        limiter.record_failure("dev@example.com");
        assert!(limiter.check("DEV@example.com").is_err());
    }
}
