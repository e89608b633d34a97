//! Sign-in throttling
//!
//! Brute-force protection for the signin endpoint: failed attempts are
//! counted per email (5 per 15 minutes) and all signin requests per
//! client IP (10 per minute), each over a sliding window.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::hash::Hash;
use std::net::IpAddr;
use tokio::sync::RwLock;

const EMAIL_MAX_FAILURES: usize = 5;
const IP_MAX_REQUESTS: usize = 10;

fn email_window() -> Duration {
    Duration::minutes(15)
}

fn ip_window() -> Duration {
    Duration::minutes(1)
}

/// Outcome of the pre-signin throttle check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleDecision {
    Allowed,
    /// Too many signin requests from this address
    IpLimited,
    /// Too many failed attempts against this account
    EmailLimited,
}

/// Timestamps of recent events per key, pruned to a sliding window
struct AttemptLog<K> {
    entries: RwLock<HashMap<K, Vec<DateTime<Utc>>>>,
    window: Duration,
    max: usize,
}

impl<K: Eq + Hash> AttemptLog<K> {
    fn new(window: Duration, max: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            window,
            max,
        }
    }

    /// Whether the key has hit its limit within the window
    async fn is_limited(&self, key: &K) -> bool {
        let mut entries = self.entries.write().await;
        let cutoff = Utc::now() - self.window;

        match entries.get_mut(key) {
            Some(times) => {
                times.retain(|time| *time > cutoff);
                times.len() >= self.max
            }
            None => false,
        }
    }

    async fn record(&self, key: K) {
        let mut entries = self.entries.write().await;
        entries.entry(key).or_default().push(Utc::now());
    }

    async fn clear(&self, key: &K) {
        let mut entries = self.entries.write().await;
        entries.remove(key);
    }

    async fn prune(&self) {
        let cutoff = Utc::now() - self.window;
        let mut entries = self.entries.write().await;
        entries.retain(|_, times| {
            times.retain(|time| *time > cutoff);
            !times.is_empty()
        });
    }
}

/// Sign-in rate limiter
pub struct SigninRateLimiter {
    email_failures: AttemptLog<String>,
    ip_requests: AttemptLog<IpAddr>,
}

impl SigninRateLimiter {
    /// Create a new rate limiter
    pub fn new() -> Self {
        Self {
            email_failures: AttemptLog::new(email_window(), EMAIL_MAX_FAILURES),
            ip_requests: AttemptLog::new(ip_window(), IP_MAX_REQUESTS),
        }
    }

    /// Gate a signin request before credentials are checked.
    ///
    /// Counts the request against the client IP when one is known, then
    /// checks the account's failed-attempt budget. IP limiting wins so a
    /// flood from one address is cut off before it can probe accounts.
    pub async fn check_signin(&self, email: &str, ip: Option<IpAddr>) -> ThrottleDecision {
        if let Some(ip) = ip {
            if self.ip_requests.is_limited(&ip).await {
                return ThrottleDecision::IpLimited;
            }
            self.ip_requests.record(ip).await;
        }

        if self.email_failures.is_limited(&normalize_email(email)).await {
            return ThrottleDecision::EmailLimited;
        }

        ThrottleDecision::Allowed
    }

    /// Record a failed sign-in attempt against an email
    pub async fn record_failed_attempt(&self, email: &str) {
        self.email_failures.record(normalize_email(email)).await;
    }

    /// Forget an email's failed attempts (on successful sign-in)
    pub async fn clear_email_attempts(&self, email: &str) {
        self.email_failures.clear(&normalize_email(email)).await;
    }

    /// Drop expired entries; called periodically from a background task
    pub async fn cleanup(&self) {
        self.email_failures.prune().await;
        self.ip_requests.prune().await;
    }
}

impl Default for SigninRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Attempts against the same account must share a bucket regardless of
/// the casing the client sends.
fn normalize_email(email: &str) -> String {
    email.to_lowercase()
}
