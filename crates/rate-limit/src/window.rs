//! Fixed-window request counter with lockout escalation.
//!
//! Tracks failed attempts per identifier inside a fixed time window.
//! Once an identifier accumulates `max_attempts` failures within one
//! window it is locked out for a configurable period. All expiry is
//! evaluated lazily at `check`/`record_failure` time; there is no
//! background sweep, so entries for idle identifiers stay in the map
//! until the identifier is touched again or cleared.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use log::{debug, warn};

use crate::clock::Clock;

/// Default maximum failures per window.
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default window length: 15 minutes.
const DEFAULT_WINDOW: Duration = Duration::from_secs(900);

/// Default lockout length: 30 minutes.
const DEFAULT_LOCKOUT: Duration = Duration::from_secs(1800);

/// Configuration for a fixed window.
#[derive(Clone, Debug)]
pub struct WindowConfig {
    /// Failures allowed within one window before lockout.
    pub max_attempts: u32,
    /// Length of the counting window.
    pub window: Duration,
    /// Lockout duration applied once the threshold is reached.
    pub lockout: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            window: DEFAULT_WINDOW,
            lockout: DEFAULT_LOCKOUT,
        }
    }
}

/// Result of a window check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowCheck {
    /// Whether the identifier may proceed.
    pub allowed: bool,
    /// Attempts left before lockout.
    pub remaining_attempts: u32,
    /// Whole minutes until an active lockout expires (ceiling), 0 when
    /// not locked out.
    pub lockout_remaining_minutes: i64,
}

impl WindowCheck {
    fn allowed_with_quota(remaining: u32) -> Self {
        Self {
            allowed: true,
            remaining_attempts: remaining,
            lockout_remaining_minutes: 0,
        }
    }
}

/// Per-identifier window state.
#[derive(Clone, Debug)]
struct WindowEntry {
    /// Failures recorded in the current window.
    count: u32,
    /// Start of the current window.
    window_start: DateTime<Utc>,
    /// End of an active lockout, if any.
    locked_until: Option<DateTime<Utc>>,
}

impl WindowEntry {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            count: 1,
            window_start: now,
            locked_until: None,
        }
    }
}

/// Fixed-window failure counter keyed by normalized identifier.
///
/// Thread-safe; shared by any number of concurrent callers. Updates
/// happen under one lock acquisition so two writers racing on the
/// same stale entry resolve last-write-wins without losing the
/// increment they each performed.
pub struct WindowCounter {
    entries: Mutex<HashMap<String, WindowEntry>>,
    clock: Arc<dyn Clock>,
}

impl WindowCounter {
    /// Create a counter reading time from the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    /// Lock the entries mutex, recovering from poison if necessary.
    ///
    /// Worst case after recovery is one miscounted attempt, which is
    /// preferable to panicking inside a request path.
    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, WindowEntry>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            warn!("Window counter mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Check whether an identifier is currently allowed.
    ///
    /// An absent entry, an expired window, or an expired lockout all
    /// yield full quota. An active lockout denies with a ceiling
    /// minute countdown. Otherwise the identifier is allowed while
    /// `count < max_attempts`.
    pub fn check(&self, identifier: &str, config: &WindowConfig) -> WindowCheck {
        let key = normalize(identifier);
        let now = self.clock.now();
        let entries = self.lock_entries();

        let Some(entry) = entries.get(&key) else {
            return WindowCheck::allowed_with_quota(config.max_attempts);
        };

        if let Some(locked_until) = entry.locked_until {
            if now < locked_until {
                let minutes = ceil_minutes(locked_until - now);
                debug!("'{}' is locked out for {} more minute(s)", key, minutes);
                return WindowCheck {
                    allowed: false,
                    remaining_attempts: 0,
                    lockout_remaining_minutes: minutes,
                };
            }
            // Lockout elapsed: the entry is stale, quota is restored.
            return WindowCheck::allowed_with_quota(config.max_attempts);
        }

        if window_expired(now, entry.window_start, config.window) {
            return WindowCheck::allowed_with_quota(config.max_attempts);
        }

        let remaining = config.max_attempts.saturating_sub(entry.count);
        WindowCheck {
            allowed: entry.count < config.max_attempts,
            remaining_attempts: remaining,
            lockout_remaining_minutes: 0,
        }
    }

    /// Record a failed attempt for an identifier.
    ///
    /// Starts a fresh window when the entry is absent or stale,
    /// otherwise increments the count. Reaching `max_attempts` sets
    /// the lockout; an already-locked identifier keeps counting but
    /// its lockout is never shortened.
    pub fn record_failure(&self, identifier: &str, config: &WindowConfig) {
        let key = normalize(identifier);
        let now = self.clock.now();
        let mut entries = self.lock_entries();

        let entry = entries
            .entry(key.clone())
            .and_modify(|entry| {
                let lockout_elapsed = entry
                    .locked_until
                    .map(|until| now >= until)
                    .unwrap_or(false);
                let stale = entry.locked_until.is_none()
                    && window_expired(now, entry.window_start, config.window);

                if lockout_elapsed || stale {
                    *entry = WindowEntry::fresh(now);
                } else {
                    entry.count += 1;
                }
            })
            .or_insert_with(|| WindowEntry::fresh(now));

        if entry.count >= config.max_attempts {
            let candidate = now
                .checked_add_signed(
                    chrono::Duration::from_std(config.lockout).unwrap_or(chrono::TimeDelta::MAX),
                )
                .unwrap_or(DateTime::<Utc>::MAX_UTC);
            let locked_until = match entry.locked_until {
                Some(existing) => existing.max(candidate),
                None => candidate,
            };
            entry.locked_until = Some(locked_until);
            warn!(
                "'{}' reached {} failed attempts, locked until {}",
                key, entry.count, locked_until
            );
        } else {
            debug!(
                "Recorded failure for '{}' ({}/{})",
                key, entry.count, config.max_attempts
            );
        }
    }

    /// Remove all state for an identifier (e.g. after a successful
    /// login). A following `check` returns full quota.
    pub fn clear(&self, identifier: &str) {
        let key = normalize(identifier);
        let mut entries = self.lock_entries();
        if entries.remove(&key).is_some() {
            debug!("Cleared window state for '{}'", key);
        }
    }

    /// Number of tracked identifiers (expired entries included, since
    /// expiry is lazy).
    pub fn tracked_identifiers(&self) -> usize {
        self.lock_entries().len()
    }
}

/// Normalize an identifier so case variants of the same email or IP
/// land on the same entry.
fn normalize(identifier: &str) -> String {
    identifier.trim().to_lowercase()
}

fn window_expired(now: DateTime<Utc>, start: DateTime<Utc>, window: Duration) -> bool {
    now.signed_duration_since(start)
        .to_std()
        .map(|elapsed| elapsed > window)
        .unwrap_or(false)
}

/// Whole minutes, rounded up, in a positive duration.
fn ceil_minutes(remaining: chrono::Duration) -> i64 {
    let millis = remaining.num_milliseconds().max(0);
    (millis + 59_999) / 60_000
}
