//! Inbound rate-limit gate.
//!
//! Thin façade composing a [`WindowCounter`] with a human-readable
//! status projection. Auth and API call paths run `check` before the
//! protected work and `record_failure`/`clear` after it; the
//! projection turns a [`WindowCheck`] into the warning or lockout
//! message the UI renders.

use std::fmt;
use std::sync::Arc;

use crate::clock::Clock;
use crate::window::{WindowCheck, WindowConfig, WindowCounter};

/// Remaining-attempt count at or below which a warning is shown.
const NEAR_LIMIT_THRESHOLD: u32 = 2;

/// Gate over a shared window counter with a default configuration.
pub struct RateLimitGate {
    counter: WindowCounter,
    config: WindowConfig,
}

impl RateLimitGate {
    /// Create a gate with the given configuration.
    pub fn new(clock: Arc<dyn Clock>, config: WindowConfig) -> Self {
        Self {
            counter: WindowCounter::new(clock),
            config,
        }
    }

    /// Create a gate with default limits (5 attempts / 15 min window /
    /// 30 min lockout).
    pub fn with_defaults(clock: Arc<dyn Clock>) -> Self {
        Self::new(clock, WindowConfig::default())
    }

    /// Check an identifier against the gate's default configuration.
    pub fn check(&self, identifier: &str) -> WindowCheck {
        self.counter.check(identifier, &self.config)
    }

    /// Check with per-call overrides (the inbound boundary lets
    /// callers tighten or relax limits per gate).
    pub fn check_with(&self, identifier: &str, config: &WindowConfig) -> WindowCheck {
        self.counter.check(identifier, config)
    }

    /// Record a failed attempt under the default configuration.
    pub fn record_failure(&self, identifier: &str) {
        self.counter.record_failure(identifier, &self.config);
    }

    /// Record a failed attempt with per-call overrides.
    pub fn record_failure_with(&self, identifier: &str, config: &WindowConfig) {
        self.counter.record_failure(identifier, config);
    }

    /// Drop all state for an identifier (successful completion).
    pub fn clear(&self, identifier: &str) {
        self.counter.clear(identifier);
    }
}

/// Human-readable projection of a [`WindowCheck`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GateStatus {
    /// Plenty of quota left; nothing to show.
    Ok,
    /// Close to the limit; warn the caller.
    NearLimit {
        /// Attempts left before lockout.
        remaining: u32,
    },
    /// Locked out; show a retry countdown.
    LockedOut {
        /// Whole minutes until the lockout expires.
        minutes: i64,
    },
}

/// Project a check result into a displayable status.
///
/// Pure function of its input, independent of the clock-dependent
/// counter, so it is unit-testable in isolation.
pub fn project_status(check: &WindowCheck) -> GateStatus {
    if !check.allowed {
        return GateStatus::LockedOut {
            minutes: check.lockout_remaining_minutes,
        };
    }
    if check.remaining_attempts > 0 && check.remaining_attempts <= NEAR_LIMIT_THRESHOLD {
        return GateStatus::NearLimit {
            remaining: check.remaining_attempts,
        };
    }
    GateStatus::Ok
}

impl fmt::Display for GateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => Ok(()),
            Self::NearLimit { remaining } => {
                let plural = if *remaining == 1 { "" } else { "s" };
                write!(f, "{} attempt{} remaining before lockout", remaining, plural)
            }
            Self::LockedOut { minutes } => {
                let plural = if *minutes == 1 { "" } else { "s" };
                write!(f, "Locked out. Try again in {} minute{}", minutes, plural)
            }
        }
    }
}
