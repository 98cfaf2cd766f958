//! Tickerdeck Rate Limit Crate
//!
//! Generic fixed-window rate limiting for the Tickerdeck dashboard.
//! Used to protect inbound auth and API call paths, and reusable by
//! anything that needs per-identifier failure tracking with lockout
//! escalation.
//!
//! # Core Types
//!
//! - [`WindowCounter`] - fixed-window failure counter with escalating
//!   lockout and lazy expiry
//! - [`RateLimitGate`] - façade applying a [`WindowConfig`] and
//!   projecting results into user-facing [`GateStatus`] messages
//! - [`Clock`] - injectable time source ([`SystemClock`] in
//!   production, [`ManualClock`] in tests)
//!
//! State lives in an in-process map; a multi-instance deployment gets
//! independent counters per instance.

pub mod clock;
pub mod gate;
pub mod window;

pub use clock::{Clock, ManualClock, SystemClock};
pub use gate::{project_status, GateStatus, RateLimitGate};
pub use window::{WindowCheck, WindowConfig, WindowCounter};
