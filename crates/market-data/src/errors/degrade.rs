/// Classification for degradation policy.
///
/// Used to determine how the batch fetch orchestrator should respond
/// to errors from the upstream provider.
///
/// # Behavior Summary
///
/// | Class | Fallback for this symbol? | Skip upstream for rest of batch? |
/// |-------|---------------------------|----------------------------------|
/// | `SymbolOnly` | Yes | No |
/// | `BatchThrottle` | Yes | Yes (sticky for the batch) |
/// | `Unavailable` | No - surfaced to the caller | n/a |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DegradeClass {
    /// Transient per-symbol failure - timeout, network error, or a
    /// malformed/empty payload. Synthesize a fallback for this symbol
    /// only; one miss says nothing about the provider as a whole.
    SymbolOnly,

    /// The provider explicitly signalled rate limiting.
    ///
    /// Synthesize a fallback for this symbol and stop calling the
    /// provider for the remainder of the batch. Converting a single
    /// 429-class response into an O(1) decision avoids hammering a
    /// provider that is already throttling us.
    BatchThrottle,

    /// The integration is not configured (missing credential).
    ///
    /// Never degraded to fallback data: the operator needs to know
    /// the integration is broken, and placeholder prices must not be
    /// mistaken for a working one.
    Unavailable,
}
