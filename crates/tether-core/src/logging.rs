//! Logging facilities for tether.
//!
//! tether uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; to see its output, install one in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_env_filter("tether_core::signal=trace")
//!         .init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! All routine events (connect, detach, emission, queue draining) are logged
//! at `TRACE`. A dropped re-entrant emission is logged at `ERROR`, see
//! [`crate::dispatch_check`].

/// Span names used throughout tether for tracing.
///
/// These constants can be used to filter traces for specific subsystems.
pub mod span_names {
    /// Emission span, entered once per delivered payload.
    pub const INVOKE: &str = "invoke";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core crate target.
    pub const CORE: &str = "tether_core";
    /// Signal/slot engine target (connect, detach, emission).
    pub const SIGNAL: &str = "tether_core::signal";
    /// Event target (queueing and draining of recursive events).
    pub const EVENT: &str = "tether_core::event";
    /// Slot holder target.
    pub const SLOT_HOLDER: &str = "tether_core::slot_holder";
    /// Scope guard target.
    pub const GUARD: &str = "tether_core::guard";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_targets_are_nested_under_core() {
        for target in [
            targets::SIGNAL,
            targets::EVENT,
            targets::SLOT_HOLDER,
            targets::GUARD,
        ] {
            assert!(target.starts_with(targets::CORE), "{target}");
        }
    }
}
