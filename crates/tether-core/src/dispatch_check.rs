//! Re-entrancy verification for non-recursive events.
//!
//! A handler reached through [`crate::Event::invoke`] must not invoke the same
//! event again. This module controls what happens when it does.
//!
//! # Check Levels
//!
//! - **Checks enabled** (default in debug builds, or with the `always-check`
//!   feature): the nested `invoke` panics with a descriptive message.
//! - **Checks disabled** (default in release builds): the nested emission is
//!   dropped and an error is logged on the `tether_core::signal` target.
//!
//! The `always-check` default is exercised by
//! `cargo test -p tether-core --release --features always-check`.
//!
//! Code that wants to handle the situation itself can call
//! [`crate::Event::try_invoke`], which reports
//! [`SignalError::ReentrantEmission`](crate::SignalError::ReentrantEmission)
//! regardless of the check level.
//!
//! # Example
//!
//! ```
//! use tether_core::dispatch_check;
//!
//! // Trap re-entrant emissions even in an optimized test build.
//! dispatch_check::set_reentrancy_checks_enabled(true);
//! assert!(dispatch_check::are_reentrancy_checks_enabled());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};

use crate::logging::targets;

/// Flag to enable/disable the re-entrancy trap globally.
static REENTRANCY_CHECKS_ENABLED: AtomicBool =
    AtomicBool::new(cfg!(any(debug_assertions, feature = "always-check")));

/// Enable or disable the re-entrancy trap.
///
/// By default the trap is enabled in debug builds and disabled in release
/// builds. The setting is process-wide.
pub fn set_reentrancy_checks_enabled(enabled: bool) {
    REENTRANCY_CHECKS_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Check if the re-entrancy trap is currently enabled.
#[inline]
pub fn are_reentrancy_checks_enabled() -> bool {
    REENTRANCY_CHECKS_ENABLED.load(Ordering::Relaxed)
}

/// Reports a re-entrant emission according to the current check level.
#[track_caller]
pub(crate) fn report_reentrant_emission(event_type: &str) {
    if are_reentrancy_checks_enabled() {
        panic_reentrant_emission(event_type);
    }
    tracing::error!(
        target: targets::SIGNAL,
        event = event_type,
        "re-entrant emission dropped; use RecursiveEvent for handlers that re-emit"
    );
}

#[cold]
#[inline(never)]
#[track_caller]
fn panic_reentrant_emission(event_type: &str) -> ! {
    let location = std::panic::Location::caller();
    panic!(
        "\n\
        ══════════════════════════════════════════════════════════════════════\n\
        RE-ENTRANT EMISSION\n\
        ══════════════════════════════════════════════════════════════════════\n\
        \n\
        {event_type}::invoke was called from a handler of the same event.\n\
        \n\
        Location: {location}\n\
        \n\
        A non-recursive event delivers one emission at a time. Nested\n\
        emissions would overlap the running dispatch.\n\
        \n\
        POSSIBLE SOLUTIONS:\n\
        \n\
        1. Use RecursiveEvent, which queues nested emissions and delivers\n\
           them in order once the current one has finished.\n\
        \n\
        2. Use Event::try_invoke and handle SignalError::ReentrantEmission.\n\
        \n\
        ══════════════════════════════════════════════════════════════════════"
    )
}
