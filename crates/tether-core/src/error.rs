//! Error types for tether.

use thiserror::Error;

/// Signal-specific errors.
///
/// Ordinary outcomes of the slot holder (a duplicate connect, a missing
/// entry) are reported through `bool` return values and never appear here.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// A handler tried to emit the non-recursive event that is delivering to it.
    #[error("re-entrant emission on a non-recursive event")]
    ReentrantEmission,
}

/// A specialized Result type for tether operations.
pub type Result<T> = std::result::Result<T, SignalError>;
