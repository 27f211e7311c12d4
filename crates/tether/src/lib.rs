//! tether - synchronous signal/slot event delegation for single-threaded Rust.
//!
//! This is the main umbrella crate that re-exports all public APIs.
//!
//! # Example
//!
//! ```
//! use tether::prelude::*;
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! enum Clicked {}
//!
//! let clicked = Event::<Clicked, ()>::new();
//! let holder = SlotHolder::new();
//! let clicks = Rc::new(Cell::new(0));
//!
//! let clicks_clone = clicks.clone();
//! holder.connect(clicked.sig(), move |_: &()| clicks_clone.set(clicks_clone.get() + 1));
//!
//! clicked.invoke(());
//! assert_eq!(clicks.get(), 1);
//! ```

pub use tether_core::*;

/// The types most users need, for glob import.
pub mod prelude {
    pub use tether_core::{
        Event, MultiGuard, RecursiveEvent, ScopeGuard, Signal, Slot, SlotHandle, SlotHolder,
    };
}
