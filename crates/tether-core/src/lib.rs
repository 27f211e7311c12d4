//! Core systems for tether.
//!
//! This crate provides the building blocks for single-threaded, event-driven
//! code:
//!
//! - **Signal/Slot System**: Synchronous event delegation with automatic
//!   disconnection when either side goes away
//! - **Events**: A non-recursive event and a recursion-tolerant variant that
//!   queues emissions raised by its own handlers
//! - **Slot Holder**: Slot lifetime management on behalf of clients
//! - **Scope Guards**: Single- and multi-action cleanup on scope exit
//!
//! Everything here is `!Send` and `!Sync`. All participants of a signal live
//! on one thread, and emissions run to completion synchronously.
//!
//! # Signal/Slot Example
//!
//! ```
//! use tether_core::{Event, Slot};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! enum Saved {}
//!
//! // The producer owns the event
//! let saved = Event::<Saved, (String,)>::new();
//!
//! // The consumer owns the slot
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let log_clone = log.clone();
//! let on_saved = Slot::with_handler(move |(path,): &(String,)| {
//!     log_clone.borrow_mut().push(path.clone());
//! });
//! saved.sig().connect(&on_saved);
//!
//! saved.invoke(("notes.txt".to_string(),));
//! assert_eq!(*log.borrow(), vec!["notes.txt".to_string()]);
//!
//! // Dropping the slot disconnects it
//! drop(on_saved);
//! saved.invoke(("draft.txt".to_string(),));
//! assert_eq!(log.borrow().len(), 1);
//! ```
//!
//! # Scope Guard Example
//!
//! ```
//! use tether_core::ScopeGuard;
//! use std::cell::Cell;
//!
//! let cleaned_up = Cell::new(false);
//! {
//!     let _guard = ScopeGuard::new(|| cleaned_up.set(true));
//! }
//! assert!(cleaned_up.get());
//! ```

pub mod dispatch_check;
mod error;
mod event;
pub mod guard;
pub mod logging;
pub mod signal;
mod slot_holder;

pub use dispatch_check::{are_reentrancy_checks_enabled, set_reentrancy_checks_enabled};
pub use error::{Result, SignalError};
pub use event::{Event, RecursiveEvent};
pub use guard::{MultiGuard, ScopeGuard};
pub use signal::{Signal, SignalId, Slot, SlotHandle};
pub use slot_holder::SlotHolder;
