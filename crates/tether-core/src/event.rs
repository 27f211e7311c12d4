//! Event sources for tether.
//!
//! An event is the producer-side object of the signal/slot system. It owns a
//! [`Signal`] that consumers connect their slots to, and it is the only way to
//! emit through that signal.
//!
//! # Event Types
//!
//! - [`Event<Tag, Args>`] - Delivers one emission at a time; a handler must not
//!   re-emit the same event
//! - [`RecursiveEvent<Tag, Args>`] - Queues emissions raised by its own
//!   handlers and delivers them in FIFO order after the current one
//!
//! # Tags
//!
//! The `Tag` parameter distinguishes event kinds that share a payload type. It
//! is never instantiated; an empty enum is the usual choice:
//!
//! ```
//! use tether_core::{Event, Slot};
//!
//! enum Pressed {}
//! enum Released {}
//!
//! let pressed = Event::<Pressed, (u8,)>::new();
//! let released = Event::<Released, (u8,)>::new();
//!
//! let on_press = Slot::<Pressed, (u8,)>::new();
//! pressed.sig().connect(&on_press);
//! // released.sig().connect(&on_press); // does not compile
//! # let _ = released;
//! ```

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;

use crate::dispatch_check;
use crate::error::{Result, SignalError};
use crate::guard::ScopeGuard;
use crate::logging::targets;
use crate::signal::Signal;

/// An event source delivering one emission at a time.
///
/// Handlers reached through [`invoke`](Self::invoke) must not call `invoke` on
/// the same event. How a violation is treated depends on
/// [`dispatch_check`]: it panics when re-entrancy checks are enabled and is
/// dropped (and logged) otherwise. Use [`RecursiveEvent`] when handlers need to
/// re-emit.
///
/// # Example
///
/// ```
/// use tether_core::{Event, Slot};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// enum Renamed {}
///
/// let renamed = Event::<Renamed, (u32, String)>::new();
/// let last = Rc::new(RefCell::new(None));
///
/// let last_clone = last.clone();
/// let slot = Slot::with_handler(move |(id, name): &(u32, String)| {
///     *last_clone.borrow_mut() = Some((*id, name.clone()));
/// });
/// renamed.sig().connect(&slot);
///
/// renamed.invoke((7, "lathe".to_string()));
/// assert_eq!(*last.borrow(), Some((7, "lathe".to_string())));
/// ```
pub struct Event<Tag, Args> {
    signal: Signal<Tag, Args>,
    dispatching: Cell<bool>,
}

impl<Tag, Args: 'static> Event<Tag, Args> {
    /// Create an event with no connected slots.
    pub fn new() -> Self {
        Self {
            signal: Signal::new(),
            dispatching: Cell::new(false),
        }
    }

    /// The signal consumers connect their slots to.
    pub fn sig(&self) -> &Signal<Tag, Args> {
        &self.signal
    }

    /// Emit `args` to every connected slot.
    ///
    /// # Panics
    ///
    /// Panics if called from a handler of this event while re-entrancy checks
    /// are enabled. Also propagates a panic raised by a handler.
    #[track_caller]
    pub fn invoke(&self, args: Args) {
        if let Err(SignalError::ReentrantEmission) = self.try_invoke(args) {
            dispatch_check::report_reentrant_emission(std::any::type_name::<Self>());
        }
    }

    /// Emit `args`, reporting a re-entrant call as an error instead of
    /// trapping.
    ///
    /// # Errors
    ///
    /// Returns [`SignalError::ReentrantEmission`] if this event is already
    /// delivering an emission. The payload is dropped in that case.
    pub fn try_invoke(&self, args: Args) -> Result<()> {
        if self.dispatching.replace(true) {
            return Err(SignalError::ReentrantEmission);
        }
        let _reset = ScopeGuard::new(|| self.dispatching.set(false));
        self.signal.invoke(&args);
        Ok(())
    }

    /// Whether an emission is currently being delivered.
    pub fn is_dispatching(&self) -> bool {
        self.dispatching.get()
    }
}

impl<Tag, Args: 'static> Default for Event<Tag, Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag, Args> fmt::Debug for Event<Tag, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("signal", &self.signal)
            .field("dispatching", &self.dispatching.get())
            .finish()
    }
}

/// An event source that accepts emissions from its own handlers.
///
/// An emission raised while another one is being delivered is appended to a
/// FIFO queue; the outermost [`invoke`](Self::invoke) call delivers queued
/// payloads in order once the current emission has reached every slot. Only
/// one emission is ever in flight, and none is lost.
///
/// Handlers are responsible for termination: the queue has no depth bound.
///
/// # Example
///
/// ```
/// use tether_core::{RecursiveEvent, Slot};
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// enum Countdown {}
///
/// let event = Rc::new(RecursiveEvent::<Countdown, (u32,)>::new());
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let weak = Rc::downgrade(&event);
/// let seen_clone = seen.clone();
/// let slot = Slot::with_handler(move |&(n,): &(u32,)| {
///     seen_clone.borrow_mut().push(n);
///     if n > 0 {
///         if let Some(event) = weak.upgrade() {
///             event.invoke((n - 1,));
///         }
///     }
/// });
/// event.sig().connect(&slot);
///
/// event.invoke((3,));
/// assert_eq!(*seen.borrow(), vec![3, 2, 1, 0]);
/// ```
pub struct RecursiveEvent<Tag, Args> {
    signal: Signal<Tag, Args>,
    queue: RefCell<VecDeque<Args>>,
    draining: Cell<bool>,
}

impl<Tag, Args: 'static> RecursiveEvent<Tag, Args> {
    /// Create an event with no connected slots.
    pub fn new() -> Self {
        Self {
            signal: Signal::new(),
            queue: RefCell::new(VecDeque::new()),
            draining: Cell::new(false),
        }
    }

    /// The signal consumers connect their slots to.
    pub fn sig(&self) -> &Signal<Tag, Args> {
        &self.signal
    }

    /// Emit `args` to every connected slot.
    ///
    /// Called from a handler of this event, the payload is queued and this
    /// returns immediately; the outermost call delivers it later.
    ///
    /// If a handler panics, the panic propagates and every payload still
    /// queued is discarded.
    pub fn invoke(&self, args: Args) {
        self.queue.borrow_mut().push_back(args);
        if self.draining.get() {
            tracing::trace!(
                target: targets::EVENT,
                signal = %self.signal.id(),
                pending = self.pending(),
                "emission queued"
            );
            return;
        }

        self.draining.set(true);
        let _reset = ScopeGuard::new(|| {
            self.queue.borrow_mut().clear();
            self.draining.set(false);
        });

        let mut delivered = 0usize;
        loop {
            let next = self.queue.borrow_mut().pop_front();
            let Some(args) = next else {
                break;
            };
            self.signal.invoke(&args);
            delivered += 1;
        }

        tracing::trace!(
            target: targets::EVENT,
            signal = %self.signal.id(),
            delivered,
            "queue drained"
        );
    }

    /// Number of queued emissions not yet delivered.
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Whether an emission is currently being delivered.
    pub fn is_dispatching(&self) -> bool {
        self.draining.get()
    }
}

impl<Tag, Args: 'static> Default for RecursiveEvent<Tag, Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag, Args> fmt::Debug for RecursiveEvent<Tag, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecursiveEvent")
            .field("signal", &self.signal)
            .field("pending", &self.queue.borrow().len())
            .field("draining", &self.draining.get())
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Event<(), ()>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(RecursiveEvent<(), ()>: Send, Sync, Clone);
