//! Signal/slot core for tether.
//!
//! This module provides the synchronous, single-threaded event delegation
//! engine. A [`Signal`] is the broadcast point owned by an event; a [`Slot`]
//! wraps a user handler and subscribes to at most one signal at a time.
//!
//! # Key Types
//!
//! - [`Signal<Tag, Args>`] - Ordered list of subscribed slots, owned by an event
//! - [`Slot<Tag, Args>`] - Subscriber wrapping a handler `Fn(&Args)`
//! - [`SlotHandle<Tag, Args>`] - Weak handle to a slot, usable from handlers
//! - [`SignalId`] - Opaque, never-reused identity of a signal
//!
//! # Auto-disconnect
//!
//! Slots and signals reference each other without owning each other. When a
//! slot is dropped it removes itself from its signal; when a signal is dropped
//! every attached slot forgets it, so [`Slot::is_connected`] reports `false`
//! and dropping the slot later is a no-op.
//!
//! # Delivery Order
//!
//! Slots are invoked most-recently-connected first. A slot connected while an
//! emission is running is placed at the front of the list and therefore only
//! sees the next emission. Handlers may disconnect themselves, disconnect or
//! drop any other slot, or connect new slots while they run.
//!
//! # Handler Panics
//!
//! A panicking handler aborts the rest of the emission and the panic
//! propagates to the caller of `invoke`. The subscriber list stays consistent:
//! a slot that detached itself before panicking is removed, all other slots
//! remain connected.
//!
//! # Related Modules
//!
//! - [`crate::Event`] / [`crate::RecursiveEvent`] - Own a signal and emit through it
//! - [`crate::SlotHolder`] - Manages slot lifetimes on behalf of clients
//!
//! # Example
//!
//! ```
//! use tether_core::{Event, Slot};
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! enum Progress {}
//!
//! let event = Event::<Progress, (u32,)>::new();
//! let seen = Rc::new(Cell::new(0));
//!
//! let seen_clone = seen.clone();
//! let slot = Slot::with_handler(move |&(percent,): &(u32,)| seen_clone.set(percent));
//! event.sig().connect(&slot);
//!
//! event.invoke((40,));
//! assert_eq!(seen.get(), 40);
//!
//! drop(slot); // detaches automatically
//! event.invoke((80,));
//! assert_eq!(seen.get(), 40);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use slotmap::{new_key_type, SlotMap};

use crate::guard::ScopeGuard;
use crate::logging::targets;

new_key_type! {
    /// Position of one subscriber inside a signal's list.
    struct LinkKey;
}

/// Opaque identity of a signal.
///
/// Every signal receives a fresh id when it is created; ids are never reused
/// within a process, so an id that outlives its signal cannot be mistaken for
/// a newer one. Only equality (and hashing/ordering for use as a map key) is
/// meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SignalId(u64);

impl SignalId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric value of this id.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SignalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "signal#{}", self.0)
    }
}

type Handler<Args> = Rc<dyn Fn(&Args)>;

// ---------------------------------------------------------------------------
// Slot side
// ---------------------------------------------------------------------------

/// The signal a slot is currently attached to, and where.
struct Attachment<Args> {
    signal: Weak<SignalShared<Args>>,
    signal_id: SignalId,
    link: LinkKey,
}

/// State shared between a [`Slot`], its [`SlotHandle`]s and an in-flight
/// emission.
struct SlotShared<Args> {
    handler: RefCell<Option<Handler<Args>>>,
    attachment: RefCell<Option<Attachment<Args>>>,
}

impl<Args> SlotShared<Args> {
    fn new(handler: Option<Handler<Args>>) -> Self {
        Self {
            handler: RefCell::new(handler),
            attachment: RefCell::new(None),
        }
    }

    fn is_connected(&self) -> bool {
        self.attachment.borrow().is_some()
    }

    fn is_attached_to(&self, id: SignalId) -> bool {
        self.attachment
            .borrow()
            .as_ref()
            .is_some_and(|attachment| attachment.signal_id == id)
    }

    fn disconnect(&self) {
        let attachment = self.attachment.borrow_mut().take();
        if let Some(attachment) = attachment {
            if let Some(signal) = attachment.signal.upgrade() {
                signal.slot_detach(attachment.link);
            }
        }
    }

    /// Records the new attachment, leaving any previous signal first.
    fn note_attached(&self, signal: &Rc<SignalShared<Args>>, link: LinkKey) {
        self.disconnect();
        *self.attachment.borrow_mut() = Some(Attachment {
            signal: Rc::downgrade(signal),
            signal_id: signal.id,
            link,
        });
    }

    fn note_signal_gone(&self, id: SignalId) {
        let mut attachment = self.attachment.borrow_mut();
        if attachment.as_ref().is_some_and(|a| a.signal_id == id) {
            *attachment = None;
        }
    }

    fn deliver(&self, args: &Args) {
        // Cloned out so the handler may replace itself while running.
        let handler = self.handler.borrow().clone();
        if let Some(handler) = handler {
            handler(args);
        }
    }
}

/// A subscriber wrapping a handler for one event kind.
///
/// A slot starts disconnected. It is attached with [`Signal::connect`] and
/// stays attached until it is disconnected, connected to another signal, or
/// either side is dropped. A slot without a handler silently drops the events
/// it receives.
///
/// The `Tag` parameter must match the signal's tag: a slot for one event kind
/// cannot be connected to the signal of another, even if both carry the same
/// payload type.
///
/// ```compile_fail
/// use tether_core::{Event, Slot};
///
/// enum Clicked {}
/// enum Hovered {}
///
/// let hovered = Event::<Hovered, (i32,)>::new();
/// let slot = Slot::<Clicked, (i32,)>::new();
/// hovered.sig().connect(&slot); // tag mismatch
/// ```
///
/// `Slot` is neither `Send` nor `Sync`: all participants of one signal live on
/// a single thread.
///
/// # Related
///
/// - [`Signal::connect`] - Attaches a slot
/// - [`SlotHandle`] - Weak handle for disconnecting from inside a handler
/// - [`crate::SlotHolder`] - Owns slots on behalf of the caller
pub struct Slot<Tag, Args> {
    shared: Rc<SlotShared<Args>>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag, Args: 'static> Slot<Tag, Args> {
    /// Create a disconnected slot without a handler.
    pub fn new() -> Self {
        Self {
            shared: Rc::new(SlotShared::new(None)),
            _tag: PhantomData,
        }
    }

    /// Create a disconnected slot with `handler`.
    pub fn with_handler<F>(handler: F) -> Self
    where
        F: Fn(&Args) + 'static,
    {
        Self {
            shared: Rc::new(SlotShared::new(Some(Rc::new(handler)))),
            _tag: PhantomData,
        }
    }

    /// Replace the handler. The connection state is not affected.
    pub fn set_handler<F>(&self, handler: F)
    where
        F: Fn(&Args) + 'static,
    {
        *self.shared.handler.borrow_mut() = Some(Rc::new(handler));
    }

    /// Remove the handler; events reaching this slot are dropped.
    pub fn clear_handler(&self) {
        self.shared.handler.borrow_mut().take();
    }

    /// Whether a handler is set.
    pub fn has_handler(&self) -> bool {
        self.shared.handler.borrow().is_some()
    }

    /// Whether this slot is attached to a live signal.
    pub fn is_connected(&self) -> bool {
        self.shared.is_connected()
    }

    /// Detach from the current signal, if any.
    ///
    /// Safe to call from inside this slot's own handler: the slot does not
    /// receive further events, including from the emission in progress.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    /// A weak handle to this slot.
    ///
    /// Handlers typically capture a handle to disconnect their own slot.
    pub fn handle(&self) -> SlotHandle<Tag, Args> {
        SlotHandle {
            shared: Rc::downgrade(&self.shared),
            _tag: PhantomData,
        }
    }
}

impl<Tag, Args: 'static> Default for Slot<Tag, Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Tag, Args> Drop for Slot<Tag, Args> {
    fn drop(&mut self) {
        self.shared.disconnect();
    }
}

impl<Tag, Args> fmt::Debug for Slot<Tag, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let signal = self
            .shared
            .attachment
            .borrow()
            .as_ref()
            .map(|attachment| attachment.signal_id);
        f.debug_struct("Slot")
            .field("signal", &signal)
            .field("has_handler", &self.shared.handler.borrow().is_some())
            .finish()
    }
}

/// A weak handle to a [`Slot`].
///
/// The handle does not keep the slot alive. Once the slot is dropped,
/// [`is_connected`](Self::is_connected) returns `false` and
/// [`disconnect`](Self::disconnect) does nothing.
///
/// # Example
///
/// ```
/// use tether_core::{Event, Slot};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// enum Once {}
///
/// let event = Event::<Once, ()>::new();
/// let calls = Rc::new(Cell::new(0));
///
/// let slot = Slot::new();
/// let handle = slot.handle();
/// let calls_clone = calls.clone();
/// slot.set_handler(move |_: &()| {
///     calls_clone.set(calls_clone.get() + 1);
///     handle.disconnect();
/// });
/// event.sig().connect(&slot);
///
/// event.invoke(());
/// event.invoke(());
/// assert_eq!(calls.get(), 1);
/// assert!(!slot.is_connected());
/// ```
pub struct SlotHandle<Tag, Args> {
    shared: Weak<SlotShared<Args>>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag, Args> SlotHandle<Tag, Args> {
    /// Whether the slot is still alive and attached to a live signal.
    pub fn is_connected(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.is_connected())
    }

    /// Detach the slot from its signal, if the slot is still alive.
    pub fn disconnect(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.disconnect();
        }
    }
}

impl<Tag, Args> Clone for SlotHandle<Tag, Args> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            _tag: PhantomData,
        }
    }
}

impl<Tag, Args> fmt::Debug for SlotHandle<Tag, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotHandle")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Signal side
// ---------------------------------------------------------------------------

/// One node of the subscriber list.
struct Link<Args> {
    slot: Weak<SlotShared<Args>>,
    prev: Option<LinkKey>,
    next: Option<LinkKey>,
}

/// Doubly linked subscriber list plus dispatch bookkeeping.
///
/// Nodes live in a slotmap so that erasing one never invalidates the keys
/// of the others.
struct Subscribers<Args> {
    links: SlotMap<LinkKey, Link<Args>>,
    head: Option<LinkKey>,
    /// Slot currently being invoked; cleared when that slot detaches.
    cursor: Option<LinkKey>,
    /// Slot the dispatch loop handed to `deliver`, regardless of the cursor.
    in_flight: Option<LinkKey>,
    dispatching: bool,
}

impl<Args> Subscribers<Args> {
    fn new() -> Self {
        Self {
            links: SlotMap::with_key(),
            head: None,
            cursor: None,
            in_flight: None,
            dispatching: false,
        }
    }

    fn push_front(&mut self, slot: Weak<SlotShared<Args>>) -> LinkKey {
        let next = self.head;
        let key = self.links.insert(Link {
            slot,
            prev: None,
            next,
        });
        if let Some(next) = next {
            self.links[next].prev = Some(key);
        }
        self.head = Some(key);
        key
    }

    /// Erase `key`, returning its successor.
    fn unlink(&mut self, key: LinkKey) -> Option<LinkKey> {
        let link = self.links.remove(key)?;
        match link.prev {
            Some(prev) => self.links[prev].next = link.next,
            None => self.head = link.next,
        }
        if let Some(next) = link.next {
            self.links[next].prev = link.prev;
        }
        link.next
    }

    fn pending_erase(&self) -> bool {
        self.in_flight.is_some() && self.cursor != self.in_flight
    }

    fn len(&self) -> usize {
        self.links.len() - usize::from(self.pending_erase())
    }
}

/// State shared between a [`Signal`], the slots attached to it and an
/// in-flight emission.
struct SignalShared<Args> {
    id: SignalId,
    subscribers: RefCell<Subscribers<Args>>,
}

impl<Args> SignalShared<Args> {
    fn slot_detach(&self, link: LinkKey) {
        let mut subscribers = self.subscribers.borrow_mut();
        if subscribers.cursor == Some(link) {
            // The dispatch loop erases this node once the handler returns.
            subscribers.cursor = None;
        } else {
            subscribers.unlink(link);
        }
        tracing::trace!(
            target: targets::SIGNAL,
            signal = %self.id,
            slot_count = subscribers.len(),
            "slot detached"
        );
    }

    fn begin_dispatch(&self) -> Option<LinkKey> {
        let mut subscribers = self.subscribers.borrow_mut();
        debug_assert!(
            !subscribers.dispatching,
            "nested emission on {}: signals do not support re-entrant invoke",
            self.id
        );
        subscribers.dispatching = true;
        subscribers.head
    }

    fn enter(&self, link: LinkKey) -> Option<Rc<SlotShared<Args>>> {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.cursor = Some(link);
        subscribers.in_flight = Some(link);
        subscribers.links.get(link).and_then(|l| l.slot.upgrade())
    }

    /// Position following `link` once its handler has returned.
    fn advance(&self, link: LinkKey) -> Option<LinkKey> {
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.in_flight = None;
        if subscribers.cursor == Some(link) {
            subscribers.links.get(link).and_then(|l| l.next)
        } else {
            subscribers.unlink(link)
        }
    }

    /// Restores a consistent, idle state after an emission, including one
    /// abandoned by a panicking handler.
    fn finish_dispatch(&self) {
        let mut subscribers = self.subscribers.borrow_mut();
        if let Some(link) = subscribers.in_flight.take() {
            if subscribers.cursor != Some(link) {
                subscribers.unlink(link);
            }
        }
        subscribers.cursor = None;
        subscribers.dispatching = false;
    }
}

impl<Args> Drop for SignalShared<Args> {
    fn drop(&mut self) {
        let subscribers = self.subscribers.get_mut();
        for link in subscribers.links.values() {
            if let Some(slot) = link.slot.upgrade() {
                slot.note_signal_gone(self.id);
            }
        }
        tracing::trace!(
            target: targets::SIGNAL,
            signal = %self.id,
            released = subscribers.links.len(),
            "signal dropped"
        );
    }
}

/// The broadcast point of an event.
///
/// A signal keeps an ordered list of non-owning references to the slots
/// attached to it. Signals are created only by events ([`crate::Event`],
/// [`crate::RecursiveEvent`]) and are reached through their `sig()` accessor;
/// emission happens through the owning event.
///
/// Dropping a signal (by dropping its event) disconnects every attached slot.
///
/// # Related Types
///
/// - [`Slot`] - The subscriber type
/// - [`SignalId`] - Identity used by [`crate::SlotHolder`]
pub struct Signal<Tag, Args> {
    shared: Rc<SignalShared<Args>>,
    _tag: PhantomData<fn() -> Tag>,
}

impl<Tag, Args: 'static> Signal<Tag, Args> {
    pub(crate) fn new() -> Self {
        Self {
            shared: Rc::new(SignalShared {
                id: SignalId::next(),
                subscribers: RefCell::new(Subscribers::new()),
            }),
            _tag: PhantomData,
        }
    }

    /// The identity of this signal.
    pub fn id(&self) -> SignalId {
        self.shared.id
    }

    /// Attach `slot` so that it receives future emissions.
    ///
    /// The slot is placed at the front of the list, so it is invoked before
    /// every previously connected slot and is skipped by an emission that is
    /// already running. Connecting a slot that is already attached here does
    /// nothing. A slot attached to another signal is detached from it first.
    pub fn connect(&self, slot: &Slot<Tag, Args>) {
        if slot.shared.is_attached_to(self.shared.id) {
            tracing::trace!(
                target: targets::SIGNAL,
                signal = %self.shared.id,
                "slot already connected"
            );
            return;
        }

        let link = self
            .shared
            .subscribers
            .borrow_mut()
            .push_front(Rc::downgrade(&slot.shared));
        slot.shared.note_attached(&self.shared, link);

        tracing::trace!(
            target: targets::SIGNAL,
            signal = %self.shared.id,
            slot_count = self.slot_count(),
            "slot connected"
        );
    }

    /// Number of slots currently attached.
    pub fn slot_count(&self) -> usize {
        self.shared.subscribers.borrow().len()
    }

    /// Whether an emission is running on this signal.
    pub fn is_dispatching(&self) -> bool {
        self.shared.subscribers.borrow().dispatching
    }

    /// Deliver `args` to every attached slot, front to back.
    ///
    /// Must not be called while an emission is already running on this
    /// signal; the owning events guarantee that.
    #[tracing::instrument(
        skip_all,
        target = "tether_core::signal",
        level = "trace",
        fields(signal = %self.shared.id)
    )]
    pub(crate) fn invoke(&self, args: &Args) {
        let shared = Rc::clone(&self.shared);
        tracing::trace!(
            target: targets::SIGNAL,
            slot_count = self.slot_count(),
            "emitting"
        );

        let mut position = shared.begin_dispatch();
        let _finish = ScopeGuard::new(|| shared.finish_dispatch());
        while let Some(link) = position {
            if let Some(slot) = shared.enter(link) {
                slot.deliver(args);
            }
            position = shared.advance(link);
        }
    }
}

impl<Tag, Args> fmt::Debug for Signal<Tag, Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let subscribers = self.shared.subscribers.borrow();
        f.debug_struct("Signal")
            .field("id", &self.shared.id)
            .field("slot_count", &subscribers.len())
            .field("dispatching", &subscribers.dispatching)
            .finish()
    }
}

static_assertions::assert_not_impl_any!(Signal<(), (i32,)>: Send, Sync, Clone);
static_assertions::assert_not_impl_any!(Slot<(), (i32,)>: Send, Sync, Clone);
