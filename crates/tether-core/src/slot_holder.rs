//! Slot holder: slots whose lifetime is managed for the caller.
//!
//! A [`SlotHolder`] creates one slot per signal on demand and keeps it until
//! the connection is replaced, disconnected, or the holder is dropped. Client
//! code only deals with signals and handlers.
//!
//! Signals are identified by their [`SignalId`]; the holder never owns a
//! signal and never looks inside one.

use std::cell::RefCell;
use std::fmt;

use crate::logging::targets;
use crate::signal::{Signal, SignalId, Slot};

/// Type-erased view of an owned slot.
trait HeldSlot {
    fn is_connected(&self) -> bool;
}

impl<Tag, Args: 'static> HeldSlot for Slot<Tag, Args> {
    fn is_connected(&self) -> bool {
        Slot::is_connected(self)
    }
}

type Entry = (SignalId, Box<dyn HeldSlot>);

/// Owns slots on behalf of its user, at most one per signal.
///
/// Dropping the holder drops every slot it owns, which disconnects them.
///
/// All methods take `&self`, so a holder can be shared with (and used from)
/// the handlers it manages.
///
/// # Example
///
/// ```
/// use tether_core::{Event, SlotHolder};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// enum Tick {}
///
/// let tick = Event::<Tick, (u64,)>::new();
/// let holder = SlotHolder::new();
/// let last = Rc::new(Cell::new(0));
///
/// let last_clone = last.clone();
/// assert!(holder.connect(tick.sig(), move |&(n,): &(u64,)| last_clone.set(n)));
/// tick.invoke((5,));
/// assert_eq!(last.get(), 5);
///
/// holder.disconnect(tick.sig());
/// tick.invoke((6,));
/// assert_eq!(last.get(), 5);
/// ```
#[derive(Default)]
pub struct SlotHolder {
    entries: RefCell<Vec<Entry>>,
}

impl SlotHolder {
    /// Create an empty holder.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
        }
    }

    /// Connect `handler` to `signal` unless this holder already has a slot
    /// for it.
    ///
    /// Returns `true` if `handler` is now connected, `false` if an existing
    /// connection was left in place.
    pub fn connect<Tag, Args, F>(&self, signal: &Signal<Tag, Args>, handler: F) -> bool
    where
        Tag: 'static,
        Args: 'static,
        F: Fn(&Args) + 'static,
    {
        self.connect_with(signal, handler, false)
    }

    /// Connect `handler` to `signal`, optionally replacing an existing
    /// connection.
    ///
    /// With `replace` set, a slot this holder already owns for `signal` is
    /// dropped (and thereby disconnected) before the new one is connected.
    /// Without it, an existing connection is kept and `false` is returned.
    pub fn connect_with<Tag, Args, F>(
        &self,
        signal: &Signal<Tag, Args>,
        handler: F,
        replace: bool,
    ) -> bool
    where
        Tag: 'static,
        Args: 'static,
        F: Fn(&Args) + 'static,
    {
        let id = signal.id();
        let previous = {
            let mut entries = self.entries.borrow_mut();
            match entries.iter().position(|(entry_id, _)| *entry_id == id) {
                Some(_) if !replace => {
                    tracing::trace!(
                        target: targets::SLOT_HOLDER,
                        signal = %id,
                        "already connected, keeping existing handler"
                    );
                    return false;
                }
                Some(index) => Some(entries.remove(index)),
                None => None,
            }
        };
        // Dropped outside the borrow: the old handler may own arbitrary state.
        drop(previous);

        let slot = Slot::<Tag, Args>::with_handler(handler);
        signal.connect(&slot);
        self.entries.borrow_mut().push((id, Box::new(slot)));

        tracing::trace!(
            target: targets::SLOT_HOLDER,
            signal = %id,
            replace,
            "handler connected"
        );
        true
    }

    /// Drop the slot this holder owns for `signal`, if any.
    pub fn disconnect<Tag, Args>(&self, signal: &Signal<Tag, Args>)
    where
        Args: 'static,
    {
        let id = signal.id();
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let index = entries.iter().position(|(entry_id, _)| *entry_id == id);
            index.map(|index| entries.remove(index))
        };
        if removed.is_some() {
            tracing::trace!(target: targets::SLOT_HOLDER, signal = %id, "handler disconnected");
        }
    }

    /// Whether this holder has a slot for `signal` that is still connected.
    ///
    /// Returns `false` if the holder never connected to `signal`, or if the
    /// signal has been dropped since.
    pub fn is_connected<Tag, Args>(&self, signal: &Signal<Tag, Args>) -> bool
    where
        Args: 'static,
    {
        let id = signal.id();
        self.entries
            .borrow()
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .is_some_and(|(_, slot)| slot.is_connected())
    }

    /// Number of slots owned, including ones whose signal has been dropped.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the holder owns no slot.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Drop every owned slot.
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.entries.borrow_mut());
        drop(entries);
    }
}

impl fmt::Debug for SlotHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        f.debug_struct("SlotHolder")
            .field(
                "signals",
                &entries.iter().map(|(id, _)| *id).collect::<Vec<_>>(),
            )
            .finish()
    }
}

static_assertions::assert_not_impl_any!(SlotHolder: Send, Sync);
