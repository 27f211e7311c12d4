//! Re-entrant emission with checks disabled.
//!
//! Kept in its own test binary: the check level is process-wide.

use std::cell::RefCell;
use std::rc::Rc;

use tether_core::{Event, Slot, dispatch_check};

enum Value {}

#[test]
fn nested_emission_is_dropped_when_checks_disabled() {
    dispatch_check::set_reentrancy_checks_enabled(false);

    let event = Rc::new(Event::<Value, (i32,)>::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    let reemitter = {
        let event = Rc::downgrade(&event);
        let log = log.clone();
        Slot::with_handler(move |&(n,): &(i32,)| {
            log.borrow_mut().push(("reemitter", n));
            if let Some(event) = event.upgrade() {
                event.invoke((n + 100,));
            }
        })
    };
    let tail = {
        let log = log.clone();
        Slot::with_handler(move |&(n,): &(i32,)| log.borrow_mut().push(("tail", n)))
    };
    event.sig().connect(&tail);
    event.sig().connect(&reemitter);

    event.invoke((1,));
    assert_eq!(*log.borrow(), vec![("reemitter", 1), ("tail", 1)]);
    assert!(!event.is_dispatching());

    event.invoke((2,));
    assert_eq!(log.borrow().len(), 4);

    dispatch_check::set_reentrancy_checks_enabled(true);
    assert!(dispatch_check::are_reentrancy_checks_enabled());
}
