//! Integration tests for recursive events.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tether_core::{RecursiveEvent, Slot};

enum Step {}
enum Job {}

#[test]
fn recursive_fan_out() {
    let event = Rc::new(RecursiveEvent::<Step, (i32, i32)>::new());
    let last_first = Rc::new(Cell::new(-1));
    let recorded_second = Rc::new(Cell::new(0));
    let counter = Rc::new(Cell::new(0));

    let a = {
        let event = Rc::downgrade(&event);
        let last_first = last_first.clone();
        Slot::with_handler(move |&(first, second): &(i32, i32)| {
            last_first.set(first);
            if first < 5 {
                if let Some(event) = event.upgrade() {
                    event.invoke((first + 1, second));
                }
            }
        })
    };
    let b = {
        let recorded_second = recorded_second.clone();
        let counter = counter.clone();
        Slot::with_handler(move |&(_, second): &(i32, i32)| {
            recorded_second.set(second);
            counter.set(counter.get() + 1);
        })
    };
    event.sig().connect(&a);
    event.sig().connect(&b);

    event.invoke((0, 10));
    assert_eq!(counter.get(), 6);
    assert_eq!(recorded_second.get(), 10);
    assert_eq!(last_first.get(), 5);
    assert_eq!(event.pending(), 0);
    assert!(!event.is_dispatching());
}

#[test]
fn nested_emissions_are_delivered_fifo_after_current() {
    let event = Rc::new(RecursiveEvent::<Job, (u32,)>::new());
    let log = Rc::new(RefCell::new(Vec::new()));

    // Job n spawns jobs 10n+1 and 10n+2 until depth two.
    let spawner = {
        let event = Rc::downgrade(&event);
        let log = log.clone();
        Slot::with_handler(move |&(job,): &(u32,)| {
            log.borrow_mut().push(job);
            if job < 10 {
                if let Some(event) = event.upgrade() {
                    event.invoke((job * 10 + 1,));
                    event.invoke((job * 10 + 2,));
                    // Nothing delivered yet: still inside the current emission.
                    assert_eq!(log.borrow().last(), Some(&job));
                }
            }
        })
    };
    event.sig().connect(&spawner);

    event.invoke((1,));
    assert_eq!(*log.borrow(), vec![1, 11, 12]);

    log.borrow_mut().clear();
    event.invoke((0,));
    assert_eq!(*log.borrow(), vec![0, 1, 2, 11, 12, 21, 22]);
}

#[test]
fn queued_emission_reaches_slot_connected_meanwhile() {
    let event = Rc::new(RecursiveEvent::<Job, (u32,)>::new());
    let late_seen = Rc::new(RefCell::new(Vec::new()));

    let late = {
        let late_seen = late_seen.clone();
        Rc::new(Slot::with_handler(move |&(job,): &(u32,)| {
            late_seen.borrow_mut().push(job);
        }))
    };
    let early = {
        let event = Rc::downgrade(&event);
        let late = Rc::downgrade(&late);
        Slot::with_handler(move |&(job,): &(u32,)| {
            if job == 0 {
                if let (Some(event), Some(late)) = (event.upgrade(), late.upgrade()) {
                    event.sig().connect(&late);
                    event.invoke((1,));
                }
            }
        })
    };
    event.sig().connect(&early);

    event.invoke((0,));
    assert_eq!(*late_seen.borrow(), vec![1]);
}

#[test]
fn recursive_event_without_reentry_behaves_like_event() {
    let event = RecursiveEvent::<Job, (u32,)>::new();
    let log = Rc::new(RefCell::new(Vec::new()));

    let first = {
        let log = log.clone();
        Slot::with_handler(move |&(job,): &(u32,)| log.borrow_mut().push(("first", job)))
    };
    let second = {
        let log = log.clone();
        Slot::with_handler(move |&(job,): &(u32,)| log.borrow_mut().push(("second", job)))
    };
    event.sig().connect(&first);
    event.sig().connect(&second);

    event.invoke((7,));
    assert_eq!(*log.borrow(), vec![("second", 7), ("first", 7)]);
}
