//! Thermostat Example
//!
//! Wires a simulated thermostat to a heater and a display:
//! - The heater reacts to temperature readings through its own slot
//! - The display is connected through a slot holder
//! - A recursive event lets the heater feed new readings back in
//!
//! Run with: RUST_LOG=tether_core=trace cargo run -p tether --example thermostat

use std::cell::Cell;
use std::rc::Rc;

use tether::prelude::*;
use tracing_subscriber::EnvFilter;

enum Reading {}
enum Switched {}

struct Thermostat {
    reading: RecursiveEvent<Reading, (f32,)>,
    heater_switched: Event<Switched, (bool,)>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let thermostat = Rc::new(Thermostat {
        reading: RecursiveEvent::new(),
        heater_switched: Event::new(),
    });

    // The heater warms the room by half a degree per reading until it hits
    // the target, re-emitting the new reading each time.
    let heating = Rc::new(Cell::new(false));
    let heater = {
        let weak = Rc::downgrade(&thermostat);
        let heating = heating.clone();
        Slot::with_handler(move |&(celsius,): &(f32,)| {
            let Some(thermostat) = weak.upgrade() else {
                return;
            };
            let should_heat = celsius < 21.0;
            if heating.replace(should_heat) != should_heat {
                thermostat.heater_switched.invoke((should_heat,));
            }
            if should_heat {
                thermostat.reading.invoke((celsius + 0.5,));
            }
        })
    };
    thermostat.reading.sig().connect(&heater);

    let display = SlotHolder::new();
    display.connect(thermostat.reading.sig(), |&(celsius,): &(f32,)| {
        println!("temperature: {celsius:.1} °C");
    });
    display.connect(thermostat.heater_switched.sig(), |&(on,): &(bool,)| {
        println!("heater {}", if on { "on" } else { "off" });
    });

    thermostat.reading.invoke((19.0,));

    // Without the heater slot the readings are only displayed.
    drop(heater);
    thermostat.reading.invoke((18.5,));

    let heater_connected = display.is_connected(thermostat.heater_switched.sig());
    tracing::info!(heater_connected, "done");
}
