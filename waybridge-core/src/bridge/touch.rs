//! Touch frame accumulation keyed by contact id.

use std::collections::HashMap;

use super::{Bridge, ObjectKind, Protocol};
use crate::events::{BridgeEvent, TouchSubEvent};
use crate::handle::Handle;

/// Raw `wl_touch` events.
#[derive(Debug, Clone, PartialEq)]
pub enum RawTouchEvent {
    Down {
        id: i32,
        surface: Handle,
        time: u32,
        x: f64,
        y: f64,
    },
    Up {
        id: i32,
        time: u32,
    },
    Motion {
        id: i32,
        time: u32,
        x: f64,
        y: f64,
    },
    Frame,
    Cancel,
}

#[derive(Debug, Clone, Copy)]
struct Contact {
    surface: Handle,
    x: f64,
    y: f64,
}

#[derive(Debug)]
pub(crate) struct TouchDevice {
    pub(crate) handle: Handle,
    contacts: HashMap<i32, Contact>,
    pending: Vec<TouchSubEvent>,
}

impl TouchDevice {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            contacts: HashMap::new(),
            pending: Vec::new(),
        }
    }

    pub(crate) fn forget_surface(&mut self, surface: Handle) {
        self.contacts.retain(|_, contact| contact.surface != surface);
        self.pending.retain(|event| match event {
            TouchSubEvent::Down { surface: target, .. }
            | TouchSubEvent::Motion { surface: target, .. }
            | TouchSubEvent::Up { surface: target, .. } => *target != surface,
            TouchSubEvent::Cancel => true,
        });
    }
}

impl<P: Protocol> Bridge<P> {
    /// Feed one `wl_touch` event; `Frame` emits the batch, `Cancel` drops it.
    pub fn on_touch_event(&mut self, touch: Handle, event: RawTouchEvent) {
        if !self.resolve(touch, ObjectKind::Touch) {
            return;
        }
        if let RawTouchEvent::Down { surface, .. } = event {
            if !self.resolve(surface, ObjectKind::Surface) {
                return;
            }
        }
        let clock = &mut self.clock;
        let Some(device) = self
            .seat
            .as_mut()
            .and_then(|seat| seat.touch.as_mut())
            .filter(|device| device.handle == touch)
        else {
            return;
        };

        let frame = match event {
            RawTouchEvent::Down { id, surface, time, x, y } => {
                let time = clock.extend(time);
                device.contacts.insert(id, Contact { surface, x, y });
                device.pending.push(TouchSubEvent::Down { id, surface, time, x, y });
                None
            },
            RawTouchEvent::Motion { id, time, x, y } => {
                let time = clock.extend(time);
                match device.contacts.get_mut(&id) {
                    Some(contact) => {
                        contact.x = x;
                        contact.y = y;
                        let surface = contact.surface;
                        device.pending.push(TouchSubEvent::Motion { id, surface, time, x, y });
                    },
                    None => log::trace!("Motion for unknown touch contact {}", id),
                }
                None
            },
            RawTouchEvent::Up { id, time } => {
                let time = clock.extend(time);
                match device.contacts.remove(&id) {
                    Some(Contact { surface, x, y }) => {
                        device.pending.push(TouchSubEvent::Up { id, surface, time, x, y });
                    },
                    None => log::trace!("Up for unknown touch contact {}", id),
                }
                None
            },
            RawTouchEvent::Frame => {
                let events = std::mem::take(&mut device.pending);
                (!events.is_empty()).then_some(events)
            },
            RawTouchEvent::Cancel => {
                log::debug!("Touch sequence cancelled with {} contacts", device.contacts.len());
                device.pending.clear();
                device.contacts.clear();
                Some(vec![TouchSubEvent::Cancel])
            },
        };

        if let Some(events) = frame {
            self.emit(BridgeEvent::TouchFrame { events });
        }
    }
}
